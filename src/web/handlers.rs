use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use std::path::Path;
use tracing::{error, warn};

use super::render::{error_page, index_page, results_page, INVALID_IMAGE_MESSAGE};
use super::types::{ErrorResponse, GenreEntry, RecommendResponse};
use crate::catalog::GENRE_TABLE;
use crate::pipeline::PipelineError;
use crate::server::AppState;
use crate::vision::DecodeError;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

pub async fn index() -> Html<String> {
    Html(index_page())
}

pub async fn recommend_page(State(state): State<AppState>, multipart: Multipart) -> Response {
    match handle_upload(&state, multipart).await {
        Ok(outcome) => Html(results_page(&outcome)).into_response(),
        Err(e) => (e.status(), Html(error_page(&e.user_message()))).into_response(),
    }
}

pub async fn recommend_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RecommendResponse>, RequestError> {
    let outcome = handle_upload(&state, multipart).await?;
    Ok(Json(outcome.into()))
}

pub async fn list_genres() -> Json<Vec<GenreEntry>> {
    let entries = GENRE_TABLE
        .iter()
        .map(|(emotion, genre)| GenreEntry {
            emotion: *emotion,
            genre_id: genre.id,
            genre_name: genre.name,
        })
        .collect();
    Json(entries)
}

pub async fn healthz() -> &'static str {
    "ok"
}

async fn handle_upload(
    state: &AppState,
    multipart: Multipart,
) -> Result<crate::pipeline::PipelineOutcome, RequestError> {
    let image = read_image(multipart).await?;
    state.pipeline.run(image).await.map_err(|e| {
        match &e {
            PipelineError::Decode(d) => warn!("Rejected upload: {}", d),
            PipelineError::Inference(i) => error!("Inference failed: {}", i),
        }
        RequestError::Pipeline(e)
    })
}

/// Extensions accepted for uploaded files.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
/// Filename browsers give a canvas blob appended to a form.
const CAMERA_FILENAME: &str = "blob";

/// Pulls the image bytes out of the form. Uploaded files must carry a jpg,
/// jpeg or png extension; camera frames arrive without a usable filename and
/// are sniffed by the decoder instead.
async fn read_image(mut multipart: Multipart) -> Result<Vec<u8>, RequestError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        match field.file_name() {
            None | Some(CAMERA_FILENAME) => {}
            Some(filename) => check_extension(filename)?,
        }

        let bytes = field.bytes().await?;
        return Ok(bytes.to_vec());
    }

    Err(RequestError::MissingImage)
}

fn check_extension(filename: &str) -> Result<(), DecodeError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(DecodeError::UnsupportedType(ext))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("No image in request (expected multipart field 'image')")]
    MissingImage,
    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<DecodeError> for RequestError {
    fn from(e: DecodeError) -> Self {
        RequestError::Pipeline(PipelineError::Decode(e))
    }
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::MissingImage => StatusCode::BAD_REQUEST,
            RequestError::Multipart(e) => e.status(),
            RequestError::Pipeline(PipelineError::Decode(_)) => StatusCode::BAD_REQUEST,
            RequestError::Pipeline(PipelineError::Inference(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RequestError::MissingImage | RequestError::Multipart(_) => "upload",
            RequestError::Pipeline(PipelineError::Decode(_)) => "decode",
            RequestError::Pipeline(PipelineError::Inference(_)) => "inference",
        }
    }

    /// Text shown to the user. Decode problems get the generic prompt,
    /// inference failures name the cause.
    pub fn user_message(&self) -> String {
        match self {
            RequestError::Pipeline(PipelineError::Inference(e)) => {
                format!("Emotion detection failed: {}", e)
            }
            RequestError::Pipeline(PipelineError::Decode(DecodeError::UnsupportedType(ext)))
                if ext.is_empty() =>
            {
                format!("Uploaded file has no extension. {}", INVALID_IMAGE_MESSAGE)
            }
            RequestError::Pipeline(PipelineError::Decode(DecodeError::UnsupportedType(ext))) => {
                format!("Unsupported file type '.{}'. {}", ext, INVALID_IMAGE_MESSAGE)
            }
            RequestError::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "The image is too large.".to_string()
            }
            _ => INVALID_IMAGE_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            kind: self.kind(),
            error: self.user_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
