use std::fmt::Write;

use crate::pipeline::PipelineOutcome;

/// Cards per row in the results grid.
pub const GRID_COLUMNS: usize = 5;
/// Characters of the synopsis shown on a card.
pub const SYNOPSIS_CHARS: usize = 150;

pub const NO_MOVIES_MESSAGE: &str = "No movies found. Try again!";
pub const INVALID_IMAGE_MESSAGE: &str = "Please provide a valid image.";

const TITLE: &str = "Emotion-Based Movie Recommender";

const STYLE: &str = r#"
body { background: #141414; color: #fff; font-family: sans-serif; margin: 0; padding: 20px; }
main { max-width: 1200px; margin: auto; }
.source { margin: 1em 0; padding: 1em; background: rgba(255,255,255,0.05); border-radius: 10px; }
.grid { display: grid; grid-template-columns: repeat(COLUMNS, 1fr); gap: 16px; }
.movie-card { text-align: center; transition: transform 0.3s ease-in-out; }
.movie-card:hover { transform: scale(1.1); }
.movie-card img { width: 90%; border-radius: 10px; }
.movie-card .year { color: #888; margin-top: 0; }
.error { color: #ff6b6b; }
video, canvas { max-width: 320px; border-radius: 10px; }
a { color: #8ab4f8; }
"#;

const CAMERA_SCRIPT: &str = r#"
const video = document.getElementById('camera');
const canvas = document.getElementById('snapshot');
document.getElementById('start-camera').onclick = async () => {
  try {
    video.srcObject = await navigator.mediaDevices.getUserMedia({ video: true });
    document.getElementById('take-picture').disabled = false;
  } catch (e) {
    document.getElementById('camera-error').textContent = 'Camera unavailable: ' + e;
  }
};
document.getElementById('take-picture').onclick = () => {
  canvas.width = video.videoWidth;
  canvas.height = video.videoHeight;
  canvas.getContext('2d').drawImage(video, 0, 0);
  canvas.toBlob(async (blob) => {
    const form = new FormData();
    form.append('image', blob);
    const response = await fetch('/recommend', { method: 'POST', body: form });
    document.open();
    document.write(await response.text());
    document.close();
  }, 'image/jpeg');
};
"#;

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n<main>\n\
         <h1>&#127917; {title}</h1>\n{body}\n</main>\n</body>\n</html>\n",
        title = TITLE,
        style = STYLE.replace("COLUMNS", &GRID_COLUMNS.to_string()),
        body = body,
    )
}

/// Landing page: file upload and camera capture.
pub fn index_page() -> String {
    let body = format!(
        r#"<p>Choose how to provide an image: upload a file or capture one with your camera.</p>
<section class="source">
<h2>Upload Image</h2>
<form action="/recommend" method="post" enctype="multipart/form-data">
<input type="file" name="image" accept=".jpg,.jpeg,.png,image/jpeg,image/png" required>
<button type="submit">Recommend</button>
</form>
</section>
<section class="source">
<h2>Use Camera</h2>
<button id="start-camera" type="button">Start camera</button>
<button id="take-picture" type="button" disabled>Take a picture</button>
<p id="camera-error" class="error"></p>
<video id="camera" autoplay playsinline></video>
<canvas id="snapshot" hidden></canvas>
</section>
<p>Please upload or capture an image to get predictions.</p>
<script>{script}</script>"#,
        script = CAMERA_SCRIPT,
    );
    page(&body)
}

pub fn results_page(outcome: &PipelineOutcome) -> String {
    let emotion = outcome.prediction.emotion;
    let recs = &outcome.recommendations;

    let mut body = String::new();
    let _ = write!(
        body,
        "<h2>&#127917; <strong>Predicted Emotion: {}</strong></h2>\n\
         <h3>&#127916; Since you're feeling <strong>{}</strong>, here are some <strong>{}</strong> movies for you!</h3>\n",
        escape_html(emotion.as_str()),
        escape_html(emotion.as_str()),
        escape_html(recs.genre_name()),
    );

    if recs.items.is_empty() {
        let _ = writeln!(body, "<p>{}</p>", NO_MOVIES_MESSAGE);
    } else {
        body.push_str("<div class=\"grid\">\n");
        for item in &recs.items {
            let year = item
                .year()
                .map(|y| format!("<p class=\"year\">{}</p>\n", y))
                .unwrap_or_default();
            let _ = write!(
                body,
                "<div class=\"movie-card\">\n\
                 <a href=\"{href}\" target=\"_blank\" rel=\"noopener\"><img src=\"{poster}\" alt=\"{title}\"></a>\n\
                 <p><strong>{title}</strong></p>\n\
                 {year}\
                 <p>{synopsis}...</p>\n\
                 </div>\n",
                href = escape_html(&item.page_url),
                poster = escape_html(&item.poster_url),
                title = escape_html(&item.title),
                year = year,
                synopsis = escape_html(truncate_chars(&item.overview, SYNOPSIS_CHARS)),
            );
        }
        body.push_str("</div>\n");
    }

    body.push_str("<p><a href=\"/\">Try another image</a></p>");
    page(&body)
}

pub fn error_page(message: &str) -> String {
    page(&format!(
        "<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>",
        escape_html(message)
    ))
}

/// First `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
