use image::{imageops::FilterType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Spatial size the emotion model was trained on.
pub const INPUT_SIZE: u32 = 48;
/// Colour channels fed to the model.
pub const INPUT_CHANNELS: usize = 3;

/// Order of the colour channels in the tensor's innermost axis.
///
/// The model was exported from a pipeline that decoded images with OpenCV,
/// which yields BGR, so that is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Bgr,
    Rgb,
}

/// A batch of one image in NHWC layout with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
}

impl ImageTensor {
    pub const SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS];

    pub fn shape(&self) -> [usize; 4] {
        Self::SHAPE
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Builds a tensor from raw values. Fails if the length does not match
    /// the fixed input shape.
    pub fn from_vec(data: Vec<f32>) -> Result<Self, DecodeError> {
        let expected: usize = Self::SHAPE.iter().product();
        if data.len() != expected {
            return Err(DecodeError::Shape {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }
}

/// Decodes an encoded image and turns it into the model input tensor, using
/// the default channel order.
pub fn normalize(bytes: &[u8]) -> Result<ImageTensor, DecodeError> {
    normalize_with(bytes, ChannelOrder::default())
}

pub fn normalize_with(bytes: &[u8], order: ChannelOrder) -> Result<ImageTensor, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let format = image::guess_format(bytes).map_err(|_| DecodeError::UnknownFormat)?;
    let corrupt = |source| DecodeError::Corrupt { format, source };

    let mut decoder = ImageReader::with_format(Cursor::new(bytes), format)
        .into_decoder()
        .map_err(corrupt)?;
    let orientation = decoder.orientation().map_err(corrupt)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(corrupt)?;
    // Phone cameras store the sensor frame plus an EXIF rotation tag.
    img.apply_orientation(orientation);

    debug!(
        format = ?format,
        width = img.width(),
        height = img.height(),
        orientation = ?orientation,
        "Decoded input image"
    );

    // Squash to the model size; no cropping or letterboxing.
    let resized = img
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();

    let mut data = Vec::with_capacity(ImageTensor::SHAPE.iter().product());
    for pixel in resized.pixels() {
        let [r, g, b] = pixel.0;
        let channels = match order {
            ChannelOrder::Bgr => [b, g, r],
            ChannelOrder::Rgb => [r, g, b],
        };
        data.extend(channels.iter().map(|&c| c as f32 / 255.0));
    }

    ImageTensor::from_vec(data)
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Image data is empty")]
    Empty,
    #[error("Unrecognised image format")]
    UnknownFormat,
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("Failed to decode {format:?} image: {source}")]
    Corrupt {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },
    #[error("Tensor has {actual} values, expected {expected}")]
    Shape { expected: usize, actual: usize },
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    pub(crate) fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_shape_and_range() {
        for (w, h) in [(48, 48), (640, 480), (7, 300), (1, 1)] {
            let bytes = encode(gradient(w, h), ImageFormat::Png);
            let tensor = normalize(&bytes).unwrap();
            assert_eq!(tensor.shape(), [1, 48, 48, 3]);
            assert_eq!(tensor.as_slice().len(), 48 * 48 * 3);
            assert!(tensor.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_jpeg_decodes() {
        let bytes = encode(gradient(120, 90), ImageFormat::Jpeg);
        let tensor = normalize(&bytes).unwrap();
        assert_eq!(tensor.shape(), ImageTensor::SHAPE);
    }

    #[test]
    fn test_channel_order() {
        let img = RgbImage::from_pixel(48, 48, Rgb([255, 0, 51]));
        let bytes = encode(img, ImageFormat::Png);

        let bgr = normalize_with(&bytes, ChannelOrder::Bgr).unwrap();
        assert_eq!(&bgr.as_slice()[..3], &[0.2, 0.0, 1.0]);

        let rgb = normalize_with(&bytes, ChannelOrder::Rgb).unwrap();
        assert_eq!(&rgb.as_slice()[..3], &[1.0, 0.0, 0.2]);
    }

    /// Inserts an APP1 Exif segment carrying only an Orientation tag right
    /// after the JPEG SOI marker.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = vec![0x4d, 0x4d, 0x00, 0x2a, 0x00, 0x00, 0x00, 0x08];
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let mut segment = b"Exif\0\0".to_vec();
        segment.extend_from_slice(&tiff);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xff, 0xe1]);
        out.extend_from_slice(&((segment.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&segment);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn pixel(tensor: &ImageTensor, row: usize, col: usize) -> f32 {
        tensor.as_slice()[(row * 48 + col) * 3]
    }

    #[test]
    fn test_exif_orientation_applied() {
        // White left half, black right half.
        let img = RgbImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let jpeg = encode(img, ImageFormat::Jpeg);

        let upright = normalize(&jpeg).unwrap();
        assert!(pixel(&upright, 45, 2) > 0.8);
        assert!(pixel(&upright, 2, 45) < 0.2);

        // Orientation 6: rotate 90 degrees clockwise, so the white half
        // ends up on top.
        let rotated = normalize(&with_exif_orientation(&jpeg, 6)).unwrap();
        assert!(pixel(&rotated, 2, 45) > 0.8);
        assert!(pixel(&rotated, 45, 2) < 0.2);

        let untouched = normalize(&with_exif_orientation(&jpeg, 1)).unwrap();
        assert_eq!(untouched, upright);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(normalize(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_garbage_input() {
        assert!(matches!(
            normalize(b"definitely not an image"),
            Err(DecodeError::UnknownFormat)
        ));
    }

    #[test]
    fn test_truncated_png() {
        let bytes = encode(gradient(64, 64), ImageFormat::Png);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(
            normalize(truncated),
            Err(DecodeError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(matches!(
            ImageTensor::from_vec(vec![0.0; 10]),
            Err(DecodeError::Shape { expected: 6912, actual: 10 })
        ));
    }
}
