/// Text recognition behind a single `recognize(image) -> text` call.
///
/// The image is encoded to PNG and handed to an [`OcrEngine`] on a blocking
/// thread. Every call re-runs recognition; nothing is cached.
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::RecognitionError;

/// A blocking OCR capability fed with PNG bytes.
pub trait OcrEngine: Send + Sync + 'static {
    fn text(&self, png: &[u8]) -> Result<String, RecognitionError>;
}

/// Tesseract via the system `libtesseract`.
///
/// A fresh engine handle is created per call so no native state crosses
/// threads.
pub struct Tesseract {
    language: String,
}

impl Tesseract {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    fn run(&self, png: &[u8]) -> Result<String, tesseract::TesseractError> {
        let mut tess = tesseract::Tesseract::new(None, Some(self.language.as_str()))?
            .set_image_from_mem(png)?
            .recognize()?;
        Ok(tess.get_text()?)
    }
}

impl OcrEngine for Tesseract {
    fn text(&self, png: &[u8]) -> Result<String, RecognitionError> {
        self.run(png).map_err(|e| RecognitionError::Engine(e.to_string()))
    }
}

pub struct RecognitionAdapter<E> {
    engine: Arc<E>,
    deadline: Duration,
}

impl<E: OcrEngine> RecognitionAdapter<E> {
    pub fn new(engine: E, deadline: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            deadline,
        }
    }

    /// Recognizes the text in `img`, trimmed of surrounding whitespace.
    ///
    /// An empty string means no text was found. If the engine does not answer
    /// within the deadline, [`RecognitionError::Timeout`] is returned; the
    /// blocking thread itself cannot be interrupted and is left to finish.
    pub async fn recognize(&self, img: DynamicImage) -> Result<String, RecognitionError> {
        let engine = Arc::clone(&self.engine);
        let task = tokio::task::spawn_blocking(move || {
            let png = encode_png(&img)?;
            debug!("Running OCR on {} byte PNG", png.len());
            engine.text(&png)
        });

        let text = match tokio::time::timeout(self.deadline, task).await {
            Ok(joined) => joined??,
            Err(_) => return Err(RecognitionError::Timeout(self.deadline)),
        };
        Ok(text.trim().to_string())
    }
}

/// Lossless transport encoding. Floating-point buffers have no PNG
/// representation and are converted to 8-bit RGBA first.
fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, RecognitionError> {
    let mut buf = Cursor::new(Vec::new());
    match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, ImageFormat::Png)?
        }
        _ => img.write_to(&mut buf, ImageFormat::Png)?,
    }
    Ok(buf.into_inner())
}
