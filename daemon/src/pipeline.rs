/// Per-screenshot processing: decode → normalize → recognize → deliver.
///
/// One call to [`Pipeline::process`] handles one create-event completely,
/// including both sink calls, before returning. The watch loop awaits it
/// before looking at the next event, so at most one clipboard write is ever
/// in flight.
use std::path::Path;

use image::{DynamicImage, ImageError, ImageReader};
use tracing::{debug, info};

use crate::error::DaemonError;
use crate::normalize::SizeNormalizer;
use crate::recognize::{OcrEngine, RecognitionAdapter};
use crate::sink::{ClipboardSink, NotificationSink};

/// Result of handling one event that did not fail.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Text was placed on the clipboard and announced.
    Copied(String),
    /// OCR found nothing; no sink was called.
    NoText,
    /// The created entry is not a regular file.
    Skipped,
}

pub struct Pipeline<E, C, N> {
    normalizer: SizeNormalizer,
    recognizer: RecognitionAdapter<E>,
    clipboard: C,
    notifier: N,
}

impl<E, C, N> Pipeline<E, C, N>
where
    E: OcrEngine,
    C: ClipboardSink + Sync,
    N: NotificationSink + Sync,
{
    pub fn new(
        normalizer: SizeNormalizer,
        recognizer: RecognitionAdapter<E>,
        clipboard: C,
        notifier: N,
    ) -> Self {
        Self {
            normalizer,
            recognizer,
            clipboard,
            notifier,
        }
    }

    pub async fn process(&self, path: &Path) -> Result<Outcome, DaemonError> {
        if !path.is_file() {
            debug!("Ignoring non-file entry {}", path.display());
            return Ok(Outcome::Skipped);
        }

        let owned = path.to_path_buf();
        let normalizer = self.normalizer;
        let img = tokio::task::spawn_blocking(move || prepare(&owned, &normalizer)).await??;

        let text = self.recognizer.recognize(img).await?;
        if text.is_empty() {
            debug!("No text detected in {}", path.display());
            return Ok(Outcome::NoText);
        }

        self.clipboard.set(&text).await?;
        self.notifier.notify(&copied_message(&text)).await?;
        info!("Copied {} chars from {}", text.chars().count(), path.display());
        Ok(Outcome::Copied(text))
    }
}

/// Message shown after a successful copy.
pub fn copied_message(text: &str) -> String {
    format!("Copied '{text}' to clipboard.")
}

/// Decodes the file (format sniffed from its content) and applies size
/// normalization.
fn prepare(path: &Path, normalizer: &SizeNormalizer) -> Result<DynamicImage, DaemonError> {
    let decode_err = |source| DaemonError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let img = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| decode_err(ImageError::IoError(e)))?
        .decode()
        .map_err(decode_err)?;

    let (w, h) = (img.width(), img.height());
    let img = normalizer.normalize(img);
    if (w, h) != (img.width(), img.height()) {
        debug!("Rescaled {w}x{h} → {}x{}", img.width(), img.height());
    }
    Ok(img)
}
