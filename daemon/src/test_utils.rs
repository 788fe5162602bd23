//! Fakes shared by the pipeline, watcher and controller tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{Rgb, RgbImage};

use crate::error::{RecognitionError, SinkError};
use crate::recognize::OcrEngine;
use crate::sink::{ClipboardSink, NotificationSink};

/// Ordered record of every call made against the fakes.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries starting with `prefix`, prefix stripped.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

/// OCR engine answering from a queue. Journals `ocr:<w>x<h>` for the image it
/// received, so tests can see what normalization produced.
pub struct FakeEngine {
    replies: Mutex<VecDeque<Result<String, String>>>,
    journal: Journal,
    delay: Duration,
}

impl FakeEngine {
    pub fn new(journal: &Journal, replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            journal: journal.clone(),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(journal: &Journal, msg: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(msg.to_string())])),
            journal: journal.clone(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl OcrEngine for FakeEngine {
    fn text(&self, png: &[u8]) -> Result<String, RecognitionError> {
        let img = image::load_from_memory(png).map_err(RecognitionError::Encode)?;
        self.journal.push(format!("ocr:{}x{}", img.width(), img.height()));
        std::thread::sleep(self.delay);
        let reply = self.replies.lock().unwrap().pop_front();
        self.journal.push("ocr:done");
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(RecognitionError::Engine(msg)),
            None => Ok(String::new()),
        }
    }
}

fn fake_failure() -> SinkError {
    SinkError::Timeout {
        program: "fake".into(),
        after: Duration::from_secs(1),
    }
}

#[derive(Clone)]
pub struct RecordingClipboard {
    journal: Journal,
    fail: bool,
}

impl RecordingClipboard {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: false,
        }
    }

    pub fn failing(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: true,
        }
    }
}

impl ClipboardSink for RecordingClipboard {
    async fn set(&self, text: &str) -> Result<(), SinkError> {
        if self.fail {
            return Err(fake_failure());
        }
        self.journal.push(format!("clipboard:{text}"));
        Ok(())
    }
}

#[derive(Clone)]
pub struct RecordingNotifier {
    journal: Journal,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: false,
        }
    }

    pub fn failing(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: true,
        }
    }
}

impl NotificationSink for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), SinkError> {
        if self.fail {
            return Err(fake_failure());
        }
        self.journal.push(format!("notify:{message}"));
        Ok(())
    }
}

/// Writes a `width`×`height` PNG into `dir` and returns its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
        .save(&path)
        .unwrap();
    path
}

/// Polls `cond` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
