//! 내보내기 — 캡처 PNG, 캡션 로그 TXT.
//!
//! 파일명은 저장 시각(epoch 밀리초)으로 만든다:
//! `capture_<ms>.png`, `caption_<ms>.txt`.

use std::path::PathBuf;

use blipcam_core::error::CoreError;
use blipcam_core::models::frame::EncodedImage;
use chrono::Utc;
use tracing::debug;

pub struct Exporter {
    directory: PathBuf,
}

impl Exporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// 인코딩된 캡처 저장 → `capture_<ms>.<ext>`
    pub fn save_capture(&self, image: &EncodedImage) -> Result<PathBuf, CoreError> {
        let name = format!(
            "capture_{}.{}",
            Utc::now().timestamp_millis(),
            image.format().extension()
        );
        self.write(&name, image.bytes())
    }

    /// 로그 텍스트 저장 → `caption_<ms>.txt`
    pub fn save_log(&self, text: &str) -> Result<PathBuf, CoreError> {
        let name = format!("caption_{}.txt", Utc::now().timestamp_millis());
        self.write(&name, text.as_bytes())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, CoreError> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(name);
        std::fs::write(&path, bytes)?;
        debug!("파일 저장: {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
