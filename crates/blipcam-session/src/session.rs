//! 캡처 세션 — 표시 레이어의 진입점.
//!
//! 카메라 활성 여부, 캡션 진행 여부, 현재 프레임, 활동 로그를
//! 하나의 세션 객체가 소유한다. 모든 진입점은 에러를 로그/상태로
//! 보고한 뒤 호출자에게도 반환한다.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use blipcam_core::config::AppConfig;
use blipcam_core::error::CoreError;
use blipcam_core::models::caption::CaptionResult;
use blipcam_core::models::event::SessionEvent;
use blipcam_core::models::frame::{EncodedImage, Frame};
use blipcam_core::ports::captioner::Captioner;
use blipcam_core::ports::frame_source::FrameSource;
use blipcam_vision::codec;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::activity_log::ActivityLog;
use crate::dispatcher::{CaptionDispatcher, DispatchError};
use crate::export::Exporter;
use crate::frame_slot::FrameSlot;
use crate::preview::{PreviewHandle, SharedSource};

/// 세션 상태 스냅샷 (표시 레이어용)
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub camera_active: bool,
    pub caption_in_flight: bool,
    pub has_frame: bool,
    pub status: String,
    pub log_lines: usize,
}

pub struct CaptureSession {
    device_index: u32,
    poll_interval: Duration,
    camera_active: AtomicBool,
    source: SharedSource,
    frames: FrameSlot,
    log: Arc<ActivityLog>,
    dispatcher: CaptionDispatcher,
    exporter: Exporter,
    preview: tokio::sync::Mutex<Option<PreviewHandle>>,
}

impl CaptureSession {
    pub fn new(
        config: &AppConfig,
        source: Box<dyn FrameSource>,
        captioner: Arc<dyn Captioner>,
    ) -> Self {
        let log = Arc::new(ActivityLog::new());
        let dispatcher =
            CaptionDispatcher::new(captioner, log.clone(), config.caption.jpeg_quality);

        Self {
            device_index: config.camera.device_index,
            poll_interval: config.poll_interval(),
            camera_active: AtomicBool::new(false),
            source: Arc::new(Mutex::new(source)),
            frames: FrameSlot::new(),
            log,
            dispatcher,
            exporter: Exporter::new(config.export.resolved_directory()),
            preview: tokio::sync::Mutex::new(None),
        }
    }

    /// 세션 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.log.subscribe()
    }

    /// 카메라 열고 미리보기 루프 시작. 이미 동작 중이면 아무것도 하지 않는다.
    pub async fn start_preview(&self) -> Result<(), CoreError> {
        let mut preview = self.preview.lock().await;
        if preview.is_some() {
            debug!("미리보기 이미 동작 중");
            return Ok(());
        }

        let source = self.source.clone();
        let index = self.device_index;
        let opened = tokio::task::spawn_blocking(move || {
            let mut source = source.lock();
            source.open(index).map(|_| source.name().to_string())
        })
        .await
        .map_err(|e| CoreError::Internal(format!("카메라 열기 태스크 실패: {e}")))?;

        match opened {
            Ok(name) => {
                self.camera_active.store(true, Ordering::SeqCst);
                *preview = Some(PreviewHandle::spawn(
                    self.source.clone(),
                    self.frames.clone(),
                    self.log.clone(),
                    self.poll_interval,
                ));
                self.log.log(format!("카메라 시작 ({name}, 장치 {index})"));
                self.log.set_status("카메라 동작 중");
                Ok(())
            }
            Err(e) => {
                warn!("카메라 시작 실패: {e}");
                self.log.log(format!("카메라 시작 실패: {e}"));
                self.log.set_status("카메라 시작 실패");
                Err(e)
            }
        }
    }

    /// 미리보기 루프 종료 후 장치 해제. 동작 중이 아니면 아무것도 하지 않는다.
    pub async fn stop_preview(&self) {
        let Some(handle) = self.preview.lock().await.take() else {
            debug!("미리보기 동작 중 아님");
            return;
        };

        self.camera_active.store(false, Ordering::SeqCst);
        let frames = handle.stop().await;

        let source = self.source.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || source.lock().close()).await {
            warn!("카메라 해제 태스크 실패: {e}");
        }

        self.frames.clear();
        self.log.log(format!("카메라 정지 (프레임 {frames}개 수신)"));
        self.log.set_status("카메라 정지");
        self.log.emit(SessionEvent::CameraStopped);
    }

    /// 현재 프레임을 PNG로 인코딩해 내보내기 디렉토리에 저장
    pub async fn capture_still(&self) -> Result<EncodedImage, CoreError> {
        let result = self.capture_still_inner().await;
        if let Err(e) = &result {
            self.log.log(format!("캡처 실패: {e}"));
            self.log.set_status("캡처 실패");
        }
        result
    }

    async fn capture_still_inner(&self) -> Result<EncodedImage, CoreError> {
        if !self.camera_active.load(Ordering::SeqCst) {
            return Err(CoreError::NotOpen);
        }

        let frame = match self.frames.snapshot() {
            Some(frame) => frame,
            None => self.read_fresh_frame().await?,
        };

        let image = tokio::task::spawn_blocking(move || codec::encode_png(&frame))
            .await
            .map_err(|e| CoreError::Internal(format!("PNG 인코딩 태스크 실패: {e}")))??;

        let path = self.exporter.save_capture(&image)?;
        self.log.log(format!("캡처 저장: {}", path.display()));
        self.log.set_status("캡처 저장됨");
        Ok(image)
    }

    async fn read_fresh_frame(&self) -> Result<Frame, CoreError> {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || source.lock().read_frame())
            .await
            .map_err(|e| CoreError::Internal(format!("프레임 읽기 태스크 실패: {e}")))?
    }

    /// 현재 프레임 스냅샷으로 캡션 요청.
    ///
    /// 카메라 미동작/프레임 없음이면 `NoFrame`, 진행 중이면 `Busy`로 거부한다.
    pub fn request_caption(&self) -> Result<JoinHandle<CaptionResult>, DispatchError> {
        if !self.camera_active.load(Ordering::SeqCst) {
            self.log.log("카메라가 동작 중이 아님 — 캡션 요청 무시");
            return Err(DispatchError::NoFrame);
        }

        let Some(frame) = self.frames.snapshot() else {
            self.log.log("아직 프레임 없음 — 캡션 요청 무시");
            return Err(DispatchError::NoFrame);
        };

        self.dispatcher.try_dispatch(frame).inspect_err(|e| {
            debug!("캡션 요청 거부: {e}");
        })
    }

    /// 누적 로그를 `caption_<ms>.txt`로 저장. 로그가 비어 있으면 `None`.
    pub fn save_log(&self) -> Result<Option<PathBuf>, CoreError> {
        if self.log.is_empty() {
            self.log.log("저장할 캡션 로그 없음");
            return Ok(None);
        }

        match self.exporter.save_log(&self.log.text()) {
            Ok(path) => {
                self.log.set_status(format!("로그 저장: {}", path.display()));
                info!("캡션 로그 저장: {}", path.display());
                Ok(Some(path))
            }
            Err(e) => {
                self.log.log(format!("로그 저장 실패: {e}"));
                self.log.set_status("로그 저장 실패");
                Err(e)
            }
        }
    }

    pub fn clear_log(&self) {
        self.log.clear();
        self.log.set_status("로그 비움");
    }

    pub fn status(&self) -> SessionState {
        SessionState {
            camera_active: self.camera_active.load(Ordering::SeqCst),
            caption_in_flight: self.dispatcher.is_busy(),
            has_frame: !self.frames.is_empty(),
            status: self.log.status(),
            log_lines: self.log.len(),
        }
    }

    /// 장치가 실제로 열려 있는지 (진행 중인 읽기가 끝날 때까지 대기)
    pub fn is_device_open(&self) -> bool {
        self.source.lock().is_open()
    }

    pub fn log_text(&self) -> String {
        self.log.text()
    }

    /// 종료 처리: 미리보기 정지 + 장치 해제
    pub async fn shutdown(&self) {
        self.stop_preview().await;
        info!("세션 종료");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blipcam_core::config::ExportConfig;
    use blipcam_vision::test_pattern::TestPatternSource;
    use tempfile::TempDir;

    struct FixedCaptioner(&'static str);

    #[async_trait]
    impl Captioner for FixedCaptioner {
        async fn caption(&self, _image: &EncodedImage) -> CaptionResult {
            CaptionResult::success(self.0, 1)
        }
    }

    fn config(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default_config();
        config.camera.poll_interval_ms = 5;
        config.export = ExportConfig {
            directory: Some(dir.path().to_path_buf()),
        };
        config
    }

    fn session(dir: &TempDir, source: TestPatternSource) -> CaptureSession {
        CaptureSession::new(
            &config(dir),
            Box::new(source),
            Arc::new(FixedCaptioner("a gray square")),
        )
    }

    async fn wait_for_frame(session: &CaptureSession) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !session.status().has_frame {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("프레임 대기 시간 초과");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn caption_without_camera_is_rejected() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, TestPatternSource::new(8, 8));

        let err = session.request_caption().unwrap_err();
        assert_eq!(err, DispatchError::NoFrame);
        assert!(!session.status().caption_in_flight);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn start_failure_reported_in_status() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, TestPatternSource::new(8, 8).unavailable());

        let err = session.start_preview().await.unwrap_err();
        assert!(matches!(err, CoreError::DeviceUnavailable(_)));

        let state = session.status();
        assert!(!state.camera_active);
        assert_eq!(state.status, "카메라 시작 실패");
        assert!(session.log_text().contains("카메라 시작 실패"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn preview_caption_and_stop() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, TestPatternSource::new(32, 24));

        session.start_preview().await.unwrap();
        // 중복 시작은 무시
        session.start_preview().await.unwrap();
        wait_for_frame(&session).await;

        let result = session.request_caption().unwrap().await.unwrap();
        assert!(result.success);
        assert_eq!(result.text, "a gray square");
        assert!(session.log_text().contains("캡션: a gray square"));

        session.stop_preview().await;
        let state = session.status();
        assert!(!state.camera_active);
        assert!(!state.has_frame);
        assert!(!session.is_device_open());

        // 정지 후 재요청은 거부
        assert_eq!(session.request_caption().unwrap_err(), DispatchError::NoFrame);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn capture_still_writes_png() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, TestPatternSource::new(16, 12).with_color([255, 0, 0]));

        assert!(matches!(
            session.capture_still().await.unwrap_err(),
            CoreError::NotOpen
        ));

        session.start_preview().await.unwrap();
        wait_for_frame(&session).await;

        let image = session.capture_still().await.unwrap();
        assert_eq!(image.dimensions(), (16, 12));

        let written: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.starts_with("capture_") && name.ends_with(".png"))
            .collect();
        assert_eq!(written.len(), 1);

        let decoded = image::load_from_memory(image.bytes()).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0]);

        session.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn save_and_clear_log() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, TestPatternSource::new(8, 8));

        session.start_preview().await.unwrap();
        session.stop_preview().await;

        let path = session.save_log().unwrap().unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("카메라 시작"));
        assert!(saved.ends_with('\n'));

        session.clear_log();
        assert_eq!(session.status().log_lines, 0);
        assert!(session.save_log().unwrap().is_none());
    }
}
