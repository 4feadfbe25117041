//! 단일 슬롯 캡션 디스패처.
//!
//! 동시에 최대 1개의 캡션 요청만 진행한다. 진행 중에 들어온 요청은
//! 큐잉하지 않고 즉시 거부한다. 진행 표시(`Busy`)는 작업 시작 전에 켜지고
//! 성공/실패/패닉과 무관하게 정확히 한 번 꺼진다.

use std::sync::Arc;

use blipcam_core::models::caption::CaptionResult;
use blipcam_core::models::event::SessionEvent;
use blipcam_core::models::frame::Frame;
use blipcam_core::ports::captioner::Captioner;
use blipcam_vision::codec;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::activity_log::ActivityLog;

/// 캡션 요청 거부 사유
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// 이미 요청이 진행 중
    #[error("캡션 요청 진행 중")]
    Busy,
    /// 캡션할 프레임 없음 (카메라 미동작 또는 첫 프레임 전)
    #[error("캡션할 프레임 없음")]
    NoFrame,
}

/// 용량 1의 캡션 작업 슬롯
pub struct CaptionDispatcher {
    slot: Arc<Semaphore>,
    captioner: Arc<dyn Captioner>,
    log: Arc<ActivityLog>,
    jpeg_quality: u8,
}

impl CaptionDispatcher {
    pub fn new(captioner: Arc<dyn Captioner>, log: Arc<ActivityLog>, jpeg_quality: u8) -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
            captioner,
            log,
            jpeg_quality,
        }
    }

    /// 요청 진행 중 여부
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }

    /// 프레임 스냅샷으로 캡션 작업 시작.
    ///
    /// 슬롯이 비어 있지 않으면 `DispatchError::Busy`로 즉시 거부한다.
    /// 반환된 핸들은 결과를 기다리고 싶은 호출자용이며, 버려도 작업은 계속된다.
    pub fn try_dispatch(&self, frame: Frame) -> Result<JoinHandle<CaptionResult>, DispatchError> {
        let permit = self
            .slot
            .clone()
            .try_acquire_owned()
            .map_err(|_| DispatchError::Busy)?;

        // 작업 시작 전에 진행 표시
        self.log.emit(SessionEvent::Busy(true));
        self.log.set_status("이미지 처리 중...");

        let guard = BusyGuard {
            permit: Some(permit),
            log: self.log.clone(),
        };
        let captioner = self.captioner.clone();
        let log = self.log.clone();
        let quality = self.jpeg_quality;

        Ok(tokio::spawn(async move {
            let _guard = guard;
            let result = run_caption(frame, captioner, quality).await;

            if result.success {
                log.log(format!("캡션: {}", result.text));
                log.set_status("캡션 수신");
            } else {
                log.log(format!("캡션 실패: {}", result.text));
                log.set_status("캡션 실패");
            }
            log.emit(SessionEvent::CaptionReady(result.clone()));
            result
        }))
    }
}

async fn run_caption(frame: Frame, captioner: Arc<dyn Captioner>, quality: u8) -> CaptionResult {
    let encoded = tokio::task::spawn_blocking(move || codec::encode_jpeg(&frame, quality)).await;

    let image = match encoded {
        Ok(Ok(image)) => image,
        Ok(Err(e)) => {
            warn!("캡션용 인코딩 실패: {e}");
            return CaptionResult::failure(e.to_string(), 0);
        }
        Err(e) => {
            warn!("인코딩 태스크 실패: {e}");
            return CaptionResult::failure(format!("인코딩 태스크 실패: {e}"), 0);
        }
    };

    debug!("캡션 요청: JPEG {} bytes", image.len());
    captioner.caption(&image).await
}

/// 슬롯 반환 후 진행 표시 해제. 태스크가 어떻게 끝나든 Drop에서 한 번만 실행.
struct BusyGuard {
    permit: Option<OwnedSemaphorePermit>,
    log: Arc<ActivityLog>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        // 구독자가 Busy(false)를 본 시점에 새 요청이 받아들여지도록 먼저 반환
        drop(self.permit.take());
        self.log.emit(SessionEvent::Busy(false));
    }
}
