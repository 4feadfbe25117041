//! 미리보기 폴링 루프.
//!
//! 고정 주기(기본 33ms)로 프레임 소스를 읽어 현재 프레임 슬롯을 교체한다.
//! 읽기는 블로킹이므로 `spawn_blocking`에서 수행한다.
//! 단일 틱 실패(`ReadError`)는 스킵, `NotOpen`이면 루프 종료.

use std::sync::Arc;
use std::time::Duration;

use blipcam_core::error::CoreError;
use blipcam_core::models::event::SessionEvent;
use blipcam_core::ports::frame_source::FrameSource;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::activity_log::ActivityLog;
use crate::frame_slot::FrameSlot;

/// 세션과 미리보기 루프가 공유하는 프레임 소스
pub type SharedSource = Arc<Mutex<Box<dyn FrameSource>>>;

/// 실행 중인 미리보기 루프 핸들
pub struct PreviewHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl PreviewHandle {
    /// 미리보기 루프 시작
    pub fn spawn(
        source: SharedSource,
        slot: FrameSlot,
        log: Arc<ActivityLog>,
        interval: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_preview_loop(source, slot, log, interval, shutdown_rx));
        Self { shutdown_tx, task }
    }

    /// 종료 신호 후 루프 종료까지 대기. 수신한 프레임 수 반환.
    ///
    /// 진행 중인 읽기가 있으면 그 읽기가 끝난 뒤 반환된다.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown_tx.send(true);
        match self.task.await {
            Ok(frames) => frames,
            Err(e) => {
                warn!("미리보기 태스크 비정상 종료: {e}");
                0
            }
        }
    }
}

async fn run_preview_loop(
    source: SharedSource,
    slot: FrameSlot,
    log: Arc<ActivityLog>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut sequence: u64 = 0;
    let mut skipped: u64 = 0;

    info!("미리보기 루프 시작 (주기 {:?})", interval);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        if *shutdown_rx.borrow() {
            break;
        }

        let reader = source.clone();
        let read = tokio::task::spawn_blocking(move || reader.lock().read_frame()).await;

        match read {
            Ok(Ok(frame)) => {
                sequence += 1;
                let (width, height) = (frame.width(), frame.height());
                slot.store(frame);
                if sequence == 1 {
                    debug!("첫 프레임 수신: {width}x{height}");
                }
                log.emit(SessionEvent::Preview {
                    sequence,
                    width,
                    height,
                });
            }
            Ok(Err(CoreError::NotOpen)) => {
                debug!("프레임 소스 닫힘 — 미리보기 루프 종료");
                break;
            }
            Ok(Err(e)) => {
                skipped += 1;
                if e.is_transient() {
                    debug!("프레임 스킵: {e}");
                } else {
                    warn!("프레임 읽기 에러: {e}");
                }
            }
            Err(e) => {
                warn!("프레임 읽기 태스크 실패: {e}");
            }
        }
    }

    info!("미리보기 루프 종료 (수신 {sequence}, 스킵 {skipped})");
    sequence
}
