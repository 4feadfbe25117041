//! 활동 로그 + 상태 표시줄.
//!
//! 모든 실패는 여기로 모인다: 로그에 한 줄 추가, 상태 한 줄 갱신,
//! 구독자에게 `SessionEvent` 브로드캐스트.

use blipcam_core::models::event::SessionEvent;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::info;

/// 이벤트 채널 용량 (미리보기 이벤트 포함)
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// 초기 상태 문자열
pub const READY_STATUS: &str = "준비";

/// 추가 전용 활동 로그
pub struct ActivityLog {
    lines: RwLock<Vec<String>>,
    status: RwLock<String>,
    events: broadcast::Sender<SessionEvent>,
}

impl ActivityLog {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            lines: RwLock::new(Vec::new()),
            status: RwLock::new(READY_STATUS.to_string()),
            events,
        }
    }

    /// 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// 로그 한 줄 추가
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.lines.write().push(message.clone());
        self.emit(SessionEvent::Log(message));
    }

    /// 상태 표시줄 갱신
    pub fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        *self.status.write() = status.clone();
        self.emit(SessionEvent::Status(status));
    }

    /// 이벤트 전송 (구독자가 없으면 버림)
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// 누적 로그 전체 (줄마다 개행)
    pub fn text(&self) -> String {
        self.lines
            .read()
            .iter()
            .map(|line| format!("{line}\n"))
            .collect()
    }

    pub fn status(&self) -> String {
        self.status.read().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }

    /// 로그 비우기 (상태는 유지)
    pub fn clear(&self) {
        self.lines.write().clear();
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}
