//! 현재 프레임 슬롯.
//!
//! 슬롯에는 항상 최대 1개의 프레임만 존재한다. 미리보기 루프는 프레임을
//! 통째로 교체하고, 캡션 요청은 `snapshot()`으로 불변 복제본을 가져간다.

use std::sync::Arc;

use blipcam_core::models::frame::Frame;
use parking_lot::RwLock;

#[derive(Clone, Default)]
pub struct FrameSlot {
    current: Arc<RwLock<Option<Frame>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 프레임 교체
    pub fn store(&self, frame: Frame) {
        *self.current.write() = Some(frame);
    }

    /// 현재 프레임 스냅샷 (픽셀 버퍼 공유, 불변)
    pub fn snapshot(&self) -> Option<Frame> {
        self.current.read().clone()
    }

    pub fn clear(&self) {
        *self.current.write() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_none()
    }
}
