//! 프레임 소스 포트.
//!
//! 구현: `blipcam-vision` crate (nokhwa 웹캠, 테스트 패턴)

use crate::error::CoreError;
use crate::models::frame::Frame;

/// 카메라 장치 핸들 — opened / closed 두 상태만 가진다.
///
/// 모든 메서드는 블로킹이며, 호출자는 `spawn_blocking`에서 호출한다.
/// 폴링 주기는 세션 레이어가 결정한다.
pub trait FrameSource: Send {
    /// 장치 열기. 실패 시 `DeviceUnavailable`.
    fn open(&mut self, device_index: u32) -> Result<(), CoreError>;

    /// 가장 최근 프레임 읽기.
    ///
    /// 닫힌 상태에서는 `NotOpen`, 단일 읽기 실패는 `ReadError`.
    fn read_frame(&mut self) -> Result<Frame, CoreError>;

    /// 장치 해제. 이미 닫혀 있으면 아무것도 하지 않는다.
    fn close(&mut self);

    /// 장치가 열려 있는지 여부
    fn is_open(&self) -> bool;

    /// 소스 이름 (로그용)
    fn name(&self) -> &str;
}
