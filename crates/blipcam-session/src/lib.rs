//! # blipcam-session
//!
//! 캡처 세션 오케스트레이션.
//! 표시 레이어(GUI/콘솔)가 호출하는 진입점을 제공하고
//! 결과를 `SessionEvent` 브로드캐스트로 전달한다.
//!
//! - [`session`] — `CaptureSession` (세션 상태 소유, 진입점)
//! - [`preview`] — 고정 주기 프레임 폴링 루프
//! - [`dispatcher`] — 단일 슬롯 캡션 디스패처 (용량 1, 진행 중이면 거부)
//! - [`frame_slot`] — 현재 프레임 슬롯
//! - [`activity_log`] — 추가 전용 활동 로그 + 상태 표시줄
//! - [`export`] — 캡처 PNG / 캡션 로그 TXT 저장

pub mod activity_log;
pub mod dispatcher;
pub mod export;
pub mod frame_slot;
pub mod preview;
pub mod session;

pub use dispatcher::DispatchError;
pub use session::{CaptureSession, SessionState};
