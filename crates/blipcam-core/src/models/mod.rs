//! BLIPCAM 도메인 모델.
//!
//! 모든 엔티티는 메모리 상의 일시적 버퍼이며 영속화하지 않는다
//! (사용자가 요청한 PNG/TXT 내보내기 제외).

pub mod caption;
pub mod event;
pub mod frame;
