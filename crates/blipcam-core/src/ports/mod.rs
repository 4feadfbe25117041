//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 각 어댑터 crate가 이 trait들을 구현하며,
//! `blipcam-app`에서 `Arc<dyn T>` / `Box<dyn T>`로 와이어링한다.

pub mod captioner;
pub mod frame_source;
