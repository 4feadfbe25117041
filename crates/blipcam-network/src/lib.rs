//! # blipcam-network
//!
//! 이미지 캡션 추론 API 어댑터.
//! 인코딩된 이미지를 `{"inputs": ...}` JSON으로 전송하고
//! 응답의 `generated_text` 필드를 추출한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use blipcam_network::caption_client::HttpCaptionTransport;
//! use blipcam_network::fallback::FallbackCaptioner;
//!
//! let transport = HttpCaptionTransport::new(&config.caption, token)?;
//! let captioner = FallbackCaptioner::new(Arc::new(transport), true);
//! let result = captioner.caption(&jpeg).await;
//! ```

pub mod caption_client;
pub mod fallback;
pub mod response;
