//! 캡션 포트.
//!
//! 구현: `blipcam-network` crate (reqwest 기반 HTTP 전송 + 폴백 정책)

use async_trait::async_trait;

use crate::models::caption::{AttemptOutcome, CaptionPayload, CaptionResult};
use crate::models::frame::EncodedImage;

/// 캡션 엔드포인트에 대한 HTTP 요청 1회
///
/// 전송/프로토콜 에러는 `AttemptOutcome::Failed`로 변환되며
/// 절대 에러로 전파하지 않는다.
#[async_trait]
pub trait CaptionTransport: Send + Sync {
    /// 페이로드 1회 전송 후 결과 반환
    async fn send(&self, payload: &CaptionPayload) -> AttemptOutcome;

    /// 엔드포인트 URL (로그용)
    fn endpoint(&self) -> &str;
}

/// 인코딩된 이미지 → 캡션 결과 (재시도 정책 포함)
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, image: &EncodedImage) -> CaptionResult;
}
