//! 캡션 폴백 정책.
//!
//! 1차: data URI 페이로드. 캡션이 없거나 실패하면([`FallbackPolicy`]에 따라
//! "Error" 포함 캡션이나 빈 캡션도) 접두사 없는 Base64로 정확히 1회 재시도하고,
//! 재시도 결과를 그대로 반환한다.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use blipcam_core::models::caption::{CaptionPayload, CaptionResult, FallbackPolicy};
use blipcam_core::models::frame::EncodedImage;
use blipcam_core::ports::captioner::{CaptionTransport, Captioner};

/// 1회 폴백 재시도를 수행하는 `Captioner` 구현
pub struct FallbackCaptioner {
    transport: Arc<dyn CaptionTransport>,
    policy: FallbackPolicy,
}

impl FallbackCaptioner {
    pub fn new(transport: Arc<dyn CaptionTransport>, policy: FallbackPolicy) -> Self {
        Self { transport, policy }
    }
}

#[async_trait]
impl Captioner for FallbackCaptioner {
    async fn caption(&self, image: &EncodedImage) -> CaptionResult {
        let base64 = image.to_base64();
        debug!(
            endpoint = self.transport.endpoint(),
            image_size = image.len(),
            base64_len = base64.len(),
            "캡션 요청 시작"
        );

        let first = self
            .transport
            .send(&CaptionPayload::data_uri(&base64, image.mime_type()))
            .await;

        if !first.needs_fallback(self.policy) {
            return first.into_result(1);
        }

        info!(first = first.text(), "data URI 요청 실패 — 접두사 없이 재시도");

        let second = self
            .transport
            .send(&CaptionPayload::raw_base64(&base64))
            .await;
        second.into_result(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blipcam_core::models::caption::{AttemptOutcome, PayloadEncoding, NO_CAPTION_SENTINEL};
    use blipcam_core::models::frame::ImageFormat;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// 미리 정한 결과를 순서대로 반환하고 요청을 기록하는 전송
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<AttemptOutcome>>,
        sent: Mutex<Vec<CaptionPayload>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<AttemptOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<CaptionPayload> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl CaptionTransport for ScriptedTransport {
        async fn send(&self, payload: &CaptionPayload) -> AttemptOutcome {
            self.sent.lock().push(payload.clone());
            self.outcomes
                .lock()
                .pop_front()
                .unwrap_or(AttemptOutcome::Failed("스크립트 소진".to_string()))
        }

        fn endpoint(&self) -> &str {
            "scripted://caption"
        }
    }

    const NO_ERROR_TEXT_RETRY: FallbackPolicy = FallbackPolicy {
        retry_on_error_text: false,
        retry_on_blank_caption: false,
    };

    fn jpeg() -> EncodedImage {
        EncodedImage::new(ImageFormat::Jpeg, 2, 2, vec![0xFF, 0xD8, 0xFF, 0xD9])
    }

    #[tokio::test]
    async fn first_attempt_success_makes_one_call() {
        let transport = ScriptedTransport::new(vec![AttemptOutcome::Caption("a cat".into())]);
        let captioner = FallbackCaptioner::new(transport.clone(), FallbackPolicy::default());

        let result = captioner.caption(&jpeg()).await;
        assert!(result.success);
        assert_eq!(result.text, "a cat");
        assert_eq!(result.attempts, 1);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].encoding, PayloadEncoding::DataUri);
        assert_eq!(sent[0].inputs, "data:image/jpeg;base64,/9j/2Q==");
    }

    #[tokio::test]
    async fn sentinel_triggers_exactly_one_prefix_free_retry() {
        let transport = ScriptedTransport::new(vec![
            AttemptOutcome::NoCaption,
            AttemptOutcome::NoCaption,
        ]);
        let captioner = FallbackCaptioner::new(transport.clone(), FallbackPolicy::default());

        let result = captioner.caption(&jpeg()).await;
        // 재시도도 실패하면 그 결과를 그대로 반환
        assert!(!result.success);
        assert_eq!(result.text, NO_CAPTION_SENTINEL);
        assert_eq!(result.attempts, 2);

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].encoding, PayloadEncoding::RawBase64);
        assert_eq!(sent[1].inputs, "/9j/2Q==");
    }

    #[tokio::test]
    async fn retry_result_is_returned_on_recovery() {
        let transport = ScriptedTransport::new(vec![
            AttemptOutcome::Failed("캡션 API 호출 실패: timeout".into()),
            AttemptOutcome::Caption("a dog on a couch".into()),
        ]);
        let captioner = FallbackCaptioner::new(transport.clone(), FallbackPolicy::default());

        let result = captioner.caption(&jpeg()).await;
        assert!(result.success);
        assert_eq!(result.text, "a dog on a couch");
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn error_text_in_caption_retries_only_in_parity_mode() {
        let caption = AttemptOutcome::Caption("a screen showing Error 404".into());

        let parity = ScriptedTransport::new(vec![
            caption.clone(),
            AttemptOutcome::Caption("a computer screen".into()),
        ]);
        let result = FallbackCaptioner::new(parity.clone(), FallbackPolicy::default())
            .caption(&jpeg())
            .await;
        assert_eq!(parity.sent().len(), 2);
        assert_eq!(result.text, "a computer screen");

        let corrected = ScriptedTransport::new(vec![caption]);
        let result = FallbackCaptioner::new(corrected.clone(), NO_ERROR_TEXT_RETRY)
            .caption(&jpeg())
            .await;
        assert_eq!(corrected.sent().len(), 1);
        assert_eq!(result.text, "a screen showing Error 404");
    }

    #[tokio::test]
    async fn blank_caption_is_returned_without_retry_by_default() {
        let transport = ScriptedTransport::new(vec![
            AttemptOutcome::Caption(String::new()),
            AttemptOutcome::Caption("unused".into()),
        ]);
        let captioner = FallbackCaptioner::new(transport.clone(), FallbackPolicy::default());

        let result = captioner.caption(&jpeg()).await;
        assert!(result.success);
        assert_eq!(result.text, "");
        assert_eq!(result.attempts, 1);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn blank_caption_retries_when_enabled() {
        let transport = ScriptedTransport::new(vec![
            AttemptOutcome::Caption(String::new()),
            AttemptOutcome::Caption("a red square".into()),
        ]);
        let policy = FallbackPolicy {
            retry_on_blank_caption: true,
            ..FallbackPolicy::default()
        };
        let captioner = FallbackCaptioner::new(transport.clone(), policy);

        let result = captioner.caption(&jpeg()).await;
        assert!(result.success);
        assert_eq!(result.text, "a red square");
        assert_eq!(result.attempts, 2);

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].encoding, PayloadEncoding::RawBase64);
    }
}
