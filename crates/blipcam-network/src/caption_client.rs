//! 캡션 추론 API HTTP 클라이언트.
//!
//! `CaptionTransport` 포트 구현. 요청 1회를 수행하고 결과를
//! `AttemptOutcome`으로 변환한다. 에러 응답도 본문을 끝까지 읽는다.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use blipcam_core::config::CaptionConfig;
use blipcam_core::error::CoreError;
use blipcam_core::models::caption::{AttemptOutcome, CaptionPayload};
use blipcam_core::ports::captioner::CaptionTransport;

use crate::response::extract_generated_text;

/// 에러 메시지에 포함할 응답 본문 최대 길이 (문자)
const MAX_ERROR_BODY_CHARS: usize = 200;

/// 캡션 API HTTP 전송 — `CaptionTransport` 포트 구현
///
/// **보안**: 토큰은 생성 시 외부에서 주입받아 메모리에만 유지한다.
#[derive(Debug)]
pub struct HttpCaptionTransport {
    http_client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl HttpCaptionTransport {
    /// 새 전송 클라이언트 생성
    pub fn new(config: &CaptionConfig, api_token: String) -> Result<Self, CoreError> {
        if api_token.trim().is_empty() {
            return Err(CoreError::Config(format!(
                "캡션 API 토큰 미설정. config.json의 caption.api_token 또는 {} 환경 변수를 설정하세요.",
                blipcam_core::config::API_TOKEN_ENV
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        debug!(
            endpoint = %config.endpoint,
            timeout = config.timeout_secs,
            "HttpCaptionTransport 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_token,
        })
    }

    /// 상태 코드 + 본문 → 시도 결과
    ///
    /// 상태와 무관하게 `generated_text`가 있으면 캡션으로 취급한다.
    fn interpret(status: StatusCode, body: &str) -> AttemptOutcome {
        if let Some(text) = extract_generated_text(body) {
            return AttemptOutcome::Caption(text);
        }

        if status.is_success() {
            AttemptOutcome::NoCaption
        } else {
            AttemptOutcome::Failed(format!(
                "캡션 API 오류 ({}): {}",
                status,
                body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>()
            ))
        }
    }
}

#[async_trait]
impl CaptionTransport for HttpCaptionTransport {
    async fn send(&self, payload: &CaptionPayload) -> AttemptOutcome {
        let request_body = serde_json::json!({ "inputs": payload.inputs });

        debug!(
            endpoint = %self.endpoint,
            encoding = ?payload.encoding,
            payload_size = payload.inputs.len(),
            "캡션 API 호출"
        );

        let response = match self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("캡션 API 호출 실패: {e}");
                return AttemptOutcome::Failed(format!("캡션 API 호출 실패: {e}"));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = %status, "캡션 API 응답 읽기 실패: {e}");
                return AttemptOutcome::Failed(format!("캡션 API 응답 읽기 실패: {e}"));
            }
        };

        if !status.is_success() {
            warn!(status = %status, "캡션 API 오류 응답");
        }

        let outcome = Self::interpret(status, &body);
        debug!(status = %status, outcome = ?outcome, "캡션 API 응답 수신");
        outcome
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config_for(endpoint: String) -> CaptionConfig {
        CaptionConfig {
            endpoint,
            timeout_secs: 5,
            ..CaptionConfig::default()
        }
    }

    #[test]
    fn empty_token_is_config_error() {
        let result = HttpCaptionTransport::new(&CaptionConfig::default(), "  ".to_string());
        let err = result.unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.to_string().contains("미설정"));
    }

    #[test]
    fn interpret_rules() {
        assert_eq!(
            HttpCaptionTransport::interpret(StatusCode::OK, r#"{"generated_text":"a cat"}"#),
            AttemptOutcome::Caption("a cat".to_string())
        );
        assert_eq!(
            HttpCaptionTransport::interpret(StatusCode::OK, r#"{"foo":"bar"}"#),
            AttemptOutcome::NoCaption
        );
        assert_eq!(
            HttpCaptionTransport::interpret(StatusCode::OK, r#"{"generated_text":""}"#),
            AttemptOutcome::Caption(String::new())
        );

        let failed = HttpCaptionTransport::interpret(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error":"model loading"}"#,
        );
        match failed {
            AttemptOutcome::Failed(msg) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("model loading"));
            }
            other => panic!("Failed 기대, 실제: {other:?}"),
        }
    }

    #[test]
    fn interpret_truncates_long_error_body() {
        let body = "x".repeat(1_000);
        match HttpCaptionTransport::interpret(StatusCode::BAD_GATEWAY, &body) {
            AttemptOutcome::Failed(msg) => assert!(msg.len() < 300),
            other => panic!("Failed 기대, 실제: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sends_bearer_and_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/blip")
            .match_header("authorization", "Bearer hf_test")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "inputs": "data:image/jpeg;base64,QUJD"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"generated_text":"a red square"}]"#)
            .create_async()
            .await;

        let transport = HttpCaptionTransport::new(
            &config_for(format!("{}/models/blip", server.url())),
            "hf_test".to_string(),
        )
        .unwrap();

        let outcome = transport
            .send(&CaptionPayload::data_uri("QUJD", "image/jpeg"))
            .await;
        assert_eq!(outcome, AttemptOutcome::Caption("a red square".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_body_is_read() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/blip")
            .with_status(503)
            .with_body(r#"{"error":"model loading","estimated_time":20.0}"#)
            .create_async()
            .await;

        let transport = HttpCaptionTransport::new(
            &config_for(format!("{}/models/blip", server.url())),
            "hf_test".to_string(),
        )
        .unwrap();

        let outcome = transport.send(&CaptionPayload::raw_base64("QUJD")).await;
        assert!(matches!(&outcome, AttemptOutcome::Failed(msg) if msg.contains("model loading")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connection_failure_becomes_failed_outcome() {
        // 바인딩되지 않은 포트 → 연결 거부
        let transport = HttpCaptionTransport::new(
            &config_for("http://127.0.0.1:9/models/blip".to_string()),
            "hf_test".to_string(),
        )
        .unwrap();

        let outcome = transport.send(&CaptionPayload::raw_base64("QUJD")).await;
        assert!(matches!(outcome, AttemptOutcome::Failed(_)));
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9/models/blip");
    }
}
