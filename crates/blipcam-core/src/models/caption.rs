//! 캡션 요청/결과 모델.
//!
//! HTTP 1회 시도의 결과(`AttemptOutcome`)와 재시도 정책을 거친 최종 결과
//! (`CaptionResult`)를 구분한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 사용 가능한 캡션이 없을 때의 센티넬 문자열
pub const NO_CAPTION_SENTINEL: &str = "No caption generated";

/// `retry_on_error_text` 활성 시 재시도를 유발하는 부분 문자열
pub const ERROR_TEXT_MARKER: &str = "Error";

/// 요청 본문 `inputs` 필드의 이미지 표현 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadEncoding {
    /// `data:image/jpeg;base64,<b64>` (1차 시도)
    DataUri,
    /// 접두사 없는 Base64 (폴백 시도)
    RawBase64,
}

/// 캡션 API 요청 페이로드 — `{"inputs": <inputs>}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionPayload {
    pub encoding: PayloadEncoding,
    pub inputs: String,
}

impl CaptionPayload {
    /// data URI 페이로드 생성
    pub fn data_uri(base64: &str, mime_type: &str) -> Self {
        Self {
            encoding: PayloadEncoding::DataUri,
            inputs: format!("data:{mime_type};base64,{base64}"),
        }
    }

    /// 접두사 없는 Base64 페이로드 생성
    pub fn raw_base64(base64: &str) -> Self {
        Self {
            encoding: PayloadEncoding::RawBase64,
            inputs: base64.to_string(),
        }
    }
}

/// 폴백 재시도 조건
///
/// 기본값은 기존 동작과 동일하다: 캡션 없음, 전송/HTTP 실패, 센티넬과 같은 캡션,
/// "Error"를 포함한 캡션은 재시도하고 빈 캡션은 그대로 반환한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// 캡션 텍스트에 "Error"가 포함되면 재시도
    pub retry_on_error_text: bool,
    /// 빈(공백뿐인) 캡션도 재시도
    pub retry_on_blank_caption: bool,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            retry_on_error_text: true,
            retry_on_blank_caption: false,
        }
    }
}

/// HTTP 캡션 요청 1회의 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// `generated_text` 추출 성공
    Caption(String),
    /// 2xx 응답이지만 캡션 필드 없음
    NoCaption,
    /// 전송 실패 또는 캡션 없는 오류 응답 (메시지에 상태/본문 포함)
    Failed(String),
}

impl AttemptOutcome {
    /// 접두사 없는 페이로드로 재시도해야 하는지 판단
    pub fn needs_fallback(&self, policy: FallbackPolicy) -> bool {
        match self {
            AttemptOutcome::Caption(text) => {
                text == NO_CAPTION_SENTINEL
                    || (policy.retry_on_error_text && text.contains(ERROR_TEXT_MARKER))
                    || (policy.retry_on_blank_caption && text.trim().is_empty())
            }
            AttemptOutcome::NoCaption | AttemptOutcome::Failed(_) => true,
        }
    }

    /// 표시용 텍스트 (NoCaption은 센티넬)
    pub fn text(&self) -> &str {
        match self {
            AttemptOutcome::Caption(text) | AttemptOutcome::Failed(text) => text,
            AttemptOutcome::NoCaption => NO_CAPTION_SENTINEL,
        }
    }

    /// 최종 결과로 변환
    pub fn into_result(self, attempts: u8) -> CaptionResult {
        match self {
            AttemptOutcome::Caption(text) => CaptionResult::success(text, attempts),
            AttemptOutcome::NoCaption => {
                CaptionResult::failure(CoreError::NoCaptionProduced.to_string(), attempts)
            }
            AttemptOutcome::Failed(message) => CaptionResult::failure(message, attempts),
        }
    }
}

/// 캡션 요청 최종 결과 — 표시 레이어로 전달 후 보관하지 않음
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionResult {
    /// 캡션 생성 성공 여부
    pub success: bool,
    /// 캡션 텍스트 또는 에러 메시지
    pub text: String,
    /// 사용한 HTTP 시도 횟수 (0 = 인코딩 단계에서 중단)
    pub attempts: u8,
    /// 완료 시각
    pub completed_at: DateTime<Utc>,
}

impl CaptionResult {
    pub fn success(text: impl Into<String>, attempts: u8) -> Self {
        Self {
            success: true,
            text: text.into(),
            attempts,
            completed_at: Utc::now(),
        }
    }

    pub fn failure(message: impl Into<String>, attempts: u8) -> Self {
        Self {
            success: false,
            text: message.into(),
            attempts,
            completed_at: Utc::now(),
        }
    }

    /// 센티넬(캡션 없음) 결과인지 여부
    pub fn is_no_caption(&self) -> bool {
        !self.success && self.text == NO_CAPTION_SENTINEL
    }
}
