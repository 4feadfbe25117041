//! 애플리케이션 설정 구조체.
//!
//! 카메라 장치/폴링 주기, 캡션 API 엔드포인트/인증, 내보내기 경로 등
//! 런타임 설정을 정의한다. `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::caption::FallbackPolicy;

/// API 토큰 환경 변수 이름 (설정 파일 값보다 우선)
pub const API_TOKEN_ENV: &str = "BLIPCAM_API_TOKEN";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 카메라 설정
    pub camera: CameraConfig,
    /// 캡션 API 설정
    pub caption: CaptionConfig,
    /// 파일 내보내기 설정
    #[serde(default)]
    pub export: ExportConfig,
}

// ============================================================
// 카메라 설정
// ============================================================

/// 카메라 설정 — 장치 인덱스 + 미리보기 폴링 주기
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// 카메라 장치 인덱스 (0 = 기본 장치)
    #[serde(default)]
    pub device_index: u32,
    /// 미리보기 폴링 주기 (밀리초, 33ms ≈ 30fps)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 테스트 패턴 소스 너비
    #[serde(default = "default_frame_width")]
    pub width: u32,
    /// 테스트 패턴 소스 높이
    #[serde(default = "default_frame_height")]
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            poll_interval_ms: default_poll_interval_ms(),
            width: default_frame_width(),
            height: default_frame_height(),
        }
    }
}

// ============================================================
// 캡션 API 설정
// ============================================================

/// 캡션 API 설정
///
/// **보안**: 토큰은 코드에 포함하지 않는다. config.json 또는
/// `BLIPCAM_API_TOKEN` 환경 변수로 주입.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// 추론 엔드포인트 URL
    #[serde(default = "default_caption_endpoint")]
    pub endpoint: String,
    /// Bearer 토큰 (로컬 config.json에 저장 가능)
    #[serde(default)]
    pub api_token: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_caption_timeout_secs")]
    pub timeout_secs: u64,
    /// 전송용 JPEG 품질 (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// 캡션 텍스트에 "Error"가 포함되면 재시도 (기존 동작 호환)
    #[serde(default = "default_true")]
    pub retry_on_error_text: bool,
    /// 빈 캡션을 실패로 보고 재시도 (기본 꺼짐: 빈 캡션은 성공으로 반환)
    #[serde(default)]
    pub retry_on_blank_caption: bool,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_caption_endpoint(),
            api_token: String::new(),
            timeout_secs: default_caption_timeout_secs(),
            jpeg_quality: default_jpeg_quality(),
            retry_on_error_text: true,
            retry_on_blank_caption: false,
        }
    }
}

impl CaptionConfig {
    /// 캡션 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 폴백 재시도 조건
    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy {
            retry_on_error_text: self.retry_on_error_text,
            retry_on_blank_caption: self.retry_on_blank_caption,
        }
    }

    /// 유효 토큰 결정 — 환경 변수 우선, 없으면 설정 파일 값
    pub fn resolve_api_token(&self) -> Option<String> {
        std::env::var(API_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                let token = self.api_token.trim();
                (!token.is_empty()).then(|| token.to_string())
            })
    }
}

// ============================================================
// 내보내기 설정
// ============================================================

/// 내보내기 설정 — 캡처 이미지(PNG)와 캡션 로그(TXT) 저장 위치
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// 저장 디렉토리 (None이면 현재 디렉토리)
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl ExportConfig {
    /// 실제 저장 디렉토리
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            camera: CameraConfig::default(),
            caption: CaptionConfig::default(),
            export: ExportConfig::default(),
        }
    }

    /// 미리보기 폴링 주기를 Duration으로 반환
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.camera.poll_interval_ms)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.camera.poll_interval_ms == 0 {
            return Err(CoreError::Config(
                "camera.poll_interval_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(CoreError::Config(format!(
                "잘못된 프레임 크기: {}x{}",
                self.camera.width, self.camera.height
            )));
        }
        if !(1..=100).contains(&self.caption.jpeg_quality) {
            return Err(CoreError::Config(format!(
                "caption.jpeg_quality 범위 초과 (1-100): {}",
                self.caption.jpeg_quality
            )));
        }
        if !self.caption.endpoint.starts_with("http://")
            && !self.caption.endpoint.starts_with("https://")
        {
            return Err(CoreError::Config(format!(
                "caption.endpoint는 http(s) URL이어야 합니다: {}",
                self.caption.endpoint
            )));
        }
        if self.caption.timeout_secs == 0 {
            return Err(CoreError::Config(
                "caption.timeout_secs는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    33
}
fn default_frame_width() -> u32 {
    640
}
fn default_frame_height() -> u32 {
    480
}
fn default_caption_endpoint() -> String {
    "https://api-inference.huggingface.co/models/Salesforce/blip-image-captioning-base"
        .to_string()
}
fn default_caption_timeout_secs() -> u64 {
    60
}
fn default_jpeg_quality() -> u8 {
    90
}
