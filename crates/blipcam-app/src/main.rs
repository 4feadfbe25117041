//! # blipcam-app
//!
//! BLIPCAM 바이너리 진입점.
//! 설정 로드, 어댑터 생성(DI 와이어링), 콘솔 표시 레이어 실행.

mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use blipcam_core::config::{AppConfig, API_TOKEN_ENV};
use blipcam_core::config_manager::ConfigManager;
use blipcam_network::caption_client::HttpCaptionTransport;
use blipcam_network::fallback::FallbackCaptioner;
use blipcam_session::CaptureSession;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// BLIPCAM — 웹캠 캡처 + 이미지 캡션
#[derive(Parser, Debug)]
#[command(name = "blipcam")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 카메라 장치 인덱스
    #[arg(long, short = 'd')]
    device: Option<u32>,

    /// 캡션 API 엔드포인트 URL
    #[arg(long, short = 'e')]
    endpoint: Option<String>,

    /// 캡처/로그 내보내기 디렉토리
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 미리보기 폴링 간격 (밀리초)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// 카메라 대신 테스트 패턴 사용
    #[arg(long)]
    test_pattern: bool,
}

impl Args {
    /// CLI 인자로 설정 오버라이드 (파일에는 저장하지 않음)
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(device) = self.device {
            config.camera.device_index = device;
        }
        if let Some(ref endpoint) = self.endpoint {
            config.caption.endpoint = endpoint.clone();
        }
        if let Some(ref dir) = self.export_dir {
            config.export.directory = Some(dir.clone());
        }
        if let Some(interval) = self.interval_ms {
            config.camera.poll_interval_ms = interval;
        }
    }
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let manager = match args.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    info!("설정 파일: {}", manager.config_path().display());

    let mut config = manager.get();
    args.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow!("설정 검증 실패: {e}"))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "blipcam={},blipcam_app={},blipcam_core={},blipcam_vision={},blipcam_network={},blipcam_session={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("BLIPCAM 시작 (v{})", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;

    let token = config.caption.resolve_api_token().ok_or_else(|| {
        anyhow!("캡션 API 토큰 미설정 — 설정 파일의 caption.api_token 또는 {API_TOKEN_ENV} 환경변수 필요")
    })?;

    // ── 어댑터 생성 (DI 와이어링) ──
    let transport = Arc::new(
        HttpCaptionTransport::new(&config.caption, token)
            .map_err(|e| anyhow!("캡션 클라이언트 생성 실패: {e}"))?,
    );
    let captioner = Arc::new(FallbackCaptioner::new(
        transport,
        config.caption.fallback_policy(),
    ));
    let source = blipcam_vision::create_frame_source(&config.camera, args.test_pattern);

    info!(
        "캡션 엔드포인트: {}, 카메라 장치 {}, 폴링 {}ms",
        config.caption.endpoint, config.camera.device_index, config.camera.poll_interval_ms
    );

    let session = Arc::new(CaptureSession::new(&config, source, captioner));
    console::run(session).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = Args::parse_from([
            "blipcam",
            "--device",
            "2",
            "--endpoint",
            "http://localhost:9000/caption",
            "--interval-ms",
            "50",
            "--export-dir",
            "/tmp/blipcam",
        ]);
        let mut config = AppConfig::default_config();
        args.apply_overrides(&mut config);

        assert_eq!(config.camera.device_index, 2);
        assert_eq!(config.caption.endpoint, "http://localhost:9000/caption");
        assert_eq!(config.camera.poll_interval_ms, 50);
        assert_eq!(
            config.export.resolved_directory(),
            PathBuf::from("/tmp/blipcam")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_leave_config_untouched() {
        let args = Args::parse_from(["blipcam", "--test-pattern"]);
        assert!(args.test_pattern);

        let mut config = AppConfig::default_config();
        args.apply_overrides(&mut config);
        let defaults = AppConfig::default_config();
        assert_eq!(config.camera.device_index, defaults.camera.device_index);
        assert_eq!(config.caption.endpoint, defaults.caption.endpoint);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let args = Args::parse_from(["blipcam", "--interval-ms", "0"]);
        let mut config = AppConfig::default_config();
        args.apply_overrides(&mut config);
        assert!(config.validate().is_err());
    }
}
