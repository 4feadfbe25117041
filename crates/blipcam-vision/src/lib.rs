//! # blipcam-vision
//!
//! 프레임 소스와 이미지 코덱 어댑터.
//!
//! - [`codec`] — 픽셀 버퍼 → JPEG/PNG 바이트, Base64 변환
//! - [`test_pattern`] — 단색 합성 프레임 소스 (카메라 없는 환경/테스트)
//! - `camera` — nokhwa 웹캠 소스 (`camera` feature)

#[cfg(feature = "camera")]
pub mod camera;
pub mod codec;
pub mod test_pattern;

use blipcam_core::config::CameraConfig;
use blipcam_core::ports::frame_source::FrameSource;

use crate::test_pattern::TestPatternSource;

/// 빌드 구성에 맞는 프레임 소스 생성
///
/// `camera` feature가 켜져 있고 `force_test_pattern`이 false이면 웹캠,
/// 그 외에는 테스트 패턴 소스를 반환한다.
pub fn create_frame_source(config: &CameraConfig, force_test_pattern: bool) -> Box<dyn FrameSource> {
    #[cfg(feature = "camera")]
    {
        if !force_test_pattern {
            return Box::new(camera::NokhwaCamera::new(config.width, config.height));
        }
    }

    #[cfg(not(feature = "camera"))]
    {
        if !force_test_pattern {
            tracing::warn!("camera feature 비활성 — 테스트 패턴 소스 사용");
        }
    }

    Box::new(TestPatternSource::new(config.width, config.height))
}
