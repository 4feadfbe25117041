//! 테스트 패턴 프레임 소스.
//!
//! 카메라 없이 단색 프레임을 생성한다. `camera` feature 비활성 빌드와
//! 테스트에서 사용하며, 읽기 실패/지연/장치 불가 상황을 재현할 수 있다.

use std::thread;
use std::time::Duration;

use blipcam_core::error::CoreError;
use blipcam_core::models::frame::{Frame, PixelFormat};
use blipcam_core::ports::frame_source::FrameSource;
use tracing::{debug, info};

/// 단색 합성 프레임 소스
#[derive(Debug)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    color: [u8; 3],
    format: PixelFormat,
    opened: bool,
    unavailable: bool,
    failures_remaining: u32,
    read_delay: Option<Duration>,
    reads: u64,
}

impl TestPatternSource {
    /// 회색 프레임을 생성하는 소스
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: [128, 128, 128],
            format: PixelFormat::Rgb8,
            opened: false,
            unavailable: false,
            failures_remaining: 0,
            read_delay: None,
            reads: 0,
        }
    }

    /// 프레임 색상 (RGB 기준)
    pub fn with_color(mut self, rgb: [u8; 3]) -> Self {
        self.color = rgb;
        self
    }

    /// 출력 픽셀 포맷 (Rgb8 / Bgr8 / Rgba8)
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// `open`이 항상 `DeviceUnavailable`로 실패
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// 다음 `n`회 읽기를 `ReadError`로 실패
    pub fn fail_next_reads(mut self, n: u32) -> Self {
        self.failures_remaining = n;
        self
    }

    /// 매 읽기마다 지연 (느린 장치 재현)
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// 누적 읽기 시도 횟수
    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn render(&self) -> Result<Frame, CoreError> {
        let [r, g, b] = self.color;
        let px: &[u8] = match self.format {
            PixelFormat::Rgb8 => &[r, g, b],
            PixelFormat::Bgr8 => &[b, g, r],
            PixelFormat::Rgba8 => &[r, g, b, 255],
        };
        let count = self.width as usize * self.height as usize;
        Frame::new(self.width, self.height, self.format, px.repeat(count))
    }
}

impl FrameSource for TestPatternSource {
    fn open(&mut self, device_index: u32) -> Result<(), CoreError> {
        if self.unavailable {
            return Err(CoreError::DeviceUnavailable(format!(
                "테스트 패턴 장치 {device_index} 사용 불가"
            )));
        }
        self.opened = true;
        info!(
            "테스트 패턴 소스 열림: {}x{} {:?}",
            self.width, self.height, self.format
        );
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CoreError> {
        if !self.opened {
            return Err(CoreError::NotOpen);
        }
        self.reads += 1;

        if let Some(delay) = self.read_delay {
            thread::sleep(delay);
        }

        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err(CoreError::ReadError(format!(
                "테스트 패턴 읽기 실패 (#{})",
                self.reads
            )));
        }

        self.render()
    }

    fn close(&mut self) {
        if self.opened {
            self.opened = false;
            debug!("테스트 패턴 소스 닫힘 (읽기 {}회)", self.reads);
        }
    }

    fn is_open(&self) -> bool {
        self.opened
    }

    fn name(&self) -> &str {
        "test-pattern"
    }
}
