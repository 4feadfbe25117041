//! 프레임(카메라 이미지) 및 인코딩 이미지 모델.
//!
//! `Frame`은 픽셀을 `Arc<[u8]>`로 보관하는 불변 값이다.
//! 복제는 O(1) 스냅샷이며, 미리보기 루프는 슬롯의 프레임을 교체할 뿐
//! 기존 버퍼를 수정하지 않는다.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::CoreError;

/// 픽셀 포맷 (채널 순서)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// R, G, B 순서 8비트
    Rgb8,
    /// B, G, R 순서 8비트 (OpenCV/V4L 계열 장치 기본값)
    Bgr8,
    /// R, G, B, A 순서 8비트
    Rgba8,
}

impl PixelFormat {
    /// 픽셀당 바이트 수
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// 디코딩된 비디오 프레임 1장
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Arc<[u8]>,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// 원시 픽셀 버퍼로 프레임 생성
    ///
    /// 버퍼 길이가 `width * height * bpp`와 다르면 `ReadError`.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(CoreError::ReadError(format!(
                "버퍼 크기 불일치: {}x{} {:?} → 기대 {} bytes, 실제 {} bytes",
                width,
                height,
                format,
                expected,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            format,
            data: data.into(),
            captured_at: Utc::now(),
        })
    }

    /// 단색 RGB 프레임 생성
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            data: data.into(),
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// 원시 픽셀 바이트
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// 캡처 시각
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// 픽셀이 없는 프레임인지 여부
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 두 프레임이 같은 픽셀 버퍼를 공유하는지 여부
    pub fn shares_buffer_with(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// 압축 이미지 포맷
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// 캡션 API 전송용
    Jpeg,
    /// 캡처 파일 내보내기용
    Png,
}

impl ImageFormat {
    /// MIME 타입
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    /// 파일 확장자
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

/// Base64 인코딩 (표준 알파벳, 패딩 포함). 임의 바이트열에 대해 실패하지 않는다.
pub fn to_base64(bytes: &[u8]) -> String {
    B64.encode(bytes)
}

/// 압축된 이미지 바이트 (프레임 스냅샷에서 동기적으로 생성)
#[derive(Debug, Clone)]
pub struct EncodedImage {
    format: ImageFormat,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(format: ImageFormat, width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            format,
            width,
            height,
            bytes,
        }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// JSON 전송용 Base64 표현
    pub fn to_base64(&self) -> String {
        to_base64(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_buffer_length() {
        let result = Frame::new(4, 4, PixelFormat::Rgb8, vec![0; 10]);
        assert!(matches!(result, Err(CoreError::ReadError(_))));

        let ok = Frame::new(4, 4, PixelFormat::Rgba8, vec![0; 64]);
        assert!(ok.is_ok());
    }

    #[test]
    fn solid_frame_fills_pixels() {
        let frame = Frame::solid(3, 2, [255, 0, 0]);
        assert_eq!(frame.pixels().len(), 18);
        assert_eq!(&frame.pixels()[0..3], &[255, 0, 0]);
        assert_eq!(&frame.pixels()[15..18], &[255, 0, 0]);
        assert_eq!(frame.format(), PixelFormat::Rgb8);
    }

    #[test]
    fn clone_is_snapshot_of_same_buffer() {
        let frame = Frame::solid(8, 8, [1, 2, 3]);
        let snapshot = frame.clone();
        assert!(snapshot.shares_buffer_with(&frame));

        // 슬롯 교체 후에도 스냅샷은 원래 픽셀 유지
        let replaced = Frame::solid(8, 8, [9, 9, 9]);
        assert!(!snapshot.shares_buffer_with(&replaced));
        assert_eq!(&snapshot.pixels()[0..3], &[1, 2, 3]);
    }

    #[test]
    fn image_format_metadata() {
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Png.extension(), "png");
        let img = EncodedImage::new(ImageFormat::Png, 2, 2, vec![1, 2, 3]);
        assert_eq!(img.len(), 3);
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.mime_type(), "image/png");
        assert_eq!(img.to_base64(), "AQID");
    }
}
