//! 이미지 코덱 어댑터.
//!
//! 원시 프레임 → RGB 변환 → JPEG(전송용) / PNG(내보내기용) 인코딩,
//! JSON 전송을 위한 Base64 변환.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use blipcam_core::error::CoreError;
use blipcam_core::models::frame::{EncodedImage, Frame, ImageFormat, PixelFormat};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

/// 프레임을 RGB 이미지로 변환 (BGR/RGBA 채널 정규화)
pub fn to_rgb_image(frame: &Frame) -> Result<RgbImage, CoreError> {
    if frame.is_empty() || frame.width() == 0 || frame.height() == 0 {
        return Err(CoreError::EncodeError(format!(
            "빈 프레임: {}x{}",
            frame.width(),
            frame.height()
        )));
    }

    let pixels = frame.pixels();
    let rgb = match frame.format() {
        PixelFormat::Rgb8 => pixels.to_vec(),
        PixelFormat::Bgr8 => pixels
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
        PixelFormat::Rgba8 => pixels
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
    };

    RgbImage::from_raw(frame.width(), frame.height(), rgb).ok_or_else(|| {
        CoreError::EncodeError(format!(
            "RGB 버퍼 생성 실패: {}x{}",
            frame.width(),
            frame.height()
        ))
    })
}

/// 전송용 JPEG 인코딩. 품질은 1-100으로 보정된다.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<EncodedImage, CoreError> {
    let rgb = to_rgb_image(frame)?;
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| CoreError::EncodeError(format!("JPEG 인코딩 실패: {e}")))?;
    Ok(finish(ImageFormat::Jpeg, &rgb, bytes))
}

/// 내보내기용 PNG 인코딩 (무손실)
pub fn encode_png(frame: &Frame) -> Result<EncodedImage, CoreError> {
    let rgb = to_rgb_image(frame)?;
    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| CoreError::EncodeError(format!("PNG 인코딩 실패: {e}")))?;
    Ok(finish(ImageFormat::Png, &rgb, bytes))
}

fn finish(format: ImageFormat, rgb: &RgbImage, bytes: Vec<u8>) -> EncodedImage {
    debug!(
        "{:?} 인코딩: {}x{} → {} bytes",
        format,
        rgb.width(),
        rgb.height(),
        bytes.len()
    );
    EncodedImage::new(format, rgb.width(), rgb.height(), bytes)
}

/// Base64 인코딩 (표준 알파벳, 패딩 포함)
pub use blipcam_core::models::frame::to_base64;

/// Base64 디코딩
pub fn from_base64(text: &str) -> Result<Vec<u8>, CoreError> {
    B64.decode(text)
        .map_err(|e| CoreError::EncodeError(format!("Base64 디코딩 실패: {e}")))
}
