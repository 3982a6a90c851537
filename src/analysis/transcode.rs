use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::ImageConfig;
use crate::types::{AppError, AppResult};

// Clients are not consistent about padding
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// JPEG ready to hand to the vision model.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub base64: String,
    pub media_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub original_bytes: usize,
    pub encoded_bytes: usize,
}

/// Decode a base64 upload. Accepts a `data:` URL prefix and line-wrapped input.
pub fn decode_payload(payload: &str) -> AppResult<Vec<u8>> {
    let body = match payload.trim_start().strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| AppError::Image("data URL without payload".to_string()))?,
        None => payload,
    };

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = LENIENT.decode(compact.as_bytes())?;
    if bytes.is_empty() {
        return Err(AppError::Image("empty image payload".to_string()));
    }
    Ok(bytes)
}

/// Fit the image inside a `max_dimension` square (never enlarging) and
/// re-encode it as JPEG at the configured quality.
pub fn transcode(raw: &[u8], config: &ImageConfig) -> AppResult<PreparedImage> {
    let decoded = image::load_from_memory(raw)?;

    let bound = config.max_dimension.max(1);
    let resized = if decoded.width() > bound || decoded.height() > bound {
        decoded.resize(bound, bound, FilterType::Lanczos3)
    } else {
        decoded
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, config.jpeg_quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;

    Ok(PreparedImage {
        base64: STANDARD.encode(&encoded),
        media_type: JPEG_MEDIA_TYPE,
        width: rgb.width(),
        height: rgb.height(),
        original_bytes: raw.len(),
        encoded_bytes: encoded.len(),
    })
}

/// Decode and transcode on the blocking pool so large uploads do not stall
/// the runtime's worker threads.
pub async fn prepare_image(payload: String, config: ImageConfig) -> AppResult<PreparedImage> {
    tokio::task::spawn_blocking(move || {
        let raw = decode_payload(&payload)?;
        transcode(&raw, &config)
    })
    .await
    .map_err(|e| AppError::Internal(format!("image task panicked: {}", e)))?
}
