//! QR code rendering for the pairing flow.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{ImageFormat, Luma};
use qrcode::render::unicode::Dense1x2;
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use wagate_core::error::GatewayError;

/// Prefix of every QR image data URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

const MODULE_PX: u32 = 8;

fn encode(qr_data: &str, level: EcLevel) -> Result<QrCode, GatewayError> {
    QrCode::with_error_correction_level(qr_data.as_bytes(), level)
        .map_err(|e| GatewayError::Client(format!("QR generation failed: {e}")))
}

/// Render a QR payload for the log, two module rows per text line.
pub fn generate_qr_terminal(qr_data: &str) -> Result<String, GatewayError> {
    let code = encode(qr_data, EcLevel::L)?;
    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .build())
}

/// Render a QR payload as PNG bytes, 8px per module with a 4-module margin.
pub fn generate_qr_image(qr_data: &str) -> Result<Vec<u8>, GatewayError> {
    let code = encode(qr_data, EcLevel::M)?;
    let img = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PX, MODULE_PX)
        .quiet_zone(true)
        .build();

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)
        .map_err(|e| GatewayError::Client(format!("PNG encoding failed: {e}")))?;
    Ok(png.into_inner())
}

/// Render a QR payload as a `data:image/png;base64,...` URL for browsers.
pub fn qr_data_url(qr_data: &str) -> Result<String, GatewayError> {
    let png = generate_qr_image(qr_data)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", BASE64.encode(png)))
}
