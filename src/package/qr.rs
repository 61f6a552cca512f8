use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::models::{PackageModel, PackageStatus};
use crate::shared::AppError;

const MODULE_PIXELS: u32 = 8;
const QUIET_ZONE_MODULES: u32 = 4;

/// JSON document encoded into a package's QR label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPayload {
    pub tracking_code: String,
    pub sender: String,
    pub recipient: String,
    pub status: PackageStatus,
    pub tracking_url: String,
}

impl QrPayload {
    pub fn for_package(package: &PackageModel, tracking_base_url: &str) -> Self {
        Self {
            tracking_code: package.tracking_code.clone(),
            sender: package.sender_name.clone(),
            recipient: package.recipient_name.clone(),
            status: package.status,
            tracking_url: format!(
                "{}/{}",
                tracking_base_url.trim_end_matches('/'),
                package.tracking_code
            ),
        }
    }
}

/// Renders `data` as a black-on-white PNG QR code
pub fn render_qr_png(data: &str) -> Result<Vec<u8>, AppError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::Internal(format!("QR encoding failed: {e}")))?;

    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE_MODULES) * MODULE_PIXELS;

    let image = GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / MODULE_PIXELS) as i64 - QUIET_ZONE_MODULES as i64;
        let my = (y / MODULE_PIXELS) as i64 - QUIET_ZONE_MODULES as i64;
        let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
        let dark = inside && colors[(my as usize) * modules as usize + mx as usize] == Color::Dark;
        Luma([if dark { 0 } else { 255 }])
    });

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(png)
}
