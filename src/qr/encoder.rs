//! QR code encoder

use crate::error::{Error, Result};
use crate::qr::{QrEcc, QrPayload};
use image::{DynamicImage, Luma};
use qrcode::QrCode;

/// Pixels per QR module, matching common label printers at 300 dpi
pub const DEFAULT_MODULE_SIZE: u32 = 10;

/// QR code encoder
pub struct QrEncoder {
    /// Error correction level
    ecc_level: QrEcc,
    /// Edge length of one module in pixels
    module_size: u32,
    /// Whether to surround the symbol with the standard 4-module quiet zone
    quiet_zone: bool,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings (Medium ECC)
    pub fn new() -> Self {
        Self {
            ecc_level: QrEcc::M,
            module_size: DEFAULT_MODULE_SIZE,
            quiet_zone: true,
        }
    }

    /// Create a new QR encoder with a specific error correction level
    pub fn with_ecc_level(ecc_level: QrEcc) -> Self {
        Self {
            ecc_level,
            ..Self::new()
        }
    }

    /// Set the module size in pixels (clamped to at least one pixel)
    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.module_size = module_size.max(1);
        self
    }

    /// Enable or disable the quiet zone
    pub fn with_quiet_zone(mut self, quiet_zone: bool) -> Self {
        self.quiet_zone = quiet_zone;
        self
    }

    /// Encode data into a QR code image
    pub fn encode(&self, payload: &QrPayload) -> Result<DynamicImage> {
        let code = QrCode::with_error_correction_level(&payload.data, self.ecc_level.into())
            .map_err(|e| Error::QrEncode(format!("{} byte payload: {}", payload.data.len(), e)))?;

        tracing::debug!(
            version = ?code.version(),
            ecc = %self.ecc_level,
            modules = code.width(),
            "Encoded QR symbol"
        );

        let image = code
            .render::<Luma<u8>>()
            .quiet_zone(self.quiet_zone)
            .module_dimensions(self.module_size, self.module_size)
            .build();

        Ok(DynamicImage::ImageLuma8(image))
    }

    /// Encode a string into a QR code image
    pub fn encode_string(&self, data: &str) -> Result<DynamicImage> {
        let payload = QrPayload::from_string(data.to_string());
        self.encode(&payload)
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}
