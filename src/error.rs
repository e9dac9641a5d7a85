//! Error types for label generation

use thiserror::Error;

/// Result type alias using labelgen's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for label generation
#[derive(Error, Debug)]
pub enum Error {
    /// QR code encoding failed (payload too long for any QR version)
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in image
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// Code128 encoding failed
    #[error("Failed to encode barcode: {0}")]
    BarcodeEncode(String),

    /// Code128 decoding failed
    #[error("Failed to decode barcode: {0}")]
    BarcodeDecode(String),

    /// No Code128 symbol found on the scanline
    #[error("No barcode found in image")]
    NoBarcodeFound,

    /// Payload contains a character outside ASCII, which Code128 cannot represent
    #[error("Unsupported barcode character {ch:?} at position {position}")]
    UnsupportedCharacter {
        /// Offending character
        ch: char,
        /// Character index within the payload
        position: usize,
    },

    /// Order identifier or SKU rejected
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// A written artifact decoded to something other than what was encoded
    #[error("Payload mismatch: expected {expected:?}, found {found:?}")]
    PayloadMismatch {
        /// Payload that was encoded
        expected: String,
        /// Payload read back from the image
        found: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}
