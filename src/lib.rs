//! labelgen - order label generator
//!
//! Produces the two images an order label needs: a QR code carrying the
//! order URL and a Code128 barcode carrying `<order-id>|<sku>`.
//!
//! # Features
//!
//! - **QR**: encoded with `qrcode`, verified with `rqrr`
//! - **Code128**: encoded and drawn with `barcoders`, verified in-crate
//! - **Atomic output**: files are renamed into place, never left half-written
//! - **Layered configuration**: toml/yaml file, `LABELGEN_*` environment, CLI flags
//!
//! # Example
//!
//! ```no_run
//! use labelgen::{LabelConfig, LabelGenerator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let generator = LabelGenerator::new(LabelConfig::default())?;
//!
//!     // Writes qr.png and barcode.png in the current directory
//!     let labels = generator.generate().await?;
//!
//!     for artifact in labels.artifacts() {
//!         println!("{} -> {}", artifact.payload, artifact.path.display());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod artifact;
pub mod barcode;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod order;
pub mod output;
pub mod qr;

// Re-exports for convenience
pub use error::{Error, Result};

pub use artifact::{Artifact, ArtifactKind};
pub use barcode::{BarcodeDecoder, BarcodeEncoder, Code128Payload};
pub use config::{
    BarcodeOptions, LabelConfig, LogRotation, LoggingOptions, OrderOptions, OutputOptions,
    QrOptions,
};
pub use generator::{LabelGenerator, LabelSet, Targets};
pub use order::OrderLabel;
pub use qr::{QrDecoder, QrEcc, QrEncoder, QrPayload};
