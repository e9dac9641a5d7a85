//! Label generation: QR and Code128 artifacts for an order

use crate::artifact::{self, Artifact, ArtifactKind};
use crate::barcode::{BarcodeDecoder, BarcodeEncoder, Code128Payload};
use crate::config::LabelConfig;
use crate::error::{Error, Result};
use crate::order::OrderLabel;
use crate::qr::{QrDecoder, QrEncoder};
use image::DynamicImage;
use std::path::Path;
use tracing::info;

/// Which artifacts a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    /// Produce the QR PNG
    pub qr: bool,
    /// Produce the barcode PNG
    pub barcode: bool,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            qr: true,
            barcode: true,
        }
    }
}

/// Artifacts written for one order
#[derive(Debug, Clone)]
pub struct LabelSet {
    /// The order the artifacts belong to
    pub order: OrderLabel,
    /// QR artifact, when requested
    pub qr: Option<Artifact>,
    /// Barcode artifact, when requested
    pub barcode: Option<Artifact>,
}

impl LabelSet {
    /// Artifacts in generation order
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.qr.iter().chain(self.barcode.iter())
    }
}

/// Writes QR and barcode images according to a [`LabelConfig`]
pub struct LabelGenerator {
    config: LabelConfig,
    order: OrderLabel,
    qr_encoder: QrEncoder,
    barcode_encoder: BarcodeEncoder,
}

impl LabelGenerator {
    /// Validate the configuration and build encoders from it
    pub fn new(config: LabelConfig) -> Result<Self> {
        config.validate()?;
        let order = config.order.label()?;
        let qr_encoder = config.qr.encoder();
        let barcode_encoder = config.barcode.encoder()?;

        Ok(Self {
            config,
            order,
            qr_encoder,
            barcode_encoder,
        })
    }

    /// Configured order
    pub fn order(&self) -> &OrderLabel {
        &self.order
    }

    /// Active configuration
    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    /// Encode `url` as a QR code and write it to the configured QR path.
    pub async fn generate_qr(&self, url: &str) -> Result<Artifact> {
        let path = self.config.output.qr_path(&self.order);
        self.write_qr(url, &path).await
    }

    /// Encode `payload` as Code128 and write it to the configured barcode
    /// base path with `.png` appended.
    pub async fn generate_barcode(&self, payload: &str) -> Result<Artifact> {
        let base = self.config.output.barcode_base(&self.order);
        self.write_barcode(payload, &base).await
    }

    /// Produce both artifacts for the configured order.
    pub async fn generate(&self) -> Result<LabelSet> {
        self.generate_order(&self.order, Targets::default()).await
    }

    /// Produce the requested artifacts for `order`, QR first.
    pub async fn generate_order(&self, order: &OrderLabel, targets: Targets) -> Result<LabelSet> {
        let qr = if targets.qr {
            let url = self.config.order.qr_url(order)?;
            let path = self.config.output.qr_path(order);
            Some(self.write_qr(&url, &path).await?)
        } else {
            None
        };

        let barcode = if targets.barcode {
            let base = self.config.output.barcode_base(order);
            Some(self.write_barcode(&order.barcode_payload(), &base).await?)
        } else {
            None
        };

        Ok(LabelSet {
            order: order.clone(),
            qr,
            barcode,
        })
    }

    /// Encode `url` and write the QR PNG to exactly `path`.
    pub async fn write_qr(&self, url: &str, path: &Path) -> Result<Artifact> {
        let image = self.qr_encoder.encode_string(url)?;
        let artifact = write_image(ArtifactKind::Qr, &image, url, path).await?;

        info!(path = %artifact.path.display(), bytes = artifact.byte_length, "Wrote QR code");
        Ok(artifact)
    }

    /// Encode `payload` and write the barcode PNG to `base` plus `.png`.
    pub async fn write_barcode(&self, payload: &str, base: &Path) -> Result<Artifact> {
        let validated = Code128Payload::new(payload)?;
        let image = self.barcode_encoder.encode(&validated)?;
        let path = artifact::with_png_extension(base);
        let artifact = write_image(ArtifactKind::Barcode, &image, payload, &path).await?;

        info!(path = %artifact.path.display(), bytes = artifact.byte_length, "Wrote barcode");
        Ok(artifact)
    }

    /// Read an artifact back from disk and check it decodes to its payload.
    pub async fn verify(&self, artifact: &Artifact) -> Result<String> {
        let image = artifact::load_image(&artifact.path).await?;

        let found = match artifact.kind {
            ArtifactKind::Qr => {
                let decoded = QrDecoder::new().decode(&image)?;
                decoded
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::QrDecode("payload is not valid UTF-8".to_string()))?
            }
            ArtifactKind::Barcode => BarcodeDecoder::new().decode(&image)?,
        };

        if found != artifact.payload {
            return Err(Error::PayloadMismatch {
                expected: artifact.payload.clone(),
                found,
            });
        }

        tracing::debug!(kind = %artifact.kind, path = %artifact.path.display(), "Artifact verified");
        Ok(found)
    }
}

async fn write_image(
    kind: ArtifactKind,
    image: &DynamicImage,
    payload: &str,
    path: &Path,
) -> Result<Artifact> {
    let png = artifact::png_bytes(image)?;
    artifact::write_atomic(path, &png).await?;

    Ok(Artifact {
        kind,
        path: path.to_path_buf(),
        payload: payload.to_string(),
        width: image.width(),
        height: image.height(),
        byte_length: png.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn generator_in(dir: &Path) -> LabelGenerator {
        let mut config = LabelConfig::default();
        config.output.dir = dir.to_path_buf();
        LabelGenerator::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_generate_writes_default_files() {
        let dir = TempDir::new().unwrap();
        let generator = generator_in(dir.path());

        let set = generator.generate().await.unwrap();

        let qr = set.qr.as_ref().unwrap();
        let barcode = set.barcode.as_ref().unwrap();
        assert_eq!(qr.path, dir.path().join("qr.png"));
        assert_eq!(barcode.path, dir.path().join("barcode.png"));
        assert_eq!(
            qr.payload,
            "https://www.thednalabstore.com/order/ORD-2025-001"
        );
        assert_eq!(barcode.payload, "ORD-2025-001|TS-001");
        assert_eq!(set.artifacts().count(), 2);

        assert_eq!(generator.verify(qr).await.unwrap(), qr.payload);
        assert_eq!(generator.verify(barcode).await.unwrap(), barcode.payload);
    }

    #[tokio::test]
    async fn test_generate_order_selected_targets() {
        let dir = TempDir::new().unwrap();
        let generator = generator_in(dir.path());
        let order = OrderLabel::new("ORD-7", "SKU-7").unwrap();

        let set = generator
            .generate_order(
                &order,
                Targets {
                    qr: false,
                    barcode: true,
                },
            )
            .await
            .unwrap();

        assert!(set.qr.is_none());
        assert_eq!(set.barcode.unwrap().payload, "ORD-7|SKU-7");
        assert!(!dir.path().join("qr.png").exists());
    }

    #[tokio::test]
    async fn test_unencodable_barcode_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let generator = generator_in(dir.path());

        let result = generator.generate_barcode("ORD-2025-001|TS-001\u{e9}").await;

        assert!(matches!(result, Err(Error::UnsupportedCharacter { .. })));
        assert!(!dir.path().join("barcode.png").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_qr_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let generator = generator_in(dir.path());

        let url = format!("https://example.com/{}", "a".repeat(8000));
        let result = generator.generate_qr(&url).await;

        assert!(matches!(result, Err(Error::QrEncode(_))));
        assert!(!dir.path().join("qr.png").exists());
    }

    #[tokio::test]
    async fn test_verify_detects_mismatch() {
        let dir = TempDir::new().unwrap();
        let generator = generator_in(dir.path());

        let mut artifact = generator.generate_barcode("ORD-1|A").await.unwrap();
        artifact.payload = "ORD-1|B".to_string();

        assert!(matches!(
            generator.verify(&artifact).await,
            Err(Error::PayloadMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = LabelConfig::default();
        config.order.order_id = " ".to_string();
        assert!(LabelGenerator::new(config).is_err());
    }
}
