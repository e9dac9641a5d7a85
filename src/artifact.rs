//! Image artifacts and how they reach the filesystem

use crate::error::{Error, Result};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Which symbology an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// QR code PNG
    Qr,
    /// Code128 barcode PNG
    Barcode,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qr => f.write_str("qr"),
            Self::Barcode => f.write_str("barcode"),
        }
    }
}

/// An image file written for one payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Symbology
    pub kind: ArtifactKind,
    /// Where the file was written
    pub path: PathBuf,
    /// Payload encoded in the image
    pub payload: String,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Size of the PNG file in bytes
    pub byte_length: usize,
}

/// Serialize an image to PNG in memory.
pub fn png_bytes(image: &DynamicImage) -> Result<Bytes> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(Bytes::from(buf))
}

/// Append `.png` to a base path unless it already carries that extension.
pub fn with_png_extension(base: &Path) -> PathBuf {
    let has_png = base
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));

    if has_png {
        base.to_path_buf()
    } else {
        let mut name = base.as_os_str().to_os_string();
        name.push(".png");
        PathBuf::from(name)
    }
}

/// Write `bytes` to `path` through a temp file in the same directory and a
/// rename, so `path` either keeps its old content or holds the full new file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create directory {}: {e}", dir.display()),
        ))
    })?;

    let file_name = path.file_name().ok_or_else(|| {
        Error::Other(format!("Artifact path '{}' has no file name", path.display()))
    })?;
    let tmp = dir.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        Uuid::new_v4().simple()
    ));

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write {}: {e}", tmp.display()),
        )));
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to move artifact into place at {}: {e}", path.display()),
        )));
    }

    Ok(())
}

/// Read an artifact image back from disk.
pub async fn load_image(path: &Path) -> Result<DynamicImage> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {e}", path.display()),
        ))
    })?;
    Ok(image::load_from_memory(&data)?)
}
