//! labelgen runtime configuration handling

use crate::barcode::BarcodeEncoder;
use crate::error::{Error, Result};
use crate::order::{DEFAULT_ORDER_ID, DEFAULT_SKU, DEFAULT_URL_TEMPLATE, OrderLabel};
use crate::qr::{QrEcc, QrEncoder};
use rusttype::Font;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Which order to label
    pub order: OrderOptions,
    /// Where artifacts are written
    pub output: OutputOptions,
    /// QR rendering options
    pub qr: QrOptions,
    /// Barcode rendering options
    pub barcode: BarcodeOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl LabelConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No labelgen.toml / labelgen.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["labelgen.toml", "labelgen.yaml", "labelgen.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("labelgen");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply `LABELGEN_*` overrides resolved through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.order.apply_overrides(&lookup);
        self.output.apply_overrides(&lookup);
        self.qr.apply_overrides(&lookup);
        self.barcode.apply_overrides(&lookup);
        self.logging.apply_overrides(&lookup);
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        self.order.label()?;
        if self.order.url.is_none() && !self.order.url_template.contains("{order_id}") {
            return Err(Error::Config(format!(
                "url_template '{}' must contain {{order_id}}",
                self.order.url_template
            )));
        }
        check_range("qr.module_px", self.qr.module_px, 1, MAX_MODULE_PX)?;
        check_range("barcode.module_px", self.barcode.module_px, 1, MAX_MODULE_PX)?;
        check_range("barcode.height_px", self.barcode.height_px, 1, MAX_HEIGHT_PX)?;
        check_range(
            "barcode.quiet_zone_modules",
            self.barcode.quiet_zone_modules,
            0,
            MAX_QUIET_ZONE_MODULES,
        )?;
        let size = self.barcode.font_size_px;
        if !(size > 0.0 && size <= MAX_FONT_SIZE_PX) {
            return Err(Error::Config(format!(
                "barcode.font_size_px must be in (0, {MAX_FONT_SIZE_PX}], got {size}"
            )));
        }
        Ok(())
    }
}

/// Upper bounds keeping rendered labels within a sane allocation
const MAX_MODULE_PX: u32 = 64;
const MAX_HEIGHT_PX: u32 = 4096;
const MAX_QUIET_ZONE_MODULES: u32 = 100;
const MAX_FONT_SIZE_PX: f32 = 512.0;

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(Error::Config(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Parse an override, warning and returning `None` when it does not parse.
fn parse_override<T>(key: &str, value: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring {key}={value:?}: {e}");
            None
        }
    }
}

/// The order being labelled and how its QR URL is formed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderOptions {
    /// Order identifier
    pub order_id: String,
    /// Stock keeping unit
    pub sku: String,
    /// Explicit QR URL; takes precedence over `url_template`
    pub url: Option<String>,
    /// URL template with an `{order_id}` placeholder
    pub url_template: String,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            order_id: DEFAULT_ORDER_ID.to_string(),
            sku: DEFAULT_SKU.to_string(),
            url: None,
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
        }
    }
}

impl OrderOptions {
    pub(crate) fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(order_id) = lookup("LABELGEN_ORDER_ID") {
            self.order_id = order_id;
        }
        if let Some(sku) = lookup("LABELGEN_SKU") {
            self.sku = sku;
        }
        if let Some(url) = lookup("LABELGEN_QR_URL") {
            self.url = if url.trim().is_empty() { None } else { Some(url) };
        }
        if let Some(template) = lookup("LABELGEN_URL_TEMPLATE") {
            self.url_template = template;
        }
    }

    /// Validated order label
    pub fn label(&self) -> Result<OrderLabel> {
        OrderLabel::new(self.order_id.clone(), self.sku.clone())
    }

    /// URL to encode in the QR code for `order`
    pub fn qr_url(&self, order: &OrderLabel) -> Result<String> {
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => order.url(&self.url_template),
        }
    }
}

/// Output location and naming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Directory receiving both artifacts
    pub dir: PathBuf,
    /// QR file name
    pub qr_file: PathBuf,
    /// Barcode base name; `.png` is appended
    pub barcode_base: PathBuf,
    /// Suffix both file names with the order id so orders do not overwrite each other
    pub name_by_order: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            qr_file: PathBuf::from("qr.png"),
            barcode_base: PathBuf::from("barcode"),
            name_by_order: false,
        }
    }
}

impl OutputOptions {
    pub(crate) fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("LABELGEN_OUTPUT_DIR") {
            self.dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("LABELGEN_NAME_BY_ORDER") {
            match parse_flag(&flag) {
                Some(parsed) => self.name_by_order = parsed,
                None => tracing::warn!("Ignoring LABELGEN_NAME_BY_ORDER={flag:?}: not a flag"),
            }
        }
    }

    /// Destination of the QR PNG for `order`
    pub fn qr_path(&self, order: &OrderLabel) -> PathBuf {
        if self.name_by_order {
            let stem = file_stem_or(&self.qr_file, "qr");
            self.dir.join(format!("{stem}-{}.png", order.file_stem()))
        } else {
            self.dir.join(&self.qr_file)
        }
    }

    /// Base path of the barcode for `order`, before the `.png` extension is appended
    pub fn barcode_base(&self, order: &OrderLabel) -> PathBuf {
        if self.name_by_order {
            let stem = file_stem_or(&self.barcode_base, "barcode");
            self.dir.join(format!("{stem}-{}", order.file_stem()))
        } else {
            self.dir.join(&self.barcode_base)
        }
    }
}

fn file_stem_or(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(fallback)
        .to_string()
}

/// QR rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Error correction level
    pub ecc: QrEcc,
    /// Pixels per module
    pub module_px: u32,
    /// Surround the symbol with a 4-module quiet zone
    pub quiet_zone: bool,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            ecc: QrEcc::M,
            module_px: crate::qr::DEFAULT_MODULE_SIZE,
            quiet_zone: true,
        }
    }
}

impl QrOptions {
    pub(crate) fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ecc) = lookup("LABELGEN_QR_ECC") {
            match ecc.parse::<QrEcc>() {
                Ok(parsed) => self.ecc = parsed,
                Err(e) => tracing::warn!("Ignoring LABELGEN_QR_ECC: {e}"),
            }
        }
        if let Some(module_px) = lookup("LABELGEN_QR_MODULE_PX") {
            if let Some(parsed) = parse_override::<u32>("LABELGEN_QR_MODULE_PX", &module_px) {
                self.module_px = parsed.max(1);
            }
        }
    }

    /// Encoder configured from these options
    pub fn encoder(&self) -> QrEncoder {
        QrEncoder::with_ecc_level(self.ecc)
            .with_module_size(self.module_px)
            .with_quiet_zone(self.quiet_zone)
    }
}

/// Barcode rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeOptions {
    /// Pixels per module
    pub module_px: u32,
    /// Bar height in pixels
    pub height_px: u32,
    /// Light modules left and right of the symbol
    pub quiet_zone_modules: u32,
    /// TrueType/OpenType font for the human-readable line under the bars;
    /// no line is drawn when unset
    pub font: Option<PathBuf>,
    /// Height of the human-readable line in pixels
    pub font_size_px: f32,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            module_px: crate::barcode::DEFAULT_MODULE_WIDTH,
            height_px: crate::barcode::DEFAULT_BAR_HEIGHT,
            quiet_zone_modules: crate::barcode::DEFAULT_QUIET_ZONE,
            font: None,
            font_size_px: crate::barcode::DEFAULT_FONT_SIZE,
        }
    }
}

impl BarcodeOptions {
    pub(crate) fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(module_px) = lookup("LABELGEN_BARCODE_MODULE_PX") {
            if let Some(parsed) = parse_override::<u32>("LABELGEN_BARCODE_MODULE_PX", &module_px) {
                self.module_px = parsed.max(1);
            }
        }
        if let Some(height) = lookup("LABELGEN_BARCODE_HEIGHT_PX") {
            if let Some(parsed) = parse_override::<u32>("LABELGEN_BARCODE_HEIGHT_PX", &height) {
                self.height_px = parsed.max(1);
            }
        }
        if let Some(font) = lookup("LABELGEN_BARCODE_FONT") {
            self.font = if font.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(font))
            };
        }
    }

    /// Encoder configured from these options. Loads the font when one is set.
    pub fn encoder(&self) -> Result<BarcodeEncoder> {
        let encoder = BarcodeEncoder::new()
            .with_module_width(self.module_px)
            .with_bar_height(self.height_px)
            .with_quiet_zone(self.quiet_zone_modules);

        let Some(path) = &self.font else {
            return Ok(encoder);
        };
        let data = fs::read(path)
            .map_err(|e| Error::Config(format!("Failed to read font {}: {e}", path.display())))?;
        let font = Font::try_from_vec(data)
            .ok_or_else(|| Error::Config(format!("{} is not a usable font", path.display())))?;
        tracing::debug!(font = %path.display(), size = self.font_size_px, "Loaded barcode font");

        Ok(encoder.with_font(font, self.font_size_px))
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `LABELGEN_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LABELGEN_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(file) = lookup("LABELGEN_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Some(color) = lookup("LABELGEN_LOG_COLOR") {
            match parse_flag(&color) {
                Some(parsed) => self.color = parsed,
                None => tracing::warn!("Ignoring LABELGEN_LOG_COLOR={color:?}: not a flag"),
            }
        }
        if let Some(rotation) = lookup("LABELGEN_LOG_ROTATION") {
            if let Some(parsed) = parse_override::<LogRotation>("LABELGEN_LOG_ROTATION", &rotation)
            {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl FromStr for LogRotation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            other => Err(Error::Config(format!(
                "unknown rotation '{other}', expected hourly or daily"
            ))),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_fixed_labels() {
        let config = LabelConfig::default();
        let order = config.order.label().unwrap();

        assert_eq!(
            config.order.qr_url(&order).unwrap(),
            "https://www.thednalabstore.com/order/ORD-2025-001"
        );
        assert_eq!(config.output.qr_path(&order), PathBuf::from("./qr.png"));
        assert_eq!(config.output.barcode_base(&order), PathBuf::from("./barcode"));
        assert_eq!(config.qr.ecc, QrEcc::M);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_name_by_order_paths() {
        let mut output = OutputOptions::default();
        output.dir = PathBuf::from("labels");
        output.name_by_order = true;
        let order = OrderLabel::new("ORD 7", "SKU").unwrap();

        assert_eq!(output.qr_path(&order), PathBuf::from("labels/qr-ORD_7.png"));
        assert_eq!(
            output.barcode_base(&order),
            PathBuf::from("labels/barcode-ORD_7")
        );
    }

    #[test]
    fn test_explicit_url_wins() {
        let mut order = OrderOptions::default();
        order.url = Some("https://example.com/x".to_string());
        let label = order.label().unwrap();
        assert_eq!(order.qr_url(&label).unwrap(), "https://example.com/x");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LabelConfig::default();
        config.apply_overrides(lookup_from(&[
            ("LABELGEN_ORDER_ID", "ORD-9"),
            ("LABELGEN_SKU", "HAT-2"),
            ("LABELGEN_NAME_BY_ORDER", "yes"),
            ("LABELGEN_QR_ECC", "h"),
            ("LABELGEN_QR_MODULE_PX", "0"),
            ("LABELGEN_BARCODE_HEIGHT_PX", "80"),
            ("LABELGEN_LOG_ROTATION", "daily"),
            ("LABELGEN_LOG_COLOR", "off"),
        ]));

        assert_eq!(config.order.order_id, "ORD-9");
        assert_eq!(config.order.sku, "HAT-2");
        assert!(config.output.name_by_order);
        assert_eq!(config.qr.ecc, QrEcc::H);
        assert_eq!(config.qr.module_px, 1);
        assert_eq!(config.barcode.height_px, 80);
        assert_eq!(config.logging.rotation, Some(LogRotation::Daily));
        assert!(!config.logging.color);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = LabelConfig::default();
        config.apply_overrides(lookup_from(&[
            ("LABELGEN_QR_ECC", "Z"),
            ("LABELGEN_QR_MODULE_PX", "-3"),
            ("LABELGEN_BARCODE_MODULE_PX", "wide"),
            ("LABELGEN_BARCODE_HEIGHT_PX", "tall"),
            ("LABELGEN_NAME_BY_ORDER", "maybe"),
            ("LABELGEN_LOG_COLOR", "sometimes"),
            ("LABELGEN_LOG_ROTATION", "weekly"),
        ]));
        assert_eq!(config.qr.ecc, QrEcc::M);
        assert_eq!(config.qr.module_px, 10);
        assert_eq!(config.barcode.module_px, 2);
        assert_eq!(config.barcode.height_px, 120);
        assert!(!config.output.name_by_order);
        assert!(config.logging.color);
        assert_eq!(config.logging.rotation, None);
    }

    #[test]
    fn test_parse_override_reports_failures() {
        assert_eq!(parse_override::<u32>("KEY", " 12 "), Some(12));
        assert_eq!(parse_override::<u32>("KEY", "12px"), None);
        assert_eq!(
            parse_override::<LogRotation>("KEY", "Hourly"),
            Some(LogRotation::Hourly)
        );
        assert!("weekly".parse::<LogRotation>().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labelgen.toml");
        fs::write(
            &path,
            r#"
[order]
order_id = "ORD-2026-042"
sku = "MUG-7"

[output]
dir = "out"
name_by_order = true

[qr]
ecc = "Q"
module_px = 6
"#,
        )
        .unwrap();

        let config = LabelConfig::from_file(&path).unwrap();
        assert_eq!(config.order.order_id, "ORD-2026-042");
        assert_eq!(config.order.url_template, DEFAULT_URL_TEMPLATE);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.qr.ecc, QrEcc::Q);
        assert_eq!(config.qr.module_px, 6);
        assert!(config.qr.quiet_zone);
        assert_eq!(config.barcode.height_px, 120);
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labelgen.yaml");
        fs::write(&path, "order:\n  sku: CAP-1\nbarcode:\n  module_px: 3\n").unwrap();

        let config = LabelConfig::from_file(&path).unwrap();
        assert_eq!(config.order.order_id, DEFAULT_ORDER_ID);
        assert_eq!(config.order.sku, "CAP-1");
        assert_eq!(config.barcode.module_px, 3);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labelgen.ini");
        fs::write(&path, "x=1").unwrap();
        assert!(matches!(
            LabelConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LabelConfig::default();
        config.order.url_template = "https://example.com".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = LabelConfig::default();
        config.barcode.height_px = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = LabelConfig::default();
        config.order.sku = String::new();
        assert!(matches!(config.validate(), Err(Error::InvalidOrder(_))));
    }

    #[test]
    fn test_validate_caps_geometry() {
        let mut config = LabelConfig::default();
        config.barcode.module_px = 20_000_000;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = LabelConfig::default();
        config.qr.module_px = 65;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = LabelConfig::default();
        config.barcode.height_px = 5000;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = LabelConfig::default();
        config.barcode.quiet_zone_modules = 101;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = LabelConfig::default();
        config.barcode.font_size_px = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = LabelConfig::default();
        config.barcode.module_px = 64;
        config.barcode.height_px = 4096;
        config.barcode.quiet_zone_modules = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_barcode_font_loading() {
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");

        let mut options = BarcodeOptions::default();
        assert_eq!(options.encoder().unwrap().text_band_height(), 0);

        options.apply_overrides(&lookup_from(&[(
            "LABELGEN_BARCODE_FONT",
            fixture.to_str().unwrap(),
        )]));
        assert_eq!(options.font.as_deref(), Some(fixture.as_path()));
        assert!(options.encoder().unwrap().text_band_height() > 0);

        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("bogus.ttf");
        fs::write(&bogus, b"not a font").unwrap();
        options.font = Some(bogus);
        assert!(matches!(options.encoder(), Err(Error::Config(_))));

        options.font = Some(dir.path().join("missing.ttf"));
        assert!(matches!(options.encoder(), Err(Error::Config(_))));
    }
}
