//! Code128 encoder: barcoders draws the symbol, this module lays out the label

use crate::barcode::{Bars, Code128Payload};
use crate::error::{Error, Result};
use barcoders::generators::image::Image;
use barcoders::sym::code128::Code128;
use image::{DynamicImage, GrayImage, Luma, imageops};
use rusttype::{Font, Scale, point};

/// barcoders reads these markers as "start in / switch to" code set A or B
const CODE_SET_A: char = 'À';
const CODE_SET_B: char = 'Ɓ';
/// barcoders spells DEL (set B value 95) as U+00F7
const SET_B_DEL: char = '\u{f7}';

/// Pixels per module
pub const DEFAULT_MODULE_WIDTH: u32 = 2;
/// Bar height in pixels
pub const DEFAULT_BAR_HEIGHT: u32 = 120;
/// Light modules on each side of the symbol
pub const DEFAULT_QUIET_ZONE: u32 = 10;
/// Height of the human-readable line in pixels
pub const DEFAULT_FONT_SIZE: f32 = 22.0;

/// Largest label the encoder will allocate
const MAX_PIXELS: u64 = 64 * 1024 * 1024;

const SPACE: Luma<u8> = Luma([255u8]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
}

/// Code128 encoder
#[derive(Clone)]
pub struct BarcodeEncoder {
    module_width: u32,
    bar_height: u32,
    quiet_zone: u32,
    font: Option<Font<'static>>,
    font_size: f32,
}

impl BarcodeEncoder {
    /// Create an encoder with default geometry and no human-readable line
    pub fn new() -> Self {
        Self {
            module_width: DEFAULT_MODULE_WIDTH,
            bar_height: DEFAULT_BAR_HEIGHT,
            quiet_zone: DEFAULT_QUIET_ZONE,
            font: None,
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Set the module width in pixels (at least one)
    pub fn with_module_width(mut self, module_width: u32) -> Self {
        self.module_width = module_width.max(1);
        self
    }

    /// Set the bar height in pixels (at least one)
    pub fn with_bar_height(mut self, bar_height: u32) -> Self {
        self.bar_height = bar_height.max(1);
        self
    }

    /// Set the quiet zone width in modules
    pub fn with_quiet_zone(mut self, quiet_zone: u32) -> Self {
        self.quiet_zone = quiet_zone;
        self
    }

    /// Print the payload under the bars in `font` at `size` pixels
    pub fn with_font(mut self, font: Font<'static>, size: f32) -> Self {
        self.font = Some(font);
        self.font_size = size;
        self
    }

    /// Encode a validated payload into its module sequence
    pub fn bars(&self, payload: &Code128Payload) -> Result<Bars> {
        let symbol = Code128::new(with_code_set_markers(payload.as_str()))
            .map_err(|e| Error::BarcodeEncode(format!("{:?}", e)))?;
        let modules = symbol.encode();

        tracing::debug!(
            characters = payload.as_str().len(),
            modules = modules.len(),
            "Encoded Code128 symbol"
        );

        Ok(Bars::new(modules))
    }

    /// Encode a string into a barcode image
    pub fn encode_string(&self, data: &str) -> Result<DynamicImage> {
        let payload = Code128Payload::new(data)?;
        self.encode(&payload)
    }

    /// Encode a validated payload into a barcode image, with the
    /// human-readable line when a font is configured
    pub fn encode(&self, payload: &Code128Payload) -> Result<DynamicImage> {
        let bars = self.bars(payload)?;
        Ok(DynamicImage::ImageLuma8(
            self.render(&bars, Some(payload.as_str()))?,
        ))
    }

    /// Pixels added below the bars for the human-readable line; zero
    /// without a font.
    pub fn text_band_height(&self) -> u32 {
        match &self.font {
            Some(font) => {
                let v_metrics = font.v_metrics(Scale::uniform(self.font_size));
                let line = (v_metrics.ascent - v_metrics.descent).ceil().max(0.0) as u32;
                line.saturating_add(self.text_gap())
            }
            None => 0,
        }
    }

    fn text_gap(&self) -> u32 {
        self.module_width.saturating_mul(2)
    }

    /// Lay a module sequence out on a white label. The vertical margin is
    /// half the quiet zone; `text` goes under the bars when a font is set.
    pub fn render(&self, bars: &Bars, text: Option<&str>) -> Result<GrayImage> {
        let too_large = || {
            Error::Config(format!(
                "barcode of {} modules at {} px per module does not fit in an image",
                bars.len(),
                self.module_width
            ))
        };

        let modules = u32::try_from(bars.len()).map_err(|_| too_large())?;
        let quiet_px = self
            .quiet_zone
            .checked_mul(self.module_width)
            .ok_or_else(too_large)?;
        let margin = quiet_px / 2;
        let width = modules
            .checked_mul(self.module_width)
            .and_then(|w| w.checked_add(quiet_px.checked_mul(2)?))
            .ok_or_else(too_large)?;
        let height = self
            .bar_height
            .checked_add(margin.checked_mul(2).ok_or_else(too_large)?)
            .and_then(|h| h.checked_add(self.text_band_height()))
            .ok_or_else(too_large)?;

        if width as u64 * height as u64 > MAX_PIXELS {
            return Err(Error::Image(format!(
                "barcode label would be {width}x{height} pixels"
            )));
        }

        let mut generator = Image::image_buffer(self.bar_height);
        if let Image::ImageBuffer { ref mut xdim, .. } = generator {
            *xdim = self.module_width;
        }
        let symbol = generator
            .generate_buffer(bars.modules())
            .map_err(|e| Error::BarcodeEncode(format!("{:?}", e)))?;
        let symbol = DynamicImage::ImageRgba8(symbol).to_luma8();

        let mut canvas = GrayImage::from_pixel(width, height, SPACE);
        imageops::overlay(&mut canvas, &symbol, quiet_px as i64, margin as i64);

        if let (Some(font), Some(text)) = (&self.font, text) {
            let top = margin + self.bar_height + self.text_gap();
            draw_text(&mut canvas, font, self.font_size, text, top);
        }

        Ok(canvas)
    }
}

impl std::fmt::Debug for BarcodeEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarcodeEncoder")
            .field("module_width", &self.module_width)
            .field("bar_height", &self.bar_height)
            .field("quiet_zone", &self.quiet_zone)
            .field("font", &self.font.as_ref().map(|_| self.font_size))
            .finish()
    }
}

impl Default for BarcodeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Prefix the payload with a start-set marker and insert a switch marker
/// wherever a character is missing from the active set. Control characters
/// live only in set A; lowercase letters and DEL only in set B.
fn with_code_set_markers(data: &str) -> String {
    let mut out = String::with_capacity(data.len() + 4);
    let mut active: Option<CodeSet> = None;

    for ch in data.chars() {
        let required = match ch as u32 {
            0x00..=0x1F => Some(CodeSet::A),
            0x60..=0x7F => Some(CodeSet::B),
            _ => None,
        };

        let next = match (active, required) {
            (None, required) => Some(required.unwrap_or(CodeSet::B)),
            (Some(current), Some(required)) if current != required => Some(required),
            _ => None,
        };

        if let Some(set) = next {
            out.push(match set {
                CodeSet::A => CODE_SET_A,
                CodeSet::B => CODE_SET_B,
            });
            active = Some(set);
        }
        out.push(if ch == '\u{7f}' { SET_B_DEL } else { ch });
    }

    out
}

/// Draw `text` centred horizontally with its top edge at `top`.
fn draw_text(canvas: &mut GrayImage, font: &Font<'_>, size: f32, text: &str, top: u32) {
    let printable: String = text.chars().filter(|c| !c.is_control()).collect();
    let scale = Scale::uniform(size);
    let ascent = font.v_metrics(scale).ascent;

    let text_width = font
        .layout(&printable, scale, point(0.0, ascent))
        .filter_map(|g| g.pixel_bounding_box().map(|bb| bb.max.x))
        .max()
        .unwrap_or(0)
        .max(0) as u32;
    let left = canvas.width().saturating_sub(text_width) / 2;
    let (width, height) = canvas.dimensions();

    for glyph in font.layout(&printable, scale, point(left as f32, top as f32 + ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                    let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                    let shade = (255.0 * (1.0 - coverage)) as u8;
                    pixel.0[0] = pixel.0[0].min(shade);
                }
            });
        }
    }
}
