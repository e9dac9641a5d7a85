//! Code128 barcode encoding and decoding
//!
//! Symbol encoding (start code, symbol values, checksum, stop pattern) is
//! delegated to `barcoders`, and so is drawing the bars. This module
//! validates payloads, lays the symbol out on a label and reads it back
//! from a scanline.

mod decoder;
mod encoder;

pub use decoder::BarcodeDecoder;
pub use encoder::{
    BarcodeEncoder, DEFAULT_BAR_HEIGHT, DEFAULT_FONT_SIZE, DEFAULT_MODULE_WIDTH,
    DEFAULT_QUIET_ZONE,
};

use crate::error::{Error, Result};

/// Bar/space widths (in modules) of Code128 symbol values 0..=105.
pub(crate) const CODE_PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2],
    [2, 2, 2, 1, 2, 2],
    [2, 2, 2, 2, 2, 1],
    [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2],
    [1, 3, 1, 2, 2, 2],
    [1, 2, 2, 2, 1, 3],
    [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2],
    [2, 2, 1, 2, 1, 3],
    [2, 2, 1, 3, 1, 2],
    [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2],
    [1, 2, 2, 1, 3, 2],
    [1, 2, 2, 2, 3, 1],
    [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2],
    [1, 2, 3, 2, 2, 1],
    [2, 2, 3, 2, 1, 1],
    [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1],
    [2, 1, 3, 2, 1, 2],
    [2, 2, 3, 1, 1, 2],
    [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2],
    [3, 2, 1, 1, 2, 2],
    [3, 2, 1, 2, 2, 1],
    [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2],
    [3, 2, 2, 2, 1, 1],
    [2, 1, 2, 1, 2, 3],
    [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1],
    [1, 1, 1, 3, 2, 3],
    [1, 3, 1, 1, 2, 3],
    [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3],
    [1, 3, 2, 1, 1, 3],
    [1, 3, 2, 3, 1, 1],
    [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3],
    [2, 3, 1, 3, 1, 1],
    [1, 1, 2, 1, 3, 3],
    [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1],
    [1, 1, 3, 1, 2, 3],
    [1, 1, 3, 3, 2, 1],
    [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1],
    [2, 1, 1, 3, 3, 1],
    [2, 3, 1, 1, 3, 1],
    [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1],
    [2, 1, 3, 1, 3, 1],
    [3, 1, 1, 1, 2, 3],
    [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1],
    [3, 1, 2, 1, 1, 3],
    [3, 1, 2, 3, 1, 1],
    [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1],
    [2, 2, 1, 4, 1, 1],
    [4, 3, 1, 1, 1, 1],
    [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2],
    [1, 2, 1, 1, 2, 4],
    [1, 2, 1, 4, 2, 1],
    [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1],
    [1, 1, 2, 2, 1, 4],
    [1, 1, 2, 4, 1, 2],
    [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1],
    [1, 4, 2, 1, 1, 2],
    [1, 4, 2, 2, 1, 1],
    [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4],
    [4, 1, 3, 1, 1, 1],
    [2, 4, 1, 1, 1, 2],
    [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2],
    [1, 2, 1, 1, 4, 2],
    [1, 2, 1, 2, 4, 1],
    [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2],
    [1, 2, 4, 2, 1, 1],
    [4, 1, 1, 2, 1, 2],
    [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1],
    [2, 1, 2, 1, 4, 1],
    [2, 1, 4, 1, 2, 1],
    [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3],
    [1, 1, 1, 3, 4, 1],
    [1, 3, 1, 1, 4, 1],
    [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1],
    [4, 1, 1, 1, 1, 3],
    [4, 1, 1, 3, 1, 1],
    [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1],
    [3, 1, 1, 1, 4, 1],
    [4, 1, 1, 1, 3, 1],
    [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4],
    [2, 1, 1, 2, 3, 2],
];

/// Stop pattern including the terminating bar (13 modules).
pub(crate) const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

pub(crate) const START_A: u8 = 103;
pub(crate) const START_B: u8 = 104;
pub(crate) const START_C: u8 = 105;

/// A payload known to be encodable in Code128: ASCII 0x00..=0x7F
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code128Payload(String);

impl Code128Payload {
    /// Validate `data`: non-empty, every character ASCII.
    pub fn new(data: &str) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::BarcodeEncode("payload is empty".to_string()));
        }

        if let Some((position, ch)) = data.chars().enumerate().find(|(_, ch)| !ch.is_ascii()) {
            return Err(Error::UnsupportedCharacter { ch, position });
        }

        Ok(Self(data.to_string()))
    }

    /// The validated payload text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Module sequence of an encoded symbol: `1` is a bar module, `0` a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bars(Vec<u8>);

impl Bars {
    /// Wrap a raw module sequence
    pub fn new(modules: Vec<u8>) -> Self {
        Self(modules)
    }

    /// Raw modules
    pub fn modules(&self) -> &[u8] {
        &self.0
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Collapse the modules into alternating bar/space run lengths,
    /// starting with the first bar.
    pub fn runs(&self) -> Vec<u32> {
        let mut runs = Vec::new();
        let mut iter = self.0.iter().skip_while(|&&m| m == 0).peekable();
        let mut current = match iter.peek() {
            Some(&&m) => m,
            None => return runs,
        };
        let mut len = 0u32;

        for &module in iter {
            if module == current {
                len += 1;
            } else {
                runs.push(len);
                current = module;
                len = 1;
            }
        }
        if current == 1 {
            runs.push(len);
        }

        runs
    }
}
