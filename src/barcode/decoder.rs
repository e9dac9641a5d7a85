//! Code128 scanline decoder
//!
//! Reads one row of a rendered label, turns it into bar/space run lengths
//! and matches each group of six runs against the Code128 width table.
//! Good enough for verifying generated artifacts; not a camera-grade reader.

use crate::barcode::{CODE_PATTERNS, START_A, START_B, START_C, STOP_PATTERN};
use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage};

const SHIFT: u8 = 98;
const CODE_C: u8 = 99;
const CODE_B: u8 = 100;
const CODE_A: u8 = 101;
const FNC1: u8 = 102;

/// Start, checksum and stop: the smallest possible symbol
const MIN_RUNS: usize = 6 + 6 + 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Code128 decoder
#[derive(Debug, Clone)]
pub struct BarcodeDecoder {
    /// Luma values below this count as bar pixels
    threshold: u8,
}

impl BarcodeDecoder {
    /// Create a decoder with a mid-grey threshold
    pub fn new() -> Self {
        Self { threshold: 128 }
    }

    /// Decode a barcode from an image
    pub fn decode(&self, img: &DynamicImage) -> Result<String> {
        let gray = img.to_luma8();
        self.decode_gray(&gray)
    }

    /// Decode a barcode from a grayscale image, trying a few scanlines
    /// starting at the middle
    pub fn decode_gray(&self, img: &GrayImage) -> Result<String> {
        if img.width() == 0 || img.height() == 0 {
            return Err(Error::NoBarcodeFound);
        }

        // Middle row first, then rows nearer the top in case a printed
        // line under the bars crosses the middle
        let h = img.height();
        let mut rows = vec![h / 2, h / 3, h / 4, 2 * h / 3];
        rows.dedup();

        let mut last = Error::NoBarcodeFound;
        for y in rows {
            let row: Vec<u8> = (0..img.width()).map(|x| img.get_pixel(x, y).0[0]).collect();
            match self.decode_row(&row) {
                Ok(text) => return Ok(text),
                Err(e) => last = e,
            }
        }
        Err(last)
    }

    /// Decode a single row of luma samples
    pub fn decode_row(&self, row: &[u8]) -> Result<String> {
        let runs = self.run_lengths(row);
        if runs.len() < 6 {
            return Err(Error::NoBarcodeFound);
        }

        match decode_runs(&runs) {
            Ok(text) => Ok(text),
            Err(forward) => {
                // Symbol may have been scanned right-to-left
                let reversed: Vec<u32> = runs.iter().rev().copied().collect();
                decode_runs(&reversed).map_err(|_| forward)
            }
        }
    }

    /// Alternating bar/space widths from the first bar to the last bar.
    fn run_lengths(&self, row: &[u8]) -> Vec<u32> {
        let mut runs = Vec::new();
        let mut current: Option<bool> = None;
        let mut len = 0u32;

        for &luma in row {
            let dark = luma < self.threshold;
            match current {
                None if !dark => continue,
                None => {
                    current = Some(true);
                    len = 1;
                }
                Some(state) if state == dark => len += 1,
                Some(_) => {
                    runs.push(len);
                    current = Some(dark);
                    len = 1;
                }
            }
        }

        if current == Some(true) {
            runs.push(len);
        }

        runs
    }
}

impl Default for BarcodeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_runs(runs: &[u32]) -> Result<String> {
    if runs.len() < MIN_RUNS || (runs.len() - 7) % 6 != 0 {
        return Err(Error::BarcodeDecode(format!(
            "{} bar/space elements do not form a Code128 symbol",
            runs.len()
        )));
    }

    let (symbol_runs, stop_runs) = runs.split_at(runs.len() - 7);
    let stop: [u8; 7] = normalize(stop_runs, 13);
    if stop != STOP_PATTERN {
        return Err(Error::BarcodeDecode("missing stop pattern".to_string()));
    }

    let values = symbol_runs
        .chunks_exact(6)
        .enumerate()
        .map(|(index, chunk)| {
            let widths: [u8; 6] = normalize(chunk, 11);
            CODE_PATTERNS
                .iter()
                .position(|pattern| *pattern == widths)
                .map(|value| value as u8)
                .ok_or_else(|| {
                    Error::BarcodeDecode(format!("unknown symbol pattern at position {index}"))
                })
        })
        .collect::<Result<Vec<u8>>>()?;

    let (&start, rest) = values
        .split_first()
        .ok_or_else(|| Error::BarcodeDecode("empty symbol".to_string()))?;
    let (&checksum, data) = rest
        .split_last()
        .ok_or_else(|| Error::BarcodeDecode("missing checksum".to_string()))?;

    let set = match start {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        START_C => CodeSet::C,
        other => {
            return Err(Error::BarcodeDecode(format!(
                "symbol starts with value {other}, not a start code"
            )));
        }
    };

    let expected = data
        .iter()
        .enumerate()
        .fold(start as u32, |acc, (i, &v)| acc + (i as u32 + 1) * v as u32)
        % 103;
    if expected != checksum as u32 {
        return Err(Error::BarcodeDecode(format!(
            "checksum mismatch: computed {expected}, symbol carries {checksum}"
        )));
    }

    translate(set, data)
}

/// Scale run lengths so they sum to `modules` and round each to whole modules.
fn normalize<const N: usize>(runs: &[u32], modules: u32) -> [u8; N] {
    let total: u32 = runs.iter().sum();
    let mut widths = [0u8; N];
    if total == 0 {
        return widths;
    }
    for (width, &run) in widths.iter_mut().zip(runs) {
        let scaled = (run * modules * 2 + total) / (2 * total);
        *width = scaled.clamp(1, 4) as u8;
    }
    widths
}

fn translate(mut set: CodeSet, values: &[u8]) -> Result<String> {
    let mut text = String::with_capacity(values.len() * 2);
    let mut shifted = false;

    for &value in values {
        let active = if shifted {
            match set {
                CodeSet::A => CodeSet::B,
                CodeSet::B => CodeSet::A,
                CodeSet::C => CodeSet::C,
            }
        } else {
            set
        };
        shifted = false;

        match (active, value) {
            (CodeSet::C, 0..=99) => {
                text.push(char::from(b'0' + value / 10));
                text.push(char::from(b'0' + value % 10));
            }
            (CodeSet::C, CODE_B) => set = CodeSet::B,
            (CodeSet::C, CODE_A) => set = CodeSet::A,
            (CodeSet::A, 0..=63) | (CodeSet::B, 0..=95) => text.push(char::from(value + 32)),
            (CodeSet::A, 64..=95) => text.push(char::from(value - 64)),
            (CodeSet::A, SHIFT) | (CodeSet::B, SHIFT) => shifted = true,
            (CodeSet::A, CODE_C) | (CodeSet::B, CODE_C) => set = CodeSet::C,
            (CodeSet::A, CODE_B) => set = CodeSet::B,
            (CodeSet::B, CODE_A) => set = CodeSet::A,
            // FNC1..FNC4 carry no text
            (_, 96 | 97 | FNC1) | (CodeSet::A, CODE_A) | (CodeSet::B, CODE_B) => {}
            (_, other) => {
                return Err(Error::BarcodeDecode(format!(
                    "unexpected symbol value {other} in data"
                )));
            }
        }
    }

    Ok(text)
}
