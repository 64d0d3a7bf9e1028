// SPDX-License-Identifier: GPL-3.0-only

//! Built-in EAN-13 scanline decoder
//!
//! A dependency-free single-dimension decoder: each sampled row is
//! binarized, run-length encoded, and matched against the EAN-13 guard and
//! digit patterns. The symbol's own check digit is verified before a read
//! is reported, which filters out most decode noise from partial frames.
//!
//! ISBN barcodes are EAN-13 symbols, so this is sufficient for book
//! scanning; any richer library can replace it behind the [`Decoder`]
//! trait.

use super::{Decoder, RawDecodeResult};
use crate::backends::camera::CameraFrame;
use tracing::trace;

/// Left-hand (L) digit patterns as module run widths, space-first.
///
/// R patterns use the same widths bar-first; G patterns are these widths
/// reversed, space-first.
const L_WIDTHS: [[u8; 4]; 10] = [
    [3, 2, 1, 1], // 0
    [2, 2, 2, 1], // 1
    [2, 1, 2, 2], // 2
    [1, 4, 1, 1], // 3
    [1, 1, 3, 2], // 4
    [1, 2, 3, 1], // 5
    [1, 1, 1, 4], // 6
    [1, 3, 1, 2], // 7
    [1, 2, 1, 3], // 8
    [3, 1, 1, 2], // 9
];

/// Left-half parity pattern for each leading digit (true = L, false = G)
const PARITIES: [[bool; 6]; 10] = [
    [true, true, true, true, true, true],     // 0
    [true, true, false, true, false, false],  // 1
    [true, true, false, false, true, false],  // 2
    [true, true, false, false, false, true],  // 3
    [true, false, true, true, false, false],  // 4
    [true, false, false, true, true, false],  // 5
    [true, false, false, false, true, true],  // 6
    [true, false, true, false, true, false],  // 7
    [true, false, true, false, false, true],  // 8
    [true, false, false, true, false, true],  // 9
];

/// Minimum luma spread in a row before we bother binarizing it
const MIN_CONTRAST: u8 = 48;

/// Maximum total normalized-width error when matching one digit
const MAX_DIGIT_ERROR: f32 = 1.0;

/// Run of same-colored pixels in a binarized row
#[derive(Debug, Clone, Copy)]
struct Run {
    dark: bool,
    len: u32,
}

/// EAN-13 implementation of [`Decoder`]
pub struct Ean13Decoder {
    scan_rows: u32,
}

impl Ean13Decoder {
    pub fn new(scan_rows: u32) -> Self {
        Self {
            scan_rows: scan_rows.max(1),
        }
    }
}

impl Default for Ean13Decoder {
    fn default() -> Self {
        Self::new(15)
    }
}

impl Decoder for Ean13Decoder {
    fn attempt(&mut self, frame: &CameraFrame) -> Option<RawDecodeResult> {
        for y in sample_rows(frame.height, self.scan_rows) {
            if let Some(text) = decode_row(frame.row(y)) {
                trace!(row = y, text = %text, "Decoded EAN-13 from scanline");
                return Some(RawDecodeResult {
                    text,
                    captured_at: frame.captured_at,
                });
            }
        }
        None
    }
}

/// Evenly spaced distinct row indices
fn sample_rows(height: u32, count: u32) -> Vec<u32> {
    let mut ys: Vec<u32> = (1..=count).map(|k| k * height / (count + 1)).collect();
    ys.dedup();
    ys
}

/// Try to decode one scanline in either direction
fn decode_row(row: &[u8]) -> Option<String> {
    let runs = binarize(row)?;
    decode_runs(&runs).or_else(|| {
        let mut reversed = runs.clone();
        reversed.reverse();
        decode_runs(&reversed)
    })
}

/// Threshold a row at the midpoint of its luma range and run-length encode
/// it. `None` when the row has too little contrast to hold a barcode.
fn binarize(row: &[u8]) -> Option<Vec<Run>> {
    let min = *row.iter().min()?;
    let max = *row.iter().max()?;
    if max - min < MIN_CONTRAST {
        return None;
    }
    let threshold = min as u16 + (max - min) as u16 / 2;

    let mut runs: Vec<Run> = Vec::new();
    for &px in row {
        let dark = (px as u16) < threshold;
        match runs.last_mut() {
            Some(run) if run.dark == dark => run.len += 1,
            _ => runs.push(Run { dark, len: 1 }),
        }
    }
    Some(runs)
}

/// Scan the run sequence for a full EAN-13 symbol.
///
/// A symbol is 59 runs: start guard (3), six left digits (24), center
/// guard (5), six right digits (24), end guard (3).
fn decode_runs(runs: &[Run]) -> Option<String> {
    for i in 1..runs.len() {
        if runs.len() - i < 59 || !runs[i].dark {
            continue;
        }
        if let Some(text) = decode_symbol_at(runs, i) {
            return Some(text);
        }
    }
    None
}

fn decode_symbol_at(runs: &[Run], start: usize) -> Option<String> {
    let unit = guard_unit(&runs[start..start + 3])?;

    // Quiet zone before the start guard
    if runs[start - 1].dark || (runs[start - 1].len as f32) < unit * 3.0 {
        return None;
    }

    let mut digits = [0u8; 13];
    let mut parities = [true; 6];

    // Left half: space-first groups, L or G parity
    for d in 0..6 {
        let group = &runs[start + 3 + d * 4..start + 7 + d * 4];
        if group[0].dark {
            return None;
        }
        let (digit, is_l) = match_left_digit(group)?;
        digits[d + 1] = digit;
        parities[d] = is_l;
    }

    // Center guard: five one-module runs, space-first
    let center = &runs[start + 27..start + 32];
    if center[0].dark || !guard_shape_ok(center, unit) {
        return None;
    }

    // Right half: bar-first groups, R patterns only
    for d in 0..6 {
        let group = &runs[start + 32 + d * 4..start + 36 + d * 4];
        if !group[0].dark {
            return None;
        }
        digits[d + 7] = match_right_digit(group)?;
    }

    // End guard
    let end = &runs[start + 56..start + 59];
    if !end[0].dark || guard_unit(end).is_none() {
        return None;
    }

    digits[0] = leading_digit(&parities)?;
    if !checksum_ok(&digits) {
        return None;
    }

    Some(digits.iter().map(|d| (b'0' + d) as char).collect())
}

/// Estimate the module width from a 1-1-1 guard, or reject it
fn guard_unit(guard: &[Run]) -> Option<f32> {
    let unit = guard.iter().map(|r| r.len as f32).sum::<f32>() / 3.0;
    if guard_shape_ok(guard, unit) { Some(unit) } else { None }
}

/// All runs in the slice are about one module wide
fn guard_shape_ok(guard: &[Run], unit: f32) -> bool {
    guard
        .iter()
        .all(|r| (r.len as f32 / unit - 1.0).abs() <= 0.6)
}

/// Normalized widths of a 4-run digit group (7 modules total)
fn normalized_widths(group: &[Run]) -> [f32; 4] {
    let total: f32 = group.iter().map(|r| r.len as f32).sum();
    let unit = total / 7.0;
    [
        group[0].len as f32 / unit,
        group[1].len as f32 / unit,
        group[2].len as f32 / unit,
        group[3].len as f32 / unit,
    ]
}

fn pattern_error(widths: &[f32; 4], pattern: &[u8; 4]) -> f32 {
    widths
        .iter()
        .zip(pattern.iter())
        .map(|(w, &p)| (w - p as f32).abs())
        .sum()
}

/// Match a left-half digit against both the L and G tables
fn match_left_digit(group: &[Run]) -> Option<(u8, bool)> {
    let widths = normalized_widths(group);
    let mut best: Option<(u8, bool, f32)> = None;

    for (digit, pattern) in L_WIDTHS.iter().enumerate() {
        let err_l = pattern_error(&widths, pattern);
        let reversed = [pattern[3], pattern[2], pattern[1], pattern[0]];
        let err_g = pattern_error(&widths, &reversed);

        for (err, is_l) in [(err_l, true), (err_g, false)] {
            if err <= MAX_DIGIT_ERROR && best.map(|(_, _, b)| err < b).unwrap_or(true) {
                best = Some((digit as u8, is_l, err));
            }
        }
    }

    best.map(|(digit, is_l, _)| (digit, is_l))
}

/// Match a right-half digit against the R table (same widths as L)
fn match_right_digit(group: &[Run]) -> Option<u8> {
    let widths = normalized_widths(group);
    let mut best: Option<(u8, f32)> = None;

    for (digit, pattern) in L_WIDTHS.iter().enumerate() {
        let err = pattern_error(&widths, pattern);
        if err <= MAX_DIGIT_ERROR && best.map(|(_, b)| err < b).unwrap_or(true) {
            best = Some((digit as u8, err));
        }
    }

    best.map(|(digit, _)| digit)
}

/// Recover the implied leading digit from the left-half parity pattern
fn leading_digit(parities: &[bool; 6]) -> Option<u8> {
    PARITIES
        .iter()
        .position(|p| p == parities)
        .map(|d| d as u8)
}

/// EAN-13 check: digits weighted 1,3,1,3,... must sum to a multiple of 10
fn checksum_ok(digits: &[u8; 13]) -> bool {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    sum % 10 == 0
}

/// Render an ideal scanline for a 13-digit code, `unit` pixels per module.
///
/// Bars are black (0), spaces and the quiet zones white (255). Intended
/// for tests and synthetic frame sources.
pub fn synthesize_ideal_row(code: &str, unit: usize) -> Option<Vec<u8>> {
    let digits: Vec<u8> = code
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect::<Option<_>>()?;
    if digits.len() != 13 || unit == 0 {
        return None;
    }

    // 7-bit module patterns, MSB first; true bit = bar
    const L_BITS: [u8; 10] = [
        0b0001101, 0b0011001, 0b0010011, 0b0111101, 0b0100011, 0b0110001, 0b0101111, 0b0111011,
        0b0110111, 0b0001011,
    ];
    let g_bits = |d: usize| -> u8 {
        let r = !L_BITS[d] & 0x7F;
        // reverse the 7 bits
        (0..7).fold(0u8, |acc, b| (acc << 1) | ((r >> b) & 1))
    };

    let mut modules: Vec<bool> = Vec::with_capacity(115);
    let push_bits = |modules: &mut Vec<bool>, bits: u8| {
        for b in (0..7).rev() {
            modules.push((bits >> b) & 1 == 1);
        }
    };

    modules.extend([false; 10]); // quiet zone
    modules.extend([true, false, true]); // start guard

    let parity = PARITIES[digits[0] as usize];
    for (k, &d) in digits[1..7].iter().enumerate() {
        let bits = if parity[k] { L_BITS[d as usize] } else { g_bits(d as usize) };
        push_bits(&mut modules, bits);
    }

    modules.extend([false, true, false, true, false]); // center guard

    for &d in &digits[7..13] {
        push_bits(&mut modules, !L_BITS[d as usize] & 0x7F); // R = complement of L
    }

    modules.extend([true, false, true]); // end guard
    modules.extend([false; 10]); // quiet zone

    let mut row = Vec::with_capacity(modules.len() * unit);
    for dark in modules {
        let px = if dark { 0u8 } else { 255u8 };
        row.extend(std::iter::repeat(px).take(unit));
    }
    Some(row)
}
