//! Scanline EAN-13 / UPC-A detector.
//!
//! Per probed row: adaptive binarization, run lengths, normalization of run
//! widths to modules (1..4), guard scan (start 101, center 01010, end 101),
//! A/B decode of the left half and C decode of the right half, first digit
//! recovered from the left-half parity mask, checksum verification.

use std::time::Instant;

use crate::frame::{Frame, Rect};

use super::{DetectedSymbol, Detection, SymbolDetector, Symbology};

/// Left-half "A" (odd parity) width patterns; each sums to 7 modules.
const A_PATTERNS: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// Left-half "B" (even parity) patterns: A reversed run-wise.
const B_PATTERNS: [[u8; 4]; 10] = [
    [1, 1, 2, 3],
    [1, 2, 2, 2],
    [2, 2, 1, 2],
    [1, 1, 4, 1],
    [2, 3, 1, 1],
    [1, 3, 2, 1],
    [4, 1, 1, 1],
    [2, 1, 3, 1],
    [3, 1, 2, 1],
    [2, 1, 1, 3],
];

/// Right-half "C" patterns share the A widths (bar/space inversion does not
/// change run widths).
const C_PATTERNS: [[u8; 4]; 10] = A_PATTERNS;

/// Parity mask of the six left digits selects the implied first digit.
/// `true` = B pattern, `false` = A pattern.
const PARITY_MASKS: [[bool; 6]; 10] = [
    [false, false, false, false, false, false],
    [false, false, true, false, true, true],
    [false, false, true, true, false, true],
    [false, false, true, true, true, false],
    [false, true, false, false, true, true],
    [false, true, true, false, false, true],
    [false, true, true, true, false, false],
    [false, true, false, true, false, true],
    [false, true, false, true, true, false],
    [false, true, true, false, true, false],
];

// A full symbol is 59 runs; anything shorter cannot hold one.
const MIN_RUNS: usize = 40;
const MIN_ROW_PIXELS: usize = 95;

/// Detector configured for the EAN-13 symbology family. Probes a band of
/// evenly spaced rows and reports the first row that decodes.
#[derive(Debug, Clone)]
pub struct Ean13Detector {
    scan_band_rows: usize,
}

impl Ean13Detector {
    pub fn new(scan_band_rows: usize) -> Self {
        Self {
            scan_band_rows: scan_band_rows.max(1),
        }
    }
}

impl Default for Ean13Detector {
    fn default() -> Self {
        Self::new(9)
    }
}

impl SymbolDetector for Ean13Detector {
    fn detect(&self, frame: &Frame) -> Detection {
        let started = Instant::now();
        let mut symbols = Vec::new();

        if frame.height > 0 && (frame.width as usize) >= MIN_ROW_PIXELS {
            let step = (frame.height as usize / (self.scan_band_rows + 1)).max(1);
            let mut y = step;
            while y < frame.height as usize {
                if let Some(hit) = decode_row(frame.row(y as u32)) {
                    let band = (frame.height / 8).max(1);
                    let top = y as i32 - (band / 2) as i32;
                    let symbology = if hit.digits.len() == 12 {
                        Symbology::UpcA
                    } else {
                        Symbology::Ean13
                    };
                    tracing::debug!(payload = %hit.digits, row = y, "decoded symbol");
                    symbols.push(DetectedSymbol {
                        payload: hit.digits,
                        symbology,
                        bounds: Rect::new(
                            hit.x0 as i32,
                            top.max(0),
                            (hit.x1 - hit.x0) as u32,
                            band,
                        ),
                    });
                    break;
                }
                y += step;
            }
        }

        Detection {
            symbols,
            latency: started.elapsed(),
        }
    }
}

struct RowHit {
    digits: String,
    x0: usize,
    x1: usize,
}

/// Attempt to decode one luma row. Returns 13 digits for EAN-13 or 12 for
/// UPC-A (an EAN-13 whose implied first digit is zero).
fn decode_row(row: &[u8]) -> Option<RowHit> {
    if row.len() < MIN_ROW_PIXELS {
        return None;
    }

    // Adaptive mask first; fall back to a global threshold on rows where the
    // windowed mean produces too few transitions.
    let mask = adaptive_mask(row);
    let (widths, starts) = run_lengths(&mask);
    let (mask, widths, starts) = if widths.len() >= MIN_RUNS {
        (mask, widths, starts)
    } else {
        let mask = global_mask(row);
        let (widths, starts) = run_lengths(&mask);
        if widths.len() < MIN_RUNS {
            return None;
        }
        (mask, widths, starts)
    };

    let modules = quantize_modules(&widths);

    // Start guard: first dark 1,1,1 triple.
    let guard = find_start_guard(&mask, &starts, &modules)?;
    let mut idx = guard + 3;

    // Left half: six digits, four runs each, A or B parity per digit.
    let mut left = [0u8; 6];
    let mut parity = [false; 6];
    for digit in 0..6 {
        let pat = module_quad(&modules, idx)?;
        let (a_digit, a_dist) = closest(&pat, &A_PATTERNS);
        let (b_digit, b_dist) = closest(&pat, &B_PATTERNS);
        if a_dist <= b_dist {
            left[digit] = a_digit;
            parity[digit] = false;
        } else {
            left[digit] = b_digit;
            parity[digit] = true;
        }
        idx += 4;
    }

    // Center guard 01010.
    if !matches_units(&modules, idx, 5) {
        return None;
    }
    idx += 5;

    // Right half: six digits from the C set.
    let mut right = [0u8; 6];
    for digit in 0..6 {
        let pat = module_quad(&modules, idx)?;
        let (c_digit, _) = closest(&pat, &C_PATTERNS);
        right[digit] = c_digit;
        idx += 4;
    }

    // End guard 101.
    if !matches_units(&modules, idx, 3) {
        return None;
    }

    let first = first_digit(&parity)?;
    let mut digits = [0u8; 13];
    digits[0] = first;
    digits[1..7].copy_from_slice(&left);
    digits[7..13].copy_from_slice(&right);

    if digits[12] != checksum_digit(&digits[..12]) {
        return None;
    }

    // UPC-A is an EAN-13 with a leading zero; report it as 12 digits.
    let text: String = if digits[0] == 0 {
        digits[1..].iter().map(|d| char::from(b'0' + d)).collect()
    } else {
        digits.iter().map(|d| char::from(b'0' + d)).collect()
    };

    let x0 = starts[guard];
    let end_run = idx + 2;
    let x1 = starts[end_run] + widths[end_run];
    Some(RowHit { digits: text, x0, x1 })
}

/// Global threshold mask: mean/midpoint blend. Cheap, struggles with uneven
/// lighting, kept as a fallback.
fn global_mask(row: &[u8]) -> Vec<bool> {
    let (mut lo, mut hi) = (u8::MAX, 0u8);
    let mut sum: u64 = 0;
    for &v in row {
        lo = lo.min(v);
        hi = hi.max(v);
        sum += v as u64;
    }
    let mean = (sum / row.len() as u64) as u16;
    let mid = (lo as u16 + hi as u16) / 2;
    let threshold = ((mean + mid) / 2) as u8;
    row.iter().map(|&v| v < threshold).collect()
}

/// Adaptive mask from a sliding-window mean with a small dark bias.
/// Window is width/32 clamped to [8, 64].
fn adaptive_mask(row: &[u8]) -> Vec<bool> {
    let n = row.len();
    if n == 0 {
        return Vec::new();
    }
    let win = (n / 32).clamp(8, 64);
    let bias: i32 = 5;

    let mut prefix: Vec<u32> = Vec::with_capacity(n + 1);
    prefix.push(0);
    for &v in row {
        prefix.push(prefix[prefix.len() - 1] + v as u32);
    }

    let mut mask = Vec::with_capacity(n);
    for i in 0..n {
        let left = i.saturating_sub(win);
        let right = (i + win).min(n - 1);
        let len = (right - left + 1) as u32;
        let mean = ((prefix[right + 1] - prefix[left]) / len) as i32;
        mask.push((row[i] as i32) < mean - bias);
    }
    mask
}

/// Run lengths with their pixel offsets, starting from the first run as-is.
fn run_lengths(mask: &[bool]) -> (Vec<usize>, Vec<usize>) {
    let mut widths = Vec::new();
    let mut starts = Vec::new();
    if mask.is_empty() {
        return (widths, starts);
    }
    let mut current = mask[0];
    let mut len = 1usize;
    let mut start = 0usize;
    for (i, &bit) in mask.iter().enumerate().skip(1) {
        if bit == current {
            len += 1;
        } else {
            widths.push(len);
            starts.push(start);
            current = bit;
            start = i;
            len = 1;
        }
    }
    widths.push(len);
    starts.push(start);
    (widths, starts)
}

/// Normalize run widths to module counts (1..4). The base module is the
/// lower quartile of the widths, which stays stable against wide quiet runs.
fn quantize_modules(widths: &[usize]) -> Vec<u8> {
    let mut sorted = widths.to_vec();
    sorted.sort_unstable();
    let base = sorted[sorted.len() / 4].max(1);
    widths
        .iter()
        .map(|&w| (((w + base / 2) / base).clamp(1, 4)) as u8)
        .collect()
}

fn find_start_guard(mask: &[bool], starts: &[usize], modules: &[u8]) -> Option<usize> {
    for i in 0..modules.len().saturating_sub(2) {
        if modules[i] == 1 && modules[i + 1] == 1 && modules[i + 2] == 1 && mask[starts[i]] {
            return Some(i);
        }
    }
    None
}

fn matches_units(modules: &[u8], idx: usize, count: usize) -> bool {
    idx + count <= modules.len() && modules[idx..idx + count].iter().all(|&m| m == 1)
}

fn module_quad(modules: &[u8], idx: usize) -> Option<[u8; 4]> {
    if idx + 4 > modules.len() {
        return None;
    }
    Some([
        modules[idx],
        modules[idx + 1],
        modules[idx + 2],
        modules[idx + 3],
    ])
}

/// Nearest digit by Manhattan distance over the four run widths.
fn closest(pat: &[u8; 4], table: &[[u8; 4]; 10]) -> (u8, u32) {
    let mut best = (0u8, u32::MAX);
    for (digit, candidate) in table.iter().enumerate() {
        let dist: u32 = pat
            .iter()
            .zip(candidate.iter())
            .map(|(&p, &q)| (p as i32 - q as i32).unsigned_abs())
            .sum();
        if dist < best.1 {
            best = (digit as u8, dist);
        }
    }
    best
}

fn first_digit(parity: &[bool; 6]) -> Option<u8> {
    PARITY_MASKS
        .iter()
        .position(|mask| mask == parity)
        .map(|d| d as u8)
}

/// Standard EAN-13 check digit over the first twelve digits.
pub fn checksum_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .take(12)
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}

/// Append the check digit to a 12-digit prefix. Returns `None` if the input
/// is not exactly twelve ASCII digits.
pub fn with_checksum(prefix: &str) -> Option<String> {
    if prefix.len() != 12 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: Vec<u8> = prefix.bytes().map(|b| b - b'0').collect();
    let mut out = prefix.to_string();
    out.push(char::from(b'0' + checksum_digit(&digits)));
    Some(out)
}

/// Synthesize one ideal luma row for a 13-digit EAN string, `unit` pixels per
/// module, with quiet zones on both sides. Used by the simulated camera and
/// the detector tests. Returns `None` for inputs that are not 13 digits.
pub fn render_strip(digits: &str, unit: usize) -> Option<Vec<u8>> {
    if digits.len() != 13 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let ds: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
    let mask = PARITY_MASKS[ds[0] as usize];

    let mut modules: Vec<u8> = Vec::new();
    modules.push(9); // leading quiet zone (white)
    modules.extend([1, 1, 1]); // start guard

    for i in 0..6 {
        let d = ds[1 + i] as usize;
        let pat = if mask[i] { B_PATTERNS[d] } else { A_PATTERNS[d] };
        modules.extend(pat);
    }
    modules.extend([1, 1, 1, 1, 1]); // center guard
    for i in 0..6 {
        modules.extend(C_PATTERNS[ds[7 + i] as usize]);
    }
    modules.extend([1, 1, 1]); // end guard
    modules.push(9); // trailing quiet zone

    // Alternate white/black starting from the white quiet zone.
    let mut pixels = Vec::new();
    let mut dark = false;
    for m in modules {
        let value = if dark { 0u8 } else { 255u8 };
        pixels.extend(std::iter::repeat(value).take(m as usize * unit));
        dark = !dark;
    }
    Some(pixels)
}
