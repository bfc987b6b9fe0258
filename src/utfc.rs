//! UTF-C: a compact, zero-free encoding of Unicode text for dictionary keys.
//!
//! Text is coded relative to a moving window ("alphabet") of code points, so
//! runs of characters from one script cost one byte each. Characters outside
//! the window switch it with a two or three byte sequence. An auxiliary
//! alphabet of 64 code points (Latin letters, digits, space and `-` after
//! leaving Latin) stays reachable with one byte. Bytes 0xBB..=0xBF are zero
//! markers that stand in for 0x00 payload bytes, so the output never contains
//! a zero byte and can be stored in a dictionary that reserves label 0.

use smallvec::SmallVec;

use crate::error::{DawgError, Result};

const MAX_LATIN_CP: u32 = 0x02ff;
const MIN_21BIT_CP: u32 = 0x2600;

const OFFS_MASK_13BIT: u32 = 0xffff_ff80;
const OFFS_MASK_21BIT: u32 = 0xffff_8000;

const MARKER_AUX: u32 = 0xc0;
const MARKER_13BIT: u32 = 0x80;
const MARKER_21BIT: u32 = 0xa0;
const MARKER_EXTRA: u32 = 0xb0;

const MARKER_0: u8 = 0xbb;
const MARKER_00: u8 = 0xbc;
const MARKER_01: u8 = 0xbd;
const MARKER_10: u8 = 0xbe;
const MARKER_11: u8 = 0xbf;

const INIT_AUX_OFFS: u32 = 0x0410;

const RANGE_HK: (u32, u32) = (0x3000, 0x3100);

const RANGES_LATIN: [(u32, u32); 5] = [
    (0x41, 0x5b),
    (0x61, 0x7b),
    (0x30, 0x3a),
    (0x20, 0x21),
    (0x2d, 0x2e),
];

const RANGES_EXTRA: [(u32, u32); 4] = [
    (0x2000, 0x2600),
    RANGE_HK,
    (0xfe00, 0xfe10),
    (0x1f300, 0x1f5f0),
];

/// Where the auxiliary window starts when leaving the alphabet at `offs`.
/// Most scripts are not aligned to 64 code points, so their most frequent
/// block is picked by hand.
fn aux_offset(offs: u32) -> u32 {
    match offs {
        0x0080 => 0x00c0, // Latin-1 Supplement
        0x0380 => 0x0391, // Greek
        0x0400 => 0x0410, // Cyrillic
        0x0580 => 0x05be, // Hebrew
        0x0530 => 0x0531, // Armenian
        0x0600 => 0x060b, // Arabic
        0x0900 => 0x090d, // Devanagari
        0x0980 => 0x098f, // Bengali
        0x0a00 => 0x0a02, // Gurmukhi
        0x0a80 => 0x0a8f, // Gujarati
        0x0b00 => 0x0b0f, // Oriya
        0x0b80 => 0x0b8e, // Tamil
        0x0c80 => 0x0c8e, // Kannada
        0x0d00 => 0x0d0e, // Malayalam
        0x0d80 => 0x0d9b, // Sinhala
        0x0e00 => 0x0e01, // Thai
        0x0e80 => 0x0e81, // Lao
        0x0f00 => 0x0f40, // Tibetan
        0x0f80 => 0x0f90, // Tibetan
        0x1080 => 0x10b0, // Georgian
        0x3000 => 0x3040, // Hiragana
        other => other,
    }
}

fn in_ranges(cp: u32, ranges: &[(u32, u32)]) -> bool {
    ranges.iter().any(|&(lo, hi)| lo <= cp && cp < hi)
}

fn encode_ranges(cp: u32, ranges: &[(u32, u32)]) -> Option<u32> {
    let mut base = 0;
    for &(lo, hi) in ranges {
        if lo <= cp && cp < hi {
            return Some(base + cp - lo);
        }
        base += hi - lo;
    }
    None
}

fn decode_ranges(mut v: u32, ranges: &[(u32, u32)]) -> Option<u32> {
    for &(lo, hi) in ranges {
        if v < hi - lo {
            return Some(lo + v);
        }
        v -= hi - lo;
    }
    None
}

fn is_hk(cp: u32) -> bool {
    RANGE_HK.0 <= cp && cp < RANGE_HK.1
}

/// Shared coder state: the active window, the auxiliary window and whether
/// the active window is a 21-bit one.
struct State {
    offs: u32,
    aux_offs: u32,
    is_21bit: bool,
}

impl State {
    fn new() -> Self {
        State {
            offs: 0,
            aux_offs: INIT_AUX_OFFS,
            is_21bit: false,
        }
    }

    fn encode_char(&mut self, cp: u32, out: &mut SmallVec<[u8; 4]>) {
        if self.aux_offs == 0 && in_ranges(cp, &RANGES_LATIN) {
            let v = encode_ranges(cp, &RANGES_LATIN).unwrap_or(0);
            out.push((MARKER_AUX | v) as u8);
        } else if self.aux_offs != 0 && cp >= self.aux_offs && cp <= self.aux_offs + 0x3f {
            out.push((MARKER_AUX | (cp - self.aux_offs)) as u8);
        } else if in_ranges(cp, &RANGES_EXTRA) {
            let new_offs = cp & OFFS_MASK_13BIT;
            if !self.is_21bit && new_offs == self.offs {
                push_low(out, (cp & 0x7f) as u8);
                return;
            }
            let extra = encode_ranges(cp, &RANGES_EXTRA).unwrap_or(0);
            let marker = (MARKER_EXTRA | (1 + (extra >> 8))) as u8;
            let lo = extra as u8;
            if lo == 0 {
                out.extend_from_slice(&[MARKER_10, marker]);
            } else {
                out.extend_from_slice(&[marker, lo]);
            }
            // Only Hiragana and Katakana move the window.
            if is_hk(cp) {
                self.aux_offs = aux_offset(self.offs);
                self.offs = new_offs;
                self.is_21bit = false;
            }
        } else if cp >= MIN_21BIT_CP {
            let cp = cp - MIN_21BIT_CP;
            let new_offs = cp & OFFS_MASK_21BIT;
            if self.is_21bit && new_offs == self.offs {
                let hi = ((cp >> 8) & 0x7f) as u8;
                let lo = cp as u8;
                match (hi, lo) {
                    (0, 0) => out.push(MARKER_0),
                    (0, lo) => out.extend_from_slice(&[MARKER_00, lo]),
                    (hi, 0) => out.extend_from_slice(&[MARKER_10, hi]),
                    (hi, lo) => out.extend_from_slice(&[hi, lo]),
                }
                return;
            }
            let marker = (MARKER_21BIT | (cp >> 16)) as u8;
            let hi = (cp >> 8) as u8;
            let lo = cp as u8;
            match (hi, lo) {
                (0, 0) => out.extend_from_slice(&[MARKER_11, marker]),
                (0, lo) => out.extend_from_slice(&[MARKER_10, marker, lo]),
                (hi, 0) => out.extend_from_slice(&[MARKER_01, marker, hi]),
                (hi, lo) => out.extend_from_slice(&[marker, hi, lo]),
            }
            self.aux_offs = self.offs;
            self.offs = new_offs;
            self.is_21bit = true;
        } else {
            let new_offs = cp & OFFS_MASK_13BIT;
            if !self.is_21bit && new_offs == self.offs {
                push_low(out, (cp & 0x7f) as u8);
                return;
            }
            let marker = (MARKER_13BIT | (cp >> 8)) as u8;
            let lo = cp as u8;
            if lo == 0 {
                out.extend_from_slice(&[MARKER_10, marker]);
            } else {
                out.extend_from_slice(&[marker, lo]);
            }
            self.aux_offs = aux_offset(self.offs);
            self.offs = if cp <= MAX_LATIN_CP { 0 } else { new_offs };
            self.is_21bit = false;
        }
    }
}

fn push_low(out: &mut SmallVec<[u8; 4]>, lo: u8) {
    out.push(if lo == 0 { MARKER_0 } else { lo });
}

/// Streams the encoding of `text` into `f`, stopping as soon as `f` returns
/// false. Returns true if every byte was accepted.
///
/// Lets a caller walk a dictionary while encoding and give up at the first
/// missing transition without building the whole key.
pub fn follow<F: FnMut(u8) -> bool>(text: &str, mut f: F) -> bool {
    let mut state = State::new();
    let mut buf = SmallVec::<[u8; 4]>::new();
    for ch in text.chars() {
        buf.clear();
        state.encode_char(ch as u32, &mut buf);
        if !buf.iter().all(|&b| f(b)) {
            return false;
        }
    }
    true
}

/// Appends the encoding of `text` to `out`.
pub fn encode_into(text: &str, out: &mut Vec<u8>) {
    out.reserve(text.len());
    follow(text, |b| {
        out.push(b);
        true
    });
}

pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    encode_into(text, &mut out);
    out
}

const TRUNCATED: DawgError = DawgError::InvalidFormat("truncated utf-c sequence");
const INVALID: DawgError = DawgError::InvalidFormat("invalid utf-c sequence");

fn take(bytes: &[u8], i: &mut usize) -> Result<u32> {
    let b = *bytes.get(*i).ok_or(TRUNCATED)?;
    *i += 1;
    Ok(b as u32)
}

/// Decodes UTF-C bytes back to text.
///
/// # Errors
///
/// `InvalidFormat` if the bytes end inside a character or do not describe a
/// valid code point.
pub fn decode(bytes: &[u8]) -> Result<String> {
    let mut state = State::new();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let mut zm = 0;
        if (MARKER_0..=MARKER_11).contains(&bytes[i]) {
            zm = bytes[i];
            i += 1;
        }
        let mut cp = 0;
        if zm != MARKER_0 && zm != MARKER_00 {
            cp = take(bytes, &mut i)?;
        }

        if cp & MARKER_AUX == MARKER_AUX {
            cp = if state.aux_offs == 0 {
                decode_ranges(cp ^ MARKER_AUX, &RANGES_LATIN).ok_or(INVALID)?
            } else {
                state.aux_offs + (cp ^ MARKER_AUX)
            };
        } else if cp & MARKER_EXTRA == MARKER_EXTRA && cp != MARKER_EXTRA {
            let lo = if zm != MARKER_10 { take(bytes, &mut i)? } else { 0 };
            let extra = ((cp ^ MARKER_EXTRA) - 1) << 8 | lo;
            cp = decode_ranges(extra, &RANGES_EXTRA).ok_or(INVALID)?;
            if is_hk(cp) {
                state.aux_offs = aux_offset(state.offs);
                state.offs = cp & OFFS_MASK_13BIT;
                state.is_21bit = false;
            }
        } else if cp & MARKER_21BIT == MARKER_21BIT {
            let hi = if zm != MARKER_10 && zm != MARKER_11 {
                take(bytes, &mut i)?
            } else {
                0
            };
            let lo = if zm != MARKER_01 && zm != MARKER_11 {
                take(bytes, &mut i)?
            } else {
                0
            };
            cp = (cp ^ MARKER_21BIT) << 16 | hi << 8 | lo;
            state.aux_offs = state.offs;
            state.offs = cp & OFFS_MASK_21BIT;
            state.is_21bit = true;
            cp += MIN_21BIT_CP;
        } else if cp & MARKER_13BIT == MARKER_13BIT {
            let lo = if zm != MARKER_10 { take(bytes, &mut i)? } else { 0 };
            cp = (cp ^ MARKER_13BIT) << 8 | lo;
            state.aux_offs = aux_offset(state.offs);
            state.offs = if cp <= MAX_LATIN_CP {
                0
            } else {
                cp & OFFS_MASK_13BIT
            };
            state.is_21bit = false;
        } else if state.is_21bit {
            // A lone zero marker stands for both bytes.
            let lo = if zm != MARKER_10 && zm != MARKER_0 {
                take(bytes, &mut i)?
            } else {
                0
            };
            cp = MIN_21BIT_CP + (state.offs | cp << 8 | lo);
        } else {
            cp |= state.offs;
        }
        out.push(char::from_u32(cp).ok_or(INVALID)?);
    }
    Ok(out)
}
