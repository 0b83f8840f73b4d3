//! Uplink payload encoding.
//!
//! A reading travels as a fixed 2-byte big-endian signed integer in
//! milliamps. Sub-mA precision is discarded by design; the ChirpStack codec
//! on the other end divides by 1000 again.

use core::fmt::Write;

use heapless::String;

/// Rendered hex length of the 2-byte payload.
pub const UPLINK_HEX_LEN: usize = 4;

/// Multiplies by 1000, truncates toward zero and clamps to the 16-bit
/// signed range before emitting big-endian bytes.
pub fn encode_current(amps: f32) -> [u8; 2] {
    let milliamps = (amps * 1000.0) as i32;
    let clamped = milliamps.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
    clamped.to_be_bytes()
}

/// Inverse of [`encode_current`], in milliamps.
pub fn decode_current(payload: [u8; 2]) -> i16 {
    i16::from_be_bytes(payload)
}

/// Uppercase hex rendering, two chars per byte.
pub fn hex_upper<const N: usize>(bytes: &[u8]) -> String<N> {
    let mut out = String::new();
    for b in bytes {
        write!(out, "{:02X}", b).ok();
    }
    out
}
