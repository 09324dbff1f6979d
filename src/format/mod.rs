//! MessagePack wire format rules.
//!
//! Tag bytes live in [`marker`]; this module holds the fixnum and
//! length-encoding breakpoints plus the predicates and low-bit helpers for the
//! fixed-length families. Packer and Unpacker both read these values, so they
//! are the only place the breakpoints are written down. All multi-byte
//! payloads on the wire are big-endian.

pub mod marker;

/// Largest value encodable as a positive fixnum.
pub const MAX_POSITIVE_FIXNUM: i64 = 0x7F;
/// Smallest value encodable as a negative fixnum.
pub const MIN_NEGATIVE_FIXNUM: i64 = -32;

pub const MAX_UINT_8: u64 = u8::MAX as u64;
pub const MAX_UINT_16: u64 = u16::MAX as u64;
pub const MAX_UINT_32: u64 = u32::MAX as u64;

pub const MIN_INT_8: i64 = i8::MIN as i64;
pub const MIN_INT_16: i64 = i16::MIN as i64;
pub const MIN_INT_32: i64 = i32::MIN as i64;

pub const MAX_FIX_RAW_LEN: usize = 31;
pub const MAX_RAW_16_LEN: usize = 0xFFFF;
pub const MAX_FIX_ARRAY_LEN: usize = 15;
pub const MAX_ARRAY_16_LEN: usize = 0xFFFF;
pub const MAX_FIX_MAP_LEN: usize = 15;
pub const MAX_MAP_16_LEN: usize = 0xFFFF;

/// Largest length a 32-bit length field can carry.
pub const MAX_LEN_32: usize = u32::MAX as usize;

pub fn is_positive_fixnum(b: u8) -> bool {
    b & 0x80 == 0
}

pub fn is_negative_fixnum(b: u8) -> bool {
    b & 0xE0 == marker::NEGATIVE_FIXNUM_PREFIX
}

pub fn is_fix_raw(b: u8) -> bool {
    b & 0xE0 == marker::FIX_RAW_PREFIX
}

pub fn is_fix_array(b: u8) -> bool {
    b & 0xF0 == marker::FIX_ARRAY_PREFIX
}

pub fn is_fix_map(b: u8) -> bool {
    b & 0xF0 == marker::FIX_MAP_PREFIX
}

/// Builds a fix raw marker. `len` must be at most [`MAX_FIX_RAW_LEN`].
pub fn encode_fix_raw_len(len: usize) -> u8 {
    debug_assert!(len <= MAX_FIX_RAW_LEN);
    marker::FIX_RAW_PREFIX | len as u8
}

pub fn decode_fix_raw_len(b: u8) -> usize {
    usize::from(b & 0x1F)
}

/// Builds a fix array marker. `len` must be at most [`MAX_FIX_ARRAY_LEN`].
pub fn encode_fix_array_len(len: usize) -> u8 {
    debug_assert!(len <= MAX_FIX_ARRAY_LEN);
    marker::FIX_ARRAY_PREFIX | len as u8
}

pub fn decode_fix_array_len(b: u8) -> usize {
    usize::from(b & 0x0F)
}

/// Builds a fix map marker. `len` must be at most [`MAX_FIX_MAP_LEN`].
pub fn encode_fix_map_len(len: usize) -> u8 {
    debug_assert!(len <= MAX_FIX_MAP_LEN);
    marker::FIX_MAP_PREFIX | len as u8
}

pub fn decode_fix_map_len(b: u8) -> usize {
    usize::from(b & 0x0F)
}
