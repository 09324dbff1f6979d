//! MessagePack marker (type-tag) byte constants.

// Nil
pub const NIL: u8 = 0xC0;

// Boolean
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

// Float (IEEE 754, big-endian payload)
pub const FLOAT_32: u8 = 0xCA;
pub const FLOAT_64: u8 = 0xCB;

// Unsigned integer (beyond positive fixnum range)
pub const UINT_8: u8 = 0xCC;
pub const UINT_16: u8 = 0xCD;
pub const UINT_32: u8 = 0xCE;
pub const UINT_64: u8 = 0xCF;

// Signed integer (beyond fixnum range)
pub const INT_8: u8 = 0xD0;
pub const INT_16: u8 = 0xD1;
pub const INT_32: u8 = 0xD2;
pub const INT_64: u8 = 0xD3;

// Fixnum: single byte
// Positive: 0x00..=0x7F (0..127)
// Negative: 0xE0..=0xFF (-32..-1)

// Raw (strings and byte strings share one family)
// FIX_RAW: 0xA0..=0xBF (low 5 bits = byte length 0..31)
pub const RAW_16: u8 = 0xDA;
pub const RAW_32: u8 = 0xDB;

// Array
// FIX_ARRAY: 0x90..=0x9F (low 4 bits = item count 0..15)
pub const ARRAY_16: u8 = 0xDC;
pub const ARRAY_32: u8 = 0xDD;

// Map
// FIX_MAP: 0x80..=0x8F (low 4 bits = entry count 0..15)
pub const MAP_16: u8 = 0xDE;
pub const MAP_32: u8 = 0xDF;

// Prefixes for the fixed-length families.
pub const FIX_RAW_PREFIX: u8 = 0xA0;
pub const FIX_ARRAY_PREFIX: u8 = 0x90;
pub const FIX_MAP_PREFIX: u8 = 0x80;
pub const NEGATIVE_FIXNUM_PREFIX: u8 = 0xE0;
