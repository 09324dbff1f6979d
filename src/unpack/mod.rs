//! Unpacking: MessagePack bytes → Rust values.
//!
//! [`Unpacker`] reads from an [`InputBuffer`] and calls its [`Refill`]
//! whenever a read needs more bytes than are resident. Values must be read in
//! the order they were packed.
//!
//! Integer readers are lenient about width: any integer marker is accepted as
//! long as the decoded value fits the requested type, so a `uint32` marker
//! carrying `10` satisfies [`Unpacker::unpack_u8`]. Values that do not fit
//! fail with `Overflow`; markers of the wrong family fail with
//! `TypeMismatch` after the marker has been consumed.

mod buffer;
mod config;

pub use buffer::InputBuffer;
pub use config::{
    UnpackerConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_DEPTH,
};

use std::collections::HashMap;
use std::hash::Hash;
use std::iter::FusedIterator;

use bytes::Buf;

use crate::error::{Error, Result};
use crate::format::{self, marker};
use crate::packable::Packable;
use crate::value::{narrow_f64, Value};

/// Upper bound on up-front allocation for declared collection lengths.
const MAX_PREALLOC: usize = 1024;

/// Supplies more input when the unpacker runs short.
///
/// `missing` is how many more bytes the pending read needs. Implementations
/// add at least one byte to `buf` (typically through
/// [`InputBuffer::ensure_capacity`] and [`InputBuffer::fill_with`]) and
/// return `true`, or return `false` once the input is exhausted. A refill may
/// block; it is the only point where an unpacker waits. Returning `true`
/// without adding a byte is treated as end of input.
pub trait Refill {
    fn refill(&mut self, buf: &mut InputBuffer, missing: usize) -> Result<bool>;
}

impl<F> Refill for F
where
    F: FnMut(&mut InputBuffer, usize) -> Result<bool>,
{
    fn refill(&mut self, buf: &mut InputBuffer, missing: usize) -> Result<bool> {
        self(buf, missing)
    }
}

/// Refill for fully resident input: there is never more.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRefill;

impl Refill for NoRefill {
    fn refill(&mut self, _buf: &mut InputBuffer, _missing: usize) -> Result<bool> {
        Ok(false)
    }
}

/// An integer as it appeared on the wire.
#[derive(Debug, Clone, Copy)]
enum WireInt {
    Unsigned(u64),
    Signed(i64),
}

impl From<WireInt> for Value {
    fn from(int: WireInt) -> Self {
        match int {
            WireInt::Unsigned(u) => Value::UInt(u),
            WireInt::Signed(i) => Value::from(i),
        }
    }
}

/// Reads MessagePack values from a buffered, refillable input.
///
/// An unpacker must not be shared between threads without external
/// synchronization, and any error leaves it unusable: the position may sit
/// inside a partially read value.
pub struct Unpacker<R> {
    buffer: InputBuffer,
    refill: R,
    max_depth: usize,
}

impl Unpacker<NoRefill> {
    /// Unpacks from an in-memory copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            buffer: InputBuffer::from_vec(data),
            refill: NoRefill,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl<R: Refill> Unpacker<R> {
    pub fn new(refill: R) -> Self {
        Self::with_config(refill, &UnpackerConfig::default())
    }

    pub fn with_config(refill: R, config: &UnpackerConfig) -> Self {
        Self {
            buffer: InputBuffer::new(config.get_initial_capacity(), config.get_max_buffer_size()),
            refill,
            max_depth: config.get_max_depth(),
        }
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn get_ref(&self) -> &R {
        &self.refill
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.refill
    }

    pub fn into_inner(self) -> R {
        self.refill
    }

    // -- Buffer access --

    /// Refills until `n` bytes are resident. Returns `false` if the input
    /// ends first, or if a refill reports progress without adding bytes.
    fn fill_to(&mut self, n: usize) -> Result<bool> {
        while self.buffer.remaining() < n {
            let before = self.buffer.remaining();
            if !self.refill.refill(&mut self.buffer, n - before)? {
                return Ok(false);
            }
            if self.buffer.remaining() == before {
                tracing::debug!(unread = before, "refill returned true without adding input");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn more(&mut self, n: usize) -> Result<()> {
        if self.fill_to(n)? {
            Ok(())
        } else {
            Err(Error::UnexpectedEof)
        }
    }

    fn peek_marker(&mut self) -> Result<u8> {
        self.more(1)?;
        Ok(self.buffer.unread()[0])
    }

    fn read_marker(&mut self) -> Result<u8> {
        let m = self.peek_marker()?;
        self.buffer.consume(1);
        Ok(m)
    }

    /// Reads an `n`-byte big-endian field with `get`.
    fn read_with<T>(&mut self, n: usize, get: impl FnOnce(&mut &[u8]) -> T) -> Result<T> {
        self.more(n)?;
        let mut unread = self.buffer.unread();
        let value = get(&mut unread);
        self.buffer.consume(n);
        Ok(value)
    }

    // -- Marker bodies --

    fn read_int_body(&mut self, m: u8) -> Result<WireInt> {
        let int = match m {
            _ if format::is_positive_fixnum(m) => WireInt::Unsigned(u64::from(m)),
            _ if format::is_negative_fixnum(m) => WireInt::Signed(i64::from(m as i8)),
            marker::UINT_8 => WireInt::Unsigned(u64::from(self.read_with(1, |b| b.get_u8())?)),
            marker::UINT_16 => WireInt::Unsigned(u64::from(self.read_with(2, |b| b.get_u16())?)),
            marker::UINT_32 => WireInt::Unsigned(u64::from(self.read_with(4, |b| b.get_u32())?)),
            marker::UINT_64 => WireInt::Unsigned(self.read_with(8, |b| b.get_u64())?),
            marker::INT_8 => WireInt::Signed(i64::from(self.read_with(1, |b| b.get_i8())?)),
            marker::INT_16 => WireInt::Signed(i64::from(self.read_with(2, |b| b.get_i16())?)),
            marker::INT_32 => WireInt::Signed(i64::from(self.read_with(4, |b| b.get_i32())?)),
            marker::INT_64 => WireInt::Signed(self.read_with(8, |b| b.get_i64())?),
            _ => return Err(Error::mismatch("integer", m)),
        };
        Ok(int)
    }

    fn read_raw_len_body(&mut self, m: u8) -> Result<usize> {
        match m {
            _ if format::is_fix_raw(m) => Ok(format::decode_fix_raw_len(m)),
            marker::RAW_16 => Ok(usize::from(self.read_with(2, |b| b.get_u16())?)),
            marker::RAW_32 => Ok(self.read_with(4, |b| b.get_u32())? as usize),
            _ => Err(Error::mismatch("raw", m)),
        }
    }

    fn read_array_len_body(&mut self, m: u8) -> Result<usize> {
        match m {
            _ if format::is_fix_array(m) => Ok(format::decode_fix_array_len(m)),
            marker::ARRAY_16 => Ok(usize::from(self.read_with(2, |b| b.get_u16())?)),
            marker::ARRAY_32 => Ok(self.read_with(4, |b| b.get_u32())? as usize),
            _ => Err(Error::mismatch("array", m)),
        }
    }

    fn read_map_len_body(&mut self, m: u8) -> Result<usize> {
        match m {
            _ if format::is_fix_map(m) => Ok(format::decode_fix_map_len(m)),
            marker::MAP_16 => Ok(usize::from(self.read_with(2, |b| b.get_u16())?)),
            marker::MAP_32 => Ok(self.read_with(4, |b| b.get_u32())? as usize),
            _ => Err(Error::mismatch("map", m)),
        }
    }

    // -- Scalars --

    pub fn unpack_nil(&mut self) -> Result<()> {
        let m = self.read_marker()?;
        if m == marker::NIL {
            Ok(())
        } else {
            Err(Error::mismatch("nil", m))
        }
    }

    /// Consumes a nil if one is next. Any other marker is left unread, and a
    /// clean end of input yields `false`.
    pub fn try_unpack_nil(&mut self) -> Result<bool> {
        if !self.fill_to(1)? {
            return Ok(false);
        }
        if self.peek_marker()? == marker::NIL {
            self.buffer.consume(1);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn unpack_bool(&mut self) -> Result<bool> {
        match self.read_marker()? {
            marker::FALSE => Ok(false),
            marker::TRUE => Ok(true),
            m => Err(Error::mismatch("bool", m)),
        }
    }

    /// Reads a float32 or float64. A float64 whose finite value lies outside
    /// the `f32` range fails with `Overflow`.
    pub fn unpack_f32(&mut self) -> Result<f32> {
        match self.read_marker()? {
            marker::FLOAT_32 => self.read_with(4, |b| b.get_f32()),
            marker::FLOAT_64 => narrow_f64(self.read_with(8, |b| b.get_f64())?),
            m => Err(Error::mismatch("float", m)),
        }
    }

    pub fn unpack_f64(&mut self) -> Result<f64> {
        match self.read_marker()? {
            marker::FLOAT_32 => Ok(f64::from(self.read_with(4, |b| b.get_f32())?)),
            marker::FLOAT_64 => self.read_with(8, |b| b.get_f64()),
            m => Err(Error::mismatch("float", m)),
        }
    }

    fn unpack_integer<T>(&mut self) -> Result<T>
    where
        T: TryFrom<u64> + TryFrom<i64>,
    {
        let m = self.read_marker()?;
        match self.read_int_body(m)? {
            WireInt::Unsigned(v) => {
                <T as TryFrom<u64>>::try_from(v).map_err(|_| Error::overflow::<T>())
            }
            WireInt::Signed(v) => {
                <T as TryFrom<i64>>::try_from(v).map_err(|_| Error::overflow::<T>())
            }
        }
    }

    pub fn unpack_i8(&mut self) -> Result<i8> {
        self.unpack_integer()
    }

    pub fn unpack_i16(&mut self) -> Result<i16> {
        self.unpack_integer()
    }

    pub fn unpack_i32(&mut self) -> Result<i32> {
        self.unpack_integer()
    }

    pub fn unpack_i64(&mut self) -> Result<i64> {
        self.unpack_integer()
    }

    /// Unsigned readers treat negative values as overflow.
    pub fn unpack_u8(&mut self) -> Result<u8> {
        self.unpack_integer()
    }

    pub fn unpack_u16(&mut self) -> Result<u16> {
        self.unpack_integer()
    }

    pub fn unpack_u32(&mut self) -> Result<u32> {
        self.unpack_integer()
    }

    pub fn unpack_u64(&mut self) -> Result<u64> {
        self.unpack_integer()
    }

    // -- Raw --

    /// Reads a raw header and returns the payload length. The payload is
    /// left unread; follow with [`unpack_raw_body`](Self::unpack_raw_body).
    pub fn unpack_raw_length(&mut self) -> Result<usize> {
        let m = self.read_marker()?;
        self.read_raw_len_body(m)
    }

    /// Consumes `len` payload bytes.
    pub fn unpack_raw_body(&mut self, len: usize) -> Result<Vec<u8>> {
        self.more(len)?;
        let body = self.buffer.unread()[..len].to_vec();
        self.buffer.consume(len);
        Ok(body)
    }

    /// Reads a raw value, or `None` for nil.
    pub fn unpack_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        if self.try_unpack_nil()? {
            return Ok(None);
        }
        let len = self.unpack_raw_length()?;
        self.unpack_raw_body(len).map(Some)
    }

    /// Reads a raw value as UTF-8 text, or `None` for nil.
    pub fn unpack_string(&mut self) -> Result<Option<String>> {
        match self.unpack_bytes()? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    // -- Collections --

    /// Reads an array header; the caller then reads that many elements.
    pub fn unpack_array_header(&mut self) -> Result<usize> {
        let m = self.read_marker()?;
        self.read_array_len_body(m)
    }

    /// Reads a map header; the caller then reads that many key/value pairs.
    pub fn unpack_map_header(&mut self) -> Result<usize> {
        let m = self.read_marker()?;
        self.read_map_len_body(m)
    }

    pub fn unpack_array<T: Packable>(&mut self) -> Result<Vec<T>> {
        let len = self.unpack_array_header()?;
        let mut items = Vec::with_capacity(len.min(MAX_PREALLOC));
        for _ in 0..len {
            items.push(T::unpack_from(self)?);
        }
        Ok(items)
    }

    pub fn unpack_map<K, V>(&mut self) -> Result<HashMap<K, V>>
    where
        K: Packable + Eq + Hash,
        V: Packable,
    {
        let len = self.unpack_map_header()?;
        let mut map = HashMap::with_capacity(len.min(MAX_PREALLOC));
        for _ in 0..len {
            let k = K::unpack_from(self)?;
            let v = V::unpack_from(self)?;
            map.insert(k, v);
        }
        Ok(map)
    }

    pub fn unpack<T: Packable>(&mut self) -> Result<T> {
        T::unpack_from(self)
    }

    // -- Dynamic --

    /// Reads the next value whatever its shape.
    pub fn unpack_value(&mut self) -> Result<Value> {
        self.unpack_value_at(0)
    }

    /// Like [`unpack_value`](Self::unpack_value), but returns `None` when the
    /// input ends cleanly before the next value. Input that ends inside a
    /// value is still `UnexpectedEof`.
    pub fn try_unpack_value(&mut self) -> Result<Option<Value>> {
        if !self.fill_to(1)? {
            return Ok(None);
        }
        self.unpack_value().map(Some)
    }

    /// Iterates over the remaining values until the input ends. Iteration
    /// stops after the first error.
    pub fn values(&mut self) -> Values<'_, R> {
        Values {
            unpacker: self,
            done: false,
        }
    }

    /// Depth for the children of a container opened at `depth`.
    fn enter(&self, depth: usize) -> Result<usize> {
        if depth >= self.max_depth {
            tracing::debug!(max_depth = self.max_depth, "nesting limit reached");
            return Err(Error::LimitExceeded(format!(
                "nesting deeper than {}",
                self.max_depth
            )));
        }
        Ok(depth + 1)
    }

    fn unpack_value_at(&mut self, depth: usize) -> Result<Value> {
        let m = self.read_marker()?;
        match m {
            marker::NIL => Ok(Value::Nil),
            marker::FALSE => Ok(Value::Bool(false)),
            marker::TRUE => Ok(Value::Bool(true)),
            marker::FLOAT_32 => Ok(Value::F32(self.read_with(4, |b| b.get_f32())?)),
            marker::FLOAT_64 => Ok(Value::F64(self.read_with(8, |b| b.get_f64())?)),
            marker::UINT_8..=marker::UINT_64 | marker::INT_8..=marker::INT_64 => {
                self.read_int_body(m).map(Value::from)
            }
            marker::RAW_16 | marker::RAW_32 => self.read_raw_value(m),
            marker::ARRAY_16 | marker::ARRAY_32 => self.read_array_value(m, depth),
            marker::MAP_16 | marker::MAP_32 => self.read_map_value(m, depth),
            _ if format::is_positive_fixnum(m) || format::is_negative_fixnum(m) => {
                self.read_int_body(m).map(Value::from)
            }
            _ if format::is_fix_raw(m) => self.read_raw_value(m),
            _ if format::is_fix_array(m) => self.read_array_value(m, depth),
            _ if format::is_fix_map(m) => self.read_map_value(m, depth),
            _ => Err(Error::mismatch("value", m)),
        }
    }

    fn read_raw_value(&mut self, m: u8) -> Result<Value> {
        let len = self.read_raw_len_body(m)?;
        self.unpack_raw_body(len).map(Value::Raw)
    }

    fn read_array_value(&mut self, m: u8, depth: usize) -> Result<Value> {
        let len = self.read_array_len_body(m)?;
        let depth = self.enter(depth)?;
        let mut items = Vec::with_capacity(len.min(MAX_PREALLOC));
        for _ in 0..len {
            items.push(self.unpack_value_at(depth)?);
        }
        Ok(Value::Array(items))
    }

    fn read_map_value(&mut self, m: u8, depth: usize) -> Result<Value> {
        let len = self.read_map_len_body(m)?;
        let depth = self.enter(depth)?;
        let mut entries = Vec::with_capacity(len.min(MAX_PREALLOC));
        for _ in 0..len {
            let k = self.unpack_value_at(depth)?;
            let v = self.unpack_value_at(depth)?;
            entries.push((k, v));
        }
        Ok(Value::Map(entries))
    }
}

/// Iterator returned by [`Unpacker::values`].
pub struct Values<'a, R> {
    unpacker: &'a mut Unpacker<R>,
    done: bool,
}

impl<R: Refill> Iterator for Values<'_, R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.unpacker.try_unpack_value().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

impl<R: Refill> FusedIterator for Values<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pack::Packer;

    fn packed(f: impl FnOnce(&mut Packer<Vec<u8>>) -> Result<&mut Packer<Vec<u8>>>) -> Vec<u8> {
        let mut packer = Packer::new(Vec::new());
        f(&mut packer).expect("pack failed");
        packer.into_inner()
    }

    #[test]
    fn nil_and_bools() {
        let mut u = Unpacker::from_slice(&[0xC0, 0xC3, 0xC2]);
        u.unpack_nil().unwrap();
        assert!(u.unpack_bool().unwrap());
        assert!(!u.unpack_bool().unwrap());
    }

    #[test]
    fn bool_mismatch_consumes_marker() {
        let mut u = Unpacker::from_slice(&[0xC0, 0x05]);
        let err = u.unpack_bool().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(u.unpack_i32().unwrap(), 5);
    }

    #[test]
    fn try_unpack_nil_leaves_other_values() {
        let mut u = Unpacker::from_slice(&[0x2A, 0xC0]);
        assert!(!u.try_unpack_nil().unwrap());
        assert_eq!(u.unpack_i64().unwrap(), 42);
        assert!(u.try_unpack_nil().unwrap());
        assert_eq!(u.buffer().remaining(), 0);
    }

    #[test]
    fn try_unpack_nil_at_end_of_input() {
        let mut u = Unpacker::from_slice(&[]);
        assert!(!u.try_unpack_nil().unwrap());

        let mut u = Unpacker::from_slice(&[0xC0]);
        assert!(u.try_unpack_nil().unwrap());
        assert!(!u.try_unpack_nil().unwrap());
        assert_eq!(u.unpack_nil().unwrap_err().kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn stalled_refill_ends_input() {
        let mut calls = 0;
        let mut u = Unpacker::new(|_buf: &mut InputBuffer, _missing: usize| -> Result<bool> {
            calls += 1;
            Ok(true)
        });
        assert_eq!(u.unpack_u8().unwrap_err().kind(), ErrorKind::UnexpectedEof);
        assert_eq!(u.try_unpack_value().unwrap(), None);
        drop(u);
        assert_eq!(calls, 2);
    }

    #[test]
    fn integer_round_trips_at_boundaries() {
        let signed = [
            0,
            127,
            128,
            -1,
            -32,
            -33,
            -128,
            -129,
            i64::from(i16::MIN),
            i64::from(i16::MIN) - 1,
            i64::from(i32::MIN),
            i64::from(i32::MIN) - 1,
            i64::from(i32::MAX) + 1,
            i64::MIN,
            i64::MAX,
        ];
        for v in signed {
            let bytes = packed(|p| p.pack_i64(v));
            assert_eq!(Unpacker::from_slice(&bytes).unpack_i64().unwrap(), v, "failed for {v}");
        }
        for v in [0, 255, 256, 65535, 65536, u64::from(u32::MAX), u64::MAX] {
            let bytes = packed(|p| p.pack_u64(v));
            assert_eq!(Unpacker::from_slice(&bytes).unpack_u64().unwrap(), v, "failed for {v}");
        }
    }

    #[test]
    fn uint8_200_overflows_i8() {
        let mut u = Unpacker::from_slice(&[marker::UINT_8, 200]);
        let err = u.unpack_i8().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert!(matches!(err, Error::Overflow("i8")));
    }

    #[test]
    fn wide_marker_satisfies_narrow_target() {
        let bytes = [marker::UINT_32, 0, 0, 0, 10];
        assert_eq!(Unpacker::from_slice(&bytes).unpack_u16().unwrap(), 10);
        assert_eq!(Unpacker::from_slice(&bytes).unpack_u8().unwrap(), 10);
        assert_eq!(Unpacker::from_slice(&bytes).unpack_i8().unwrap(), 10);

        let bytes = [marker::INT_64, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE];
        assert_eq!(Unpacker::from_slice(&bytes).unpack_i8().unwrap(), -2);
    }

    #[test]
    fn negative_values_overflow_unsigned_targets() {
        let err = Unpacker::from_slice(&[0xFF]).unpack_u8().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        let err = Unpacker::from_slice(&[marker::INT_8, 0x80]).unpack_u64().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn u64_max_overflows_i64() {
        let bytes = packed(|p| p.pack_u64(u64::MAX));
        let err = Unpacker::from_slice(&bytes).unpack_i64().unwrap_err();
        assert!(matches!(err, Error::Overflow("i64")));
    }

    #[test]
    fn integer_rejects_other_markers() {
        let err = Unpacker::from_slice(&[0xA1, b'x']).unpack_i32().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        let err = Unpacker::from_slice(&[marker::FLOAT_32, 0, 0, 0, 0]).unpack_u8().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn float_round_trips() {
        for v in [0.0, -0.0, 1.5, f64::MAX, f64::MIN_POSITIVE, f64::INFINITY, f64::NEG_INFINITY] {
            let bytes = packed(|p| p.pack_f64(v));
            let back = Unpacker::from_slice(&bytes).unpack_f64().unwrap();
            assert_eq!(back.to_bits(), v.to_bits(), "failed for {v}");
        }
        let bytes = packed(|p| p.pack_f64(f64::NAN));
        assert!(Unpacker::from_slice(&bytes).unpack_f64().unwrap().is_nan());

        let bytes = packed(|p| p.pack_f32(-0.0));
        let back = Unpacker::from_slice(&bytes).unpack_f32().unwrap();
        assert_eq!(back.to_bits(), (-0.0f32).to_bits());
    }

    #[test]
    fn float_markers_are_interchangeable() {
        let bytes = packed(|p| p.pack_f32(2.5)?.pack_f64(0.5));
        let mut u = Unpacker::from_slice(&bytes);
        assert_eq!(u.unpack_f64().unwrap(), 2.5);
        assert_eq!(u.unpack_f32().unwrap(), 0.5);
    }

    #[test]
    fn float64_out_of_f32_range_overflows() {
        let bytes = packed(|p| p.pack_f64(1e300));
        let err = Unpacker::from_slice(&bytes).unpack_f32().unwrap_err();
        assert!(matches!(err, Error::Overflow("f32")));

        let bytes = packed(|p| p.pack_f64(f64::NEG_INFINITY));
        assert_eq!(Unpacker::from_slice(&bytes).unpack_f32().unwrap(), f32::NEG_INFINITY);
    }

    #[test]
    fn strings_and_bytes() {
        let long = "x".repeat(70_000);
        let bytes = packed(|p| {
            p.pack_str("")?
                .pack_str("hello")?
                .pack_str(&long)?
                .pack_bytes(&[])?
                .pack_opt_bytes(None)
        });
        let mut u = Unpacker::from_slice(&bytes);
        assert_eq!(u.unpack_string().unwrap().as_deref(), Some(""));
        assert_eq!(u.unpack_string().unwrap().as_deref(), Some("hello"));
        assert_eq!(u.unpack_string().unwrap(), Some(long));
        assert_eq!(u.unpack_bytes().unwrap(), Some(Vec::new()));
        assert_eq!(u.unpack_bytes().unwrap(), None);
    }

    #[test]
    fn raw_length_leaves_payload() {
        let mut u = Unpacker::from_slice(&[0xDA, 0x00, 0x03, 1, 2, 3]);
        assert_eq!(u.unpack_raw_length().unwrap(), 3);
        assert_eq!(u.buffer().remaining(), 3);
        assert_eq!(u.unpack_raw_body(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn invalid_utf8_is_type_mismatch() {
        let err = Unpacker::from_slice(&[0xA2, 0xC3, 0x28]).unpack_string().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(matches!(err, Error::InvalidUtf8(_)));
    }

    #[test]
    fn collection_headers() {
        let bytes = packed(|p| {
            p.pack_array_header(16)?
                .pack_map_header(65536)?
                .pack_array_header(3)
        });
        assert_eq!(bytes[0], marker::ARRAY_16);
        let mut u = Unpacker::from_slice(&bytes);
        assert_eq!(u.unpack_array_header().unwrap(), 16);
        assert_eq!(u.unpack_map_header().unwrap(), 65536);
        let err = u.unpack_map_header().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn truncated_input_is_unexpected_eof() {
        let err = Unpacker::from_slice(&[marker::UINT_32, 0, 0]).unpack_u32().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        let err = Unpacker::from_slice(&[0xDB, 0xFF, 0xFF, 0xFF, 0xFF]).unpack_bytes().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        let err = Unpacker::from_slice(&[]).unpack_nil().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn dynamic_value_round_trip() {
        let value = Value::Array(vec![
            Value::Nil,
            Value::Bool(true),
            Value::UInt(u64::MAX),
            Value::Int(-70_000),
            Value::F32(1.25),
            Value::F64(f64::NAN),
            Value::from("text"),
            Value::Raw(Vec::new()),
            Value::Array(Vec::new()),
            Value::Map(vec![(Value::UInt(1), Value::Map(Vec::new()))]),
        ]);
        let bytes = packed(|p| p.pack_value(&value));
        assert_eq!(Unpacker::from_slice(&bytes).unpack_value().unwrap(), value);
    }

    #[test]
    fn dynamic_integers_normalize_sign() {
        let mut u = Unpacker::from_slice(&[marker::INT_8, 0x05, marker::INT_8, 0xFB]);
        assert!(matches!(u.unpack_value().unwrap(), Value::UInt(5)));
        assert!(matches!(u.unpack_value().unwrap(), Value::Int(-5)));
    }

    #[test]
    fn dynamic_rejects_reserved_markers() {
        for m in [0xC1, 0xC4, 0xC9, 0xD4, 0xD9] {
            let err = Unpacker::from_slice(&[m]).unpack_value().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TypeMismatch, "marker 0x{m:02X}");
        }
    }

    #[test]
    fn dynamic_depth_limit() {
        let config = UnpackerConfig::new().max_depth(2);
        let data = vec![0x91, 0x91, 0x90];
        let mut pending = Some(data);
        let mut u = Unpacker::with_config(
            move |buf: &mut InputBuffer, _missing: usize| match pending.take() {
                Some(data) => buf.fill(&data).map(|()| true),
                None => Ok(false),
            },
            &config,
        );
        let err = u.unpack_value().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LimitExceeded);

        let ok = Unpacker::from_slice(&[0x91, 0x90]).unpack_value().unwrap();
        assert_eq!(ok, Value::Array(vec![Value::Array(Vec::new())]));
    }

    #[test]
    fn try_unpack_value_distinguishes_clean_end() {
        let mut u = Unpacker::from_slice(&[0x01]);
        assert_eq!(u.try_unpack_value().unwrap(), Some(Value::UInt(1)));
        assert_eq!(u.try_unpack_value().unwrap(), None);

        let mut u = Unpacker::from_slice(&[0x92, 0x01]);
        let err = u.try_unpack_value().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn values_iterates_until_end() {
        let bytes = packed(|p| p.pack_i64(1)?.pack_str("a")?.pack_nil());
        let mut u = Unpacker::from_slice(&bytes);
        let values: Vec<Value> = u.values().collect::<Result<_>>().unwrap();
        assert_eq!(values, vec![Value::UInt(1), Value::from("a"), Value::Nil]);
    }

    #[test]
    fn values_stops_after_error() {
        let mut u = Unpacker::from_slice(&[0x01, 0xC1, 0x02]);
        let mut values = u.values();
        assert!(values.next().unwrap().is_ok());
        assert!(values.next().unwrap().is_err());
        assert!(values.next().is_none());
    }

    #[test]
    fn closure_refill_feeds_chunks() {
        let bytes = packed(|p| p.pack_u64(65536)?.pack_str("chunked"));
        let mut chunks = bytes.chunks(3).map(<[u8]>::to_vec).collect::<Vec<_>>().into_iter();
        let mut u = Unpacker::new(move |buf: &mut InputBuffer, _missing: usize| {
            match chunks.next() {
                Some(chunk) => buf.fill(&chunk).map(|()| true),
                None => Ok(false),
            }
        });
        assert_eq!(u.unpack_u32().unwrap(), 65536);
        assert_eq!(u.unpack_string().unwrap().as_deref(), Some("chunked"));
        assert_eq!(u.try_unpack_value().unwrap(), None);
    }

    #[test]
    fn unpack_list_of_ints_and_map() {
        let list: Vec<i64> = (1..=66_000).collect();
        let mut bytes = crate::to_vec(&list).unwrap();
        assert_eq!(bytes[0], marker::ARRAY_32);
        let map: HashMap<i32, i32> = (1..=20).map(|v| (v, v * 2)).collect();
        bytes.extend(crate::to_vec(&map).unwrap());

        let mut u = Unpacker::from_vec(bytes);
        assert_eq!(u.unpack_array::<i64>().unwrap(), list);
        assert_eq!(u.unpack_map::<i32, i32>().unwrap(), map);
    }
}
