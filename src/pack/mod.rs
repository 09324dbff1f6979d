//! Packing: Rust values → MessagePack bytes.
//!
//! Every operation writes one wire value (or one collection header) and
//! returns the packer so calls can be chained with `?`:
//!
//! ```
//! use rawpack::pack::Packer;
//!
//! let mut packer = Packer::new(Vec::new());
//! packer.pack_array_header(2)?.pack_i64(-1)?.pack_str("ok")?;
//! assert_eq!(packer.into_inner(), vec![0x92, 0xFF, 0xA2, b'o', b'k']);
//! # Ok::<(), rawpack::Error>(())
//! ```
//!
//! Integers always take the smallest encoding that round-trips the value.

mod sink;

pub use sink::{ByteSink, IoSink};

use std::any::Any;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::format::{self, marker};
use crate::packable::Packable;
use crate::value::Value;

/// Writes MessagePack values to a [`ByteSink`].
///
/// A packer is not synchronized; use one instance per call chain.
pub struct Packer<S> {
    sink: S,
}

impl<S: ByteSink> Packer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Writes a marker followed by an `N`-byte big-endian payload in one
    /// sink call, staged in a small scratch array.
    fn write_marked<const N: usize>(&mut self, m: u8, payload: [u8; N]) -> Result<&mut Self> {
        let mut scratch = [0u8; 9];
        scratch[0] = m;
        scratch[1..=N].copy_from_slice(&payload);
        self.sink.write_slice(&scratch[..=N])?;
        Ok(self)
    }

    fn write_marker(&mut self, m: u8) -> Result<&mut Self> {
        self.sink.write_u8(m)?;
        Ok(self)
    }

    pub fn pack_nil(&mut self) -> Result<&mut Self> {
        self.write_marker(marker::NIL)
    }

    pub fn pack_bool(&mut self, value: bool) -> Result<&mut Self> {
        self.write_marker(if value { marker::TRUE } else { marker::FALSE })
    }

    pub fn pack_f32(&mut self, value: f32) -> Result<&mut Self> {
        self.write_marked(marker::FLOAT_32, value.to_be_bytes())
    }

    pub fn pack_f64(&mut self, value: f64) -> Result<&mut Self> {
        self.write_marked(marker::FLOAT_64, value.to_be_bytes())
    }

    /// Packs an unsigned integer using the smallest representation:
    /// positive fixnum, then uint8, uint16, uint32, uint64.
    pub fn pack_u64(&mut self, value: u64) -> Result<&mut Self> {
        if value <= format::MAX_POSITIVE_FIXNUM as u64 {
            self.write_marker(value as u8)
        } else if value <= format::MAX_UINT_8 {
            self.write_marked(marker::UINT_8, [value as u8])
        } else if value <= format::MAX_UINT_16 {
            self.write_marked(marker::UINT_16, (value as u16).to_be_bytes())
        } else if value <= format::MAX_UINT_32 {
            self.write_marked(marker::UINT_32, (value as u32).to_be_bytes())
        } else {
            self.write_marked(marker::UINT_64, value.to_be_bytes())
        }
    }

    /// Packs a signed integer using the smallest representation.
    /// Non-negative values follow the unsigned rules; negative values try
    /// negative fixnum, then int8, int16, int32, int64.
    pub fn pack_i64(&mut self, value: i64) -> Result<&mut Self> {
        if let Ok(unsigned) = u64::try_from(value) {
            self.pack_u64(unsigned)
        } else if value >= format::MIN_NEGATIVE_FIXNUM {
            self.write_marker(value as u8)
        } else if value >= format::MIN_INT_8 {
            self.write_marked(marker::INT_8, (value as i8).to_be_bytes())
        } else if value >= format::MIN_INT_16 {
            self.write_marked(marker::INT_16, (value as i16).to_be_bytes())
        } else if value >= format::MIN_INT_32 {
            self.write_marked(marker::INT_32, (value as i32).to_be_bytes())
        } else {
            self.write_marked(marker::INT_64, value.to_be_bytes())
        }
    }

    pub fn pack_i8(&mut self, value: i8) -> Result<&mut Self> {
        self.pack_i64(i64::from(value))
    }

    pub fn pack_i16(&mut self, value: i16) -> Result<&mut Self> {
        self.pack_i64(i64::from(value))
    }

    pub fn pack_i32(&mut self, value: i32) -> Result<&mut Self> {
        self.pack_i64(i64::from(value))
    }

    pub fn pack_u8(&mut self, value: u8) -> Result<&mut Self> {
        self.pack_u64(u64::from(value))
    }

    pub fn pack_u16(&mut self, value: u16) -> Result<&mut Self> {
        self.pack_u64(u64::from(value))
    }

    pub fn pack_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.pack_u64(u64::from(value))
    }

    /// Writes a raw header for a payload of `len` bytes. The caller writes
    /// the payload itself.
    pub fn pack_raw_header(&mut self, len: usize) -> Result<&mut Self> {
        if len <= format::MAX_FIX_RAW_LEN {
            self.write_marker(format::encode_fix_raw_len(len))
        } else if len <= format::MAX_RAW_16_LEN {
            self.write_marked(marker::RAW_16, (len as u16).to_be_bytes())
        } else {
            let len = length_32(len, "raw")?;
            self.write_marked(marker::RAW_32, len.to_be_bytes())
        }
    }

    pub fn pack_bytes(&mut self, value: &[u8]) -> Result<&mut Self> {
        self.pack_raw_header(value.len())?;
        self.sink.write_slice(value)?;
        Ok(self)
    }

    /// Packs a string as raw bytes (size = UTF-8 byte length).
    pub fn pack_str(&mut self, value: &str) -> Result<&mut Self> {
        self.pack_bytes(value.as_bytes())
    }

    /// Packs `None` as nil.
    pub fn pack_opt_bytes(&mut self, value: Option<&[u8]>) -> Result<&mut Self> {
        match value {
            Some(b) => self.pack_bytes(b),
            None => self.pack_nil(),
        }
    }

    /// Packs `None` as nil.
    pub fn pack_opt_str(&mut self, value: Option<&str>) -> Result<&mut Self> {
        match value {
            Some(s) => self.pack_str(s),
            None => self.pack_nil(),
        }
    }

    /// Writes an array header; the caller then packs `len` elements.
    pub fn pack_array_header(&mut self, len: usize) -> Result<&mut Self> {
        if len <= format::MAX_FIX_ARRAY_LEN {
            self.write_marker(format::encode_fix_array_len(len))
        } else if len <= format::MAX_ARRAY_16_LEN {
            self.write_marked(marker::ARRAY_16, (len as u16).to_be_bytes())
        } else {
            let len = length_32(len, "array")?;
            self.write_marked(marker::ARRAY_32, len.to_be_bytes())
        }
    }

    /// Writes a map header; the caller then packs `len` key/value pairs.
    pub fn pack_map_header(&mut self, len: usize) -> Result<&mut Self> {
        if len <= format::MAX_FIX_MAP_LEN {
            self.write_marker(format::encode_fix_map_len(len))
        } else if len <= format::MAX_MAP_16_LEN {
            self.write_marked(marker::MAP_16, (len as u16).to_be_bytes())
        } else {
            let len = length_32(len, "map")?;
            self.write_marked(marker::MAP_32, len.to_be_bytes())
        }
    }

    /// Packs a dynamically shaped value, recursing into arrays and maps.
    pub fn pack_value(&mut self, value: &Value) -> Result<&mut Self> {
        match value {
            Value::Nil => self.pack_nil(),
            Value::Bool(b) => self.pack_bool(*b),
            Value::UInt(u) => self.pack_u64(*u),
            Value::Int(i) => self.pack_i64(*i),
            Value::F32(f) => self.pack_f32(*f),
            Value::F64(d) => self.pack_f64(*d),
            Value::Raw(b) => self.pack_bytes(b),
            Value::Array(items) => {
                self.pack_array_header(items.len())?;
                for item in items {
                    self.pack_value(item)?;
                }
                Ok(self)
            }
            Value::Map(entries) => {
                self.pack_map_header(entries.len())?;
                for (k, v) in entries {
                    self.pack_value(k)?;
                    self.pack_value(v)?;
                }
                Ok(self)
            }
        }
    }

    /// Packs any [`Packable`] type.
    pub fn pack<T: Packable + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        value.pack_into(self)?;
        Ok(self)
    }

    /// Packs a value whose concrete type is only known at run time.
    ///
    /// Recognizes `()`, `bool`, the primitive integers and floats, `String`,
    /// `&'static str`, `Vec<u8>` and [`Bytes`] (both as raw), [`Value`] and
    /// `Option<Value>`. Anything else fails with `UnsupportedType` naming
    /// the type.
    pub fn pack_any<T: Any>(&mut self, value: &T) -> Result<&mut Self> {
        let any = value as &dyn Any;

        macro_rules! dispatch {
            ($($ty:ty => |$v:ident| $pack:expr),* $(,)?) => {
                $(
                    if let Some($v) = any.downcast_ref::<$ty>() {
                        return $pack;
                    }
                )*
            };
        }

        dispatch! {
            () => |_unit| self.pack_nil(),
            bool => |v| self.pack_bool(*v),
            i8 => |v| self.pack_i8(*v),
            i16 => |v| self.pack_i16(*v),
            i32 => |v| self.pack_i32(*v),
            i64 => |v| self.pack_i64(*v),
            isize => |v| self.pack_i64(*v as i64),
            u8 => |v| self.pack_u8(*v),
            u16 => |v| self.pack_u16(*v),
            u32 => |v| self.pack_u32(*v),
            u64 => |v| self.pack_u64(*v),
            usize => |v| self.pack_u64(*v as u64),
            f32 => |v| self.pack_f32(*v),
            f64 => |v| self.pack_f64(*v),
            String => |v| self.pack_str(v),
            &'static str => |v| self.pack_str(v),
            Vec<u8> => |v| self.pack_bytes(v),
            Bytes => |v| self.pack_bytes(v),
            Value => |v| self.pack_value(v),
            Option<Value> => |v| match v {
                Some(v) => self.pack_value(v),
                None => self.pack_nil(),
            },
        }

        Err(Error::UnsupportedType(std::any::type_name::<T>()))
    }
}

fn length_32(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        Error::LimitExceeded(format!("{what} length {len} exceeds 32-bit length field"))
    })
}
