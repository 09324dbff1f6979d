//! The `Packable` capability: types that write themselves with packer
//! primitives and read themselves back in the same order.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::format::marker;
use crate::pack::{ByteSink, Packer};
use crate::unpack::{Refill, Unpacker};
use crate::value::Value;

/// A type with a MessagePack representation.
///
/// Implementations delegate to [`Packer`] and [`Unpacker`] primitives and
/// must read fields in exactly the order they were written.
///
/// ```
/// use rawpack::{Packable, Result};
/// use rawpack::pack::{ByteSink, Packer};
/// use rawpack::unpack::{Refill, Unpacker};
///
/// #[derive(Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Packable for Point {
///     fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
///         packer.pack_array_header(2)?.pack_i32(self.x)?.pack_i32(self.y)?;
///         Ok(())
///     }
///
///     fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
///         let _len = unpacker.unpack_array_header()?;
///         Ok(Point { x: unpacker.unpack_i32()?, y: unpacker.unpack_i32()? })
///     }
/// }
///
/// let bytes = rawpack::to_vec(&Point { x: 1, y: -2 })?;
/// assert_eq!(rawpack::from_slice::<Point>(&bytes)?, Point { x: 1, y: -2 });
/// # Ok::<(), rawpack::Error>(())
/// ```
pub trait Packable {
    fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()>;

    fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self>
    where
        Self: Sized;
}

macro_rules! packable_primitive {
    ($($ty:ty => $pack:ident, $unpack:ident;)*) => {
        $(
            impl Packable for $ty {
                fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
                    packer.$pack(*self)?;
                    Ok(())
                }

                fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
                    unpacker.$unpack()
                }
            }
        )*
    };
}

packable_primitive! {
    bool => pack_bool, unpack_bool;
    i8 => pack_i8, unpack_i8;
    i16 => pack_i16, unpack_i16;
    i32 => pack_i32, unpack_i32;
    i64 => pack_i64, unpack_i64;
    u8 => pack_u8, unpack_u8;
    u16 => pack_u16, unpack_u16;
    u32 => pack_u32, unpack_u32;
    u64 => pack_u64, unpack_u64;
    f32 => pack_f32, unpack_f32;
    f64 => pack_f64, unpack_f64;
}

impl Packable for String {
    fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
        packer.pack_str(self)?;
        Ok(())
    }

    /// Nil is rejected; use `Option<String>` for nullable fields.
    fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
        unpacker
            .unpack_string()?
            .ok_or(Error::mismatch("raw", marker::NIL))
    }
}

impl Packable for Bytes {
    fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
        packer.pack_bytes(self)?;
        Ok(())
    }

    fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
        unpacker
            .unpack_bytes()?
            .map(Bytes::from)
            .ok_or(Error::mismatch("raw", marker::NIL))
    }
}

impl Packable for Value {
    fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
        packer.pack_value(self)?;
        Ok(())
    }

    fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
        unpacker.unpack_value()
    }
}

impl<T: Packable> Packable for Option<T> {
    fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
        match self {
            Some(v) => v.pack_into(packer),
            None => {
                packer.pack_nil()?;
                Ok(())
            }
        }
    }

    fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
        if unpacker.try_unpack_nil()? {
            Ok(None)
        } else {
            T::unpack_from(unpacker).map(Some)
        }
    }
}

impl<T: Packable> Packable for Vec<T> {
    fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
        packer.pack_array_header(self.len())?;
        for item in self {
            item.pack_into(packer)?;
        }
        Ok(())
    }

    fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
        unpacker.unpack_array()
    }
}

impl<K: Packable + Eq + Hash, V: Packable> Packable for HashMap<K, V> {
    fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
        packer.pack_map_header(self.len())?;
        for (k, v) in self {
            k.pack_into(packer)?;
            v.pack_into(packer)?;
        }
        Ok(())
    }

    fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
        unpacker.unpack_map()
    }
}

impl<K: Packable + Ord, V: Packable> Packable for BTreeMap<K, V> {
    fn pack_into<S: ByteSink>(&self, packer: &mut Packer<S>) -> Result<()> {
        packer.pack_map_header(self.len())?;
        for (k, v) in self {
            k.pack_into(packer)?;
            v.pack_into(packer)?;
        }
        Ok(())
    }

    fn unpack_from<R: Refill>(unpacker: &mut Unpacker<R>) -> Result<Self> {
        let len = unpacker.unpack_map_header()?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let k = K::unpack_from(unpacker)?;
            let v = V::unpack_from(unpacker)?;
            map.insert(k, v);
        }
        Ok(map)
    }
}
