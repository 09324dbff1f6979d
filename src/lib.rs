//! RawPack: a pure-Rust MessagePack codec.
//!
//! This crate implements the MessagePack wire format in its original form,
//! where strings and byte strings share the single `raw` family (no separate
//! `str`/`bin`/`ext` markers). Packing and unpacking are synchronous and run
//! on the calling thread.
//!
//! # Architecture
//!
//! - **`format`**: Marker bytes, fixnum ranges and length breakpoints
//! - **`pack`**: `Packer`, writing values to a `ByteSink`
//! - **`unpack`**: `Unpacker`, reading values from a refillable `InputBuffer`
//! - **`stream`**: Refill policy over blocking byte sources (`io::Read`, `bytes::Buf`)
//! - **`value`**: `Value`, the self-describing decoded form
//! - **`Packable`**: Capability for types that pack and unpack themselves
//!
//! ```
//! use rawpack::Value;
//!
//! let bytes = rawpack::to_vec(&vec![1i64, -2, 300])?;
//! assert_eq!(bytes, [0x93, 0x01, 0xFE, 0xCD, 0x01, 0x2C]);
//!
//! let value: Value = rawpack::from_slice(&bytes)?;
//! assert_eq!(value.as_array()?[2].as_u16()?, 300);
//! # Ok::<(), rawpack::Error>(())
//! ```

pub mod error;
pub mod format;
pub mod pack;
pub mod stream;
pub mod unpack;
pub mod value;

mod packable;

pub use error::{Error, ErrorKind, Result};
pub use pack::Packer;
pub use packable::Packable;
pub use unpack::Unpacker;
pub use value::Value;

/// Packs `value` into a new byte vector.
pub fn to_vec<T: Packable + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut packer = Packer::new(Vec::new());
    packer.pack(value)?;
    Ok(packer.into_inner())
}

/// Unpacks one `T` from the start of `data`. Trailing bytes are ignored.
pub fn from_slice<T: Packable>(data: &[u8]) -> Result<T> {
    Unpacker::from_slice(data).unpack()
}
