//! Unpacking from byte sources that deliver input incrementally.
//!
//! A [`StreamRefill`] owns a [`ByteSource`] and, whenever the unpacker runs
//! short, makes room in the input buffer and reads whatever the source has
//! into the free space. Reads may block; that is the only place an unpacker
//! waits.

use std::io::{self, Read};

use bytes::Buf;

use crate::error::Result;
use crate::unpack::{InputBuffer, Refill, Unpacker, UnpackerConfig};

/// A pull-based source of input bytes.
pub trait ByteSource {
    /// Reads up to `buf.len()` bytes into `buf`, returning how many were
    /// read. Zero means the source is exhausted.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Adapts any [`std::io::Read`] into a [`ByteSource`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Adapts any [`bytes::Buf`] into a [`ByteSource`].
#[derive(Debug)]
pub struct BufSource<B> {
    buf: B,
}

impl<B: Buf> BufSource<B> {
    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: Buf> ByteSource for BufSource<B> {
    fn read_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        let n = dst.len().min(self.buf.chunk().len());
        self.buf.copy_to_slice(&mut dst[..n]);
        Ok(n)
    }
}

/// Refill policy backed by a [`ByteSource`].
///
/// Each refill ensures the buffer has room for the missing bytes (compacting
/// or doubling as needed) and then lets the source fill as much free space
/// as it can in a single read. Once the source reports end of input the
/// refill keeps returning `false` without touching it again.
#[derive(Debug)]
pub struct StreamRefill<S> {
    source: S,
    exhausted: bool,
}

impl<S: ByteSource> StreamRefill<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            exhausted: false,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<S: ByteSource> Refill for StreamRefill<S> {
    fn refill(&mut self, buf: &mut InputBuffer, missing: usize) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        buf.ensure_capacity(missing)?;
        let source = &mut self.source;
        let n = buf.fill_with(|spare| source.read_into(spare))?;
        if n == 0 {
            tracing::debug!(unread = buf.remaining(), "byte source exhausted");
            self.exhausted = true;
            return Ok(false);
        }
        tracing::trace!(read = n, unread = buf.remaining(), "refilled unpack buffer");
        Ok(true)
    }
}

/// An unpacker reading from a [`ByteSource`].
pub type StreamUnpacker<S> = Unpacker<StreamRefill<S>>;

impl<S: ByteSource> Unpacker<StreamRefill<S>> {
    pub fn from_source(source: S) -> Self {
        Self::new(StreamRefill::new(source))
    }

    pub fn from_source_with_config(source: S, config: &UnpackerConfig) -> Self {
        Self::with_config(StreamRefill::new(source), config)
    }
}

impl<R: Read> Unpacker<StreamRefill<ReaderSource<R>>> {
    /// Unpacks from a blocking reader such as a file or socket.
    pub fn from_reader(reader: R) -> Self {
        Self::from_source(ReaderSource::new(reader))
    }
}

impl<B: Buf> Unpacker<StreamRefill<BufSource<B>>> {
    pub fn from_buf(buf: B) -> Self {
        Self::from_source(BufSource::new(buf))
    }
}
