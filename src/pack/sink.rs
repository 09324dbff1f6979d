//! Byte sinks the packer writes through.

use std::io::Write;

use bytes::{BufMut, BytesMut};

use crate::error::Result;

/// Destination for encoded bytes. The sink owns any buffering.
pub trait ByteSink {
    fn write_u8(&mut self, b: u8) -> Result<()>;

    fn write_slice(&mut self, bytes: &[u8]) -> Result<()>;
}

impl ByteSink for Vec<u8> {
    fn write_u8(&mut self, b: u8) -> Result<()> {
        self.push(b);
        Ok(())
    }

    fn write_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl ByteSink for BytesMut {
    fn write_u8(&mut self, b: u8) -> Result<()> {
        self.put_u8(b);
        Ok(())
    }

    fn write_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.put_slice(bytes);
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_u8(&mut self, b: u8) -> Result<()> {
        (**self).write_u8(b)
    }

    fn write_slice(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_slice(bytes)
    }
}

/// Adapts any [`std::io::Write`] into a [`ByteSink`].
///
/// Every write goes straight to the writer; wrap it in a `BufWriter` when
/// the writer is unbuffered.
pub struct IoSink<W> {
    writer: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn write_u8(&mut self, b: u8) -> Result<()> {
        self.writer.write_all(&[b])?;
        Ok(())
    }

    fn write_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bytes_mut_sink_appends() {
        let mut buf = BytesMut::new();
        buf.write_u8(0xC0).unwrap();
        buf.write_slice(&[0x01, 0x02]).unwrap();
        assert_eq!(&buf[..], &[0xC0, 0x01, 0x02]);
    }

    #[test]
    fn io_sink_writes_through() {
        let mut sink = IoSink::new(Vec::new());
        sink.write_slice(&[0xCC, 0x80]).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.into_inner(), vec![0xCC, 0x80]);
    }

    #[test]
    fn io_sink_surfaces_write_errors() {
        let mut sink = IoSink::new(FailingWriter);
        let err = sink.write_u8(0xC0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
