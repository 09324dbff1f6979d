//! Growable input buffer backing the unpacker.

use crate::error::{Error, Result};

/// Owned byte storage with a read cursor.
///
/// Layout: `[0, offset)` is consumed, `[offset, filled)` is unread input and
/// `[filled, capacity)` is free space. Storage is allocated on the first
/// request for free space. When free space runs short the unread bytes are
/// first slid down to the front; if that is still not enough the capacity
/// doubles until it suffices. Storage never shrinks.
#[derive(Debug)]
pub struct InputBuffer {
    storage: Vec<u8>,
    offset: usize,
    filled: usize,
    initial_capacity: usize,
    max_size: Option<usize>,
}

impl InputBuffer {
    pub fn new(initial_capacity: usize, max_size: Option<usize>) -> Self {
        Self {
            storage: Vec::new(),
            offset: 0,
            filled: 0,
            initial_capacity: initial_capacity.max(1),
            max_size,
        }
    }

    /// A buffer whose unread region is exactly `data`.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let filled = data.len();
        Self {
            initial_capacity: filled.max(1),
            storage: data,
            offset: 0,
            filled,
            max_size: None,
        }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.filled - self.offset
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Free space after the unread region.
    pub fn free(&self) -> usize {
        self.storage.len() - self.filled
    }

    pub fn unread(&self) -> &[u8] {
        &self.storage[self.offset..self.filled]
    }

    /// Marks `n` unread bytes as consumed.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are unread.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.remaining(), "consume past unread input");
        self.offset += n;
        if self.offset == self.filled {
            self.offset = 0;
            self.filled = 0;
        }
    }

    /// Makes at least `additional` bytes of free space available, compacting
    /// first and growing only if compaction is not enough.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        if self.free() >= additional {
            return Ok(());
        }

        if self.offset > 0 {
            self.storage.copy_within(self.offset..self.filled, 0);
            self.filled -= self.offset;
            tracing::trace!(
                discarded = self.offset,
                unread = self.filled,
                "compacted unpack buffer"
            );
            self.offset = 0;
            if self.free() >= additional {
                return Ok(());
            }
        }

        let needed = self
            .filled
            .checked_add(additional)
            .ok_or_else(|| Error::LimitExceeded("unpack buffer size overflows usize".into()))?;
        if let Some(limit) = self.max_size {
            if needed > limit {
                tracing::debug!(needed, limit, "unpack buffer limit reached");
                return Err(Error::LimitExceeded(format!(
                    "unpack buffer needs {needed} bytes, limit is {limit}"
                )));
            }
        }

        let mut new_capacity = self.storage.len().max(self.initial_capacity);
        while new_capacity < needed {
            new_capacity = new_capacity.saturating_mul(2);
        }
        if let Some(limit) = self.max_size {
            new_capacity = new_capacity.min(limit);
        }

        let old_capacity = self.storage.len();
        self.storage.resize(new_capacity, 0);
        tracing::trace!(old_capacity, new_capacity, "grew unpack buffer");
        Ok(())
    }

    /// Appends `bytes` to the unread region.
    pub fn fill(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.storage[self.filled..self.filled + bytes.len()].copy_from_slice(bytes);
        self.filled += bytes.len();
        Ok(())
    }

    /// Lets `read` write directly into the free space and appends the number
    /// of bytes it reports. Call [`ensure_capacity`](Self::ensure_capacity)
    /// first; `read` sees an empty slice when there is no free space.
    pub fn fill_with<F>(&mut self, read: F) -> Result<usize>
    where
        F: FnOnce(&mut [u8]) -> Result<usize>,
    {
        let spare = &mut self.storage[self.filled..];
        let spare_len = spare.len();
        let n = read(spare)?;
        assert!(n <= spare_len, "reader reported more bytes than it was given");
        self.filled += n;
        Ok(n)
    }
}
