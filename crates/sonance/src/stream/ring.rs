//! Bounded byte FIFO
//!
//! Fixed-capacity storage for bytes received from a transport. Appends never
//! grow the buffer: once it is full, callers must stop reading from the
//! socket until the consumer drains it. Consuming a prefix shifts the
//! remaining bytes to the front, so live data always starts at index 0.

use std::io;

pub struct ByteBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl ByteBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free space left before appends start failing
    pub fn remaining(&self) -> usize {
        self.data.len() - self.len
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Buffered bytes, oldest first
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Append as many of `bytes` as fit. Returns the number appended.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.remaining());
        self.data[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    /// Let `fill` write directly into the free space (e.g. a socket receive).
    ///
    /// Returns `None` without calling `fill` when the buffer is full.
    /// On `Ok(n)`, the first `n` bytes of the free space become buffered.
    pub fn fill_with<F>(&mut self, fill: F) -> Option<io::Result<usize>>
    where
        F: FnOnce(&mut [u8]) -> io::Result<usize>,
    {
        if self.is_full() {
            return None;
        }
        let free = &mut self.data[self.len..];
        let result = fill(free).map(|n| {
            let n = n.min(free.len());
            self.len += n;
            n
        });
        Some(result)
    }

    /// Drop the first `n` bytes and compact. Returns the number dropped.
    pub fn consume(&mut self, n: usize) -> usize {
        let n = n.min(self.len);
        self.data.copy_within(n..self.len, 0);
        self.len -= n;
        n
    }

    /// Move up to `dst.len()` bytes out of the front of the buffer.
    pub fn take_into(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.len);
        dst[..n].copy_from_slice(&self.data[..n]);
        self.consume(n)
    }

    /// Position of the first occurrence of `needle`
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() || needle.len() > self.len {
            return None;
        }
        self.as_slice()
            .windows(needle.len())
            .position(|window| window == needle)
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl std::fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
