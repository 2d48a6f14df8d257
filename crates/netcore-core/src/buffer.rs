//! Growable byte buffer used as the unit of pending I/O.

use bytes::{Buf, BufMut, BytesMut};

/// A contiguous, growable byte region.
///
/// Offset tracking (how many leading bytes an in-flight operation has
/// already consumed) is modeled by [`BytesMut::advance`]/`split_to` rather
/// than a manually maintained index, since `bytes` already gives us that
/// for free.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    inner: BytesMut,
}

impl Buffer {
    /// An empty buffer with no reserved capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty buffer that can hold at least `capacity` bytes without
    /// reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
        }
    }

    /// Append `bytes` to the end of the buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.inner.put_slice(bytes);
    }

    /// Number of unconsumed bytes currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the buffer holds no unconsumed bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The unconsumed bytes as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    /// Drop the first `count` bytes, as if they had been consumed by an
    /// in-flight operation.
    pub fn advance(&mut self, count: usize) {
        self.inner.advance(count);
    }

    /// Take everything currently held, leaving this buffer empty, and
    /// return it as a standalone buffer. Used by the send pipeline's
    /// `main`/`flush` swap.
    pub fn take(&mut self) -> Buffer {
        Buffer {
            inner: std::mem::take(&mut self.inner),
        }
    }

    /// Drop all unconsumed bytes.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        let mut buf = Buffer::with_capacity(bytes.len());
        buf.extend(bytes);
        buf
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            inner: BytesMut::from(bytes.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_and_advance_track_remaining_bytes() {
        let mut buf = Buffer::new();
        buf.extend(b"hello");
        assert_eq!(buf.len(), 5);
        buf.advance(2);
        assert_eq!(buf.as_slice(), b"llo");
    }

    #[test]
    fn take_empties_the_source_buffer() {
        let mut main = Buffer::new();
        main.extend(b"payload");
        let taken = main.take();
        assert!(main.is_empty());
        assert_eq!(taken.as_slice(), b"payload");
    }
}
