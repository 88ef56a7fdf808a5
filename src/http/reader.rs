//! Byte sources and the pushback buffer.
//!
//! The parser works one byte at a time. [`ByteSource`] is where bytes come from,
//! [`Pushback`] layers a small LIFO stack of "unread" bytes over a source so the
//! scanner can look ahead and roll back.

/// Maximum number of bytes that can be pushed back.
pub const PUSHBACK_CAPACITY: usize = 32;

/// A source of bytes, read one at a time.
///
/// `None` is end of stream: the peer went away, the read timed out, or the
/// content-length limit was reached.
pub trait ByteSource {
    /// Take the next byte from the source.
    fn next_byte(&mut self) -> Option<u8>;
}

impl ByteSource for &[u8] {
    fn next_byte(&mut self) -> Option<u8> {
        let (&first, rest) = self.split_first()?;
        *self = rest;
        Some(first)
    }
}

/// A byte stream that supports pushing bytes back.
pub trait ByteStream {
    /// The next byte, or `None` at end of stream.
    fn read(&mut self) -> Option<u8>;

    /// Return a byte to the stream so the next [`read`](Self::read) yields it.
    ///
    /// `None` is ignored, which lets callers hand back whatever `read` gave them.
    fn push(&mut self, ch: Option<u8>);
}

/// A fixed-capacity pushback stack over a [`ByteSource`].
///
/// Pushed bytes are returned in LIFO order before the source is consulted
/// again. When the stack is full the newest byte overwrites the top slot rather
/// than growing or failing.
#[derive(Debug)]
pub struct Pushback<S> {
    source: S,
    stack: [u8; PUSHBACK_CAPACITY],
    depth: usize,
}

impl<S: ByteSource> Pushback<S> {
    /// Wrap a source with an empty pushback stack.
    pub fn new(source: S) -> Self {
        Self {
            source,
            stack: [0; PUSHBACK_CAPACITY],
            depth: 0,
        }
    }

    /// Number of bytes currently pushed back.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Drop all pushed-back bytes.
    pub fn clear(&mut self) {
        self.depth = 0;
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The wrapped source, mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: ByteSource> ByteStream for Pushback<S> {
    fn read(&mut self) -> Option<u8> {
        if self.depth > 0 {
            self.depth -= 1;
            return Some(self.stack[self.depth]);
        }
        self.source.next_byte()
    }

    fn push(&mut self, ch: Option<u8>) {
        let Some(ch) = ch else {
            return;
        };
        if self.depth == PUSHBACK_CAPACITY {
            // full: keep replacing the top slot
            self.stack[PUSHBACK_CAPACITY - 1] = ch;
        } else {
            self.stack[self.depth] = ch;
            self.depth += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_source() {
        let mut src: &[u8] = b"ab";
        assert_eq!(src.next_byte(), Some(b'a'));
        assert_eq!(src.next_byte(), Some(b'b'));
        assert_eq!(src.next_byte(), None);
    }

    #[test]
    fn test_push_is_lifo() {
        let mut reader = Pushback::new(&b"xyz"[..]);
        assert_eq!(reader.read(), Some(b'x'));
        reader.push(Some(b'2'));
        reader.push(Some(b'1'));
        assert_eq!(reader.depth(), 2);
        assert_eq!(reader.read(), Some(b'1'));
        assert_eq!(reader.read(), Some(b'2'));
        assert_eq!(reader.read(), Some(b'y'));
    }

    #[test]
    fn test_push_none_is_ignored() {
        let mut reader = Pushback::new(&b""[..]);
        reader.push(None);
        assert_eq!(reader.depth(), 0);
        assert_eq!(reader.read(), None);
    }

    #[test]
    fn test_overflow_overwrites_top() {
        let mut reader = Pushback::new(&b""[..]);
        for i in 0..PUSHBACK_CAPACITY as u8 {
            reader.push(Some(i));
        }
        assert_eq!(reader.depth(), PUSHBACK_CAPACITY);

        reader.push(Some(0xAA));
        reader.push(Some(0xBB));
        assert_eq!(reader.depth(), PUSHBACK_CAPACITY);

        // newest byte sits in the top slot, the one below is untouched
        assert_eq!(reader.read(), Some(0xBB));
        assert_eq!(reader.read(), Some(PUSHBACK_CAPACITY as u8 - 2));
    }

    #[test]
    fn test_clear() {
        let mut reader = Pushback::new(&b"q"[..]);
        reader.push(Some(b'p'));
        reader.clear();
        assert_eq!(reader.read(), Some(b'q'));
    }
}
