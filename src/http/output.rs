//! Coalescing response writer.

use super::error::Error;

/// Where flushed output goes.
pub trait ByteSink {
    /// Write all of `data` or fail.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Error>;
}

/// Small writes are collected in a caller-provided buffer and handed to the
/// sink in one piece.
///
/// A full buffer is only flushed when the next byte arrives, so a response
/// that exactly fills the buffer costs a single write at teardown.
#[derive(Debug)]
pub struct OutputBuffer<'b> {
    buf: &'b mut [u8],
    len: usize,
    written: usize,
}

impl<'b> OutputBuffer<'b> {
    /// Buffer output in `buf`. An empty `buf` disables buffering.
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, len: 0, written: 0 }
    }

    /// Bytes waiting to be flushed.
    pub fn pending(&self) -> usize {
        self.len
    }

    /// Bytes accepted so far, buffered or written through.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Buffer a single byte.
    pub fn write_byte<W: ByteSink + ?Sized>(&mut self, sink: &mut W, byte: u8) -> Result<(), Error> {
        if self.buf.is_empty() {
            sink.write_all(&[byte])?;
        } else {
            if self.len == self.buf.len() {
                self.flush(sink)?;
            }
            self.buf[self.len] = byte;
            self.len += 1;
        }
        self.written += 1;
        Ok(())
    }

    /// Buffer every byte of `data`.
    pub fn write_all<W: ByteSink + ?Sized>(&mut self, sink: &mut W, data: &[u8]) -> Result<(), Error> {
        for &byte in data {
            self.write_byte(sink, byte)?;
        }
        Ok(())
    }

    /// Flush what is pending, then write `data` straight to the sink.
    pub fn write_unbuffered<W: ByteSink + ?Sized>(
        &mut self,
        sink: &mut W,
        data: &[u8],
    ) -> Result<(), Error> {
        self.flush(sink)?;
        sink.write_all(data)?;
        self.written += data.len();
        Ok(())
    }

    /// Hand pending bytes to the sink. They are discarded even if the write
    /// fails.
    pub fn flush<W: ByteSink + ?Sized>(&mut self, sink: &mut W) -> Result<(), Error> {
        if self.len == 0 {
            return Ok(());
        }
        let len = core::mem::take(&mut self.len);
        sink.write_all(&self.buf[..len])
    }
}
