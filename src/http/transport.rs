//! The live connection as a byte source and sink.
//!
//! [`Transport`] owns the accepted connection for the length of one request. On
//! the read side it polls the connection with a timeout and enforces the
//! request's `Content-Length`; on the write side it is the sink the
//! [`OutputBuffer`](super::OutputBuffer) flushes into.

use super::error::Error;
use super::output::ByteSink;
use super::reader::ByteSource;
use crate::network::Connection;
use crate::system::Clock;

/// A connection with read timeout and content-length limiting.
pub struct Transport<'s, C: Connection, K: Clock> {
    conn: Option<C>,
    clock: &'s K,
    timeout_ms: u32,
    limit_content: bool,
    content_remaining: i32,
}

impl<'s, C: Connection, K: Clock> Transport<'s, C, K> {
    /// Take ownership of an accepted connection.
    pub fn new(conn: C, clock: &'s K, timeout_ms: u32) -> Self {
        Self {
            conn: Some(conn),
            clock,
            timeout_ms,
            limit_content: false,
            content_remaining: 0,
        }
    }

    /// Start limiting reads to `length` more bytes from the connection.
    ///
    /// Once the counter reaches zero every read reports end of stream, even if
    /// the peer keeps the connection open.
    pub fn limit_content(&mut self, length: i32) {
        self.limit_content = true;
        self.content_remaining = length;
    }

    /// Body bytes still to be read, when content limiting is active.
    pub fn content_remaining(&self) -> Option<i32> {
        self.limit_content.then_some(self.content_remaining)
    }

    /// Whether the connection is still held and reports itself connected.
    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| conn.is_connected())
    }

    /// Flush the connection's own write buffer.
    pub fn flush(&mut self) -> Result<(), Error> {
        let conn = self.conn.as_mut().ok_or(Error::ConnectionClosed)?;
        conn.flush().map_err(|_| Error::WriteError)
    }

    /// Flush and close the connection. Later reads return end of stream and
    /// later writes fail with [`Error::ConnectionClosed`].
    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            trace!("closing connection");
            let _ = conn.flush();
            if conn.close().is_err() {
                warn!("error closing connection");
            }
        }
    }
}

impl<C: Connection, K: Clock> ByteSource for Transport<'_, C, K> {
    fn next_byte(&mut self) -> Option<u8> {
        if self.limit_content && self.content_remaining <= 0 {
            trace!("end of content");
            return None;
        }

        let start = self.clock.now_ms();
        loop {
            let conn = self.conn.as_mut()?;
            if !conn.is_connected() {
                debug!("connection lost");
                return None;
            }

            let mut byte = [0u8; 1];
            match conn.read(&mut byte) {
                Ok(0) => {}
                Ok(_) => {
                    if self.limit_content {
                        self.content_remaining -= 1;
                    }
                    return Some(byte[0]);
                }
                Err(_) => {
                    debug!("read error, dropping connection");
                    self.close();
                    return None;
                }
            }

            if self.clock.elapsed_ms(start) > u64::from(self.timeout_ms) {
                warn!("connection timed out");
                self.close();
                return None;
            }
        }
    }
}

impl<C: Connection, K: Clock> ByteSink for Transport<'_, C, K> {
    fn write_all(&mut self, data: &[u8]) -> Result<(), Error> {
        let conn = self.conn.as_mut().ok_or(Error::ConnectionClosed)?;
        conn.write_all(data)?;
        Ok(())
    }
}

impl<C: Connection, K: Clock> core::fmt::Debug for Transport<'_, C, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transport")
            .field("open", &self.conn.is_some())
            .field("timeout_ms", &self.timeout_ms)
            .field("content_remaining", &self.content_remaining())
            .finish()
    }
}
