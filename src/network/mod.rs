//! Transport abstraction layer for embedded systems
//!
//! The web server never touches a TCP stack directly. Instead it is generic over
//! the small set of traits in this module, which an application implements on top
//! of whatever network stack the target provides (smoltcp, a W5500 driver,
//! `std::net` on a host, ...).
//!
//! All traits are synchronous and non-blocking: [`Read::read`] returns `Ok(0)`
//! when no data is pending, and [`Listen::accept`] returns `Ok(None)` when no
//! client is waiting. Any waiting is done by the caller, which owns the clock.

#![allow(missing_docs)]
#![deny(unsafe_code)]

/// Common error types for network operations
pub mod error;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connection, Listen, Read, Write};
}

// Core synchronous traits
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read pending data from the connection.
    ///
    /// Returns `Ok(0)` when nothing is available yet. This must not block.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Write the whole buffer, retrying on short writes.
    ///
    /// A write that accepts zero bytes is reported as
    /// [`error::Error::WriteError`].
    fn write_all(&mut self, mut buf: &[u8]) -> Result<(), error::Error> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(error::Error::WriteError),
                Ok(n) => buf = &buf[n..],
                Err(_) => return Err(error::Error::WriteError),
            }
        }
        Ok(())
    }
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {
    /// Whether the peer is still connected, or unread data is still buffered.
    fn is_connected(&self) -> bool;
}

/// A synchronous listener (server side)
pub trait Listen {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Start listening on the given local port
    fn listen(&mut self, port: u16) -> Result<(), Self::Error>;
    /// Take the next pending connection, if any, without blocking
    fn accept(&mut self) -> Result<Option<Self::Connection>, Self::Error>;
}
