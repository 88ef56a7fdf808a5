//! # microweb - a web server for microcontrollers
//!
//! A minimal HTTP/1.0 request parser and response writer designed for severely
//! memory-constrained devices. It accepts one TCP connection at a time, parses
//! the request line and a bounded set of headers, dispatches to a registered
//! handler by URL verb, and lets the handler stream a response.
//!
//! ## Features
//!
//! - **Single-byte parser**: request line, `Content-Length`, `Authorization`,
//!   `Content-Type` and multipart boundary, with bounded lookahead and rollback
//! - **Command table**: handlers registered by URL verb, plus a default, a
//!   failure and an optional path-segment handler
//! - **Form decoding**: URL-encoded POST bodies, query strings and
//!   `multipart/form-data` uploads streamed into caller buffers
//! - **Buffered output**: small writes coalesced into larger transport writes,
//!   canned status responses and HTML form helpers
//! - **No allocation**: every buffer has a fixed capacity; overlong input is
//!   truncated, never overflowed
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! microweb = "0.1.0"
//! ```
//!
//! ### Hello world
//!
//! ```rust,no_run
//! use microweb::http::{Config, Error, Method, Session, WebServer};
//! use microweb::network::{Close, Connection, Listen, Read, Write};
//! use microweb::system::Clock;
//! # struct MockConnection;
//! # impl Connection for MockConnection {
//! #     fn is_connected(&self) -> bool { false }
//! # }
//! # impl Read for MockConnection {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for MockConnection {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for MockConnection {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockListener;
//! # impl Listen for MockListener {
//! #     type Connection = MockConnection;
//! #     type Error = ();
//! #     fn listen(&mut self, _port: u16) -> Result<(), Self::Error> { Ok(()) }
//! #     fn accept(&mut self) -> Result<Option<MockConnection>, Self::Error> { Ok(None) }
//! # }
//! # struct SysTick;
//! # impl Clock for SysTick {
//! #     fn now_ms(&self) -> u64 { 0 }
//! # }
//!
//! fn hello(
//!     session: &mut Session<'_, MockConnection, SysTick>,
//!     method: Method,
//!     _tail: &str,
//!     _complete: bool,
//! ) -> Result<(), Error> {
//!     session.http_success("text/html; charset=utf-8", None)?;
//!     if method != Method::Head {
//!         session.print("<h1>Hello, World!</h1>")?;
//!     }
//!     Ok(())
//! }
//!
//! let mut server: WebServer<_, _> = WebServer::new(MockListener, SysTick, Config::new());
//! server.set_default_command(hello);
//! server.add_command("index.html", hello).unwrap();
//! server.begin().unwrap();
//!
//! let mut url = [0u8; 64];
//! loop {
//!     server.process_connection(&mut url).ok();
//! }
//! ```
//!
//! ## Platform Support
//!
//! The crate only needs `core`. The transport and the clock are supplied by the
//! application through the [`network`] and [`system`] traits.
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Route internal logging to `defmt` and implement `defmt::Format`
//! - `log`: Route internal logging to the `log` facade

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

mod fmt;

/// Transport abstraction layer.
///
/// The traits a network stack implements so the web server can accept
/// connections, read requests and write responses.
pub mod network;

/// System utilities for embedded devices.
///
/// Clock abstraction and uptime formatting.
pub mod system;

/// The HTTP/1.0 server engine.
///
/// Request parsing, multipart decoding, command dispatch, buffered output and
/// the connection loop.
pub mod http;
