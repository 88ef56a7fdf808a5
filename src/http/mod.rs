//! HTTP/1.0 server engine for embedded systems.
//!
//! The engine is split into small layers, leaves first:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Transport   │──▶│   Pushback   │──▶│   Scanner    │──▶│   Request    │
//! │ (timeout +   │   │   (32-byte   │   │ (expect, int,│   │  + Multipart │
//! │  body limit) │   │  LIFO stack) │   │  %-decoding) │   │   parsers    │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!         ▲                                                        │
//!         │          ┌──────────────┐   ┌──────────────┐           ▼
//!         └──────────│ OutputBuffer │◀──│   Session    │◀── WebServer loop
//!                    │ (coalescing) │   │  (handlers)  │    + CommandTable
//!                    └──────────────┘   └──────────────┘
//! ```
//!
//! A [`WebServer`] owns the listener, the clock, the [`Config`] and the command
//! table. For every accepted connection it creates a [`Session`], parses the
//! request into it and hands it to the matching handler. Handlers read request
//! data and write the response through the session; when the session is
//! dropped the output is flushed and the connection closed.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod multipart;
pub mod output;
pub mod reader;
pub mod request;
pub mod scanner;
pub mod server;
pub mod session;
pub mod transport;

pub use config::Config;
pub use dispatch::{CommandTable, Route};
pub use error::Error;
pub use multipart::{MultipartReader, Part};
pub use output::{ByteSink, OutputBuffer};
pub use reader::{ByteSource, ByteStream, Pushback};
pub use request::{Headers, RequestLine};
pub use scanner::{Scan, UrlParam, next_url_param};
pub use server::{CommandFn, PathCommandFn, WebServer};
pub use session::Session;
pub use transport::Transport;

/// Line terminator used throughout HTTP.
pub const CRLF: &str = "\r\n";

/// The request method, as recognized on the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// The request line did not start with a known method.
    Invalid,
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
}

impl Method {
    /// All recognized methods in the order they are tried on the request line.
    pub const ALL: [Method; 6] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
    ];

    /// The method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Invalid => "INVALID",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    /// The request-line token, method name plus the separating space.
    pub(crate) fn token(&self) -> &'static [u8] {
        match self {
            Method::Invalid => b"",
            Method::Get => b"GET ",
            Method::Head => b"HEAD ",
            Method::Post => b"POST ",
            Method::Put => b"PUT ",
            Method::Delete => b"DELETE ",
            Method::Patch => b"PATCH ",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Method {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}
