//! One request/response exchange.
//!
//! A [`Session`] is what a handler works with: it reads the request body
//! through the [`ByteStream`]/[`Scan`] interface and writes the response through
//! `print`, the canned status helpers, or [`core::fmt::Write`].
//!
//! ```rust,ignore
//! fn led(session: &mut Session<'_, Conn, SysTick>, method: Method, _: &str, _: bool) -> Result<(), Error> {
//!     if method == Method::Post {
//!         let mut name: Vec<u8, 16> = Vec::new();
//!         let mut value: Vec<u8, 16> = Vec::new();
//!         while session.read_post_param(&mut name, &mut value) {
//!             // ...
//!         }
//!         return session.http_see_other("/");
//!     }
//!     session.http_success("text/html; charset=utf-8", None)?;
//!     write!(session, "<p>uptime {}</p>", Uptime::from_millis(now))?;
//!     Ok(())
//! }
//! ```

use super::config::Config;
use super::error::Error;
use super::multipart::{MultipartReader, Part};
use super::output::OutputBuffer;
use super::reader::{ByteStream, Pushback};
use super::request::{self, Headers, RequestLine};
use super::transport::Transport;
use super::{CRLF, Method};
use crate::network::Connection;
use crate::system::Clock;
use base64ct::{Base64, Encoding as B64Encoding};
use heapless::Vec;
use serde::{Deserialize, Serialize};

/// Size of the scratch buffer [`Session::send_json`] serializes into.
pub const JSON_BUFFER_LEN: usize = 256;

/// Longest `user:password` pair [`Session::check_basic_auth`] accepts.
const CREDENTIALS_LEN: usize = 48;

/// The state of one accepted connection.
pub struct Session<'s, C: Connection, K: Clock> {
    reader: Pushback<Transport<'s, C, K>>,
    output: OutputBuffer<'s>,
    config: &'s Config,
    headers: Headers,
    multipart: MultipartReader,
}

impl<'s, C: Connection, K: Clock> Session<'s, C, K> {
    /// Wrap an accepted connection. Responses are buffered in `output`.
    pub fn new(conn: C, clock: &'s K, config: &'s Config, output: &'s mut [u8]) -> Self {
        Self {
            reader: Pushback::new(Transport::new(conn, clock, config.read_timeout_ms)),
            output: OutputBuffer::new(output),
            config,
            headers: Headers::default(),
            multipart: MultipartReader::new(),
        }
    }

    /// Parse the request line into `url` and, for a known method, the headers.
    ///
    /// Afterwards reads are limited to the announced `Content-Length`.
    pub fn read_request(&mut self, url: &mut [u8]) -> RequestLine {
        let line = request::read_request_line(&mut self.reader, url);
        if line.method != Method::Invalid {
            if !request::read_headers(&mut self.reader, &mut self.headers) {
                debug!("request ended inside the headers");
            }
            trace!("content length {}", self.headers.content_length);
            self.reader
                .source_mut()
                .limit_content(self.headers.content_length);
        }
        line
    }

    /// Headers captured from the request.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The server configuration.
    pub fn config(&self) -> &'s Config {
        self.config
    }

    /// Whether the connection is still open.
    pub fn is_connected(&self) -> bool {
        self.reader.source().is_connected()
    }

    /// Buffer a string.
    pub fn print(&mut self, text: &str) -> Result<(), Error> {
        self.output
            .write_all(self.reader.source_mut(), text.as_bytes())
    }

    /// Buffer a single byte.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.output.write_byte(self.reader.source_mut(), byte)
    }

    /// Flush buffered output, then write `data` directly. Use this for large
    /// payloads.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        self.output
            .write_unbuffered(self.reader.source_mut(), data)
    }

    /// Buffer a CR LF pair.
    pub fn print_crlf(&mut self) -> Result<(), Error> {
        self.print(CRLF)
    }

    /// Whether any response bytes were produced yet.
    pub fn response_started(&self) -> bool {
        self.output.written() > 0
    }

    /// Push buffered output to the connection.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.output.flush(self.reader.source_mut())
    }

    fn print_server_header(&mut self) -> Result<(), Error> {
        if let Some(name) = self.config.server_header() {
            self.print("Server: ")?;
            self.print(name)?;
            self.print_crlf()?;
        }
        Ok(())
    }

    /// `200 OK` with the given content type.
    ///
    /// `extra_headers` is sent verbatim; each header in it must end with CR LF.
    pub fn http_success(&mut self, content_type: &str, extra_headers: Option<&str>) -> Result<(), Error> {
        self.print("HTTP/1.0 200 OK\r\n")?;
        self.print_server_header()?;
        self.print("Access-Control-Allow-Origin: *\r\nContent-Type: ")?;
        self.print(content_type)?;
        self.print_crlf()?;
        if let Some(extra) = extra_headers {
            self.print(extra)?;
        }
        self.print_crlf()
    }

    /// `204 No Content`.
    pub fn http_no_content(&mut self) -> Result<(), Error> {
        self.print("HTTP/1.0 204 No Content\r\n")?;
        self.print_server_header()?;
        self.print_crlf()
    }

    /// `303 See Other`, redirecting to `location`.
    pub fn http_see_other(&mut self, location: &str) -> Result<(), Error> {
        self.print("HTTP/1.0 303 See Other\r\n")?;
        self.print_server_header()?;
        self.print("Location: ")?;
        self.print(location)?;
        self.print_crlf()?;
        self.print_crlf()
    }

    /// `400 Bad Request` with the configured failure page.
    pub fn http_fail(&mut self) -> Result<(), Error> {
        self.print("HTTP/1.0 400 Bad Request\r\n")?;
        self.print_server_header()?;
        self.print("Content-Type: text/html\r\n\r\n")?;
        self.print(self.config.fail_message)
    }

    /// `401 Authorization Required`, asking for Basic credentials.
    pub fn http_unauthorized(&mut self) -> Result<(), Error> {
        self.print("HTTP/1.0 401 Authorization Required\r\n")?;
        self.print_server_header()?;
        self.print("Content-Type: text/html\r\nWWW-Authenticate: Basic realm=\"")?;
        self.print(self.config.auth_realm)?;
        self.print("\"\r\n\r\n")?;
        self.print(self.config.auth_message)
    }

    /// `500 Internal Server Error` with the configured page.
    pub fn http_server_error(&mut self) -> Result<(), Error> {
        self.print("HTTP/1.0 500 Internal Server Error\r\n")?;
        self.print_server_header()?;
        self.print("Content-Type: text/html\r\n\r\n")?;
        self.print(self.config.server_error_message)
    }

    /// An HTML checkbox inside its label.
    pub fn check_box(&mut self, name: &str, value: &str, label: &str, selected: bool) -> Result<(), Error> {
        self.labelled_input("checkbox", name, value, label, selected)
    }

    /// An HTML radio button inside its label.
    pub fn radio_button(&mut self, name: &str, value: &str, label: &str, selected: bool) -> Result<(), Error> {
        self.labelled_input("radio", name, value, label, selected)
    }

    fn labelled_input(
        &mut self,
        kind: &str,
        name: &str,
        value: &str,
        label: &str,
        selected: bool,
    ) -> Result<(), Error> {
        self.print("<label><input type='")?;
        self.print(kind)?;
        self.print("' name='")?;
        self.print(name)?;
        self.print("' value='")?;
        self.print(value)?;
        self.print("' ")?;
        if selected {
            self.print("checked ")?;
        }
        self.print("/> ")?;
        self.print(label)?;
        self.print("</label>")
    }

    /// Compare the request's Basic credentials with `expected`, the
    /// base64 encoding of `user:password`.
    pub fn check_credentials(&self, expected: &str) -> bool {
        let value = self.headers.authorization.as_str();
        match value.get(..6) {
            Some(scheme) if scheme.eq_ignore_ascii_case("Basic ") => value[6..].trim() == expected,
            _ => false,
        }
    }

    /// Check the request's Basic credentials against a user name and password.
    pub fn check_basic_auth(&self, user: &str, password: &str) -> bool {
        let mut plain: Vec<u8, CREDENTIALS_LEN> = Vec::new();
        if plain.extend_from_slice(user.as_bytes()).is_err()
            || plain.push(b':').is_err()
            || plain.extend_from_slice(password.as_bytes()).is_err()
        {
            return false;
        }

        let mut encoded = [0u8; 2 * CREDENTIALS_LEN];
        match Base64::encode(&plain, &mut encoded) {
            Ok(expected) => self.check_credentials(expected),
            Err(_) => false,
        }
    }

    /// Serialize `value` and send it as an `application/json` success response.
    pub fn send_json<T: Serialize>(&mut self, value: &T) -> Result<(), Error> {
        let mut json = [0u8; JSON_BUFFER_LEN];
        let len = serde_json_core::to_slice(value, &mut json).map_err(|_| Error::SerializeError)?;
        self.http_success("application/json", None)?;
        self.write_bytes(&json[..len])
    }

    /// Read the rest of the request body into `buf`.
    ///
    /// Fails with [`Error::BodyTooLarge`] when more body bytes remain after
    /// `buf` is full; what was read stays in `buf`.
    pub fn read_body(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut len = 0;
        while len < buf.len() {
            match self.read() {
                Some(byte) => {
                    buf[len] = byte;
                    len += 1;
                }
                None => return Ok(len),
            }
        }
        let next = self.read();
        if next.is_some() {
            self.push(next);
            return Err(Error::BodyTooLarge);
        }
        Ok(len)
    }

    /// Read the body into `buf` and deserialize it as JSON.
    pub fn read_json<'b, T: Deserialize<'b>>(&mut self, buf: &'b mut [u8]) -> Result<T, Error> {
        let len = self.read_body(buf)?;
        let body: &'b [u8] = buf;
        serde_json_core::from_slice(&body[..len])
            .map(|(value, _)| value)
            .map_err(|_| Error::DeserializeError)
    }

    /// Advance to the next part of a `multipart/form-data` body.
    ///
    /// Returns `None` when the request is not multipart or no parts are left.
    pub fn next_part(&mut self) -> Option<Part> {
        if !self.headers.is_multipart() {
            return None;
        }
        self.multipart
            .next_part(&mut self.reader, self.headers.boundary.as_str())
    }

    /// Read content of the current multipart part into `buf`.
    ///
    /// Returns the bytes stored and whether the part ended.
    pub fn read_part_content(&mut self, buf: &mut [u8]) -> (usize, bool) {
        if !self.headers.is_multipart() {
            return (0, true);
        }
        self.multipart
            .read_part_content(&mut self.reader, self.headers.boundary.as_str(), buf)
    }

    /// Flush pending output and close the connection.
    pub fn close(&mut self) {
        if self.flush().is_err() {
            debug!("could not flush response");
        }
        self.reader.clear();
        self.reader.source_mut().close();
    }
}

impl<C: Connection, K: Clock> ByteStream for Session<'_, C, K> {
    fn read(&mut self) -> Option<u8> {
        self.reader.read()
    }

    fn push(&mut self, ch: Option<u8>) {
        self.reader.push(ch)
    }
}

impl<C: Connection, K: Clock> core::fmt::Write for Session<'_, C, K> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.print(s).map_err(|_| core::fmt::Error)
    }
}

impl<C: Connection, K: Clock> Drop for Session<'_, C, K> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: Connection, K: Clock> core::fmt::Debug for Session<'_, C, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("transport", self.reader.source())
            .field("pending_output", &self.output.pending())
            .field("headers", &self.headers)
            .finish()
    }
}
