//! Request line and header parsing.

use super::Method;
use super::multipart::{push_truncated, read_parameters};
use super::scanner::Scan;
use heapless::String;

/// Capacity of the captured `Authorization` value.
pub const AUTHORIZATION_LEN: usize = 50;

/// Capacity of the captured `Content-Type` media type.
pub const CONTENT_TYPE_LEN: usize = 64;

/// Capacity of the captured multipart boundary (RFC 2046 maximum).
pub const BOUNDARY_LEN: usize = 70;

/// Media type that enables the multipart reader.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// The parsed request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine {
    /// The request method.
    pub method: Method,
    /// Number of URL bytes stored in the caller's buffer.
    pub len: usize,
    /// Space left in the URL buffer. Negative when the URL was truncated.
    pub remaining: isize,
}

impl RequestLine {
    /// Whether the whole URL fit in the buffer.
    pub fn is_complete(&self) -> bool {
        self.remaining >= 0
    }
}

/// Header values captured from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    /// `Content-Length`, 0 when absent.
    pub content_length: i32,
    /// Raw `Authorization` value, e.g. `Basic dXNlcjpwYXNz`.
    pub authorization: String<AUTHORIZATION_LEN>,
    /// Media type from `Content-Type`, without parameters.
    pub content_type: String<CONTENT_TYPE_LEN>,
    /// `boundary` parameter of a `multipart/form-data` content type.
    pub boundary: String<BOUNDARY_LEN>,
}

impl Headers {
    /// Forget everything captured from a previous request.
    pub fn clear(&mut self) {
        self.content_length = 0;
        self.authorization.clear();
        self.content_type.clear();
        self.boundary.clear();
    }

    /// Whether the body is `multipart/form-data` with a usable boundary.
    pub fn is_multipart(&self) -> bool {
        self.content_type
            .as_str()
            .eq_ignore_ascii_case(MULTIPART_FORM_DATA)
            && !self.boundary.is_empty()
    }
}

/// Parse `METHOD SP URL` into `url`.
///
/// An unknown method yields [`Method::Invalid`] and nothing further is read.
/// Otherwise the URL is copied up to the first space, CR or LF. Once `url` is
/// full, bytes are still consumed but dropped, and `remaining` goes negative.
/// The HTTP version, if any, is left unread.
pub fn read_request_line<S: Scan + ?Sized>(src: &mut S, url: &mut [u8]) -> RequestLine {
    let Some(method) = Method::ALL
        .into_iter()
        .find(|method| src.expect(method.token()))
    else {
        return RequestLine {
            method: Method::Invalid,
            len: 0,
            remaining: url.len() as isize,
        };
    };

    let mut len = 0;
    let mut remaining = url.len() as isize;
    while let Some(ch) = src.read() {
        if ch == b' ' {
            break;
        }
        if matches!(ch, b'\r' | b'\n') {
            // no version: leave the line end for the header parser
            src.push(Some(ch));
            break;
        }
        if remaining > 0 {
            url[len] = ch;
            len += 1;
        }
        remaining -= 1;
    }

    RequestLine {
        method,
        len,
        remaining,
    }
}

/// Parse the header block up to and including the blank line.
///
/// Returns `true` when the terminating `CRLF CRLF` was seen. End of stream
/// returns `false` with whatever was captured so far.
pub fn read_headers<S: Scan + ?Sized>(src: &mut S, headers: &mut Headers) -> bool {
    headers.clear();

    loop {
        if src.expect_ignore_ascii_case(b"Content-Length:") {
            headers.content_length = src.read_int().unwrap_or(0);
            continue;
        }

        if src.expect_ignore_ascii_case(b"Authorization:") {
            src.read_header_value(&mut headers.authorization);
            continue;
        }

        if src.expect_ignore_ascii_case(b"Content-Type:") {
            read_content_type(src, headers);
            continue;
        }

        if src.expect(b"\r\n\r\n") {
            return true;
        }

        // nothing recognized here, move on by one byte
        if src.read().is_none() {
            return false;
        }
    }
}

/// Read `type/subtype` and, for multipart form data, its `boundary` parameter.
fn read_content_type<S: Scan + ?Sized>(src: &mut S, headers: &mut Headers) {
    headers.content_type.clear();
    headers.boundary.clear();
    let mut ch = src.skip_blanks();
    while let Some(byte) = ch {
        if matches!(byte, b';' | b' ' | b'\t' | b'\r' | b'\n') {
            break;
        }
        if byte.is_ascii() {
            let _ = headers.content_type.push(char::from(byte));
        }
        ch = src.read();
    }
    if ch != Some(b';') {
        src.push(ch);
    }

    if !headers
        .content_type
        .as_str()
        .eq_ignore_ascii_case(MULTIPART_FORM_DATA)
    {
        return;
    }

    let boundary = &mut headers.boundary;
    let parsed = read_parameters(src, |name, value| {
        if name.eq_ignore_ascii_case("boundary") {
            boundary.clear();
            push_truncated(&mut *boundary, value);
        }
    });
    if !parsed {
        warn!("malformed Content-Type parameters");
    }
}
