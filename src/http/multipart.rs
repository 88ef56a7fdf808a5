//! `multipart/form-data` decoding.
//!
//! A multipart body is a sequence of parts separated by a delimiter line:
//!
//! ```text
//! --boundary\r\n
//! Content-Disposition: form-data; name="field"\r\n
//! \r\n
//! value\r\n
//! --boundary\r\n
//! Content-Disposition: form-data; name="upload"; filename="a.bin"\r\n
//! Content-Type: application/octet-stream\r\n
//! \r\n
//! <bytes>\r\n
//! --boundary--\r\n
//! ```
//!
//! [`MultipartReader`] walks such a body straight off the connection. Part
//! headers are decoded into a [`Part`]; part bodies are streamed into caller
//! buffers of any size, so uploads much larger than RAM can be written to flash
//! chunk by chunk.

use super::reader::ByteStream;
use super::request::CONTENT_TYPE_LEN;
use super::scanner::Scan;
use heapless::{String, Vec};

/// Capacity of a parameter name seen by [`read_parameters`].
pub const PARAM_NAME_LEN: usize = 32;

/// Capacity of a parameter value seen by [`read_parameters`].
pub const PARAM_VALUE_LEN: usize = 70;

/// Capacity of [`Part::name`].
pub const PART_NAME_LEN: usize = 32;

/// Capacity of [`Part::filename`].
pub const PART_FILENAME_LEN: usize = 64;

/// Bytes in front of the boundary text in a delimiter.
const DELIMITER_PREFIX: &[u8] = b"\r\n--";

/// Headers of one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    /// Form field name from `Content-Disposition`.
    pub name: String<PART_NAME_LEN>,
    /// File name from `Content-Disposition`, empty for plain fields.
    pub filename: String<PART_FILENAME_LEN>,
    /// The part's own `Content-Type`, empty when not given.
    pub content_type: String<CONTENT_TYPE_LEN>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartState {
    /// Before the first delimiter.
    Preamble,
    /// A delimiter was consumed, part headers follow.
    Headers,
    /// Inside a part body.
    Body,
    /// Closing delimiter seen, or the body ended.
    Finished,
}

/// Incremental multipart reader.
///
/// The reader keeps only its position in the body; the byte stream and the
/// boundary are passed to every call.
#[derive(Debug, Clone)]
pub struct MultipartReader {
    state: PartState,
    // delimiter bytes that turned out to be content, still to be handed out
    carry_from: usize,
    carry_to: usize,
}

impl Default for MultipartReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartReader {
    /// A reader positioned before the first part.
    pub fn new() -> Self {
        Self {
            state: PartState::Preamble,
            carry_from: 0,
            carry_to: 0,
        }
    }

    /// Whether the closing delimiter (or the end of the body) was reached.
    pub fn is_finished(&self) -> bool {
        self.state == PartState::Finished
    }

    /// Advance to the next part and decode its headers.
    ///
    /// Any unread content of the current part is skipped. Returns `None` when
    /// there are no more parts: after the closing delimiter, at end of stream,
    /// when no delimiter is found, or when a `Content-Disposition` line is
    /// malformed. The caller should stop processing the body in all cases.
    pub fn next_part<S: Scan + ?Sized>(&mut self, src: &mut S, boundary: &str) -> Option<Part> {
        if boundary.is_empty() {
            return None;
        }

        loop {
            match self.state {
                PartState::Finished => return None,
                PartState::Headers => break,
                PartState::Body => {
                    let mut scratch = [0u8; 16];
                    while !self.read_part_content(src, boundary, &mut scratch).1 {}
                }
                PartState::Preamble => {
                    if !seek_boundary(src, boundary) {
                        debug!("no multipart boundary found");
                        self.state = PartState::Finished;
                        return None;
                    }
                    self.state = if src.expect(b"--") {
                        PartState::Finished
                    } else {
                        PartState::Headers
                    };
                }
            }
        }

        let mut part = Part::default();
        loop {
            if src.expect(b"\r\n\r\n") {
                self.state = PartState::Body;
                self.carry_from = 0;
                self.carry_to = 0;
                trace!("multipart part {}", part.name.as_str());
                return Some(part);
            }

            if src.expect_ignore_ascii_case(b"Content-Disposition:") {
                let parsed = read_parameters(src, |name, value| {
                    if name.eq_ignore_ascii_case("name") {
                        part.name.clear();
                        push_truncated(&mut part.name, value);
                    } else if name.eq_ignore_ascii_case("filename") {
                        part.filename.clear();
                        push_truncated(&mut part.filename, value);
                    }
                });
                if !parsed {
                    warn!("malformed Content-Disposition");
                    self.state = PartState::Finished;
                    return None;
                }
                continue;
            }

            if src.expect_ignore_ascii_case(b"Content-Type:") {
                src.read_header_value(&mut part.content_type);
                continue;
            }

            if src.read().is_none() {
                self.state = PartState::Finished;
                return None;
            }
        }
    }

    /// Copy body bytes of the current part into `buf`.
    ///
    /// Returns the number of bytes stored and whether the part is complete.
    /// `false` means `buf` filled up first; call again to continue the same
    /// part. Bytes that start like a delimiter but turn out not to be one are
    /// returned as ordinary content.
    pub fn read_part_content<S: Scan + ?Sized>(
        &mut self,
        src: &mut S,
        boundary: &str,
        buf: &mut [u8],
    ) -> (usize, bool) {
        let mut len = self.drain_carry(boundary, buf);
        if self.state != PartState::Body {
            return (len, true);
        }

        while len < buf.len() {
            let Some(ch) = src.read() else {
                debug!("multipart body ended without closing delimiter");
                self.state = PartState::Finished;
                return (len, true);
            };

            if ch != b'\r' {
                buf[len] = ch;
                len += 1;
                continue;
            }

            let matched = match_delimiter(src, boundary);
            if matched == DELIMITER_PREFIX.len() + boundary.len() {
                if src.expect(b"--") {
                    let _ = src.expect(b"\r\n");
                    self.state = PartState::Finished;
                } else {
                    self.state = PartState::Headers;
                }
                return (len, true);
            }

            self.carry_from = 0;
            self.carry_to = matched;
            len += self.drain_carry(boundary, &mut buf[len..]);
        }

        (len, false)
    }

    fn drain_carry(&mut self, boundary: &str, buf: &mut [u8]) -> usize {
        let mut len = 0;
        while self.carry_from < self.carry_to && len < buf.len() {
            buf[len] = delimiter_byte(boundary, self.carry_from);
            self.carry_from += 1;
            len += 1;
        }
        len
    }
}

/// Byte `index` of the delimiter `\r\n--boundary`.
fn delimiter_byte(boundary: &str, index: usize) -> u8 {
    match DELIMITER_PREFIX.get(index) {
        Some(&byte) => byte,
        None => boundary
            .as_bytes()
            .get(index - DELIMITER_PREFIX.len())
            .copied()
            .unwrap_or_default(),
    }
}

/// Match the rest of a delimiter after its leading CR has been read.
///
/// Returns how many delimiter bytes matched, counting the CR. The first
/// mismatching byte is pushed back; the matched ones are not, since none of
/// them can begin a new delimiter.
fn match_delimiter<S: ByteStream + ?Sized>(src: &mut S, boundary: &str) -> usize {
    let mut matched = 1;
    for &expected in DELIMITER_PREFIX[1..].iter().chain(boundary.as_bytes()) {
        let ch = src.read();
        if ch != Some(expected) {
            src.push(ch);
            return matched;
        }
        matched += 1;
    }
    matched
}

/// Skip forward to just past the next `--boundary`.
fn seek_boundary<S: Scan + ?Sized>(src: &mut S, boundary: &str) -> bool {
    loop {
        if src.expect(b"--") {
            if src.expect(boundary.as_bytes()) {
                return true;
            }
            // the second dash may start the real delimiter
            src.push(Some(b'-'));
            continue;
        }
        if src.read().is_none() {
            return false;
        }
    }
}

/// Read `name=value` parameters up to the end of the line.
///
/// Parameters are separated by `;` or whitespace. Values may be quoted, in
/// which case they can contain separators; a quoted value cannot continue past
/// the line end. `visit` is called for every parameter with a non-empty name.
/// The CR or LF ending the line is pushed back.
///
/// Returns `false` on a `"` inside a name or an `=` inside an unquoted value.
pub fn read_parameters<S, F>(src: &mut S, mut visit: F) -> bool
where
    S: ByteStream + ?Sized,
    F: FnMut(&str, &str),
{
    let mut name: Vec<u8, PARAM_NAME_LEN> = Vec::new();
    let mut value: Vec<u8, PARAM_VALUE_LEN> = Vec::new();
    let mut in_value = false;
    let mut quoted = false;

    loop {
        let ch = src.read();
        let Some(byte) = ch else {
            emit(&mut visit, &name, &value);
            return true;
        };

        match byte {
            b'\r' | b'\n' => {
                src.push(ch);
                emit(&mut visit, &name, &value);
                return true;
            }
            b'"' if quoted => quoted = false,
            b'"' if in_value && value.is_empty() => quoted = true,
            b'"' if !in_value => return false,
            b'=' if quoted => push_byte(&mut value, byte),
            b'=' if in_value => return false,
            b'=' => in_value = true,
            b';' | b' ' | b'\t' if !quoted => {
                emit(&mut visit, &name, &value);
                name.clear();
                value.clear();
                in_value = false;
            }
            _ if in_value => push_byte(&mut value, byte),
            _ => push_byte(&mut name, byte),
        }
    }
}

fn emit<F: FnMut(&str, &str)>(visit: &mut F, name: &[u8], value: &[u8]) {
    let name = utf8_prefix(name);
    if !name.is_empty() {
        visit(name, utf8_prefix(value));
    }
}

fn push_byte<const N: usize>(out: &mut Vec<u8, N>, byte: u8) {
    let _ = out.push(byte);
}

/// The longest valid UTF-8 prefix of `bytes`.
fn utf8_prefix(bytes: &[u8]) -> &str {
    match core::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => core::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default(),
    }
}

/// Append as much of `value` as fits.
pub(crate) fn push_truncated<const N: usize>(out: &mut String<N>, value: &str) {
    for c in value.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::reader::Pushback;

    fn reader(input: &[u8]) -> Pushback<&[u8]> {
        Pushback::new(input)
    }

    const SINGLE: &[u8] = b"--boundary\r\n\
        Content-Disposition: form-data; name=\"x\"\r\n\
        \r\n\
        hello\r\n\
        --boundary--\r\n";

    #[test]
    fn test_single_field() {
        let mut r = reader(SINGLE);
        let mut multipart = MultipartReader::new();

        let part = multipart.next_part(&mut r, "boundary").unwrap();
        assert_eq!(part.name.as_str(), "x");
        assert!(part.filename.is_empty());

        let mut buf = [0u8; 32];
        let (len, done) = multipart.read_part_content(&mut r, "boundary", &mut buf);
        assert_eq!(&buf[..len], b"hello");
        assert!(done);
        assert!(multipart.is_finished());

        assert!(multipart.next_part(&mut r, "boundary").is_none());
        assert_eq!(r.read(), None);
    }

    #[test]
    fn test_two_parts_with_file() {
        let body = b"preamble\r\n--XyZ\r\n\
            Content-Disposition: form-data; name=\"ssid\"\r\n\r\n\
            home net\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"fw\"; filename=\"fw.bin\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            \x00\x01\r\n-\r\n--X\x02\r\n\
            --XyZ--\r\n";
        let mut r = reader(body);
        let mut multipart = MultipartReader::new();

        let part = multipart.next_part(&mut r, "XyZ").unwrap();
        assert_eq!(part.name.as_str(), "ssid");
        let mut buf = [0u8; 32];
        let (len, done) = multipart.read_part_content(&mut r, "XyZ", &mut buf);
        assert_eq!(&buf[..len], b"home net");
        assert!(done);
        assert!(!multipart.is_finished());

        let part = multipart.next_part(&mut r, "XyZ").unwrap();
        assert_eq!(part.name.as_str(), "fw");
        assert_eq!(part.filename.as_str(), "fw.bin");
        assert_eq!(part.content_type.as_str(), "application/octet-stream");

        let (len, done) = multipart.read_part_content(&mut r, "XyZ", &mut buf);
        assert_eq!(&buf[..len], b"\x00\x01\r\n-\r\n--X\x02");
        assert!(done);

        assert!(multipart.next_part(&mut r, "XyZ").is_none());
    }

    #[test]
    fn test_content_in_small_chunks() {
        let mut r = reader(SINGLE);
        let mut multipart = MultipartReader::new();
        multipart.next_part(&mut r, "boundary").unwrap();

        let mut buf = [0u8; 2];
        let mut collected = std::vec::Vec::new();
        loop {
            let (len, done) = multipart.read_part_content(&mut r, "boundary", &mut buf);
            collected.extend_from_slice(&buf[..len]);
            if done {
                break;
            }
        }
        assert_eq!(collected, b"hello");
    }

    #[test]
    fn test_false_delimiter_split_across_chunks() {
        let body = b"--b1\r\n\r\nab\r\n--b2cd\r\n--b1--";
        let mut r = reader(body);
        let mut multipart = MultipartReader::new();
        multipart.next_part(&mut r, "b1").unwrap();

        let mut buf = [0u8; 4];
        let mut collected = std::vec::Vec::new();
        loop {
            let (len, done) = multipart.read_part_content(&mut r, "b1", &mut buf);
            collected.extend_from_slice(&buf[..len]);
            if done {
                break;
            }
        }
        assert_eq!(collected, b"ab\r\n--b2cd");
        assert!(multipart.is_finished());
    }

    #[test]
    fn test_skips_unread_part() {
        let body = b"--b\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n0123456789abcdefghijklmnop\r\n\
            --b\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\nB\r\n--b--\r\n";
        let mut r = reader(body);
        let mut multipart = MultipartReader::new();

        assert_eq!(multipart.next_part(&mut r, "b").unwrap().name.as_str(), "a");
        assert_eq!(multipart.next_part(&mut r, "b").unwrap().name.as_str(), "b");
        let mut buf = [0u8; 8];
        let (len, done) = multipart.read_part_content(&mut r, "b", &mut buf);
        assert_eq!((&buf[..len], done), (&b"B"[..], true));
    }

    #[test]
    fn test_no_boundary_in_body() {
        let mut r = reader(b"just some bytes");
        let mut multipart = MultipartReader::new();
        assert!(multipart.next_part(&mut r, "boundary").is_none());
        assert!(multipart.is_finished());
    }

    #[test]
    fn test_truncated_body_ends_part() {
        let mut r = reader(b"--b\r\n\r\npartial");
        let mut multipart = MultipartReader::new();
        assert!(multipart.next_part(&mut r, "b").is_some());
        let mut buf = [0u8; 32];
        let (len, done) = multipart.read_part_content(&mut r, "b", &mut buf);
        assert_eq!((&buf[..len], done), (&b"partial"[..], true));
        assert!(multipart.next_part(&mut r, "b").is_none());
    }

    #[test]
    fn test_malformed_disposition() {
        let mut r = reader(b"--b\r\nContent-Disposition: form-data; na\"me=x\r\n\r\n");
        let mut multipart = MultipartReader::new();
        assert!(multipart.next_part(&mut r, "b").is_none());
    }

    #[test]
    fn test_read_parameters() {
        let mut r = reader(b" form-data; name=\"a b\"; filename=plain.txt\r\nrest");
        let mut seen = std::vec::Vec::new();
        assert!(read_parameters(&mut r, |n, v| seen.push((n.to_owned(), v.to_owned()))));
        assert_eq!(
            seen,
            [
                ("form-data".to_owned(), "".to_owned()),
                ("name".to_owned(), "a b".to_owned()),
                ("filename".to_owned(), "plain.txt".to_owned()),
            ]
        );
        assert_eq!(r.read(), Some(b'\r'));
    }

    #[test]
    fn test_utf8_filename_kept() {
        let body = "--b\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"résumé.pdf\"\r\n\r\n\
            x\r\n--b--\r\n";
        let mut r = reader(body.as_bytes());
        let mut multipart = MultipartReader::new();
        let part = multipart.next_part(&mut r, "b").unwrap();
        assert_eq!(part.name.as_str(), "cv");
        assert_eq!(part.filename.as_str(), "résumé.pdf");
    }

    #[test]
    fn test_read_parameters_cuts_at_char_boundary() {
        // 69 ASCII bytes then a two-byte character straddling the 70 byte limit
        let mut input = std::vec::Vec::new();
        input.extend_from_slice(b"v=");
        input.extend_from_slice(&[b'a'; 69]);
        input.extend_from_slice("é\r\n".as_bytes());
        let mut r = reader(&input);
        let mut value = std::string::String::new();
        assert!(read_parameters(&mut r, |_, v| value.push_str(v)));
        assert_eq!(value, "a".repeat(69));
    }

    #[test]
    fn test_boundary_after_extra_dash() {
        let mut r = reader(b"x---b\r\n\r\nhi\r\n--b--\r\n");
        let mut multipart = MultipartReader::new();
        assert!(multipart.next_part(&mut r, "b").is_some());
        let mut buf = [0u8; 8];
        let (len, done) = multipart.read_part_content(&mut r, "b", &mut buf);
        assert_eq!((&buf[..len], done), (&b"hi"[..], true));
        assert!(multipart.is_finished());
    }

    #[test]
    fn test_read_parameters_errors() {
        let mut r = reader(b"a=b=c\r\n");
        assert!(!read_parameters(&mut r, |_, _| {}));

        let mut r = reader(b"na\"me=x\r\n");
        assert!(!read_parameters(&mut r, |_, _| {}));

        // equals sign inside quotes is fine
        let mut r = reader(b"boundary=\"==x==\"\r\n");
        let mut value = std::string::String::new();
        assert!(read_parameters(&mut r, |_, v| value.push_str(v)));
        assert_eq!(value, "==x==");
    }

    #[test]
    fn test_unterminated_quote_stops_at_line_end() {
        let mut r = reader(b"name=\"abc\r\nnext");
        let mut value = std::string::String::new();
        assert!(read_parameters(&mut r, |_, v| value.push_str(v)));
        assert_eq!(value, "abc");
        assert_eq!(r.read(), Some(b'\r'));
    }

    #[test]
    fn test_push_truncated() {
        let mut out: String<4> = String::new();
        push_truncated(&mut out, "abcdef");
        assert_eq!(out.as_str(), "abcd");
    }
}
