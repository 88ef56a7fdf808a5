//! Token scanning on top of a [`ByteStream`].
//!
//! Every primitive here either consumes exactly what it recognized or leaves the
//! stream where it found it, using the pushback stack to undo lookahead. That
//! property is what lets the request parser try one header name after another
//! at the same position.

use super::reader::{ByteStream, PUSHBACK_CAPACITY};
use heapless::{String, Vec};

/// Outcome of [`next_url_param`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlParam {
    /// A parameter was decoded completely.
    Ok,
    /// The name did not fit its buffer and was truncated.
    NameOverflow,
    /// The value did not fit its buffer and was truncated.
    ValueOverflow,
    /// Both name and value were truncated.
    BothOverflow,
    /// No parameters left.
    EndOfString,
}

/// Scanning primitives, available on every [`ByteStream`].
pub trait Scan: ByteStream {
    /// Consume `literal` if it is next in the stream.
    ///
    /// On a mismatch the mismatched byte and every byte matched so far are
    /// pushed back, so the stream reads exactly as before the call.
    fn expect(&mut self, literal: &[u8]) -> bool {
        for (matched, &expected) in literal.iter().enumerate() {
            let ch = self.read();
            if ch != Some(expected) {
                self.push(ch);
                for &byte in literal[..matched].iter().rev() {
                    self.push(Some(byte));
                }
                return false;
            }
        }
        true
    }

    /// Like [`expect`](Self::expect) but ignoring ASCII case. On a mismatch the
    /// bytes actually read are restored, not the literal's spelling.
    fn expect_ignore_ascii_case(&mut self, literal: &[u8]) -> bool {
        let mut seen: Vec<u8, PUSHBACK_CAPACITY> = Vec::new();
        for &expected in literal {
            let ch = self.read();
            match ch {
                Some(byte) if byte.eq_ignore_ascii_case(&expected) => {
                    // past the pushback capacity the rollback is lossy anyway
                    let _ = seen.push(byte);
                }
                _ => {
                    self.push(ch);
                    for &byte in seen.iter().rev() {
                        self.push(Some(byte));
                    }
                    return false;
                }
            }
        }
        true
    }

    /// Read the next byte that is neither a space nor a tab.
    fn skip_blanks(&mut self) -> Option<u8> {
        loop {
            match self.read() {
                Some(b' ') | Some(b'\t') => continue,
                other => return other,
            }
        }
    }

    /// Read an optionally negative decimal integer, skipping leading blanks.
    ///
    /// Returns `None` when no digit was found. The byte that ended the number is
    /// pushed back. Overflow wraps, as the 32-bit counter on the wire would.
    fn read_int(&mut self) -> Option<i32> {
        let mut ch = self.skip_blanks();

        let negate = ch == Some(b'-');
        if negate {
            ch = self.read();
        }

        let mut number: i32 = 0;
        let mut got_number = false;
        while let Some(digit @ b'0'..=b'9') = ch {
            got_number = true;
            number = number
                .wrapping_mul(10)
                .wrapping_add(i32::from(digit - b'0'));
            ch = self.read();
        }
        self.push(ch);

        if negate {
            number = number.wrapping_neg();
        }
        got_number.then_some(number)
    }

    /// Read a header value up to (not including) the carriage return.
    ///
    /// Leading blanks are skipped and the CR is pushed back. Bytes beyond the
    /// capacity of `out` are consumed and dropped; non-ASCII bytes are stored as
    /// `?`. Returns `false` when the value was truncated.
    fn read_header_value<const N: usize>(&mut self, out: &mut String<N>) -> bool {
        out.clear();
        let mut complete = true;
        let mut ch = self.skip_blanks();
        while let Some(byte) = ch {
            if byte == b'\r' {
                break;
            }
            let c = if byte.is_ascii() { char::from(byte) } else { '?' };
            if out.push(c).is_err() {
                complete = false;
            }
            ch = self.read();
        }
        self.push(ch);
        complete
    }

    /// Read one `name=value` pair of a URL-encoded request body.
    ///
    /// Pairs end at `&`. `+` decodes to a space and `%XX` to the byte it
    /// encodes. Each buffer keeps as many decoded bytes as its capacity allows.
    ///
    /// Returns `false` when the body is exhausted with no pair read, or when
    /// it ends inside a `%` escape. Loop until it returns `false`.
    fn read_post_param<const N: usize, const V: usize>(
        &mut self,
        name: &mut Vec<u8, N>,
        value: &mut Vec<u8, V>,
    ) -> bool {
        name.clear();
        value.clear();

        let mut in_value = false;
        let mut read_any = false;
        while let Some(mut ch) = self.read() {
            read_any = true;
            match ch {
                b'&' => return true,
                b'=' if !in_value => {
                    in_value = true;
                    continue;
                }
                b'+' => ch = b' ',
                b'%' => {
                    let hi = self.read();
                    let lo = self.read();
                    let (Some(hi), Some(lo)) = (hi, lo) else {
                        return false;
                    };
                    match (hex_value(hi), hex_value(lo)) {
                        (Some(h), Some(l)) => ch = (h << 4) | l,
                        _ => {
                            // not an escape, keep the percent sign literally
                            self.push(Some(lo));
                            self.push(Some(hi));
                        }
                    }
                }
                _ => {}
            }

            let _ = if in_value {
                value.push(ch)
            } else {
                name.push(ch)
            };
        }
        read_any
    }
}

impl<T: ByteStream + ?Sized> Scan for T {}

/// Value of an ASCII hex digit.
pub(crate) fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Decode the next `name=value` pair from a query string and advance `tail`
/// past it.
///
/// Handlers receive the query string as their URL tail; call this in a loop
/// until it returns [`UrlParam::EndOfString`].
///
/// # Examples
///
/// ```rust
/// use heapless::Vec;
/// use microweb::http::{UrlParam, next_url_param};
///
/// let mut tail = "led=on&name=my%20board";
/// let mut name: Vec<u8, 16> = Vec::new();
/// let mut value: Vec<u8, 16> = Vec::new();
///
/// assert_eq!(next_url_param(&mut tail, &mut name, &mut value), UrlParam::Ok);
/// assert_eq!((&name[..], &value[..]), (&b"led"[..], &b"on"[..]));
///
/// assert_eq!(next_url_param(&mut tail, &mut name, &mut value), UrlParam::Ok);
/// assert_eq!(&value[..], b"my board");
///
/// assert_eq!(next_url_param(&mut tail, &mut name, &mut value), UrlParam::EndOfString);
/// ```
pub fn next_url_param<const N: usize, const V: usize>(
    tail: &mut &str,
    name: &mut Vec<u8, N>,
    value: &mut Vec<u8, V>,
) -> UrlParam {
    name.clear();
    value.clear();

    if tail.is_empty() {
        return UrlParam::EndOfString;
    }

    let bytes = tail.as_bytes();
    let mut pos = 0;
    let mut in_value = false;
    let mut name_overflow = false;
    let mut value_overflow = false;

    while pos < bytes.len() {
        let mut ch = bytes[pos];
        pos += 1;
        match ch {
            b'&' => break,
            b'=' if !in_value => {
                in_value = true;
                continue;
            }
            b'+' => ch = b' ',
            b'%' => {
                if pos + 2 > bytes.len() {
                    // truncated escape ends the string
                    pos = bytes.len();
                    break;
                }
                if let (Some(h), Some(l)) = (hex_value(bytes[pos]), hex_value(bytes[pos + 1])) {
                    ch = (h << 4) | l;
                    pos += 2;
                }
            }
            _ => {}
        }

        if in_value {
            value_overflow |= value.push(ch).is_err();
        } else {
            name_overflow |= name.push(ch).is_err();
        }
    }

    *tail = &tail[pos..];

    match (name_overflow, value_overflow) {
        (false, false) => UrlParam::Ok,
        (true, false) => UrlParam::NameOverflow,
        (false, true) => UrlParam::ValueOverflow,
        (true, true) => UrlParam::BothOverflow,
    }
}
