//! Incremental RESP Request Parser
//!
//! Turns raw bytes from a connection into [`Command`]s. Two request forms are
//! accepted:
//!
//! - **Multibulk**: `*<n>\r\n` followed by `n` bulk strings, as sent by every
//!   Redis client library.
//! - **Inline**: a single whitespace-separated line, as typed into `telnet`
//!   or `nc`. Both `\r\n` and a bare `\n` terminate the line.
//!
//! The parser never consumes input itself. It returns:
//! - `Ok(Some((command, consumed)))` - a full request occupied `consumed` bytes
//! - `Ok(None)` - the request is incomplete, read more and retry
//! - `Err(ParseError)` - the bytes can never form a valid request

use crate::protocol::types::{prefix, Command, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur during request parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A length or count line is not a valid integer
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// The command name is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Multibulk count is zero or negative
    #[error("invalid multibulk length: {0}")]
    InvalidArrayLength(i64),

    /// A multibulk element is not a bulk string
    #[error("expected '$', got {0:#04x}")]
    UnexpectedPrefix(u8),

    /// Protocol violation (missing CRLF, empty inline command, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The request exceeds a size limit
    #[error("message too large: {size} (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements in one multibulk request
pub const MAX_MULTIBULK_LEN: usize = 1024 * 1024;

/// Maximum length of an inline request line (64 KB)
pub const MAX_INLINE_SIZE: usize = 64 * 1024;

/// An incremental request parser.
///
/// # Example
///
/// ```
/// use tishkv::protocol::RespParser;
///
/// let mut parser = RespParser::new();
/// let buf = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
///
/// let (command, consumed) = parser.parse(buf).unwrap().unwrap();
/// assert_eq!(command.name, "GET");
/// assert_eq!(consumed, buf.len());
/// ```
#[derive(Debug, Default)]
pub struct RespParser {
    /// Requests decoded so far (for tracing)
    decoded: u64,
}

impl RespParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests this parser has decoded.
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    /// Attempts to parse one request from the front of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(Command, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        let parsed = if buf[0] == prefix::ARRAY {
            parse_multibulk(buf)?
        } else {
            parse_inline(buf)?
        };

        if parsed.is_some() {
            self.decoded += 1;
        }
        Ok(parsed)
    }
}

/// Parses `*<n>\r\n($<len>\r\n<data>\r\n){n}`.
fn parse_multibulk(buf: &[u8]) -> ParseResult<Option<(Command, usize)>> {
    debug_assert!(buf[0] == prefix::ARRAY);

    let (count, mut consumed) = match parse_length_line(buf)? {
        Some(v) => v,
        None => return Ok(None),
    };

    if count <= 0 {
        return Err(ParseError::InvalidArrayLength(count));
    }
    let count = count as usize;
    if count > MAX_MULTIBULK_LEN {
        return Err(ParseError::MessageTooLarge {
            size: count,
            max: MAX_MULTIBULK_LEN,
        });
    }

    let mut parts = Vec::with_capacity(count.min(64));

    for _ in 0..count {
        match parse_bulk_string(&buf[consumed..])? {
            Some((data, used)) => {
                parts.push(data);
                consumed += used;
            }
            None => return Ok(None),
        }
    }

    let mut parts = parts.into_iter();
    let name = match parts.next() {
        Some(name) => name,
        None => return Err(ParseError::InvalidArrayLength(0)),
    };
    let name = std::str::from_utf8(&name).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

    Ok(Some((Command::new(name, parts.collect()), consumed)))
}

/// Parses `$<len>\r\n<data>\r\n`.
fn parse_bulk_string(buf: &[u8]) -> ParseResult<Option<(Bytes, usize)>> {
    if buf.is_empty() {
        return Ok(None);
    }
    if buf[0] != prefix::BULK_STRING {
        return Err(ParseError::UnexpectedPrefix(buf[0]));
    }

    let (length, data_start) = match parse_length_line(buf)? {
        Some(v) => v,
        None => return Ok(None),
    };

    if length < 0 {
        return Err(ParseError::InvalidBulkLength(length));
    }
    let length = length as usize;
    if length > MAX_BULK_SIZE {
        return Err(ParseError::MessageTooLarge {
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let total_needed = data_start + length + 2;
    if buf.len() < total_needed {
        return Ok(None);
    }

    if &buf[data_start + length..total_needed] != CRLF {
        return Err(ParseError::ProtocolError(
            "bulk string missing trailing CRLF".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);
    Ok(Some((data, total_needed)))
}

/// Parses the `<prefix><integer>\r\n` header shared by arrays and bulk strings.
///
/// Returns the integer and the number of bytes the header occupied.
fn parse_length_line(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    let end = match find_crlf(&buf[1..]) {
        Some(pos) => pos,
        None => return Ok(None),
    };

    let text = std::str::from_utf8(&buf[1..1 + end])
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    let n: i64 = text
        .parse()
        .map_err(|_| ParseError::InvalidInteger(text.to_string()))?;

    Ok(Some((n, 1 + end + 2)))
}

/// Parses an inline command line.
fn parse_inline(buf: &[u8]) -> ParseResult<Option<(Command, usize)>> {
    let newline = match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None if buf.len() > MAX_INLINE_SIZE => {
            return Err(ParseError::MessageTooLarge {
                size: buf.len(),
                max: MAX_INLINE_SIZE,
            })
        }
        None => return Ok(None),
    };
    if newline > MAX_INLINE_SIZE {
        return Err(ParseError::MessageTooLarge {
            size: newline,
            max: MAX_INLINE_SIZE,
        });
    }

    let line = buf[..newline].strip_suffix(b"\r").unwrap_or(&buf[..newline]);
    let line =
        std::str::from_utf8(line).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

    let mut words = line.split_whitespace();
    let name = match words.next() {
        Some(name) => name,
        None => {
            return Err(ParseError::ProtocolError(
                "empty inline command".to_string(),
            ))
        }
    };

    let args = words.map(|w| Bytes::copy_from_slice(w.as_bytes())).collect();

    Ok(Some((Command::new(name, args), newline + 1)))
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Parses a single request from a standalone buffer.
pub fn parse_command(buf: &[u8]) -> ParseResult<Option<(Command, usize)>> {
    RespParser::new().parse(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<Bytes> {
        parts.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    #[test]
    fn test_parse_multibulk() {
        let input = b"*3\r\n$3\r\nSET\r\n$1\r\na\r\n$5\r\nhello\r\n";
        let (cmd, consumed) = parse_command(input).unwrap().unwrap();

        assert_eq!(cmd, Command::new("SET", args(&["a", "hello"])));
        assert_eq!(consumed, input.len());
    }

    #[test]
    fn test_name_is_uppercased() {
        let input = b"*2\r\n$3\r\nget\r\n$1\r\na\r\n";
        let (cmd, _) = parse_command(input).unwrap().unwrap();
        assert_eq!(cmd.name, "GET");
    }

    #[test]
    fn test_arguments_keep_case() {
        let input = b"*2\r\n$4\r\nPING\r\n$5\r\nHeLLo\r\n";
        let (cmd, _) = parse_command(input).unwrap().unwrap();
        assert_eq!(cmd.args, args(&["HeLLo"]));
    }

    #[test]
    fn test_parse_incomplete() {
        let input = b"*2\r\n$3\r\nGET\r\n$4\r\nna";
        for end in 0..input.len() {
            assert!(
                parse_command(&input[..end]).unwrap().is_none(),
                "prefix of length {} should be incomplete",
                end
            );
        }
    }

    #[test]
    fn test_parse_pipelined_leaves_rest() {
        let input = b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n";
        let (cmd, consumed) = parse_command(input).unwrap().unwrap();

        assert_eq!(cmd.name, "PING");
        assert_eq!(consumed, 14);
        assert!(parse_command(&input[consumed..]).unwrap().is_some());
    }

    #[test]
    fn test_binary_safe_argument() {
        let input = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$5\r\nhel\x00o\r\n";
        let (cmd, _) = parse_command(input).unwrap().unwrap();
        assert_eq!(cmd.args[1], Bytes::from(&b"hel\x00o"[..]));
    }

    #[test]
    fn test_empty_bulk_argument() {
        let input = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$0\r\n\r\n";
        let (cmd, _) = parse_command(input).unwrap().unwrap();
        assert_eq!(cmd.args[1], Bytes::new());
    }

    #[test]
    fn test_parse_inline() {
        let (cmd, consumed) = parse_command(b"set  a   hello\r\n").unwrap().unwrap();
        assert_eq!(cmd, Command::new("SET", args(&["a", "hello"])));
        assert_eq!(consumed, 16);

        let (cmd, consumed) = parse_command(b"PING\n").unwrap().unwrap();
        assert_eq!(cmd, Command::new("PING", vec![]));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_inline_incomplete() {
        assert!(parse_command(b"PING").unwrap().is_none());
    }

    #[test]
    fn test_inline_line_too_long() {
        let mut line = vec![b'a'; MAX_INLINE_SIZE + 1];
        assert!(matches!(
            parse_command(&line),
            Err(ParseError::MessageTooLarge { .. })
        ));

        line.extend_from_slice(b"\r\n");
        assert!(matches!(
            parse_command(&line),
            Err(ParseError::MessageTooLarge { .. })
        ));

        assert!(parse_command(&line[..MAX_INLINE_SIZE]).unwrap().is_none());
    }

    #[test]
    fn test_empty_inline_is_error() {
        assert!(matches!(
            parse_command(b"   \r\n"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_invalid_counts() {
        assert_eq!(
            parse_command(b"*0\r\n"),
            Err(ParseError::InvalidArrayLength(0))
        );
        assert_eq!(
            parse_command(b"*x\r\n"),
            Err(ParseError::InvalidInteger("x".to_string()))
        );
        assert_eq!(
            parse_command(b"*1\r\n$-1\r\n"),
            Err(ParseError::InvalidBulkLength(-1))
        );
    }

    #[test]
    fn test_non_bulk_element_is_error() {
        assert_eq!(
            parse_command(b"*1\r\n:1\r\n"),
            Err(ParseError::UnexpectedPrefix(b':'))
        );
    }

    #[test]
    fn test_missing_trailing_crlf() {
        assert!(matches!(
            parse_command(b"*1\r\n$4\r\nPINGxx"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_parser_counts_decoded() {
        let mut parser = RespParser::new();
        parser.parse(b"PING\r\n").unwrap();
        parser.parse(b"PI").unwrap();
        assert_eq!(parser.decoded(), 1);
    }
}
