//! RESP Request and Reply Types
//!
//! Requests arrive as arrays of bulk strings and are decoded into a
//! [`Command`]: an uppercase name plus zero or more binary-safe arguments.
//! Results travel back as a [`Reply`], which knows how to encode itself.
//!
//! ## Reply Encoding
//!
//! | Reply            | Wire format              |
//! |------------------|--------------------------|
//! | `Simple("OK")`   | `+OK\r\n`                |
//! | `Error(msg)`     | `-<msg>\r\n`             |
//! | `Integer(42)`    | `:42\r\n`                |
//! | `Bulk("hi")`     | `$2\r\nhi\r\n`           |
//! | `Nil`            | `$-1\r\n`                |
//! | `Array([..])`    | `*<n>\r\n<elements...>`  |

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name, uppercased
    pub name: String,
    /// Arguments following the name
    pub args: Vec<Bytes>,
}

impl Command {
    /// Creates a command, normalising the name to uppercase.
    pub fn new(name: &str, args: Vec<Bytes>) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            args,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

/// A reply to be encoded and written back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status reply, e.g. `+OK`. Must not contain CRLF.
    Simple(String),
    /// Error reply, e.g. `-ERR ...`. Must not contain CRLF.
    Error(String),
    /// 64-bit signed integer
    Integer(i64),
    /// Binary-safe bulk string
    Bulk(Bytes),
    /// Null bulk string
    Nil,
    /// Array of nested replies
    Array(Vec<Reply>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    pub fn pong() -> Self {
        Reply::Simple("PONG".to_string())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    pub fn nil() -> Self {
        Reply::Nil
    }

    pub fn array(values: Vec<Reply>) -> Self {
        Reply::Array(values)
    }

    /// Encodes the reply into its self-delimited wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    /// Encodes the reply into an existing buffer.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Simple(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Bulk(data) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            Reply::Nil => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
            Reply::Array(values) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.encode_into(buf);
                }
            }
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Simple(s) => write!(f, "{}", s),
            Reply::Error(s) => write!(f, "(error) {}", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(data) => write!(f, "\"{}\"", String::from_utf8_lossy(data)),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Array(values) if values.is_empty() => write!(f, "(empty array)"),
            Reply::Array(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, v)?;
                }
                Ok(())
            }
        }
    }
}
