//! RESP Wire Protocol
//!
//! The boundary between raw connection bytes and the command layer:
//!
//! - `parser`: incremental decoder from bytes to [`Command`]
//! - `types`: the [`Command`] and [`Reply`] types and reply encoding
//!
//! ## Example
//!
//! ```
//! use tishkv::protocol::{parse_command, Reply};
//!
//! let (command, _consumed) = parse_command(b"*1\r\n$4\r\nPING\r\n").unwrap().unwrap();
//! assert_eq!(command.name, "PING");
//!
//! assert_eq!(Reply::pong().encode(), b"+PONG\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{
    parse_command, ParseError, ParseResult, RespParser, MAX_BULK_SIZE, MAX_INLINE_SIZE,
    MAX_MULTIBULK_LEN,
};
pub use types::{Command, Reply};
