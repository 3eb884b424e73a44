//! Command Processing Layer
//!
//! Receives parsed commands, executes them against the store, and returns
//! replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Parser    │  (protocol module)
//! └────────┬────────┘
//!          │ Command
//!          ▼
//! ┌─────────────────┐
//! │   Dispatcher    │  (this module)
//! │                 │
//! │  - Route        │  CommandTable lookup
//! │  - Validate     │  arity
//! │  - Execute      │  handler fn
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Store       │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! ### Keyspace
//! - `PING [message]`
//! - `TTL key`, `DEL key [key ...]`, `EXISTS key [key ...]`
//!
//! ### Strings
//! - `SET key value [option ttl-seconds]`, `GET key`
//!
//! ### Sorted Sets
//! - `ZADD key score member [score member ...]`
//! - `ZSCORE`, `ZRANK`, `ZCARD`, `ZREM`
//!
//! ### Sets
//! - `SADD`, `SREM`, `SMEMBERS`, `SISMEMBER`, `SCARD`

mod args;
pub mod dispatcher;
pub mod error;
mod keyspace;
mod sets;
mod strings;
pub mod table;
mod zsets;

pub use dispatcher::Dispatcher;
pub use error::CommandError;
pub use keyspace::{TTL_KEY_NOT_EXIST, TTL_NO_EXPIRE};
pub use table::{CommandSpec, CommandTable, HandlerFn};
