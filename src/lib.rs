//! # tishkv - An In-Memory Key-Value Store
//!
//! tishkv serves string, sorted-set and set values over RESP (the Redis wire
//! protocol). Any key may carry a time-to-live.
//!
//! ## Features
//!
//! - **RESP over TCP**: works with `redis-cli` and Redis client libraries
//! - **Sharded storage**: 64 `RwLock` shards so unrelated keys rarely contend
//! - **TTL**: expired keys are hidden on access and reclaimed by a background
//!   sweeper
//! - **Typed values**: strings, sorted sets (score + rank), sets
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               tishkv                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │   Server    │───>│ Connection  │───>│ Dispatcher  │                  │
//! │  │ (Listener)  │    │  Handler    │    │CommandTable │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                     ┌──────┴──────┐           ▼                         │
//! │                     │ RespParser  │   ┌────────────────────────────┐    │
//! │                     └─────────────┘   │           Store            │    │
//! │                                       │ ┌───────┐┌───────┐┌─────┐ │    │
//! │                                       │ │Shard 0││Shard 1││ ... │ │    │
//! │                                       │ └───────┘└───────┘└─────┘ │    │
//! │                                       └────────────────────────────┘    │
//! │                                                    ▲                    │
//! │                                       ┌────────────┴───────────────┐    │
//! │                                       │  ExpirySweeper (tokio task)│    │
//! │                                       └────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use tishkv::{Config, Server, Store};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let store = Arc::new(Store::new());
//!     let server = Server::bind(Config::default(), store).await?;
//!
//!     server
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: objects, sorted sets, sets, the sharded store and the sweeper
//! - [`protocol`]: RESP request parser and reply encoding
//! - [`commands`]: command table, handlers and the dispatcher
//! - [`connection`]: per-client read/dispatch loop
//! - [`server`]: listener and accept loop
//! - [`config`]: command-line options

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

pub use commands::{CommandError, Dispatcher};
pub use config::{CliAction, Config, ConfigError};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{Command, ParseError, Reply, RespParser};
pub use server::Server;
pub use storage::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper, Store};

/// The default port tishkv listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host tishkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of tishkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
