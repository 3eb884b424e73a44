//! Client Connections
//!
//! One async task per client. The task owns the socket and its read buffer
//! and hands every complete request to a shared
//! [`Dispatcher`](crate::commands::Dispatcher).
//!
//! ```text
//!        TcpListener (server)
//!              │ accept()
//!              ▼
//!      tokio::spawn(handle_connection)
//!              │
//!              ▼
//!   ┌──────────────────────────────────────────┐
//!   │ ConnectionHandler                        │
//!   │  read bytes ─> RespParser ─> Dispatcher  │
//!   │                                   │      │
//!   │               reply <─────────────┘      │
//!   └──────────────────────────────────────────┘
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
