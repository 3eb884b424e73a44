//! Per-Connection Supervisor
//!
//! Each accepted client gets its own task running a read → parse → dispatch
//! loop until the client disconnects or an error occurs.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! accept ──> ConnectionHandler::run
//!               │
//!               ▼
//!     ┌──────────────────────────────┐
//!     │ parse every complete request │<──┐
//!     │ in the buffer, respond to    │   │
//!     │ each one in order            │   │
//!     └──────────────┬───────────────┘   │
//!                    ▼                   │
//!     ┌──────────────────────────────┐   │
//!     │ read more bytes              │───┘
//!     └──────────────┬───────────────┘
//!                    ▼
//!      EOF / I/O error / protocol error ──> task ends
//! ```
//!
//! TCP is a stream, so one read may hold part of a request or several
//! pipelined requests. Bytes accumulate in a `BytesMut` and are consumed only
//! once a whole request has been parsed.

use crate::commands::Dispatcher;
use crate::protocol::{Command, ParseError, Reply, RespParser, MAX_BULK_SIZE, MAX_INLINE_SIZE};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Upper bound for one buffered request: the largest bulk argument the
/// parser accepts plus room for the rest of the request.
const MAX_BUFFER_SIZE: usize = MAX_BULK_SIZE + MAX_INLINE_SIZE;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Counters shared by every connection task.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands dispatched
    pub commands_processed: AtomicU64,
    /// Connections closed because of a protocol error
    pub protocol_errors: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// State for one connected client.
pub struct ConnectionHandler {
    /// The TCP stream for this connection
    stream: BufWriter<TcpStream>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Bytes received but not yet parsed
    buffer: BytesMut,

    /// Shared command dispatcher
    dispatcher: Dispatcher,

    parser: RespParser,

    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        dispatcher: Dispatcher,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            dispatcher,
            parser: RespParser::new(),
            stats,
        }
    }

    /// Runs the connection loop to completion.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(ConnectionError::ClientDisconnected) => {
                info!(client = %self.addr, commands = self.parser.decoded(), "Client disconnected")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        self.stats.connection_closed();
        result
    }

    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(command) = self.try_parse_command().await? {
                let written = self.dispatcher.respond(&command, &mut self.stream).await?;

                self.stats.command_processed();
                self.stats.bytes_written(written);
                trace!(client = %self.addr, command = %command.name, bytes = written, "Sent reply");
            }

            self.read_more_data().await?;
        }
    }

    /// Attempts to parse one command from the front of the buffer.
    ///
    /// On malformed input the client is told why before the error is
    /// returned, which ends the connection.
    async fn try_parse_command(&mut self) -> Result<Option<Command>, ConnectionError> {
        match self.parser.parse(&self.buffer) {
            Ok(Some((command, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed command"
                );
                Ok(Some(command))
            }
            Ok(None) => {
                trace!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "Incomplete command, need more data"
                );
                Ok(None)
            }
            Err(e) => {
                warn!(client = %self.addr, error = %e, "Protocol error");
                self.stats.protocol_error();
                self.send_protocol_error(&e).await?;
                Err(ConnectionError::ParseError(e))
            }
        }
    }

    async fn send_protocol_error(&mut self, err: &ParseError) -> Result<(), ConnectionError> {
        self.send_error_reply(format!("ERR Protocol error: {}", err)).await
    }

    async fn send_error_reply(&mut self, message: String) -> Result<(), ConnectionError> {
        let encoded = Reply::error(message).encode();
        self.stream.write_all(&encoded).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(encoded.len());
        Ok(())
    }

    /// Reads more bytes into the buffer, growing it for large requests.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            self.stats.protocol_error();
            self.send_error_reply(format!(
                "ERR Protocol error: request exceeds {} bytes",
                MAX_BUFFER_SIZE
            ))
            .await?;
            return Err(ConnectionError::BufferFull);
        }

        // Grow geometrically, never past the cap.
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            let additional = self
                .buffer
                .len()
                .max(INITIAL_BUFFER_SIZE)
                .min(MAX_BUFFER_SIZE - self.buffer.len());
            self.buffer.reserve(additional);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            return if self.buffer.is_empty() {
                Err(ConnectionError::ClientDisconnected)
            } else {
                Err(ConnectionError::UnexpectedEof)
            };
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed request framing
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// Client disconnected between requests
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Client disconnected in the middle of a request
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// A single request outgrew the read buffer
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Runs a client connection to completion.
///
/// Errors are logged by the handler; nothing propagates to the accept loop.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    dispatcher: Dispatcher,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, dispatcher, stats);
    if let Err(e) = handler.run().await {
        trace!(client = %addr, error = %e, "Connection task finished");
    }
}
