//! Command Dispatcher
//!
//! Routes a parsed [`Command`] to its handler and writes the encoded reply
//! back to the connection it came from.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Dispatcher                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │   route     │───>│  execute    │───>│  respond    │     │
//! │  │ CommandTable│    │  handler()  │    │ AsyncWrite  │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                            │                                │
//! │                            ▼                                │
//! │                          Store                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command produces exactly one reply. Errors raised by a handler
//! (including an unknown command name) become error replies; only a failed
//! write is reported back to the caller.

use crate::commands::{CommandError, CommandTable};
use crate::protocol::{Command, Reply};
use crate::storage::Store;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// Executes commands against a shared [`Store`].
///
/// Cheap to clone; every connection task holds its own clone.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<Store>,
    table: Arc<CommandTable>,
}

impl Dispatcher {
    /// Creates a dispatcher with every built-in command registered.
    pub fn new(store: Arc<Store>) -> Self {
        Self::with_table(store, Arc::new(CommandTable::builtin()))
    }

    /// Creates a dispatcher over a custom command table.
    pub fn with_table(store: Arc<Store>, table: Arc<CommandTable>) -> Self {
        Self { store, table }
    }

    /// The store commands run against.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Routes and executes a command, returning its reply.
    pub fn execute(&self, command: &Command) -> Reply {
        let spec = match self.table.get(&command.name) {
            Some(spec) => spec,
            None => {
                debug!(command = %command.name, "Unknown command");
                return CommandError::UnknownCommand(command.name.clone()).into();
            }
        };

        trace!(command = spec.name, argc = command.args.len(), "Executing");

        let result = spec
            .check_arity(command.args.len())
            .and_then(|()| (spec.handler)(&self.store, &command.args));

        match result {
            Ok(reply) => reply,
            Err(err) => {
                trace!(command = spec.name, error = %err, "Command failed");
                err.into()
            }
        }
    }

    /// Executes a command and writes its encoded reply to `sink`.
    ///
    /// Exactly one reply is written and flushed. Returns the number of bytes
    /// written.
    pub async fn respond<W>(&self, command: &Command, sink: &mut W) -> io::Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let encoded = self.execute(command).encode();

        sink.write_all(&encoded).await?;
        sink.flush().await?;

        Ok(encoded.len())
    }
}
