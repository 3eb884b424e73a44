//! TCP Server
//!
//! Owns the listener, the shared [`Store`] and the background expiry
//! sweeper. Every accepted connection is served by its own task.

use crate::commands::Dispatcher;
use crate::config::Config;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::{ExpiryConfig, ExpirySweeper, Store};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// A bound, not yet running, server.
pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
    stats: Arc<ConnectionStats>,
    config: Config,
}

impl Server {
    /// Binds the listener described by `config`.
    ///
    /// Commands run against `store`, so callers can inspect it or share it
    /// between servers.
    pub async fn bind(config: Config, store: Arc<Store>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;

        Ok(Self {
            listener,
            dispatcher: Dispatcher::new(store),
            stats: Arc::new(ConnectionStats::new()),
            config,
        })
    }

    /// The address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Counters shared by all connections.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Serves clients until `shutdown` completes.
    ///
    /// The expiry sweeper runs for exactly as long as this future.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let _sweeper = ExpirySweeper::start(
            Arc::clone(self.dispatcher.store()),
            ExpiryConfig {
                interval: self.config.sweep_interval,
            },
        );

        info!(
            address = %self.config.bind_address(),
            protocol = %self.config.protocol,
            "Listening"
        );

        tokio::select! {
            _ = accept_loop(self.listener, self.dispatcher, self.stats) => {}
            _ = shutdown => {
                info!("Shutdown signal received, stopping server...");
            }
        }
    }
}

/// Accepts connections forever. A failed accept is logged and skipped.
async fn accept_loop(
    listener: TcpListener,
    dispatcher: Dispatcher,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let dispatcher = dispatcher.clone();
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, dispatcher, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
