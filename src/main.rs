//! tishkv server binary.
//!
//! Parses the command line, sets up logging, binds the listener and serves
//! until Ctrl+C.

use anyhow::Context;
use std::sync::Arc;
use tishkv::config::HELP;
use tishkv::{CliAction, Config, Server, Store};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn print_banner(config: &Config) {
    println!(
        r#"
tishkv v{} - in-memory key-value store
──────────────────────────────────────────────────────────────
Server starting on {} ({})
Expiry sweep every {} ms

Use Ctrl+C to shut down.
"#,
        tishkv::VERSION,
        config.bind_address(),
        config.protocol,
        config.sweep_interval.as_millis()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::parse_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(config)) => config,
        Ok(CliAction::Help) => {
            println!("{}", HELP);
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("tishkv version {}", tishkv::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", HELP);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tishkv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    print_banner(&config);

    let store = Arc::new(Store::new());
    info!("Store initialized with 64 shards");

    let server = Server::bind(config.clone(), store)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    server
        .run(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Server shutdown complete");
    Ok(())
}
