// Server mode - standalone receiver for envoy metrics streams
//
// Binds a TCP listener, serves one stream session per connection and drains
// normalized records through a channel standing in for the downstream
// aggregation pipeline.
//
// Features:
// - Length-delimited framed stream transport
// - Structured logging with tracing (text or JSON)
// - Graceful shutdown on Ctrl+C / SIGTERM

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info, warn};

pub mod config;
mod connection;
mod init;
mod sink;

pub use config::{LogFormat, ServerConfig};
pub use connection::run_connection;
pub use sink::{drain, ChannelReceiver, OutboundRecord};

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Entry point for server mode
pub async fn run(config: ServerConfig) -> Result<()> {
    init::init_tracing(&config);

    let (receiver, outbound) = ChannelReceiver::new();
    let drain_task = tokio::spawn(sink::drain(outbound));

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;

    info!(
        "Envoy metrics stream endpoint listening on {}",
        config.listen_addr
    );
    info!("Press Ctrl+C or send SIGTERM to stop");

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    let receiver = receiver.clone();
                    tokio::spawn(async move {
                        debug!(%peer, "metrics stream connected");
                        if let Err(error) = run_connection(socket, receiver).await {
                            warn!(%peer, %error, "metrics stream transport error");
                        }
                    });
                }
                Err(error) => warn!(%error, "failed to accept connection"),
            },
            _ = shutdown_signal() => break,
        }
    }

    drain_task.abort();
    info!("Server shutdown complete");

    Ok(())
}
