//! # Fabric Runtime
//!
//! Host process for the tiered event notification fabric.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `FABRIC_*` environment variables
//! 2. Initialize tracing
//! 3. Build the transport and replay adapters the configuration selects
//! 4. Construct the fabric and start the background connect
//! 5. Register a structured-log sink per channel
//! 6. Run until Ctrl+C, then shut down the relays
//!
//! ## Delivery Tiers
//!
//! ```text
//! publish ──→ replay log (best-effort)
//!         ──→ transport (when connected; peers + this process via relay)
//!         ──→ local emitter (fallback)
//! ```
//!
//! Local-only operation (no `FABRIC_TRANSPORT_URL`) is first-class: the
//! fabric reports `Disabled` and every publish takes the local path.

mod config;

use anyhow::{bail, Context, Result};
use shared_bus::adapters::{JsonlReplay, LoopbackTransport, NoopReplay};
use shared_bus::{EventFabric, ReplaySink, Transport};
use shared_types::Channel;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::RuntimeConfig;

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("invalid FABRIC_LOG_LEVEL {level:?}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;
    Ok(())
}

/// Resolve the configured transport URL to an adapter. Only `loopback:`
/// URLs are recognized in-tree; embedders inject real broker clients
/// behind the [`Transport`] port.
fn build_transport(config: &RuntimeConfig) -> Result<Option<Arc<dyn Transport>>> {
    match config.transport_url.as_deref() {
        None => Ok(None),
        Some(url) if url.starts_with("loopback:") => {
            Ok(Some(Arc::new(LoopbackTransport::new())))
        }
        Some(url) => bail!("unsupported transport url {url:?} (expected loopback:)"),
    }
}

fn build_replay(config: &RuntimeConfig) -> Arc<dyn ReplaySink> {
    match &config.replay_path {
        Some(path) => Arc::new(JsonlReplay::new(path.clone())),
        None => Arc::new(NoopReplay),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    init_tracing(&config.log_level)?;

    info!("===========================================");
    info!("  Event Fabric Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(
        transport = config.transport_url.as_deref().unwrap_or("(local-only)"),
        replay = %config
            .replay_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(disabled)".to_owned()),
        publish_timeout_ms = config.publish_timeout_ms,
        "configuration loaded"
    );

    let transport = build_transport(&config)?;
    let replay = build_replay(&config);
    let fabric = EventFabric::new(config.fabric_config(), transport, replay);
    fabric.start();

    // One structured-log sink per channel; kept alive for the process
    // lifetime by holding the subscriptions.
    let _sinks: Vec<_> = Channel::ALL
        .into_iter()
        .map(|channel| {
            fabric.subscribe(channel, move |event| {
                info!(
                    channel = %channel,
                    kind = event.event_type(),
                    ts = %event.ts(),
                    "event received"
                );
            })
        })
        .collect();

    info!(
        state = ?fabric.transport_state(),
        "fabric running, press Ctrl+C to stop"
    );
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("initiating graceful shutdown");
    fabric.shutdown();
    info!(
        relayed = fabric.relay_counters().relayed(),
        dropped_malformed = fabric.relay_counters().dropped_malformed(),
        "shutdown complete"
    );
    Ok(())
}
