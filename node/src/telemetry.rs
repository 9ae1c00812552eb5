// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::errors::{NodeError, NodeResult};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const PROOFS_REGISTERED: &str = "avalanche_proofs_registered_total";
pub const PROOFS_ORPHANED: &str = "avalanche_proofs_orphaned_total";
pub const PROOFS_REJECTED: &str = "avalanche_proofs_rejected_total";
pub const POLLS_SENT: &str = "avalanche_polls_sent_total";
pub const POLLS_TIMED_OUT: &str = "avalanche_polls_timed_out_total";
pub const ORPHAN_STAKES: &str = "avalanche_orphan_stakes";
pub const PEERS: &str = "avalanche_peers";

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() -> NodeResult<()> {
    // 1. Logs
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "avalanche_node=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| NodeError::Telemetry(e.to_string()))?;

    // 2. Metrics (Prometheus)
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| NodeError::Telemetry(e.to_string()))?;

    if PROM_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
    }

    metrics::describe_counter!(PROOFS_REGISTERED, "Proofs bound to a peer");
    metrics::describe_counter!(PROOFS_ORPHANED, "Proofs parked in the orphan pool");
    metrics::describe_counter!(PROOFS_REJECTED, "Proofs refused at registration");
    metrics::describe_counter!(POLLS_SENT, "Polls issued to nodes");
    metrics::describe_counter!(POLLS_TIMED_OUT, "Polls that expired without a response");
    metrics::describe_gauge!(ORPHAN_STAKES, "Stakes held by the orphan pool");
    metrics::describe_gauge!(PEERS, "Registered peers");

    metrics::gauge!("avalanche_node_up", 1.0);
    Ok(())
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
