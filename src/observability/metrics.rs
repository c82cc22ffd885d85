//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `gateway_node_reconciliations_total` - Total number of reconciliations
//! - `gateway_node_reconciliation_errors_total` - Reconciliation errors by reason
//! - `gateway_node_reconciliation_duration_seconds` - Duration of reconciliations
//! - `gateway_node_gateway_updates_total` - Gateways written with new addresses
//! - `gateway_node_noop_reconciliations_total` - Reconciliations that found nothing to change
//! - `gateway_node_requeues_total` - Requeues scheduled, by reason
//! - `gateway_node_events_mapped_total` - Secondary resource events mapped to a Gateway, by source

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gateway_node_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gateway_node_reconciliation_errors_total",
            "Total number of reconciliation errors by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "gateway_node_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static GATEWAY_UPDATES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gateway_node_gateway_updates_total",
        "Total number of Gateway updates with changed addresses",
    )
    .expect("Failed to create GATEWAY_UPDATES_TOTAL metric - this should never happen")
});

static NOOP_RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gateway_node_noop_reconciliations_total",
        "Total number of reconciliations where addresses were already up to date",
    )
    .expect("Failed to create NOOP_RECONCILIATIONS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gateway_node_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static EVENTS_MAPPED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gateway_node_events_mapped_total",
            "Total number of secondary resource events mapped to a Gateway",
        ),
        &["source"],
    )
    .expect("Failed to create EVENTS_MAPPED_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(GATEWAY_UPDATES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NOOP_RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(EVENTS_MAPPED_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconciliation_duration(seconds: f64) {
    RECONCILIATION_DURATION.observe(seconds);
}

pub fn increment_gateway_updates() {
    GATEWAY_UPDATES_TOTAL.inc();
}

pub fn increment_noop_reconciliations() {
    NOOP_RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_events_mapped(source: &str) {
    EVENTS_MAPPED_TOTAL.with_label_values(&[source]).inc();
}
