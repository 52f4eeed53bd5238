//! Metrics definitions for the SSO service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sso_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Every label value is a `&'static str` chosen by this crate:
//! - `ticket`: tgc, st, session
//! - `operation`: issue, refresh, validate, subject, revoke, consume, set, get,
//!   delete
//! - `outcome`: success, absent, error
//! - `command`: get, set, setex, expire, del, decr, ttl, getdel
//! - `status`: success, error, exhausted
//! - `reason`: broken, failed_health_check, idle_limit, pool_closed

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// ============================================================================
// Ticket Metrics
// ============================================================================

/// Record a ticket operation outcome
///
/// Metric: `sso_ticket_operations_total`
/// Labels: `ticket`, `operation`, `outcome`
pub fn record_ticket_operation(ticket: &'static str, operation: &'static str, outcome: &'static str) {
    counter!(
        "sso_ticket_operations_total",
        "ticket" => ticket,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

// ============================================================================
// Store Metrics
// ============================================================================

/// Record one store command
///
/// Metric: `sso_store_command_duration_seconds`, `sso_store_commands_total`
/// Labels: `command`, `status`
pub fn record_store_command(command: &'static str, status: &'static str, duration: Duration) {
    histogram!("sso_store_command_duration_seconds", "command" => command)
        .record(duration.as_secs_f64());

    counter!("sso_store_commands_total", "command" => command, "status" => status).increment(1);
}

// ============================================================================
// Pool Metrics
// ============================================================================

/// Record how long `acquire` took
///
/// Metric: `sso_pool_acquire_duration_seconds`
/// Labels: `status`
pub fn record_pool_acquire(status: &'static str, duration: Duration) {
    histogram!("sso_pool_acquire_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
}

/// Record an `acquire` that gave up after the max wait
///
/// Metric: `sso_pool_exhausted_total`
pub fn record_pool_exhausted() {
    counter!("sso_pool_exhausted_total").increment(1);
}

/// Metric: `sso_pool_connections_opened_total`
pub fn record_connection_opened() {
    counter!("sso_pool_connections_opened_total").increment(1);
}

/// Record a connection closed instead of parked
///
/// Metric: `sso_pool_connections_discarded_total`
/// Labels: `reason`
pub fn record_connection_discarded(reason: &'static str) {
    counter!("sso_pool_connections_discarded_total", "reason" => reason).increment(1);
}

/// Update pool occupancy gauges
///
/// Metric: `sso_pool_connections_in_use`, `sso_pool_connections_idle`
pub fn set_pool_connections(in_use: usize, idle: usize) {
    gauge!("sso_pool_connections_in_use").set(in_use as f64);
    gauge!("sso_pool_connections_idle").set(idle as f64);
}
