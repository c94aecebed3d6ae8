//! Prometheus metrics collection for tipwarden.
//!
//! - `tipwarden_rule_matches_total` - keyword rule matches
//! - `tipwarden_reactive_matches_total` - reactive fallback matches
//! - `tipwarden_actions_total{action}` - moderation steps dispatched
//! - `tipwarden_tips_published_total{slot}` - notices published by slot kind
//! - `tipwarden_slots_cleared_total{reason}` - sweep expiries and orphans
//! - `tipwarden_platform_failures_total{op,error}` - swallowed platform errors
//! - `tipwarden_commands_total{command,result}` - administrator commands
//! - `tipwarden_groups` - groups held in memory

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

pub static RULE_MATCHES: OnceLock<IntCounter> = OnceLock::new();

pub static REACTIVE_MATCHES: OnceLock<IntCounter> = OnceLock::new();

pub static ACTIONS: OnceLock<IntCounterVec> = OnceLock::new();

pub static TIPS_PUBLISHED: OnceLock<IntCounterVec> = OnceLock::new();

pub static SLOTS_CLEARED: OnceLock<IntCounterVec> = OnceLock::new();

pub static PLATFORM_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

pub static COMMANDS: OnceLock<IntCounterVec> = OnceLock::new();

pub static LINK_ROTATIONS: OnceLock<IntCounter> = OnceLock::new();

pub static GROUPS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Until this runs every `record_*` helper is a no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(RULE_MATCHES, IntCounter::new("tipwarden_rule_matches_total", "Keyword rule matches"));
    register!(REACTIVE_MATCHES, IntCounter::new("tipwarden_reactive_matches_total", "Reactive fallback matches"));
    register!(ACTIONS, IntCounterVec::new(Opts::new("tipwarden_actions_total", "Moderation steps dispatched"), &["action"]));
    register!(TIPS_PUBLISHED, IntCounterVec::new(Opts::new("tipwarden_tips_published_total", "Notices published by slot kind"), &["slot"]));
    register!(SLOTS_CLEARED, IntCounterVec::new(Opts::new("tipwarden_slots_cleared_total", "Slots cleared by the sweep"), &["reason"]));
    register!(PLATFORM_FAILURES, IntCounterVec::new(Opts::new("tipwarden_platform_failures_total", "Platform failures tolerated"), &["op", "error"]));
    register!(COMMANDS, IntCounterVec::new(Opts::new("tipwarden_commands_total", "Administrator commands"), &["command", "result"]));
    register!(LINK_ROTATIONS, IntCounter::new("tipwarden_link_rotations_total", "Invite link publishes"));
    register!(GROUPS, IntGauge::new("tipwarden_groups", "Groups held in memory"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

#[inline]
fn inc_vec(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

#[inline]
pub fn record_rule_match() {
    if let Some(c) = RULE_MATCHES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_reactive_match() {
    if let Some(c) = REACTIVE_MATCHES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_action(action: &str) {
    inc_vec(&ACTIONS, &[action]);
}

#[inline]
pub fn record_tip(slot: &str) {
    inc_vec(&TIPS_PUBLISHED, &[slot]);
}

/// `reason` is `expired` or `orphaned`.
#[inline]
pub fn record_cleared(reason: &str, count: usize) {
    if let Some(c) = SLOTS_CLEARED.get() {
        c.with_label_values(&[reason]).inc_by(count as u64);
    }
}

#[inline]
pub fn record_platform_failure(op: &str, error: &str) {
    inc_vec(&PLATFORM_FAILURES, &[op, error]);
}

#[inline]
pub fn record_command(command: &str, result: &str) {
    inc_vec(&COMMANDS, &[command, result]);
}

#[inline]
pub fn record_rotation() {
    if let Some(c) = LINK_ROTATIONS.get() {
        c.inc();
    }
}

#[inline]
pub fn set_groups(count: usize) {
    if let Some(g) = GROUPS.get() {
        g.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_rule_match();
        record_tip("keyword");
        record_cleared("expired", 2);

        let output = gather_metrics();
        assert!(output.contains("tipwarden_rule_matches_total"));
        assert!(output.contains("tipwarden_tips_published_total"));
    }
}
