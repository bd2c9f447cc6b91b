//! Prometheus metrics for the quoting engine.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which must crash at startup. These panics only
//! occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, register_int_gauge_vec,
    CounterVec, Encoder, GaugeVec, HistogramVec, IntGaugeVec, TextEncoder,
};

use crate::error::TelemetryResult;

/// Quote pairs submitted.
pub static QUOTES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmq_quotes_total",
        "Total quote pairs submitted",
        &["instrument"]
    )
    .unwrap()
});

/// Cycles that ended without quoting.
/// Labels: reason (zombie/expiring/out_of_range/risk_gate/crossed_quote/no_mid)
pub static VETOES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmq_vetoes_total",
        "Total quote cycles vetoed",
        &["instrument", "reason"]
    )
    .unwrap()
});

/// Risk gate block count.
pub static GATE_BLOCKED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmq_gate_blocked_total",
        "Total risk gate blocks",
        &["instrument", "gate"]
    )
    .unwrap()
});

pub static FILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmq_fills_total",
        "Total fills received",
        &["instrument", "side"]
    )
    .unwrap()
});

pub static HEDGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmq_hedges_total",
        "Total hedge market orders submitted",
        &["instrument", "side"]
    )
    .unwrap()
});

pub static REJECTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmq_rejects_total",
        "Total order rejections by category",
        &["instrument", "category"]
    )
    .unwrap()
});

/// Order sink failures on submit or cancel.
pub static SINK_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmq_sink_errors_total",
        "Total order sink errors",
        &["instrument", "op"]
    )
    .unwrap()
});

/// Current quote parameters.
/// Labels: param (spread/skew/volatility/mid)
pub static QUOTE_PARAM: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "pmq_quote_param",
        "Latest quote parameters",
        &["instrument", "param"]
    )
    .unwrap()
});

pub static SPREAD_HIST: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pmq_spread",
        "Distribution of quoted spreads (fraction of mid)",
        &["instrument"],
        vec![0.01, 0.015, 0.02, 0.025, 0.03, 0.04, 0.06, 0.1, 0.15]
    )
    .unwrap()
});

pub static INVENTORY: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "pmq_inventory",
        "Signed inventory in contracts",
        &["instrument"]
    )
    .unwrap()
});

pub static TIME_REMAINING_SECS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "pmq_time_remaining_secs",
        "Seconds until market expiry",
        &["instrument"]
    )
    .unwrap()
});

/// 0 normal, 1 cold start, 2 zombie, 3 expiring, 4 out of range.
pub static LIFECYCLE_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "pmq_lifecycle_state",
        "Current market lifecycle state code",
        &["instrument"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    pub fn quote_submitted(instrument: &str) {
        QUOTES_TOTAL.with_label_values(&[instrument]).inc();
    }

    pub fn cycle_vetoed(instrument: &str, reason: &str) {
        VETOES_TOTAL.with_label_values(&[instrument, reason]).inc();
    }

    pub fn gate_blocked(instrument: &str, gate: &str) {
        GATE_BLOCKED_TOTAL
            .with_label_values(&[instrument, gate])
            .inc();
    }

    pub fn fill(instrument: &str, side: &str) {
        FILLS_TOTAL.with_label_values(&[instrument, side]).inc();
    }

    pub fn hedge(instrument: &str, side: &str) {
        HEDGES_TOTAL.with_label_values(&[instrument, side]).inc();
    }

    pub fn order_rejected(instrument: &str, category: &str) {
        REJECTS_TOTAL
            .with_label_values(&[instrument, category])
            .inc();
    }

    pub fn sink_error(instrument: &str, op: &str) {
        SINK_ERRORS_TOTAL.with_label_values(&[instrument, op]).inc();
    }

    /// Record the parameters of a submitted quote.
    pub fn quote_params(instrument: &str, mid: f64, spread: f64, skew: f64, volatility: f64) {
        QUOTE_PARAM.with_label_values(&[instrument, "mid"]).set(mid);
        QUOTE_PARAM
            .with_label_values(&[instrument, "spread"])
            .set(spread);
        QUOTE_PARAM.with_label_values(&[instrument, "skew"]).set(skew);
        QUOTE_PARAM
            .with_label_values(&[instrument, "volatility"])
            .set(volatility);
        SPREAD_HIST.with_label_values(&[instrument]).observe(spread);
    }

    pub fn inventory(instrument: &str, quantity: i64) {
        INVENTORY.with_label_values(&[instrument]).set(quantity);
    }

    pub fn time_remaining(instrument: &str, secs: u64) {
        TIME_REMAINING_SECS
            .with_label_values(&[instrument])
            .set(i64::try_from(secs).unwrap_or(i64::MAX));
    }

    pub fn lifecycle_state(instrument: &str, code: i64) {
        LIFECYCLE_STATE.with_label_values(&[instrument]).set(code);
    }

    /// Render the default registry in Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Write the text exposition to `path`.
    pub fn write_to_file(path: &std::path::Path) -> TelemetryResult<()> {
        std::fs::write(path, Self::gather_text()?)?;
        Ok(())
    }
}
