use tracing::info;

/// Step for periodic gate progress logs.
pub const GATE_LOG_STEP: usize = 1_000_000;

/// Compact gate count: `950`, `12.5k`, `3.2m`, `1.05b`.
pub fn format_gate_count(n: u64) -> String {
    const THOUSAND: u64 = 1_000;
    const MILLION: u64 = 1_000_000;
    const BILLION: u64 = 1_000_000_000;

    match n {
        v if v >= BILLION => format!("{:.2}b", v as f64 / BILLION as f64),
        v if v >= MILLION => format!("{:.1}m", v as f64 / MILLION as f64),
        v if v >= THOUSAND => format!("{:.1}k", v as f64 / THOUSAND as f64),
        _ => n.to_string(),
    }
}

/// Log under `label` when the processed gate count moves from `before` to
/// `after` across a multiple of [`GATE_LOG_STEP`].
pub fn maybe_log_progress(label: &str, before: usize, after: usize) {
    if after / GATE_LOG_STEP > before / GATE_LOG_STEP {
        info!("{label}: {} gates", format_gate_count(after as u64));
    }
}
