// ── Engine tuning ──
//
// Built by the consumer and handed to `Engine::new` — the core never
// reads configuration from disk.

use std::time::Duration;

/// Tuning knobs for the reconciliation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay between scans while continually scanning.
    pub continuous_scan_interval: Duration,
    /// Delay between retries after the radio rejects a scan trigger.
    pub scan_retry_delay: Duration,
    /// Maximum scan-trigger attempts before reporting a scan error.
    pub scan_max_retries: u32,
    /// How many configured open (unsecured) networks to retain. Open
    /// networks accumulate without a password prompt gating them, so
    /// the excess is forgotten oldest-priority-first after a connect.
    pub open_networks_kept: usize,
    /// Once the next managed priority would exceed this, priorities are
    /// compacted to start again at 0. Other clients of the network
    /// stack can use values outside [0, ceiling] without interference.
    pub priority_ceiling: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            continuous_scan_interval: Duration::from_millis(6000),
            scan_retry_delay: Duration::from_millis(1000),
            scan_max_retries: 5,
            open_networks_kept: 10,
            priority_ceiling: 99_999,
        }
    }
}
