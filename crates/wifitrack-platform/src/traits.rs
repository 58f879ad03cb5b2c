// ── Consumed platform services ──
//
// Both services return immediately; longer-running work (association,
// IP configuration, the scan itself) completes via `RadioEvent`
// broadcasts. Failures are reported through sentinel return values,
// never panics, matching the platform's own API shape.

use std::cmp::Ordering;

use crate::types::{ConnectionInfo, NetworkConfig, NetworkId, ScanResult};

/// The radio / connection manager.
pub trait RadioService: Send + Sync {
    /// Whether the adapter is currently enabled.
    fn is_enabled(&self) -> bool;

    /// Trigger an active scan. Returns `false` if the radio rejected
    /// the request (busy, powering down); the caller owns retry policy.
    fn trigger_scan(&self) -> bool;

    /// The most recent scan result list. Hidden networks appear with an
    /// empty SSID.
    fn scan_results(&self) -> Vec<ScanResult>;

    /// Info about the current (or in-progress) connection.
    fn connection_info(&self) -> ConnectionInfo;

    /// Enable a saved network. With `disable_others` the supplicant is
    /// forced to associate with exactly this network.
    fn enable_network(&self, id: NetworkId, disable_others: bool) -> bool;

    /// Ask the supplicant to reconnect to the highest-priority enabled
    /// network.
    fn reconnect(&self);

    /// Platform-defined signal comparison. The RSSI scale is non-linear,
    /// so raw numeric comparison of levels is not authoritative.
    fn compare_signal_level(&self, a: i32, b: i32) -> Ordering;
}

/// The persisted network-configuration store.
///
/// Mutations take effect in the store immediately but survive a restart
/// only after `persist()`. The store may silently evict old entries and
/// renumber ids when persisting; consumers learn about that through
/// `RadioEvent::NetworkIdsChanged` and by re-listing.
pub trait ConfigStore: Send + Sync {
    /// All saved networks.
    fn list(&self) -> Vec<NetworkConfig>;

    /// Add a new network. Returns the assigned id, or `None` on failure.
    fn add(&self, config: NetworkConfig) -> Option<NetworkId>;

    /// Replace the saved network with `config.network_id`. Returns the
    /// (possibly reassigned) id, or `None` on failure.
    fn update(&self, config: NetworkConfig) -> Option<NetworkId>;

    /// Delete a saved network.
    fn remove(&self, id: NetworkId) -> bool;

    /// Flush pending changes to durable storage.
    fn persist(&self) -> bool;
}
