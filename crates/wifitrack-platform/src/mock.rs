// ── In-memory service mocks ──
//
// Scriptable stand-ins for the radio and the configuration store, used
// by the core's tests and by consumers that want a simulated device.
// Failure injection mirrors the real services' sentinel-return style.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::traits::{ConfigStore, RadioService};
use crate::types::{self, ConnectionInfo, NetworkConfig, NetworkId, ScanResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── MockRadio ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RadioState {
    enabled: bool,
    scan_results: Vec<ScanResult>,
    connection_info: ConnectionInfo,
    /// Scripted outcomes for `trigger_scan`, front first. Empty = accept.
    trigger_outcomes: VecDeque<bool>,
    trigger_count: usize,
    enable_calls: Vec<(NetworkId, bool)>,
    reconnect_count: usize,
    /// Invert the signal comparator, to prove callers consult it
    /// instead of comparing raw levels.
    invert_signal_cmp: bool,
}

/// Scriptable [`RadioService`] implementation.
#[derive(Debug, Default)]
pub struct MockRadio {
    state: Mutex<RadioState>,
}

impl MockRadio {
    pub fn new() -> Self {
        let radio = Self::default();
        lock(&radio.state).enabled = true;
        radio
    }

    pub fn set_enabled(&self, enabled: bool) {
        lock(&self.state).enabled = enabled;
    }

    pub fn set_scan_results(&self, results: Vec<ScanResult>) {
        lock(&self.state).scan_results = results;
    }

    pub fn set_connection_info(&self, info: ConnectionInfo) {
        lock(&self.state).connection_info = info;
    }

    /// Queue outcomes for the next `trigger_scan` calls; once the queue
    /// drains, triggers succeed.
    pub fn script_trigger_outcomes(&self, outcomes: impl IntoIterator<Item = bool>) {
        lock(&self.state).trigger_outcomes.extend(outcomes);
    }

    pub fn set_invert_signal_cmp(&self, invert: bool) {
        lock(&self.state).invert_signal_cmp = invert;
    }

    pub fn trigger_count(&self) -> usize {
        lock(&self.state).trigger_count
    }

    pub fn enable_calls(&self) -> Vec<(NetworkId, bool)> {
        lock(&self.state).enable_calls.clone()
    }

    pub fn reconnect_count(&self) -> usize {
        lock(&self.state).reconnect_count
    }
}

impl RadioService for MockRadio {
    fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    fn trigger_scan(&self) -> bool {
        let mut state = lock(&self.state);
        state.trigger_count += 1;
        state.trigger_outcomes.pop_front().unwrap_or(true)
    }

    fn scan_results(&self) -> Vec<ScanResult> {
        lock(&self.state).scan_results.clone()
    }

    fn connection_info(&self) -> ConnectionInfo {
        lock(&self.state).connection_info.clone()
    }

    fn enable_network(&self, id: NetworkId, disable_others: bool) -> bool {
        lock(&self.state).enable_calls.push((id, disable_others));
        true
    }

    fn reconnect(&self) {
        lock(&self.state).reconnect_count += 1;
    }

    fn compare_signal_level(&self, a: i32, b: i32) -> Ordering {
        if lock(&self.state).invert_signal_cmp {
            types::compare_signal_level(a, b).reverse()
        } else {
            types::compare_signal_level(a, b)
        }
    }
}

// ── MockConfigStore ──────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StoreState {
    configs: Vec<NetworkConfig>,
    next_id: i32,
    add_calls: usize,
    update_calls: usize,
    remove_calls: usize,
    persist_calls: usize,
    fail_add: bool,
    fail_update: bool,
    fail_persist: bool,
    /// Fail updates once this many have succeeded (compaction-abort tests).
    fail_update_after: Option<usize>,
    updates_succeeded: usize,
    /// Id remapping applied once at the next `persist()`, simulating the
    /// store renumbering entries.
    remap_on_persist: Vec<(NetworkId, NetworkId)>,
}

/// Scriptable [`ConfigStore`] implementation.
#[derive(Debug, Default)]
pub struct MockConfigStore {
    state: Mutex<StoreState>,
}

impl MockConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a saved network, assigning it an id.
    pub fn seed(&self, mut config: NetworkConfig) -> NetworkId {
        let mut state = lock(&self.state);
        let id = NetworkId(state.next_id);
        state.next_id += 1;
        config.network_id = Some(id);
        state.configs.push(config);
        id
    }

    pub fn set_fail_add(&self, fail: bool) {
        lock(&self.state).fail_add = fail;
    }

    pub fn set_fail_update(&self, fail: bool) {
        lock(&self.state).fail_update = fail;
    }

    pub fn set_fail_persist(&self, fail: bool) {
        lock(&self.state).fail_persist = fail;
    }

    pub fn set_fail_update_after(&self, successes: usize) {
        lock(&self.state).fail_update_after = Some(successes);
    }

    pub fn set_remap_on_persist(&self, remap: Vec<(NetworkId, NetworkId)>) {
        lock(&self.state).remap_on_persist = remap;
    }

    pub fn configs(&self) -> Vec<NetworkConfig> {
        lock(&self.state).configs.clone()
    }

    pub fn config(&self, id: NetworkId) -> Option<NetworkConfig> {
        lock(&self.state)
            .configs
            .iter()
            .find(|c| c.network_id == Some(id))
            .cloned()
    }

    pub fn add_calls(&self) -> usize {
        lock(&self.state).add_calls
    }

    pub fn update_calls(&self) -> usize {
        lock(&self.state).update_calls
    }

    pub fn remove_calls(&self) -> usize {
        lock(&self.state).remove_calls
    }

    pub fn persist_calls(&self) -> usize {
        lock(&self.state).persist_calls
    }
}

impl ConfigStore for MockConfigStore {
    fn list(&self) -> Vec<NetworkConfig> {
        lock(&self.state).configs.clone()
    }

    fn add(&self, mut config: NetworkConfig) -> Option<NetworkId> {
        let mut state = lock(&self.state);
        state.add_calls += 1;
        if state.fail_add {
            return None;
        }
        let id = NetworkId(state.next_id);
        state.next_id += 1;
        config.network_id = Some(id);
        state.configs.push(config);
        Some(id)
    }

    fn update(&self, config: NetworkConfig) -> Option<NetworkId> {
        let mut state = lock(&self.state);
        state.update_calls += 1;
        if state.fail_update {
            return None;
        }
        if let Some(limit) = state.fail_update_after {
            if state.updates_succeeded >= limit {
                return None;
            }
        }
        let id = config.network_id?;
        let slot = state
            .configs
            .iter_mut()
            .find(|c| c.network_id == Some(id))?;
        *slot = config;
        state.updates_succeeded += 1;
        Some(id)
    }

    fn remove(&self, id: NetworkId) -> bool {
        let mut state = lock(&self.state);
        state.remove_calls += 1;
        let before = state.configs.len();
        state.configs.retain(|c| c.network_id != Some(id));
        state.configs.len() != before
    }

    fn persist(&self) -> bool {
        let mut state = lock(&self.state);
        state.persist_calls += 1;
        if state.fail_persist {
            return false;
        }
        let remap = std::mem::take(&mut state.remap_on_persist);
        for (from, to) in remap {
            for config in &mut state.configs {
                if config.network_id == Some(from) {
                    config.network_id = Some(to);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bssid;

    fn config(ssid: &str) -> NetworkConfig {
        NetworkConfig {
            ssid: format!("\"{ssid}\""),
            bssid: Bssid::Any,
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn store_assigns_increasing_ids() {
        let store = MockConfigStore::new();
        let a = store.add(config("a")).expect("add");
        let b = store.add(config("b")).expect("add");
        assert!(b > a);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn update_replaces_matching_config() {
        let store = MockConfigStore::new();
        let id = store.seed(config("a"));
        let mut updated = config("a");
        updated.network_id = Some(id);
        updated.priority = 42;
        assert_eq!(store.update(updated), Some(id));
        assert_eq!(store.config(id).expect("config").priority, 42);
    }

    #[test]
    fn persist_applies_remap_once() {
        let store = MockConfigStore::new();
        let id = store.seed(config("a"));
        store.set_remap_on_persist(vec![(id, NetworkId(9))]);
        assert!(store.persist());
        assert!(store.config(NetworkId(9)).is_some());
        assert!(store.config(id).is_none());
    }

    #[test]
    fn scripted_trigger_outcomes_drain_to_success() {
        let radio = MockRadio::new();
        radio.script_trigger_outcomes([false, false]);
        assert!(!radio.trigger_scan());
        assert!(!radio.trigger_scan());
        assert!(radio.trigger_scan());
        assert_eq!(radio.trigger_count(), 3);
    }
}
