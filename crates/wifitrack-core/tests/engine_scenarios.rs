// End-to-end reconciliation scenarios against the mock radio and
// config store. The scheduler task is deliberately not started: every
// flow here is synchronous, and timer commands just buffer.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use wifitrack_core::{
    Engine, EngineConfig, ErrorKind, ObserverEvent, RecordingObserver, TrackedNetwork,
};
use wifitrack_platform::{
    ConfigStore, ConnectionInfo, DetailedState, MockConfigStore, MockRadio, NetworkConfig,
    NetworkHandle, NetworkId, PasswordEncoding, RadioEvent, ScanResult, SecurityKind,
    SupplicantError, SupplicantState, WifiState,
};

struct Harness {
    radio: Arc<MockRadio>,
    store: Arc<MockConfigStore>,
    observer: Arc<RecordingObserver>,
    engine: Engine,
}

fn harness_with(config: EngineConfig) -> Harness {
    let radio = Arc::new(MockRadio::new());
    let store = Arc::new(MockConfigStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let engine = Engine::new(radio.clone(), store.clone(), observer.clone(), config);
    Harness {
        radio,
        store,
        observer,
        engine,
    }
}

fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

fn scan_result(ssid: &str, bssid: &str, capabilities: &str, level: i32) -> ScanResult {
    ScanResult {
        ssid: ssid.into(),
        bssid: bssid.into(),
        capabilities: capabilities.into(),
        level,
    }
}

fn saved(ssid: &str, security: SecurityKind, priority: i32) -> NetworkConfig {
    NetworkConfig {
        ssid: format!("\"{ssid}\""),
        security: Some(security),
        priority,
        ..NetworkConfig::default()
    }
}

impl Harness {
    fn ingest(&self, results: Vec<ScanResult>) {
        self.radio.set_scan_results(results);
        self.engine.handle_event(RadioEvent::ScanResultsAvailable);
    }

    fn entry_by_ssid(&self, ssid: &str) -> Option<(wifitrack_core::EntryId, TrackedNetwork)> {
        self.engine
            .entries_sorted()
            .into_iter()
            .find(|(_, entry)| entry.human_readable_ssid() == ssid)
    }
}

// ── Scan ingestion ───────────────────────────────────────────────────

#[test]
fn repeated_identical_scan_is_idempotent() {
    let h = harness();
    let results = vec![
        scan_result("Cafe", "00:11:22:33:44:55", "[WPA2-PSK-CCMP]", -60),
        scan_result("Home", "66:77:88:99:aa:bb", "[ESS]", -70),
    ];

    h.ingest(results.clone());
    let first: Vec<_> = h.engine.entries_sorted();
    assert_eq!(first.len(), 2);

    h.ingest(results);
    let second: Vec<_> = h.engine.entries_sorted();
    assert_eq!(second.len(), 2);
    for ((_, a), (_, b)) in first.iter().zip(second.iter()) {
        assert_eq!(a.ssid, b.ssid);
        assert_eq!(a.security, b.security);
        assert_eq!(a.network_id, b.network_id);
        assert_eq!(a.seen, b.seen);
        assert_eq!(a.configured, b.configured);
        assert_eq!(a.signal, b.signal);
    }
}

#[test]
fn multiple_aps_merge_keeping_the_stronger_signal() {
    let h = harness();
    h.ingest(vec![
        scan_result("Campus", "00:11:22:33:44:55", "[WPA2-PSK-CCMP]", -70),
        scan_result("Campus", "66:77:88:99:aa:bb", "[WPA2-PSK-CCMP]", -50),
    ]);

    let (_, entry) = h.entry_by_ssid("Campus").expect("tracked");
    assert_eq!(h.engine.entries_sorted().len(), 1);
    assert_eq!(entry.signal, -50);
}

#[test]
fn best_signal_merge_consults_the_platform_comparator() {
    // An inverted comparator must flip which level wins, proving the
    // merge never compares raw numbers itself.
    let h = harness();
    h.radio.set_invert_signal_cmp(true);
    h.ingest(vec![
        scan_result("Campus", "00:11:22:33:44:55", "[WPA2-PSK-CCMP]", -40),
        scan_result("Campus", "66:77:88:99:aa:bb", "[WPA2-PSK-CCMP]", -80),
    ]);

    let (_, entry) = h.entry_by_ssid("Campus").expect("tracked");
    assert_eq!(entry.signal, -80);
}

#[test]
fn scan_losing_a_configured_network_demotes_it() {
    let h = harness();
    h.store.seed(saved("Home", SecurityKind::Wpa2, 0));
    h.engine.bootstrap();
    h.ingest(vec![scan_result(
        "Home",
        "00:11:22:33:44:55",
        "[WPA2-PSK-CCMP]",
        -55,
    )]);
    assert!(h.entry_by_ssid("Home").expect("tracked").1.seen);

    h.observer.take();
    h.ingest(Vec::new());

    let (_, entry) = h.entry_by_ssid("Home").expect("still tracked");
    assert!(!entry.seen);
    assert!(entry.configured);
    let removed = h
        .observer
        .take()
        .into_iter()
        .any(|e| matches!(e, ObserverEvent::SetChanged { added: false, .. }));
    assert!(!removed, "configured networks must not be removed from the UI");
}

#[test]
fn scan_losing_an_unconfigured_network_drops_it() {
    let h = harness();
    h.ingest(vec![scan_result(
        "Cafe",
        "00:11:22:33:44:55",
        "[ESS]",
        -55,
    )]);
    h.observer.take();

    h.ingest(Vec::new());

    assert!(h.entry_by_ssid("Cafe").is_none());
    let removals: Vec<_> = h
        .observer
        .take()
        .into_iter()
        .filter(|e| matches!(e, ObserverEvent::SetChanged { added: false, .. }))
        .collect();
    assert_eq!(removals.len(), 1, "exactly one removal notification");
    assert!(matches!(
        &removals[0],
        ObserverEvent::SetChanged { ssid, added: false, .. } if ssid == "Cafe"
    ));
}

#[test]
fn adhoc_and_hidden_results_are_skipped() {
    let h = harness();
    h.ingest(vec![
        scan_result("", "00:11:22:33:44:55", "[WPA2-PSK-CCMP]", -50),
        scan_result("peer", "02:11:22:33:44:55", "[IBSS]", -50),
    ]);
    assert!(h.engine.entries_sorted().is_empty());
}

// ── connect ──────────────────────────────────────────────────────────

#[test]
fn connect_to_a_new_open_network_creates_and_prioritizes_it() {
    let h = harness();
    h.store.seed(saved("Home", SecurityKind::Wpa2, 5));
    h.engine.bootstrap();
    h.ingest(vec![scan_result(
        "Cafe",
        "00:11:22:33:44:55",
        "[ESS]",
        -55,
    )]);
    let (id, entry) = h.entry_by_ssid("Cafe").expect("tracked");
    assert_eq!(entry.network_id, NetworkHandle::Any);
    let adds_before = h.store.add_calls();

    h.engine.connect(id).expect("connect");

    assert_eq!(h.store.add_calls(), adds_before + 1);
    let (_, entry) = h.entry_by_ssid("Cafe").expect("tracked");
    assert!(entry.configured);
    let network_id = entry.network_id.assigned().expect("assigned id");
    assert_eq!(h.store.config(network_id).expect("stored").ssid, "\"Cafe\"");
    // Above the highest observed priority (Home's 5).
    assert_eq!(entry.priority, 6);
    // Exclusive enable after the plain one.
    let calls = h.radio.enable_calls();
    assert!(calls.contains(&(network_id, false)));
    assert_eq!(calls.last(), Some(&(network_id, true)));
}

#[test]
fn connect_adopts_the_stored_id_for_a_weakly_matched_entry() {
    let h = harness();
    h.ingest(vec![scan_result(
        "Home",
        "00:11:22:33:44:55",
        "[WPA2-PSK-CCMP]",
        -55,
    )]);
    let (id, entry) = h.entry_by_ssid("Home").expect("tracked");
    assert_eq!(entry.network_id, NetworkHandle::Any);
    // Saved by another client after the scan; this engine never
    // reloaded, so the entry still carries the wildcard id.
    let stored = h.store.seed(saved("Home", SecurityKind::Wpa2, 3));
    h.observer.take();

    h.engine.connect(id).expect("connect");

    let (_, entry) = h.entry_by_ssid("Home").expect("tracked");
    assert_eq!(entry.network_id, NetworkHandle::Assigned(stored));
    assert!(entry.configured);
    // The existing configuration is reused, not duplicated.
    assert_eq!(h.store.add_calls(), 0);
    assert!(h.radio.enable_calls().contains(&(stored, true)));
    assert!(!h
        .observer
        .take()
        .iter()
        .any(|e| matches!(e, ObserverEvent::Error(_))));
}

#[test]
fn connect_reconnects_when_the_supplicant_is_idle() {
    let h = harness();
    h.ingest(vec![scan_result("Cafe", "00:11:22:33:44:55", "[ESS]", -55)]);
    let (id, _) = h.entry_by_ssid("Cafe").expect("tracked");

    h.engine.handle_event(RadioEvent::SupplicantStateChanged {
        state: SupplicantState::Scanning,
        error: None,
    });
    h.engine.connect(id).expect("connect");
    assert_eq!(h.radio.reconnect_count(), 1);

    h.engine.handle_event(RadioEvent::SupplicantStateChanged {
        state: SupplicantState::Completed,
        error: None,
    });
    h.engine.connect(id).expect("connect");
    assert_eq!(h.radio.reconnect_count(), 1);
}

#[test]
fn failed_config_creation_aborts_connect_with_an_error() {
    let h = harness();
    h.ingest(vec![scan_result("Cafe", "00:11:22:33:44:55", "[ESS]", -55)]);
    let (id, _) = h.entry_by_ssid("Cafe").expect("tracked");
    h.store.set_fail_add(true);
    h.observer.take();

    assert!(h.engine.connect(id).is_err());

    let (_, entry) = h.entry_by_ssid("Cafe").expect("tracked");
    assert!(!entry.configured);
    assert!(h.store.configs().is_empty());
    assert!(h
        .observer
        .take()
        .contains(&ObserverEvent::Error(ErrorKind::Connecting)));
}

#[test]
fn next_broadcast_after_connect_reenables_siblings() {
    let h = harness();
    h.store.seed(saved("Home", SecurityKind::Wpa2, 0));
    h.engine.bootstrap();
    h.ingest(vec![scan_result("Cafe", "00:11:22:33:44:55", "[ESS]", -55)]);
    let (id, _) = h.entry_by_ssid("Cafe").expect("tracked");
    h.engine.connect(id).expect("connect");
    let calls_after_connect = h.radio.enable_calls().len();

    h.engine.handle_event(RadioEvent::NetworkStateChanged {
        state: DetailedState::Connecting,
        bssid: Some("00:11:22:33:44:55".into()),
    });

    // Both saved networks re-enabled non-exclusively, exactly once.
    let reenables = h.radio.enable_calls().split_off(calls_after_connect);
    assert_eq!(reenables.len(), 2);
    assert!(reenables.iter().all(|(_, disable_others)| !disable_others));

    h.engine.handle_event(RadioEvent::NetworkStateChanged {
        state: DetailedState::Connecting,
        bssid: Some("00:11:22:33:44:55".into()),
    });
    assert_eq!(
        h.radio.enable_calls().len(),
        calls_after_connect + 2,
        "the re-enable flag must clear after one broadcast"
    );
}

#[test]
fn connecting_to_an_open_network_evicts_excess_open_ones() {
    let h = harness_with(EngineConfig {
        open_networks_kept: 1,
        ..EngineConfig::default()
    });
    h.store.seed(saved("open-a", SecurityKind::Open, 0));
    h.store.seed(saved("open-b", SecurityKind::Open, 1));
    h.engine.bootstrap();
    h.ingest(vec![scan_result("Cafe", "00:11:22:33:44:55", "[ESS]", -55)]);
    let (id, _) = h.entry_by_ssid("Cafe").expect("tracked");

    h.engine.connect(id).expect("connect");

    let remaining: Vec<String> = h.store.configs().into_iter().map(|c| c.ssid).collect();
    assert_eq!(remaining, vec!["\"Cafe\"".to_owned()]);
    assert_eq!(h.store.remove_calls(), 2);
}

// ── save ─────────────────────────────────────────────────────────────

#[test]
fn saving_a_manually_entered_network_assumes_hidden_ssid() {
    let h = harness();
    let mut entry = TrackedNetwork::default();
    entry.set_ssid("Backstage");
    entry.set_security(SecurityKind::Wpa2);
    entry.set_password("hunter22", PasswordEncoding::Auto);
    let id = h.engine.track(entry);

    h.engine.save_network(id).expect("save");

    let (_, entry) = h.entry_by_ssid("Backstage").expect("tracked");
    assert!(entry.configured);
    assert!(entry.hidden_ssid);
    let network_id = entry.network_id.assigned().expect("assigned");
    let config = h.store.config(network_id).expect("stored");
    assert!(config.hidden_ssid);
    assert_eq!(config.pre_shared_key.as_deref(), Some("\"hunter22\""));
    // New configurations come disabled and must be enabled on save.
    assert!(h.radio.enable_calls().contains(&(network_id, false)));
    assert_eq!(h.store.persist_calls(), 1);
}

#[test]
fn save_re_resolves_the_network_id_after_persist() {
    let h = harness();
    let old = h.store.seed(saved("Home", SecurityKind::Wpa2, 0));
    h.engine.bootstrap();
    let (id, _) = h.entry_by_ssid("Home").expect("tracked");
    h.store.set_remap_on_persist(vec![(old, NetworkId(42))]);

    h.engine.save_network(id).expect("save");

    let (_, entry) = h.entry_by_ssid("Home").expect("tracked");
    assert_eq!(entry.network_id, NetworkHandle::Assigned(NetworkId(42)));
}

#[test]
fn failed_persist_reports_a_saving_error() {
    let h = harness();
    h.store.seed(saved("Home", SecurityKind::Wpa2, 0));
    h.engine.bootstrap();
    let (id, _) = h.entry_by_ssid("Home").expect("tracked");
    h.store.set_fail_persist(true);
    h.observer.take();

    assert!(h.engine.save_network(id).is_err());
    assert!(h
        .observer
        .take()
        .contains(&ObserverEvent::Error(ErrorKind::Saving)));
}

// ── forget ───────────────────────────────────────────────────────────

#[test]
fn forgetting_an_unconfigured_entry_is_an_idempotent_no_op() {
    let h = harness();
    h.ingest(vec![scan_result("Cafe", "00:11:22:33:44:55", "[ESS]", -55)]);
    let (id, _) = h.entry_by_ssid("Cafe").expect("tracked");
    h.observer.take();

    h.engine.forget_network(id).expect("forget");

    assert!(h.entry_by_ssid("Cafe").is_some());
    assert_eq!(h.store.remove_calls(), 0);
    assert!(h.observer.take().is_empty());
}

#[test]
fn forgetting_an_out_of_range_network_removes_it_entirely() {
    let h = harness();
    h.store.seed(saved("Home", SecurityKind::Wpa2, 0));
    h.engine.bootstrap();
    let (id, _) = h.entry_by_ssid("Home").expect("tracked");
    h.observer.take();

    h.engine.forget_network(id).expect("forget");

    assert!(h.entry_by_ssid("Home").is_none());
    assert!(h.store.configs().is_empty());
    let events = h.observer.take();
    assert!(events.iter().any(|e| matches!(
        e,
        ObserverEvent::SetChanged { added: false, ssid, .. } if ssid == "Home"
    )));
}

#[test]
fn forgetting_a_visible_network_keeps_it_in_the_list() {
    let h = harness();
    h.store.seed(saved("Home", SecurityKind::Wpa2, 0));
    h.engine.bootstrap();
    h.ingest(vec![scan_result(
        "Home",
        "00:11:22:33:44:55",
        "[WPA2-PSK-CCMP]",
        -55,
    )]);
    let (id, _) = h.entry_by_ssid("Home").expect("tracked");

    h.engine.forget_network(id).expect("forget");

    let (_, entry) = h.entry_by_ssid("Home").expect("still visible");
    assert!(!entry.configured);
    assert!(entry.seen);
    assert_eq!(entry.network_id, NetworkHandle::NotSet);
    assert!(h.store.configs().is_empty());
}

// ── Priority compaction ──────────────────────────────────────────────

#[test]
fn compaction_preserves_relative_order_and_renumbers_from_zero() {
    let h = harness_with(EngineConfig {
        priority_ceiling: 2,
        ..EngineConfig::default()
    });
    let a = h.store.seed(saved("a", SecurityKind::Wpa2, 0));
    let b = h.store.seed(saved("b", SecurityKind::Wpa2, 1));
    let c = h.store.seed(saved("c", SecurityKind::Wpa2, 2));
    h.engine.bootstrap();
    let (id_a, _) = h.entry_by_ssid("a").expect("tracked");

    // Next allocation would exceed the ceiling, forcing a compaction
    // before `a` is raised on top.
    h.engine.connect(id_a).expect("connect");

    assert_eq!(h.store.config(b).expect("b").priority, 1);
    assert_eq!(h.store.config(c).expect("c").priority, 2);
    assert_eq!(h.store.config(a).expect("a").priority, 3);
}

#[test]
fn aborted_compaction_leaves_priorities_partially_renumbered() {
    let h = harness_with(EngineConfig {
        priority_ceiling: 2,
        ..EngineConfig::default()
    });
    let a = h.store.seed(saved("a", SecurityKind::Wpa2, 7));
    let b = h.store.seed(saved("b", SecurityKind::Wpa2, 1));
    h.store.seed(saved("cap", SecurityKind::Wpa2, 2));
    h.engine.bootstrap();
    let (id_a, _) = h.entry_by_ssid("a").expect("tracked");
    // First renumbering update succeeds, everything after fails.
    h.store.set_fail_update_after(1);

    // The priority raise fails, but connect itself still goes through.
    h.engine.connect(id_a).expect("connect");

    // b (lowest old priority) was renumbered to 0 before the abort;
    // a kept its old value. No rollback.
    assert_eq!(h.store.config(b).expect("b").priority, 0);
    assert_eq!(h.store.config(a).expect("a").priority, 7);
}

// ── Broadcast-driven state ───────────────────────────────────────────

#[test]
fn connection_broadcasts_mark_the_primary_entry() {
    let h = harness();
    h.ingest(vec![scan_result(
        "Office",
        "00:11:22:33:44:55",
        "[WPA2-PSK-CCMP]",
        -55,
    )]);
    h.radio.set_connection_info(ConnectionInfo {
        supplicant_state: SupplicantState::Associated,
        ssid: Some("Office".into()),
        bssid: Some("00:11:22:33:44:55".into()),
        ..ConnectionInfo::default()
    });

    h.engine.handle_event(RadioEvent::NetworkStateChanged {
        state: DetailedState::Connecting,
        bssid: Some("00:11:22:33:44:55".into()),
    });

    let (id, entry) = h.entry_by_ssid("Office").expect("tracked");
    assert!(entry.primary);
    assert_eq!(entry.status, Some(DetailedState::Connecting));
    assert_eq!(h.engine.primary(), Some(id));

    // A plain disconnect clears the primary pointer.
    h.radio.set_connection_info(ConnectionInfo::default());
    h.engine.handle_event(RadioEvent::NetworkStateChanged {
        state: DetailedState::Disconnected,
        bssid: None,
    });
    assert_eq!(h.engine.primary(), None);
    assert!(!h.entry_by_ssid("Office").expect("tracked").1.primary);
}

#[test]
fn failed_connection_surfaces_a_generic_error() {
    let h = harness();
    h.ingest(vec![scan_result(
        "Office",
        "00:11:22:33:44:55",
        "[WPA2-PSK-CCMP]",
        -55,
    )]);
    h.radio.set_connection_info(ConnectionInfo {
        supplicant_state: SupplicantState::Associated,
        ssid: Some("Office".into()),
        bssid: Some("00:11:22:33:44:55".into()),
        ..ConnectionInfo::default()
    });
    h.engine.handle_event(RadioEvent::NetworkStateChanged {
        state: DetailedState::Connecting,
        bssid: Some("00:11:22:33:44:55".into()),
    });
    h.observer.take();

    h.engine.handle_event(RadioEvent::NetworkStateChanged {
        state: DetailedState::Failed,
        bssid: Some("00:11:22:33:44:55".into()),
    });

    assert_eq!(h.engine.primary(), None);
    let (_, entry) = h.entry_by_ssid("Office").expect("tracked");
    assert_eq!(entry.status, Some(DetailedState::Failed));
    assert!(h
        .observer
        .take()
        .contains(&ObserverEvent::Error(ErrorKind::ConnectionFailed)));
}

#[test]
fn authentication_errors_route_to_the_handshaking_entry() {
    let h = harness();
    h.ingest(vec![scan_result(
        "Office",
        "00:11:22:33:44:55",
        "[WPA2-PSK-CCMP]",
        -55,
    )]);
    h.radio.set_connection_info(ConnectionInfo {
        supplicant_state: SupplicantState::FourWayHandshake,
        ssid: Some("Office".into()),
        bssid: Some("00:11:22:33:44:55".into()),
        ..ConnectionInfo::default()
    });
    h.engine.handle_event(RadioEvent::SupplicantStateChanged {
        state: SupplicantState::FourWayHandshake,
        error: None,
    });
    h.observer.take();

    h.engine.handle_event(RadioEvent::SupplicantStateChanged {
        state: SupplicantState::Disconnected,
        error: Some(SupplicantError::Authenticating),
    });

    let events = h.observer.take();
    let retries: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, ObserverEvent::RetryPassword { ssid, .. } if ssid == "Office"))
        .collect();
    assert_eq!(retries.len(), 1);
    assert!(!events.iter().any(|e| matches!(e, ObserverEvent::Error(_))));
}

#[test]
fn disabling_wifi_clears_every_tracked_network() {
    let h = harness();
    h.store.seed(saved("Home", SecurityKind::Wpa2, 0));
    h.engine.bootstrap();
    h.ingest(vec![scan_result("Cafe", "00:11:22:33:44:55", "[ESS]", -55)]);
    h.observer.take();

    h.engine.handle_event(RadioEvent::WifiStateChanged {
        state: WifiState::Disabled,
    });

    assert!(h.engine.entries_sorted().is_empty());
    assert!(!h.engine.has_saved_networks());
    let events = h.observer.take();
    let removals = events
        .iter()
        .filter(|e| matches!(e, ObserverEvent::SetChanged { added: false, .. }))
        .count();
    assert_eq!(removals, 2);
    assert_eq!(events.last(), Some(&ObserverEvent::EntriesState(false)));
}

#[test]
fn enabling_wifi_reloads_saved_networks_and_scans() {
    let h = harness();
    h.store.seed(saved("Home", SecurityKind::Wpa2, 0));

    h.engine.handle_event(RadioEvent::WifiStateChanged {
        state: WifiState::Enabled,
    });

    assert!(h.entry_by_ssid("Home").is_some());
    assert!(h.engine.has_saved_networks());
    assert_eq!(h.radio.trigger_count(), 1);
    assert!(h
        .observer
        .take()
        .contains(&ObserverEvent::EntriesState(true)));
}

#[test]
fn signal_broadcasts_update_only_the_primary_entry() {
    let h = harness();
    h.ingest(vec![
        scan_result("Office", "00:11:22:33:44:55", "[WPA2-PSK-CCMP]", -55),
        scan_result("Cafe", "66:77:88:99:aa:bb", "[ESS]", -60),
    ]);
    h.radio.set_connection_info(ConnectionInfo {
        supplicant_state: SupplicantState::Completed,
        ssid: Some("Office".into()),
        bssid: Some("00:11:22:33:44:55".into()),
        ..ConnectionInfo::default()
    });
    h.engine.handle_event(RadioEvent::NetworkStateChanged {
        state: DetailedState::Connected,
        bssid: Some("00:11:22:33:44:55".into()),
    });

    h.engine.handle_event(RadioEvent::SignalChanged { rssi: -30 });

    assert_eq!(h.entry_by_ssid("Office").expect("tracked").1.signal, -30);
    assert_eq!(h.entry_by_ssid("Cafe").expect("tracked").1.signal, -60);
}

#[test]
fn renumbered_store_ids_are_re_resolved() {
    let h = harness();
    let old = h.store.seed(saved("Home", SecurityKind::Wpa2, 0));
    h.engine.bootstrap();
    assert_eq!(
        h.entry_by_ssid("Home").expect("tracked").1.network_id,
        NetworkHandle::Assigned(old)
    );

    // Another client persisted and the store renumbered everything.
    h.store.set_remap_on_persist(vec![(old, NetworkId(7))]);
    h.store.persist();
    h.engine.handle_event(RadioEvent::NetworkIdsChanged);

    assert_eq!(
        h.entry_by_ssid("Home").expect("tracked").1.network_id,
        NetworkHandle::Assigned(NetworkId(7))
    );
}

// ── Snapshots ────────────────────────────────────────────────────────

#[test]
fn a_restored_snapshot_resolves_to_the_live_entry() {
    let h = harness();
    h.ingest(vec![scan_result(
        "Office",
        "00:11:22:33:44:55",
        "[WPA2-PSK-CCMP]",
        -55,
    )]);
    let (id, entry) = h.entry_by_ssid("Office").expect("tracked");

    let json = serde_json::to_string(&entry).expect("serialize");
    let restored: TrackedNetwork = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(h.engine.resolve(&restored), Some(id));
}

#[test]
fn entry_updates_flow_over_the_refresh_channel() {
    let h = harness();
    let mut updates = h.engine.entry_updates().expect("channel");
    h.ingest(vec![scan_result("Cafe", "00:11:22:33:44:55", "[ESS]", -55)]);
    let (id, _) = h.entry_by_ssid("Cafe").expect("tracked");

    assert_eq!(updates.try_recv().ok(), Some(id));
    assert!(h.engine.entry_updates().is_none(), "channel is take-once");
}

#[test]
fn a_dropped_update_receiver_does_not_disturb_tracking() {
    let h = harness();
    // Opting out of per-entry updates entirely.
    drop(h.engine.entry_updates().expect("channel"));

    h.ingest(vec![scan_result("Cafe", "00:11:22:33:44:55", "[ESS]", -55)]);
    let (id, _) = h.entry_by_ssid("Cafe").expect("tracked");
    h.engine.connect(id).expect("connect");

    assert!(h.entry_by_ssid("Cafe").expect("tracked").1.configured);
}
