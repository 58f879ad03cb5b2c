// ── Broadcast handlers ──
//
// One handler per `RadioEvent`, applied in arrival order under the
// engine lock. These are ports of the platform broadcast receivers:
// they pull fresh state from the radio/store, reconcile the registry,
// and queue observer notices.

use tracing::debug;

use wifitrack_platform::{
    Bssid, ConnectionInfo, DetailedState, NetworkHandle, SupplicantError, SupplicantState,
    WifiState, detailed_state_of,
};

use crate::entry::{TrackedNetwork, config_match_key, quote_ssid};
use crate::error::ErrorKind;
use crate::matching::MatchKey;
use crate::registry::{EntryId, Visibility};

use super::{EngineInner, EngineState, Notice, Notices};

impl EngineInner {
    // ── Connection state ─────────────────────────────────────────

    pub(super) fn handle_network_state(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        detailed: DetailedState,
    ) {
        let ap = self.current_connection_entry(state);
        debug!(?detailed, ?ap, "network state changed");

        // Scanning while acquiring an address is wasteful and can
        // destabilize DHCP, so the continuous scan pauses for it.
        if detailed == DetailedState::ObtainingIpAddr {
            state.obtaining_address = true;
            self.remove_future_scans();
        } else {
            state.obtaining_address = false;
            self.queue_continuous_scan(state);
        }

        self.refresh_status(state, ap, Some(detailed));

        if ap.is_some() && detailed.is_connected_or_connecting() {
            state.registry.set_primary(ap);
        } else if detailed == DetailedState::Failed {
            state.registry.set_primary(None);
            if let Some(id) = ap {
                if let Some(entry) = state.registry.get_mut(id) {
                    entry.set_status(Some(DetailedState::Failed));
                }
            }
            self.notice_error(notices, ErrorKind::ConnectionFailed);
        } else if detailed == DetailedState::Disconnected {
            // Fell off the network entirely (e.g. the router powered
            // down); the disconnect carries no BSSID.
            state.registry.set_primary(None);
        }

        if detailed.is_connected() || detailed == DetailedState::ObtainingIpAddr {
            // Passive background scans are weaker than active ones and
            // may miss the AP we are demonstrably attached to.
            if let Some(id) = ap {
                if let Some(entry) = state.registry.get_mut(id) {
                    entry.set_seen(true);
                }
            }
        }

        self.attempt_reenable_all(state);
    }

    // ── Adapter state ────────────────────────────────────────────

    pub(super) fn handle_wifi_state(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        wifi: WifiState,
    ) {
        match wifi {
            WifiState::Enabled => {
                self.load_configured(state, notices);
                self.attempt_scan_locked(state, notices);
            }
            WifiState::Disabled => {
                self.remove_future_scans();
                debug!("wifi disabled, clearing tracked networks");
                for (id, entry) in state.registry.clear() {
                    notices.push(Notice::SetChanged {
                        id,
                        entry,
                        added: false,
                    });
                }
            }
            _ => {}
        }

        notices.push(Notice::EntriesState(wifi == WifiState::Enabled));
    }

    // ── Supplicant ───────────────────────────────────────────────

    pub(super) fn handle_supplicant_connection(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        connected: bool,
    ) {
        notices.push(Notice::EntriesState(connected));

        if connected {
            self.load_configured(state, notices);
            self.refresh_status(state, None, None);
            self.attempt_scan_locked(state, notices);
        }
    }

    pub(super) fn handle_supplicant_state(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        supplicant: SupplicantState,
        error: Option<SupplicantError>,
    ) {
        state.supplicant_state = supplicant;

        if supplicant == SupplicantState::FourWayHandshake {
            // The authentication-error broadcast carries no network
            // identity, so remember who we are handshaking with now.
            state.last_authenticating = self.current_connection_entry(state);
        }

        if matches!(error, Some(SupplicantError::Authenticating)) {
            if let Some(id) = state.last_authenticating {
                if let Some(entry) = state.registry.get(id) {
                    notices.push(Notice::RetryPassword {
                        id,
                        entry: entry.clone(),
                    });
                }
            }
        }
    }

    // ── Signal / id churn ────────────────────────────────────────

    pub(super) fn handle_signal(&self, state: &mut EngineState, rssi: i32) {
        if let Some(id) = state.registry.primary() {
            if let Some(entry) = state.registry.get_mut(id) {
                entry.set_signal(rssi);
            }
        }
    }

    /// Ids cannot be used for lookup here, since they are exactly what
    /// changed. Match each config by (bssid, ssid, security) and adopt
    /// its new id.
    pub(super) fn resync_network_ids(&self, state: &mut EngineState) {
        for config in self.store.list() {
            let network_id = match config.network_id {
                Some(network_id) => network_id,
                None => continue,
            };
            let key = MatchKey {
                network_id: NetworkHandle::Any,
                bssid: config.bssid.clone(),
                ssid: config.ssid.clone(),
                security: config.security,
            };
            if let Some(id) = state.registry.find_any(&key) {
                if let Some(entry) = state.registry.get_mut(id) {
                    entry.set_network_id(network_id.into());
                }
            }
        }
    }

    // ── Shared loading / status ──────────────────────────────────

    /// Merge the store's saved networks into the registry, keeping the
    /// priority counter above everything observed.
    pub(super) fn load_configured(&self, state: &mut EngineState, notices: &mut Notices) {
        for config in self.store.list() {
            state.allocator.observe(config.priority);

            if state.registry.find_any(&config_match_key(&config)).is_some() {
                continue;
            }

            let entry = TrackedNetwork::from(config);
            debug!(ssid = entry.human_readable_ssid(), "tracking saved network");
            let id = state.registry.insert(entry, Visibility::Remembered);
            self.notice_set_changed(state, notices, id, true);
        }
    }

    /// Refresh the connected entry from live connection info. With no
    /// entry given, resolves the current one when the connection is
    /// live.
    pub(super) fn refresh_status(
        &self,
        state: &mut EngineState,
        ap: Option<EntryId>,
        detailed: Option<DetailedState>,
    ) {
        let info = self.radio.connection_info();
        let detailed = detailed.unwrap_or_else(|| detailed_state_of(info.supplicant_state));

        let ap = ap.or_else(|| {
            if detailed.is_live_connection() {
                self.connection_entry(state, &info)
            } else {
                None
            }
        });

        if let Some(id) = ap {
            if let Some(entry) = state.registry.get_mut(id) {
                entry.update_from_connection(&info, Some(detailed));
            }
        }
    }

    /// The tracked entry for the radio's current connection, if any.
    pub(super) fn current_connection_entry(&self, state: &EngineState) -> Option<EntryId> {
        let info = self.radio.connection_info();
        self.connection_entry(state, &info)
    }

    fn connection_entry(&self, state: &EngineState, info: &ConnectionInfo) -> Option<EntryId> {
        let ssid = info.ssid.as_deref()?;
        // No security in the key: the connection carries a network id
        // (not a wildcard) and matching relies on that.
        let key = MatchKey {
            network_id: info.network_id,
            bssid: Bssid::from_optional(info.bssid.as_deref()),
            ssid: quote_ssid(ssid),
            security: None,
        };
        state.registry.find_any(&key)
    }

    /// Undo the "disable siblings" part of a connect, once, on the
    /// first network-state broadcast after it.
    pub(super) fn attempt_reenable_all(&self, state: &mut EngineState) {
        if !state.reenable_on_state_change {
            return;
        }
        state.reenable_on_state_change = false;
        debug!("re-enabling sibling networks");

        for id in state.registry.ids() {
            let network_id = state
                .registry
                .get(id)
                .and_then(|entry| entry.network_id.assigned());
            if let Some(network_id) = network_id {
                self.enable_network(state, id, network_id, false);
            }
        }
    }
}
