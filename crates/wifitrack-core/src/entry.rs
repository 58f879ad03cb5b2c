// ── Tracked network state ──
//
// One mutable record per known network, merging data from scans, the
// saved configuration, and live connection info. Field-level setters
// detect real changes and push a refresh event for the owning entry;
// multi-field updates are batched so at most one event is emitted.

use std::cmp::Ordering;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use wifitrack_platform::{
    Bssid, ConnectionInfo, DetailedState, NetworkConfig, NetworkHandle, PasswordEncoding,
    ScanResult, SecurityKind,
};

use crate::matching::{MatchKey, MatchStrength};
use crate::registry::EntryId;

/// Damping factor for the time-averaged signal used only for sort
/// stability.
const SIGNAL_DAMPING: f32 = 0.2;

/// Wrap a raw SSID in quotes, the canonical display/storage form. An
/// already-quoted SSID passes through unchanged.
pub fn quote_ssid(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2 {
        return raw.to_owned();
    }
    format!("\"{raw}\"")
}

fn is_hex(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// WEP-40, WEP-104, and 256-bit vendor WEP key lengths, in hex digits.
fn is_hex_wep_key(key: &str) -> bool {
    matches!(key.len(), 10 | 26 | 58) && is_hex(key)
}

// ── Refresh plumbing ─────────────────────────────────────────────────

/// Change-notification state. Detached on clone: snapshots handed to
/// the UI never emit refresh events.
#[derive(Debug, Default)]
struct RefreshState {
    tx: Option<UnboundedSender<EntryId>>,
    id: Option<EntryId>,
    block_depth: u32,
    pending: bool,
}

impl Clone for RefreshState {
    fn clone(&self) -> Self {
        RefreshState::default()
    }
}

// ── TrackedNetwork ───────────────────────────────────────────────────

/// One logical Wi-Fi network as known to this device.
///
/// Field declaration order is the persisted snapshot order; restored
/// state must reconstitute identically across a process restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedNetwork {
    pub bssid: Bssid,
    pub configured: bool,
    pub ip_address: Option<Ipv4Addr>,
    pub link_speed: u32,
    pub network_id: NetworkHandle,
    pub primary: bool,
    pub priority: i32,
    pub hidden_ssid: bool,
    pub security: Option<SecurityKind>,
    pub seen: bool,
    pub disabled: bool,
    pub signal: i32,
    /// Quoted SSID.
    pub ssid: String,
    pub status: Option<DetailedState>,
    /// User-entered password, never read back from the store.
    pub password: Option<String>,
    /// Whether the saved configuration held key material.
    pub had_password: bool,
    pub password_encoding: PasswordEncoding,

    /// Heavily damped time-averaged signal, for display ordering only.
    #[serde(skip)]
    signal_for_sorting: Option<f32>,
    #[serde(skip)]
    refresh: RefreshState,
}

impl Default for TrackedNetwork {
    fn default() -> Self {
        Self {
            bssid: Bssid::Any,
            configured: false,
            ip_address: None,
            link_speed: 0,
            network_id: NetworkHandle::NotSet,
            primary: false,
            priority: 0,
            hidden_ssid: false,
            security: None,
            seen: false,
            disabled: false,
            signal: 0,
            ssid: String::new(),
            status: None,
            password: None,
            had_password: false,
            password_encoding: PasswordEncoding::default(),
            signal_for_sorting: None,
            refresh: RefreshState::default(),
        }
    }
}

impl TrackedNetwork {
    // ── Lifecycle / notification ─────────────────────────────────

    /// Wire this entry to its registry slot. Called on insert.
    pub(crate) fn attach(&mut self, id: EntryId, tx: UnboundedSender<EntryId>) {
        self.refresh.id = Some(id);
        self.refresh.tx = Some(tx);
    }

    /// Begin a batch: refresh events are held until the matching
    /// [`end_batch`](Self::end_batch), then at most one is emitted.
    pub fn begin_batch(&mut self) {
        self.refresh.block_depth += 1;
    }

    pub fn end_batch(&mut self) {
        self.refresh.block_depth = self.refresh.block_depth.saturating_sub(1);
        if self.refresh.block_depth == 0 && self.refresh.pending {
            self.request_refresh();
        }
    }

    fn batched(&mut self, f: impl FnOnce(&mut Self)) {
        self.begin_batch();
        f(self);
        self.end_batch();
    }

    fn request_refresh(&mut self) {
        if self.refresh.block_depth > 0 {
            self.refresh.pending = true;
            return;
        }
        if let (Some(tx), Some(id)) = (&self.refresh.tx, self.refresh.id) {
            let _ = tx.send(id);
        }
        self.refresh.pending = false;
    }

    // ── Setters ──────────────────────────────────────────────────

    pub fn set_network_id(&mut self, network_id: NetworkHandle) {
        if self.network_id != network_id {
            self.network_id = network_id;
            self.request_refresh();
        }
    }

    /// Adopt a specific BSSID, unless this entry already matches any AP
    /// for its SSID — the wildcard is never narrowed by a specific
    /// observation.
    pub fn set_bssid(&mut self, bssid: Bssid) {
        if self.bssid.is_wildcard() {
            return;
        }
        if self.bssid != bssid {
            self.bssid = bssid;
            self.request_refresh();
        }
    }

    pub fn set_primary(&mut self, primary: bool) {
        if self.primary != primary {
            self.primary = primary;
            self.request_refresh();
        }
    }

    pub fn set_seen(&mut self, seen: bool) {
        if self.seen != seen {
            self.seen = seen;
            self.request_refresh();
        }
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        if self.disabled != disabled {
            self.disabled = disabled;
            self.request_refresh();
        }
    }

    pub fn set_signal(&mut self, signal: i32) {
        self.signal_for_sorting = Some(match self.signal_for_sorting {
            None => signal as f32,
            Some(avg) => SIGNAL_DAMPING * signal as f32 + (1.0 - SIGNAL_DAMPING) * avg,
        });

        if self.signal != signal {
            self.signal = signal;
            self.request_refresh();
        }
    }

    pub fn set_ssid(&mut self, raw: &str) {
        let quoted = quote_ssid(raw);
        if self.ssid != quoted {
            self.ssid = quoted;
            self.request_refresh();
        }
    }

    pub fn set_priority(&mut self, priority: i32) {
        if self.priority != priority {
            self.priority = priority;
            self.request_refresh();
        }
    }

    pub fn set_hidden_ssid(&mut self, hidden: bool) {
        if self.hidden_ssid != hidden {
            self.hidden_ssid = hidden;
            self.request_refresh();
        }
    }

    pub fn set_link_speed(&mut self, link_speed: u32) {
        if self.link_speed != link_speed {
            self.link_speed = link_speed;
            self.request_refresh();
        }
    }

    pub fn set_ip_address(&mut self, address: Option<Ipv4Addr>) {
        if self.ip_address != address {
            self.ip_address = address;
            self.request_refresh();
        }
    }

    pub fn set_configured(&mut self, configured: bool) {
        if self.configured != configured {
            self.configured = configured;
            self.request_refresh();
        }
    }

    pub fn set_status(&mut self, status: Option<DetailedState>) {
        if self.status != status {
            self.status = status;
            self.request_refresh();
        }
    }

    pub fn set_security(&mut self, security: SecurityKind) {
        if self.security != Some(security) {
            self.security = Some(security);
            self.request_refresh();
        }
    }

    /// Record a user-entered password. Not change-notified: passwords
    /// are transient input, not rendered state.
    pub fn set_password(&mut self, password: impl Into<String>, encoding: PasswordEncoding) {
        self.password = Some(password.into());
        self.password_encoding = encoding;
    }

    // ── Queries ──────────────────────────────────────────────────

    /// SSID with the canonical quotes stripped, for display.
    pub fn human_readable_ssid(&self) -> &str {
        self.ssid
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(&self.ssid)
    }

    /// Whether this network requires credentials (an unknown security
    /// kind counts as open until observed otherwise).
    pub fn has_security(&self) -> bool {
        self.security.is_some_and(|s| !s.is_open())
    }

    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty()) || self.had_password
    }

    pub(crate) fn signal_for_sorting(&self) -> f32 {
        self.signal_for_sorting.unwrap_or(f32::MIN)
    }

    pub fn match_key(&self) -> MatchKey {
        MatchKey {
            network_id: self.network_id,
            bssid: self.bssid.clone(),
            ssid: self.ssid.clone(),
            security: self.security,
        }
    }

    pub fn matches(&self, candidate: &MatchKey) -> MatchStrength {
        self.match_key().match_against(candidate)
    }

    pub fn matches_config(&self, config: &NetworkConfig) -> MatchStrength {
        self.matches(&config_match_key(config))
    }

    // ── Merging from observations ────────────────────────────────

    /// Refresh from a scan observation. The BSSID deliberately stays a
    /// wildcard: one logical network covers every physical AP
    /// broadcasting its SSID.
    pub fn update_from_scan(&mut self, result: &ScanResult) {
        self.batched(|entry| {
            entry.set_seen(true);
            entry.set_ssid(&result.ssid);
            if entry.network_id == NetworkHandle::NotSet {
                // Scan results carry no network id; stay a wildcard
                // until correlated with a saved configuration.
                entry.set_network_id(NetworkHandle::Any);
            }
            entry.set_signal(result.level);
            entry.set_security(result.security());
        });
    }

    /// Refresh from a saved configuration.
    pub fn update_from_config(&mut self, config: &NetworkConfig) {
        self.batched(|entry| {
            entry.set_bssid(config.bssid.clone());
            if let Some(id) = config.network_id {
                entry.set_network_id(id.into());
            }
            entry.set_priority(config.priority);
            entry.set_hidden_ssid(config.hidden_ssid);
            entry.set_ssid(&config.ssid);
            entry.set_configured(true);
            entry.set_disabled(config.disabled);
            if let Some(security) = config.security {
                entry.set_security(security);
            }
            entry.had_password = config.has_password();
        });
    }

    /// Refresh from live connection info.
    pub fn update_from_connection(&mut self, info: &ConnectionInfo, status: Option<DetailedState>) {
        self.batched(|entry| {
            entry.set_bssid(Bssid::from_optional(info.bssid.as_deref()));
            entry.set_link_speed(info.link_speed);
            if entry.configured {
                // An unconfigured entry never carries a real network
                // id, even when it is the one we are associated with.
                entry.set_network_id(info.network_id);
            }
            entry.set_ip_address(info.ip_address);
            if let Some(ssid) = &info.ssid {
                entry.set_ssid(ssid);
            }
            if status.is_some() {
                entry.set_status(status);
            }
            entry.set_hidden_ssid(info.hidden_ssid);
        });
    }

    /// Reset the in-memory state as if this network were never
    /// configured. Does not touch the configuration store.
    pub fn forget(&mut self) {
        self.batched(|entry| {
            entry.set_configured(false);
            entry.set_network_id(NetworkHandle::NotSet);
            entry.set_primary(false);
            entry.set_status(None);
            entry.set_disabled(false);
        });
    }

    // ── Export to the configuration store ────────────────────────

    /// Write this entry's fields into a store configuration, including
    /// key material derived from the user-entered password.
    pub fn apply_to_config(&self, config: &mut NetworkConfig) {
        config.bssid = self.bssid.clone();
        config.priority = self.priority;
        config.hidden_ssid = self.hidden_ssid;
        config.ssid = quote_ssid(&self.ssid);
        config.security = Some(self.security.unwrap_or(SecurityKind::Open));

        let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) else {
            // An absent password leaves existing key material untouched.
            return;
        };

        config.pre_shared_key = None;
        config.wep_keys = Default::default();
        config.wep_tx_key_index = 0;

        match self.security.unwrap_or(SecurityKind::Open) {
            SecurityKind::Wep => {
                let key = match self.password_encoding {
                    PasswordEncoding::Auto if is_hex_wep_key(password) => password.to_owned(),
                    PasswordEncoding::Hex => password.to_owned(),
                    _ => quote_ssid(password),
                };
                config.wep_keys[0] = Some(key);
                config.wep_tx_key_index = 0;
            }
            SecurityKind::Wpa | SecurityKind::Wpa2 => {
                // A 64-digit hex PSK goes unquoted; a passphrase quoted.
                config.pre_shared_key = Some(if password.len() == 64 && is_hex(password) {
                    password.to_owned()
                } else {
                    quote_ssid(password)
                });
            }
            SecurityKind::WpaEap | SecurityKind::Ieee8021x => {
                config.pre_shared_key = Some(quote_ssid(password));
            }
            SecurityKind::Open => {}
            _ => {}
        }
    }
}

impl From<NetworkConfig> for TrackedNetwork {
    fn from(config: NetworkConfig) -> Self {
        let mut entry = TrackedNetwork::default();
        entry.update_from_config(&config);
        entry
    }
}

/// The match key of a saved configuration.
pub fn config_match_key(config: &NetworkConfig) -> MatchKey {
    MatchKey {
        network_id: config
            .network_id
            .map_or(NetworkHandle::NotSet, NetworkHandle::Assigned),
        bssid: config.bssid.clone(),
        ssid: config.ssid.clone(),
        security: config.security,
    }
}

/// Ranking for the access-point list shown to the user. This orders for
/// display, not for auto-connect — the supplicant uses the persisted
/// priority field for that.
pub fn display_ordering(a: &TrackedNetwork, b: &TrackedNetwork) -> Ordering {
    // Primary first, then currently seen, then configured.
    let cmp = b.primary.cmp(&a.primary);
    if cmp != Ordering::Equal {
        return cmp;
    }
    let cmp = b.seen.cmp(&a.seen);
    if cmp != Ordering::Equal {
        return cmp;
    }
    let cmp = b.configured.cmp(&a.configured);
    if cmp != Ordering::Equal {
        return cmp;
    }

    if !a.configured {
        // Neither is configured: open networks first.
        let cmp = a.has_security().cmp(&b.has_security());
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    let cmp = b
        .signal_for_sorting()
        .partial_cmp(&a.signal_for_sorting())
        .unwrap_or(Ordering::Equal);
    if cmp != Ordering::Equal {
        return cmp;
    }

    a.ssid.to_lowercase().cmp(&b.ssid.to_lowercase())
}
