// ── Boundary data types ──
//
// Plain values exchanged with the radio service and the configuration
// store. Wildcard identity is expressed in the type system: a
// `NetworkId` is always a real store-assigned handle, and the sentinels
// live in `NetworkHandle`/`Bssid` so a wildcard can never be handed to
// the store by accident.

use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

// ── Network identity ─────────────────────────────────────────────────

/// A real network id assigned by the configuration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub i32);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked entry's view of its network id.
///
/// `NotSet` means the entry has never been correlated to a saved
/// configuration. `Any` is the scan-derived wildcard: "match any saved
/// configuration," used while an observation has not yet been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkHandle {
    #[default]
    NotSet,
    Any,
    Assigned(NetworkId),
}

impl NetworkHandle {
    /// The id if this handle refers to a real saved configuration.
    pub fn assigned(self) -> Option<NetworkId> {
        match self {
            NetworkHandle::Assigned(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_wildcard(self) -> bool {
        matches!(self, NetworkHandle::Any)
    }
}

impl From<NetworkId> for NetworkHandle {
    fn from(id: NetworkId) -> Self {
        NetworkHandle::Assigned(id)
    }
}

// The persisted form matches the platform's flat integer encoding:
// -1 = not set, -2 = wildcard, >= 0 = assigned.
const HANDLE_NOT_SET: i32 = -1;
const HANDLE_ANY: i32 = -2;

impl Serialize for NetworkHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            NetworkHandle::NotSet => HANDLE_NOT_SET,
            NetworkHandle::Any => HANDLE_ANY,
            NetworkHandle::Assigned(id) => id.0,
        };
        serializer.serialize_i32(raw)
    }
}

impl<'de> Deserialize<'de> for NetworkHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i32::deserialize(deserializer)?;
        Ok(match raw {
            HANDLE_NOT_SET => NetworkHandle::NotSet,
            HANDLE_ANY => NetworkHandle::Any,
            id if id >= 0 => NetworkHandle::Assigned(NetworkId(id)),
            other => return Err(de::Error::custom(format!("invalid network handle {other}"))),
        })
    }
}

/// An access point address, or the wildcard meaning "any AP broadcasting
/// this SSID." Consumer networks with many physical APs share one SSID,
/// so the wildcard is the common case for saved configurations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Bssid {
    #[default]
    Any,
    Specific(String),
}

impl Bssid {
    /// The store treats an absent BSSID as the wildcard.
    pub fn from_optional(bssid: Option<&str>) -> Self {
        match bssid {
            Some(b) if !b.is_empty() => Bssid::Specific(b.to_owned()),
            _ => Bssid::Any,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Bssid::Any)
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bssid::Any => f.write_str("any"),
            Bssid::Specific(b) => f.write_str(b),
        }
    }
}

const BSSID_ANY: &str = "any";

impl Serialize for Bssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Bssid::Any => serializer.serialize_str(BSSID_ANY),
            Bssid::Specific(b) => serializer.serialize_str(b),
        }
    }
}

impl<'de> Deserialize<'de> for Bssid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == BSSID_ANY || raw.is_empty() {
            Bssid::Any
        } else {
            Bssid::Specific(raw)
        })
    }
}

// ── Security ─────────────────────────────────────────────────────────

/// Security kind of a network, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SecurityKind {
    Open,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WPA2")]
    Wpa2,
    #[serde(rename = "WPA-EAP")]
    WpaEap,
    #[serde(rename = "IEEE8021X")]
    Ieee8021x,
}

impl SecurityKind {
    /// Parse the security kind out of a scan-result capability string.
    /// Stronger/enterprise markers win over weaker ones when several
    /// appear in the same capability string.
    pub fn from_capabilities(capabilities: &str) -> Self {
        const ORDERED: [(&str, SecurityKind); 5] = [
            ("IEEE8021X", SecurityKind::Ieee8021x),
            ("WPA-EAP", SecurityKind::WpaEap),
            ("WPA2", SecurityKind::Wpa2),
            ("WPA", SecurityKind::Wpa),
            ("WEP", SecurityKind::Wep),
        ];
        for (marker, kind) in ORDERED {
            if capabilities.contains(marker) {
                return kind;
            }
        }
        SecurityKind::Open
    }

    pub fn is_open(self) -> bool {
        self == SecurityKind::Open
    }
}

impl fmt::Display for SecurityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityKind::Open => "Open",
            SecurityKind::Wep => "WEP",
            SecurityKind::Wpa => "WPA",
            SecurityKind::Wpa2 => "WPA2",
            SecurityKind::WpaEap => "WPA-EAP",
            SecurityKind::Ieee8021x => "IEEE8021X",
        };
        f.write_str(name)
    }
}

/// How a user-entered WEP key should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PasswordEncoding {
    /// Detect hex keys by length and character set, quote otherwise.
    #[default]
    Auto,
    Ascii,
    Hex,
}

// ── Scan results ─────────────────────────────────────────────────────

/// String present in capabilities if the scan result is ad-hoc.
const ADHOC_CAPABILITY: &str = "[IBSS]";

/// One network observed during a scan, as reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Raw (unquoted) SSID. Empty for hidden networks.
    pub ssid: String,
    pub bssid: String,
    /// Raw capability string, e.g. `"[WPA2-PSK-CCMP][ESS]"`.
    pub capabilities: String,
    /// Raw signal level (RSSI, dBm).
    pub level: i32,
}

impl ScanResult {
    pub fn security(&self) -> SecurityKind {
        SecurityKind::from_capabilities(&self.capabilities)
    }

    pub fn is_adhoc(&self) -> bool {
        self.capabilities.contains(ADHOC_CAPABILITY)
    }
}

// ── Connection state ─────────────────────────────────────────────────

/// Supplicant association state, as broadcast by the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SupplicantState {
    Uninitialized,
    Disconnected,
    Inactive,
    Dormant,
    Scanning,
    Associating,
    Associated,
    FourWayHandshake,
    GroupHandshake,
    Completed,
}

/// Detailed connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DetailedState {
    Idle,
    Scanning,
    Connecting,
    Authenticating,
    ObtainingIpAddr,
    Connected,
    Disconnecting,
    Disconnected,
    Failed,
}

impl DetailedState {
    /// Whether this state represents a live connection attempt or an
    /// established connection, i.e. an entry in this state can be
    /// resolved from the current connection info.
    pub fn is_live_connection(self) -> bool {
        matches!(
            self,
            DetailedState::Connecting
                | DetailedState::Authenticating
                | DetailedState::ObtainingIpAddr
                | DetailedState::Connected
        )
    }

    pub fn is_connected_or_connecting(self) -> bool {
        self.is_live_connection()
    }

    pub fn is_connected(self) -> bool {
        self == DetailedState::Connected
    }
}

/// Map a supplicant state to the coarse connection lifecycle state it
/// implies. The IP-configuration phase (`Completed` onwards) is only
/// distinguishable from the network-state broadcast, which carries the
/// richer state directly.
pub fn detailed_state_of(state: SupplicantState) -> DetailedState {
    match state {
        SupplicantState::Uninitialized | SupplicantState::Inactive => DetailedState::Idle,
        SupplicantState::Disconnected | SupplicantState::Dormant => DetailedState::Disconnected,
        SupplicantState::Scanning => DetailedState::Scanning,
        SupplicantState::Associating | SupplicantState::Associated => DetailedState::Connecting,
        SupplicantState::FourWayHandshake | SupplicantState::GroupHandshake => {
            DetailedState::Authenticating
        }
        SupplicantState::Completed => DetailedState::ObtainingIpAddr,
    }
}

/// Error codes attached to a supplicant-state broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SupplicantError {
    /// Authentication with the AP failed (wrong credentials).
    Authenticating,
}

/// Adapter / radio power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WifiState {
    Disabled,
    Enabling,
    Enabled,
    Disabling,
    Unknown,
}

/// Live connection info, as reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub supplicant_state: SupplicantState,
    /// Raw (unquoted) SSID of the current network, if any.
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    pub network_id: NetworkHandle,
    pub rssi: i32,
    pub link_speed: u32,
    pub ip_address: Option<Ipv4Addr>,
    pub hidden_ssid: bool,
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            supplicant_state: SupplicantState::Disconnected,
            ssid: None,
            bssid: None,
            network_id: NetworkHandle::NotSet,
            rssi: i32::MIN,
            link_speed: 0,
            ip_address: None,
            hidden_ssid: false,
        }
    }
}

// ── Persisted configuration ──────────────────────────────────────────

/// One saved network as held by the configuration store.
///
/// `network_id` is `None` only while building a config that has not yet
/// been added to the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: Option<NetworkId>,
    pub bssid: Bssid,
    /// Quoted SSID, e.g. `"\"Cafe\""`.
    pub ssid: String,
    pub security: Option<SecurityKind>,
    pub priority: i32,
    pub hidden_ssid: bool,
    pub disabled: bool,
    pub pre_shared_key: Option<String>,
    pub wep_keys: [Option<String>; 4],
    pub wep_tx_key_index: usize,
}

impl NetworkConfig {
    /// Whether the store holds key material for this network. The store
    /// never hands back the actual key, only its presence.
    pub fn has_password(&self) -> bool {
        self.pre_shared_key.as_deref().is_some_and(|k| !k.is_empty())
            || self
                .wep_keys
                .iter()
                .any(|k| k.as_deref().is_some_and(|k| !k.is_empty()))
    }
}

/// Platform signal-level comparison. The RSSI scale is not linear in
/// perceived quality, but ordering is preserved, so a plain numeric
/// comparison is the reference behavior mocks default to.
pub fn compare_signal_level(a: i32, b: i32) -> Ordering {
    a.cmp(&b)
}
