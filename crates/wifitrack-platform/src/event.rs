// ── Radio broadcast events ──
//
// The platform delivers these on the UI dispatch thread; the core
// applies them in arrival order.

use crate::types::{DetailedState, SupplicantError, SupplicantState, WifiState};

/// One broadcast notification from the radio / connectivity stack.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RadioEvent {
    /// The connection lifecycle state changed. `bssid` identifies the AP
    /// when known; plain disconnects carry no BSSID.
    NetworkStateChanged {
        state: DetailedState,
        bssid: Option<String>,
    },
    /// A fresh scan result list is ready to be fetched.
    ScanResultsAvailable,
    /// The supplicant connection to the radio came up or went down.
    SupplicantConnectionChanged { connected: bool },
    /// The supplicant association state machine moved.
    SupplicantStateChanged {
        state: SupplicantState,
        error: Option<SupplicantError>,
    },
    /// The adapter was enabled/disabled.
    WifiStateChanged { state: WifiState },
    /// Signal strength of the current connection changed.
    SignalChanged { rssi: i32 },
    /// The store reassigned network ids (e.g. after a save evicted
    /// older entries). All cached ids must be re-resolved.
    NetworkIdsChanged,
}
