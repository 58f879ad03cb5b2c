// wifitrack-platform: the in-process boundary between the reconciliation
// core and the device's network stack. Everything here is either a plain
// data type that crosses that boundary or a trait the platform implements.

pub mod event;
pub mod mock;
pub mod traits;
pub mod types;

// ── Primary re-exports ──────────────────────────────────────────────
pub use event::RadioEvent;
pub use mock::{MockConfigStore, MockRadio};
pub use traits::{ConfigStore, RadioService};
pub use types::{
    Bssid, ConnectionInfo, DetailedState, NetworkConfig, NetworkHandle, NetworkId,
    PasswordEncoding, ScanResult, SecurityKind, SupplicantError, SupplicantState, WifiState,
    compare_signal_level, detailed_state_of,
};
