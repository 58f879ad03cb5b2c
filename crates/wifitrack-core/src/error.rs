// ── Core error types ──
//
// Failures are terminal at the boundary where they are detected: the
// engine never retries connect/save/forget on its own (only scan
// triggering has retry semantics). User-visible failures additionally
// reach the observer as an `ErrorKind`.

use thiserror::Error;

use wifitrack_platform::NetworkId;

use crate::registry::EntryId;

/// Coarse message kind delivered through
/// [`EngineObserver::on_error`](crate::observer::EngineObserver::on_error).
/// The UI maps these to user-facing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Scan trigger kept getting rejected by the radio.
    Scanning,
    /// A connect operation failed at the store or radio boundary.
    Connecting,
    /// A save/forget persistence step failed.
    Saving,
    /// The connection attempt itself failed (broadcast-reported).
    ConnectionFailed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Scanning => "scanning",
            ErrorKind::Connecting => "connecting",
            ErrorKind::Saving => "saving",
            ErrorKind::ConnectionFailed => "connection failed",
        };
        f.write_str(name)
    }
}

/// Unified error type for engine operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("entry {id} is not tracked by this engine")]
    NotTracked { id: EntryId },

    #[error("configuration store rejected adding network {ssid}")]
    ConfigCreateFailed { ssid: String },

    #[error("radio refused to enable network {id}")]
    EnableFailed { id: NetworkId },

    #[error("entry has no store-assigned network id")]
    MissingNetworkId,

    #[error("configuration store rejected update of network {id}")]
    UpdateFailed { id: NetworkId },

    #[error("configuration store rejected removal of network {id}")]
    RemoveFailed { id: NetworkId },

    #[error("configuration store failed to persist")]
    PersistFailed,

    #[error("entry is not eligible for a managed priority")]
    PriorityNotEligible,
}
