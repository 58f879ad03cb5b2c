// ── Observer surface ──
//
// The UI registers one observer and renders from it. Callbacks are
// invoked after the engine releases its internal lock, so an observer
// may call back into the engine freely.

use std::sync::Mutex;

use crate::entry::TrackedNetwork;
use crate::error::ErrorKind;
use crate::registry::EntryId;

/// Receiver for engine state changes. All methods default to no-ops so
/// implementors pick what they care about.
pub trait EngineObserver: Send + Sync {
    /// An entry entered (`added = true`) or left the tracked set.
    fn on_set_changed(&self, id: EntryId, entry: &TrackedNetwork, added: bool) {
        let _ = (id, entry, added);
    }

    /// The engine started or stopped actively scanning.
    fn on_scanning_changed(&self, scanning: bool) {
        let _ = scanning;
    }

    /// A bulk state transition happened (radio toggled, reconnect). The
    /// whole list should be re-read; `enabled` is the radio state.
    fn on_entries_state_changed(&self, enabled: bool) {
        let _ = enabled;
    }

    /// Authentication failed for `entry`; the user should be asked for
    /// the password again.
    fn on_retry_password(&self, id: EntryId, entry: &TrackedNetwork) {
        let _ = (id, entry);
    }

    /// A user-visible failure occurred.
    fn on_error(&self, kind: ErrorKind) {
        let _ = kind;
    }
}

/// No observer registered.
pub struct NullObserver;

impl EngineObserver for NullObserver {}

// ── Test support ─────────────────────────────────────────────────────

/// One recorded observer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    SetChanged {
        id: EntryId,
        ssid: String,
        added: bool,
    },
    Scanning(bool),
    EntriesState(bool),
    RetryPassword {
        id: EntryId,
        ssid: String,
    },
    Error(ErrorKind),
}

/// Observer that records every callback, for assertions in tests.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<ObserverEvent> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut *events)
    }

    fn record(&self, event: ObserverEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}

impl EngineObserver for RecordingObserver {
    fn on_set_changed(&self, id: EntryId, entry: &TrackedNetwork, added: bool) {
        self.record(ObserverEvent::SetChanged {
            id,
            ssid: entry.human_readable_ssid().to_owned(),
            added,
        });
    }

    fn on_scanning_changed(&self, scanning: bool) {
        self.record(ObserverEvent::Scanning(scanning));
    }

    fn on_entries_state_changed(&self, enabled: bool) {
        self.record(ObserverEvent::EntriesState(enabled));
    }

    fn on_retry_password(&self, id: EntryId, entry: &TrackedNetwork) {
        self.record(ObserverEvent::RetryPassword {
            id,
            ssid: entry.human_readable_ssid().to_owned(),
        });
    }

    fn on_error(&self, kind: ErrorKind) {
        self.record(ObserverEvent::Error(kind));
    }
}
