// ── Reconciliation engine ──
//
// Merges scan results, saved configurations, and connection broadcasts
// into one tracked-network view, and mediates connect/save/forget
// against the configuration store. Broadcast handling is synchronous
// under one coarse lock; the only background task is the scan
// scheduler. Observer callbacks are collected under the lock and
// dispatched after release, so observers may re-enter the engine.

mod handlers;
mod ops;
mod scan;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use wifitrack_platform::{
    ConfigStore, PasswordEncoding, RadioEvent, RadioService, SupplicantState,
};

use crate::config::EngineConfig;
use crate::entry::TrackedNetwork;
use crate::error::{CoreError, ErrorKind};
use crate::observer::EngineObserver;
use crate::priority::PriorityAllocator;
use crate::registry::{EntryId, NetworkRegistry, Visibility};

use scan::TimerCommand;

// ── Observer notices ─────────────────────────────────────────────────

/// A pending observer callback, recorded under the lock and delivered
/// after it is released.
enum Notice {
    SetChanged {
        id: EntryId,
        entry: TrackedNetwork,
        added: bool,
    },
    Scanning(bool),
    EntriesState(bool),
    RetryPassword { id: EntryId, entry: TrackedNetwork },
    Error(ErrorKind),
}

type Notices = Vec<Notice>;

// ── Engine state ─────────────────────────────────────────────────────

pub(crate) struct EngineState {
    pub(crate) registry: NetworkRegistry,
    pub(crate) allocator: PriorityAllocator,
    pub(crate) scan_retry_count: u32,
    /// Scans are suppressed while the device is acquiring an address.
    pub(crate) obtaining_address: bool,
    /// Set when a connect disabled sibling networks; cleared exactly
    /// once, on the next network-state broadcast.
    pub(crate) reenable_on_state_change: bool,
    pub(crate) supplicant_state: SupplicantState,
    /// Entry we were last authenticating against, for attributing
    /// identity-free authentication-error broadcasts.
    pub(crate) last_authenticating: Option<EntryId>,
}

pub(crate) struct EngineInner {
    pub(crate) radio: Arc<dyn RadioService>,
    pub(crate) store: Arc<dyn ConfigStore>,
    observer: Arc<dyn EngineObserver>,
    pub(crate) config: EngineConfig,
    state: Mutex<EngineState>,
    pub(crate) timer_tx: UnboundedSender<TimerCommand>,
    timer_rx: Mutex<Option<UnboundedReceiver<TimerCommand>>>,
    entry_rx: Mutex<Option<UnboundedReceiver<EntryId>>>,
    cancel: CancellationToken,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Engine ───────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Construct with [`new`](Self::new), call
/// [`start`](Self::start) inside a tokio runtime to arm the scan
/// scheduler, then feed it [`RadioEvent`]s via
/// [`handle_event`](Self::handle_event).
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(
        radio: Arc<dyn RadioService>,
        store: Arc<dyn ConfigStore>,
        observer: Arc<dyn EngineObserver>,
        config: EngineConfig,
    ) -> Self {
        let (entry_tx, entry_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let state = EngineState {
            registry: NetworkRegistry::new(entry_tx),
            allocator: PriorityAllocator::new(config.priority_ceiling),
            scan_retry_count: 0,
            obtaining_address: false,
            reenable_on_state_change: false,
            supplicant_state: SupplicantState::Uninitialized,
            last_authenticating: None,
        };

        Self {
            inner: Arc::new(EngineInner {
                radio,
                store,
                observer,
                config,
                state: Mutex::new(state),
                timer_tx,
                timer_rx: Mutex::new(Some(timer_rx)),
                entry_rx: Mutex::new(Some(entry_rx)),
                cancel: CancellationToken::new(),
                scheduler: Mutex::new(None),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the scan-scheduler task. Must be called from within a
    /// tokio runtime; calling it twice is a no-op.
    pub fn start(&self) {
        let Some(timer_rx) = lock(&self.inner.timer_rx).take() else {
            return;
        };
        let engine = self.clone();
        let cancel = self.inner.cancel.clone();
        let handle = tokio::spawn(scan::scheduler_task(engine, timer_rx, cancel));
        *lock(&self.inner.scheduler) = Some(handle);
    }

    /// Cancel the scheduler and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = lock(&self.inner.scheduler).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!("engine shut down");
    }

    /// Initial load: configured networks plus current connection
    /// status, if the radio is up.
    pub fn bootstrap(&self) {
        if !self.inner.radio.is_enabled() {
            return;
        }
        self.with_state(|engine, state, notices| {
            engine.load_configured(state, notices);
            engine.refresh_status(state, None, None);
        });
    }

    /// Re-arm the continuous scan after the owning surface comes back.
    pub fn resume(&self) {
        if !self.inner.radio.is_enabled() {
            return;
        }
        self.with_state(|engine, state, _| {
            engine.queue_continuous_scan(state);
        });
    }

    /// The owning surface is going away: re-enable any networks a
    /// connect attempt disabled, and stop firing timers at it.
    pub fn pause(&self) {
        self.with_state(|engine, state, _| {
            engine.attempt_reenable_all(state);
            engine.remove_future_scans();
        });
    }

    // ── Broadcast entry point ────────────────────────────────────

    /// Apply one radio broadcast. Events must be delivered in arrival
    /// order.
    pub fn handle_event(&self, event: RadioEvent) {
        debug!(?event, "radio event");
        self.with_state(|engine, state, notices| match event {
            RadioEvent::NetworkStateChanged { state: detailed, .. } => {
                engine.handle_network_state(state, notices, detailed);
            }
            RadioEvent::ScanResultsAvailable => {
                engine.handle_scan_results(state, notices);
            }
            RadioEvent::SupplicantConnectionChanged { connected } => {
                engine.handle_supplicant_connection(state, notices, connected);
            }
            RadioEvent::SupplicantStateChanged { state: sup, error } => {
                engine.handle_supplicant_state(state, notices, sup, error);
            }
            RadioEvent::WifiStateChanged { state: wifi } => {
                engine.handle_wifi_state(state, notices, wifi);
            }
            RadioEvent::SignalChanged { rssi } => {
                engine.handle_signal(state, rssi);
            }
            RadioEvent::NetworkIdsChanged => {
                engine.resync_network_ids(state);
            }
            _ => {}
        });
    }

    // ── Operations (bodies in ops.rs / scan.rs) ──────────────────

    /// Trigger a scan, with bounded retry on rejection.
    pub fn attempt_scan(&self) {
        self.with_state(|engine, state, notices| {
            engine.attempt_scan_locked(state, notices);
        });
    }

    /// Connect to a tracked network, creating its saved configuration
    /// if absent.
    pub fn connect(&self, id: EntryId) -> Result<(), CoreError> {
        self.with_state(|engine, state, notices| engine.connect_locked(state, notices, id))
    }

    /// Create or update the saved configuration from the entry's
    /// current fields.
    pub fn save_network(&self, id: EntryId) -> Result<(), CoreError> {
        self.with_state(|engine, state, notices| engine.save_locked(state, notices, id))
    }

    /// Forget a saved network. Forgetting an unconfigured entry is an
    /// idempotent no-op.
    pub fn forget_network(&self, id: EntryId) -> Result<(), CoreError> {
        self.with_state(|engine, state, notices| engine.forget_locked(state, notices, id))
    }

    /// Record a user-entered password on an entry, for the next
    /// connect/save.
    pub fn set_password(
        &self,
        id: EntryId,
        password: impl Into<String>,
        encoding: PasswordEncoding,
    ) -> Result<(), CoreError> {
        self.with_state(|_, state, _| {
            let entry = state.registry.get_mut(id).ok_or(CoreError::NotTracked { id })?;
            entry.set_password(password, encoding);
            Ok(())
        })
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Detached snapshot of one tracked network.
    pub fn entry(&self, id: EntryId) -> Option<TrackedNetwork> {
        self.with_state(|_, state, _| state.registry.get(id).cloned())
    }

    /// Snapshots of every tracked network in display order.
    pub fn entries_sorted(&self) -> Vec<(EntryId, TrackedNetwork)> {
        self.with_state(|_, state, _| state.registry.sorted_for_display())
    }

    /// Re-attach a snapshot (e.g. restored after a process restart) to
    /// the live entry the engine tracks for the same network.
    pub fn resolve(&self, snapshot: &TrackedNetwork) -> Option<EntryId> {
        let key = snapshot.match_key();
        self.with_state(|_, state, _| state.registry.find_any(&key))
    }

    /// Track an externally constructed entry, typically a manually
    /// entered network about to be saved. If a tracked entry already
    /// matches it, that one is returned instead.
    pub fn track(&self, entry: TrackedNetwork) -> EntryId {
        self.with_state(|_, state, _| {
            if let Some(id) = state.registry.find_any(&entry.match_key()) {
                return id;
            }
            state.registry.insert(entry, Visibility::Remembered)
        })
    }

    pub fn has_saved_networks(&self) -> bool {
        self.with_state(|_, state, _| state.registry.has_saved_networks())
    }

    pub fn primary(&self) -> Option<EntryId> {
        self.with_state(|_, state, _| state.registry.primary())
    }

    pub fn is_wifi_enabled(&self) -> bool {
        self.inner.radio.is_enabled()
    }

    /// The per-entry refresh channel. Yields the id of every entry
    /// whose observable fields changed; can be taken once.
    ///
    /// The channel is unbounded and buffers an id per change until
    /// drained. Consumers that want fine-grained updates must take the
    /// receiver early and keep receiving; consumers that do not should
    /// take it and drop it, which closes the channel and makes further
    /// sends free.
    pub fn entry_updates(&self) -> Option<UnboundedReceiver<EntryId>> {
        lock(&self.inner.entry_rx).take()
    }

    // ── Internals ────────────────────────────────────────────────

    /// Run `f` under the state lock, then deliver the notices it
    /// queued with the lock released.
    fn with_state<R>(&self, f: impl FnOnce(&EngineInner, &mut EngineState, &mut Notices) -> R) -> R {
        let mut notices = Notices::new();
        let result = {
            let mut state = lock(&self.inner.state);
            f(&self.inner, &mut state, &mut notices)
        };
        self.dispatch(notices);
        result
    }

    fn dispatch(&self, notices: Notices) {
        let observer = &self.inner.observer;
        for notice in notices {
            match notice {
                Notice::SetChanged { id, entry, added } => {
                    observer.on_set_changed(id, &entry, added);
                }
                Notice::Scanning(started) => observer.on_scanning_changed(started),
                Notice::EntriesState(enabled) => observer.on_entries_state_changed(enabled),
                Notice::RetryPassword { id, entry } => observer.on_retry_password(id, &entry),
                Notice::Error(kind) => observer.on_error(kind),
            }
        }
    }
}

impl EngineInner {
    fn notice_set_changed(
        &self,
        state: &EngineState,
        notices: &mut Notices,
        id: EntryId,
        added: bool,
    ) {
        if let Some(entry) = state.registry.get(id) {
            notices.push(Notice::SetChanged {
                id,
                entry: entry.clone(),
                added,
            });
        }
    }

    fn notice_error(&self, notices: &mut Notices, kind: ErrorKind) {
        tracing::error!(%kind, "reporting error to observer");
        notices.push(Notice::Error(kind));
    }
}
