// ── Scan scheduling and ingestion ──
//
// One background task owns the scan timer. The sync side talks to it
// with `Schedule`/`Cancel` commands; a `Schedule` replaces any pending
// deadline, so the retry timer and the continuous-scan timer are the
// same slot, as there is never more than one pending scan.

use std::cmp::Ordering;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::entry::{TrackedNetwork, quote_ssid};
use crate::error::ErrorKind;
use crate::matching::{MatchKey, MatchStrength};
use crate::registry::{EntryId, Visibility};

use super::{Engine, EngineInner, EngineState, Notice, Notices};

#[derive(Debug)]
pub(crate) enum TimerCommand {
    /// Arm (or re-arm) the scan timer.
    Schedule(Duration),
    /// Drop any pending deadline.
    Cancel,
}

pub(super) async fn scheduler_task(
    engine: Engine,
    mut commands: UnboundedReceiver<TimerCommand>,
    cancel: CancellationToken,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        let timer = async {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            command = commands.recv() => match command {
                Some(TimerCommand::Schedule(delay)) => {
                    deadline = Some(Instant::now() + delay);
                }
                Some(TimerCommand::Cancel) => deadline = None,
                None => break,
            },

            _ = timer => {
                deadline = None;
                engine.attempt_scan();
            }
        }
    }

    debug!("scan scheduler stopped");
}

impl EngineInner {
    pub(super) fn queue_continuous_scan(&self, state: &EngineState) {
        if state.obtaining_address {
            return;
        }
        let _ = self
            .timer_tx
            .send(TimerCommand::Schedule(self.config.continuous_scan_interval));
    }

    pub(super) fn remove_future_scans(&self) {
        let _ = self.timer_tx.send(TimerCommand::Cancel);
    }

    // ── Scan triggering ──────────────────────────────────────────

    pub(super) fn attempt_scan_locked(&self, state: &mut EngineState, notices: &mut Notices) {
        // A scan is happening right now, nothing else should be queued.
        self.remove_future_scans();

        if !self.radio.is_enabled() {
            return;
        }

        if self.radio.trigger_scan() {
            state.scan_retry_count = 0;
        } else {
            self.post_attempt_scan(state, notices);
        }
    }

    fn post_attempt_scan(&self, state: &mut EngineState, notices: &mut Notices) {
        notices.push(Notice::Scanning(true));

        state.scan_retry_count += 1;
        if state.scan_retry_count < self.config.scan_max_retries {
            debug!(attempt = state.scan_retry_count, "scan rejected, retrying");
            self.remove_future_scans();
            let _ = self
                .timer_tx
                .send(TimerCommand::Schedule(self.config.scan_retry_delay));
        } else {
            warn!("scan trigger kept getting rejected, giving up");
            self.notice_error(notices, ErrorKind::Scanning);
            self.on_scanning_ended(state, notices);
        }
    }

    pub(super) fn on_scanning_ended(&self, state: &EngineState, notices: &mut Notices) {
        self.queue_continuous_scan(state);
        notices.push(Notice::Scanning(false));
    }

    // ── Ingestion ────────────────────────────────────────────────

    /// Reconcile the latest scan result list into the registry.
    pub(super) fn handle_scan_results(&self, state: &mut EngineState, notices: &mut Notices) {
        let previous = state.registry.ids_in(Visibility::Scanned);
        let mut current: Vec<EntryId> = Vec::with_capacity(previous.len());

        for result in self.radio.scan_results() {
            // Hidden networks show up with an empty SSID; ad-hoc peers
            // are not connectable through this engine.
            if result.ssid.is_empty() || result.is_adhoc() {
                continue;
            }

            let key = MatchKey::wildcard(quote_ssid(&result.ssid), Some(result.security()));

            // A large network has many physical APs sharing one SSID.
            // If this batch already produced an entry for the key,
            // merge by keeping whichever signal the platform ranks
            // higher.
            if let Some(id) = find_in_batch(state, &current, &key) {
                let stronger = state.registry.get(id).is_some_and(|entry| {
                    self.radio.compare_signal_level(result.level, entry.signal)
                        == Ordering::Greater
                });
                if stronger {
                    if let Some(entry) = state.registry.get_mut(id) {
                        entry.set_signal(result.level);
                    }
                }
                continue;
            }

            // Known network coming (back) into range, or a new one.
            let id = match state.registry.find_any(&key) {
                Some(id) => {
                    state.registry.set_visibility(id, Visibility::Scanned);
                    id
                }
                None => state
                    .registry
                    .insert(TrackedNetwork::default(), Visibility::Scanned),
            };
            if let Some(entry) = state.registry.get_mut(id) {
                entry.update_from_scan(&result);
            }
            self.notice_set_changed(state, notices, id, true);
            current.push(id);
        }

        // Whatever was in the previous scan set and not re-matched is
        // out of range now. Configured entries stay tracked; transient
        // ones have nothing keeping them alive.
        for id in previous {
            if current.contains(&id) {
                continue;
            }
            let configured = state.registry.get(id).is_some_and(|entry| entry.configured);
            if configured {
                if let Some(entry) = state.registry.get_mut(id) {
                    entry.set_seen(false);
                }
                state.registry.set_visibility(id, Visibility::Remembered);
            } else if let Some(entry) = state.registry.remove(id) {
                notices.push(Notice::SetChanged {
                    id,
                    entry,
                    added: false,
                });
            }
        }

        self.on_scanning_ended(state, notices);
    }
}

fn find_in_batch(state: &EngineState, batch: &[EntryId], key: &MatchKey) -> Option<EntryId> {
    batch.iter().copied().find(|id| {
        state
            .registry
            .get(*id)
            .is_some_and(|entry| entry.matches(key) >= MatchStrength::Weak)
    })
}
