// ── User operations ──
//
// connect / save / forget, plus the priority bookkeeping they lean on.
// All of these run under the engine lock; failures abort the operation
// where detected and nothing already applied is rolled back, beyond
// what the store itself guarantees atomically.

use tracing::{debug, warn};

use wifitrack_platform::{NetworkConfig, NetworkHandle, NetworkId, SupplicantState};

use crate::entry::TrackedNetwork;
use crate::error::{CoreError, ErrorKind};
use crate::matching::MatchStrength;
use crate::registry::EntryId;

use super::{EngineInner, EngineState, Notice, Notices};

impl EngineInner {
    // ── connect ──────────────────────────────────────────────────

    pub(super) fn connect_locked(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        id: EntryId,
    ) -> Result<(), CoreError> {
        let entry = state.registry.get(id).ok_or(CoreError::NotTracked { id })?;
        debug!(%id, ssid = entry.human_readable_ssid(), "connecting");

        let mut config = match self.find_configured(entry) {
            Some(mut config) => {
                entry.apply_to_config(&mut config);
                config
            }
            None => {
                // First connect to this network: create its saved
                // configuration now, enable and persist below.
                self.add_configuration(state, notices, id, false)
                    .inspect_err(|_| self.notice_error(notices, ErrorKind::Connecting))?
            }
        };

        // A scan-derived entry can weakly match a saved configuration
        // while still carrying a wildcard id; adopt the stored one.
        if let Some(network_id) = config.network_id {
            if let Some(entry) = state.registry.get_mut(id) {
                entry.begin_batch();
                entry.set_network_id(network_id.into());
                entry.set_configured(true);
                entry.end_batch();
            }
        }

        let network_id = self.assigned_id(state, id)?;

        // Enable before persisting anything.
        if !self.enable_network(state, id, network_id, false) {
            self.notice_error(notices, ErrorKind::Connecting);
            return Err(CoreError::EnableFailed { id: network_id });
        }

        // Highest priority can renumber network ids, so it comes after
        // all other modifications. A failure here does not abort the
        // connect; the supplicant may still pick the network.
        if let Err(error) = self.set_highest_priority_and_save(state, notices, id, &mut config) {
            warn!(%error, "could not raise priority, continuing with connect");
        }

        // Force the supplicant onto this network by disabling the
        // siblings. Done after the save so the disabled flags are not
        // persisted; the next network-state broadcast re-enables them.
        state.reenable_on_state_change = true;
        if !self.enable_network(state, id, network_id, true) {
            self.notice_error(notices, ErrorKind::Connecting);
            return Err(CoreError::EnableFailed { id: network_id });
        }

        if matches!(
            state.supplicant_state,
            SupplicantState::Disconnected | SupplicantState::Scanning
        ) {
            self.radio.reconnect();
        }

        let open = state
            .registry
            .get(id)
            .is_some_and(|entry| !entry.has_security());
        if open {
            self.check_excess_open_networks(state, notices);
        }

        Ok(())
    }

    // ── save ─────────────────────────────────────────────────────

    pub(super) fn save_locked(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        id: EntryId,
    ) -> Result<(), CoreError> {
        let entry = state.registry.get(id).ok_or(CoreError::NotTracked { id })?;
        debug!(%id, ssid = entry.human_readable_ssid(), "saving");

        match self.find_configured(entry) {
            None => {
                // A manually entered network is assumed hidden, since
                // the user would have picked it from the scan list
                // otherwise.
                if let Some(entry) = state.registry.get_mut(id) {
                    entry.set_hidden_ssid(true);
                }
                self.add_configuration(state, notices, id, true)
                    .inspect_err(|_| self.notice_error(notices, ErrorKind::Saving))?;
            }
            Some(mut config) => {
                entry.apply_to_config(&mut config);
                let network_id = config.network_id.ok_or(CoreError::MissingNetworkId)?;
                if self.store.update(config).is_none() {
                    self.notice_error(notices, ErrorKind::Saving);
                    return Err(CoreError::UpdateFailed { id: network_id });
                }
            }
        }

        if !self.persist_and_resync(state) {
            self.notice_error(notices, ErrorKind::Saving);
            return Err(CoreError::PersistFailed);
        }

        // The store may have evicted older entries while persisting,
        // renumbering ids. Re-resolve ours from scratch.
        if let Some(entry) = state.registry.get_mut(id) {
            entry.set_network_id(NetworkHandle::Any);
        }
        if let Some(entry) = state.registry.get(id) {
            if let Some(network_id) = self.find_configured(entry).and_then(|c| c.network_id) {
                if let Some(entry) = state.registry.get_mut(id) {
                    entry.set_network_id(network_id.into());
                }
            }
        }

        Ok(())
    }

    // ── forget ───────────────────────────────────────────────────

    pub(super) fn forget_locked(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        id: EntryId,
    ) -> Result<(), CoreError> {
        let entry = state.registry.get(id).ok_or(CoreError::NotTracked { id })?;

        if !entry.configured {
            // The end state (not configured) already holds.
            warn!(%id, "forgetting a network that is not configured");
            return Ok(());
        }

        let old_network_id = entry.network_id.assigned();
        debug!(%id, ssid = entry.human_readable_ssid(), "forgetting");

        if let Some(entry) = state.registry.get_mut(id) {
            entry.forget();
        }

        let seen = state.registry.get(id).is_some_and(|entry| entry.seen);
        if !seen {
            // Out of range and no longer configured: nothing tracks it.
            if let Some(removed) = state.registry.remove(id) {
                notices.push(Notice::SetChanged {
                    id,
                    entry: removed,
                    added: false,
                });
            }
        }

        let network_id = old_network_id.ok_or(CoreError::MissingNetworkId)?;
        if !self.store.remove(network_id) {
            warn!(%network_id, "store rejected network removal");
            return Err(CoreError::RemoveFailed { id: network_id });
        }

        if !self.persist_and_resync(state) {
            self.notice_error(notices, ErrorKind::Saving);
            return Err(CoreError::PersistFailed);
        }

        Ok(())
    }

    // ── Configuration helpers ────────────────────────────────────

    /// The saved configuration matching `entry`, if any.
    pub(super) fn find_configured(&self, entry: &TrackedNetwork) -> Option<NetworkConfig> {
        self.store
            .list()
            .into_iter()
            .find(|config| entry.matches_config(config) >= MatchStrength::Weak)
    }

    /// Create a saved configuration from the entry's fields and adopt
    /// the assigned id. Fires one added notice on success.
    fn add_configuration(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        id: EntryId,
        enable: bool,
    ) -> Result<NetworkConfig, CoreError> {
        let entry = state.registry.get(id).ok_or(CoreError::NotTracked { id })?;

        let mut config = NetworkConfig::default();
        entry.apply_to_config(&mut config);
        let ssid = entry.human_readable_ssid().to_owned();

        let network_id = self
            .store
            .add(config.clone())
            .ok_or(CoreError::ConfigCreateFailed { ssid })?;
        config.network_id = Some(network_id);

        if let Some(entry) = state.registry.get_mut(id) {
            entry.begin_batch();
            entry.set_network_id(network_id.into());
            entry.set_configured(true);
            entry.end_batch();
        }

        // New configurations come disabled by default.
        if enable && !self.enable_network(state, id, network_id, false) {
            return Err(CoreError::EnableFailed { id: network_id });
        }

        self.notice_set_changed(state, notices, id, true);
        Ok(config)
    }

    pub(super) fn enable_network(
        &self,
        state: &mut EngineState,
        id: EntryId,
        network_id: NetworkId,
        disable_others: bool,
    ) -> bool {
        if !self.radio.enable_network(network_id, disable_others) {
            return false;
        }
        if let Some(entry) = state.registry.get_mut(id) {
            entry.set_disabled(false);
        }
        true
    }

    fn assigned_id(&self, state: &EngineState, id: EntryId) -> Result<NetworkId, CoreError> {
        state
            .registry
            .get(id)
            .ok_or(CoreError::NotTracked { id })?
            .network_id
            .assigned()
            .ok_or(CoreError::MissingNetworkId)
    }

    /// Flush the store and re-resolve ids, since persisting may
    /// renumber them.
    pub(super) fn persist_and_resync(&self, state: &mut EngineState) -> bool {
        let ok = self.store.persist();
        self.resync_network_ids(state);
        ok
    }

    // ── Priority management ──────────────────────────────────────

    /// Give the entry the highest saved priority and persist it.
    fn set_highest_priority_and_save(
        &self,
        state: &mut EngineState,
        notices: &mut Notices,
        id: EntryId,
        config: &mut NetworkConfig,
    ) -> Result<(), CoreError> {
        let entry = state.registry.get(id).ok_or(CoreError::NotTracked { id })?;
        if !entry.configured {
            return Err(CoreError::PriorityNotEligible);
        }
        let network_id = entry
            .network_id
            .assigned()
            .ok_or(CoreError::PriorityNotEligible)?;

        let priority = self.next_priority(state, notices);
        config.priority = priority;
        config.network_id = Some(network_id);

        if self.store.update(config.clone()).is_none() {
            warn!(%network_id, "store rejected priority update");
            return Err(CoreError::UpdateFailed { id: network_id });
        }
        if !self.persist_and_resync(state) {
            return Err(CoreError::PersistFailed);
        }

        if let Some(entry) = state.registry.get_mut(id) {
            entry.set_priority(priority);
            debug!(%id, priority, "raised priority");
        }
        Ok(())
    }

    fn next_priority(&self, state: &mut EngineState, notices: &mut Notices) -> i32 {
        if state.allocator.needs_compaction() {
            if let Err(error) = self.compact_priorities(state, notices) {
                // Best effort: priorities are left partially renumbered,
                // each individually persisted and valid.
                warn!(%error, "priority compaction aborted");
            }
        }
        state.allocator.allocate()
    }

    /// Renumber every priority-eligible entry to `0..N`, ascending in
    /// the old priority order, persisting each change before committing
    /// it in memory.
    fn compact_priorities(
        &self,
        state: &mut EngineState,
        _notices: &mut Notices,
    ) -> Result<(), CoreError> {
        let ids = state.registry.configured_by_priority();
        debug!(entries = ids.len(), "compacting saved priorities");
        state.allocator.reset();

        for id in ids {
            let network_id = match state.registry.get(id).and_then(|e| e.network_id.assigned()) {
                Some(network_id) => network_id,
                None => continue,
            };
            let mut config = match self
                .store
                .list()
                .into_iter()
                .find(|c| c.network_id == Some(network_id))
            {
                Some(config) => config,
                None => continue,
            };

            let priority = state.allocator.allocate();
            config.priority = priority;
            if self.store.update(config).is_none() {
                return Err(CoreError::UpdateFailed { id: network_id });
            }
            if !self.persist_and_resync(state) {
                return Err(CoreError::PersistFailed);
            }
            if let Some(entry) = state.registry.get_mut(id) {
                entry.set_priority(priority);
            }
        }
        Ok(())
    }

    /// Open networks accumulate without a password prompt gating them,
    /// so after connecting to one, forget any beyond the retention
    /// count, lowest priority first.
    fn check_excess_open_networks(&self, state: &mut EngineState, notices: &mut Notices) {
        let mut ids = state.registry.ids();
        ids.sort_by_key(|id| state.registry.get(*id).map_or(0, |entry| entry.priority));

        let mut open_configured = 0usize;
        for id in ids.into_iter().rev() {
            let is_excess = match state.registry.get(id) {
                Some(entry) => entry.configured && !entry.has_security(),
                None => false,
            };
            if !is_excess {
                continue;
            }
            open_configured += 1;
            if open_configured > self.config.open_networks_kept {
                if let Err(error) = self.forget_locked(state, notices, id) {
                    warn!(%id, %error, "failed to forget excess open network");
                }
            }
        }
    }
}
