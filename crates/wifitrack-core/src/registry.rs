// ── Network registry ──
//
// Owns every `TrackedNetwork` the engine knows about. One map with a
// visibility tag per entry: `Scanned` entries were observed in the most
// recent scan, `Remembered` entries are saved configurations currently
// out of range. An entry migrates between the two, it is never
// duplicated.

use std::fmt;

use indexmap::IndexMap;
use tokio::sync::mpsc::UnboundedSender;

use crate::entry::{TrackedNetwork, display_ordering};
use crate::matching::{MatchKey, MatchStrength};

/// Opaque stable handle for one tracked network. Ids are never reused
/// within an engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    #[cfg(test)]
    pub(crate) fn test(raw: u64) -> Self {
        EntryId(raw)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which population an entry currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Present in the latest scan results.
    Scanned,
    /// Saved configuration not currently in range.
    Remembered,
}

#[derive(Debug)]
struct Slot {
    entry: TrackedNetwork,
    visibility: Visibility,
}

/// All tracked networks, keyed by [`EntryId`].
#[derive(Debug)]
pub struct NetworkRegistry {
    slots: IndexMap<EntryId, Slot>,
    next_id: u64,
    primary: Option<EntryId>,
    refresh_tx: UnboundedSender<EntryId>,
}

impl NetworkRegistry {
    pub fn new(refresh_tx: UnboundedSender<EntryId>) -> Self {
        Self {
            slots: IndexMap::new(),
            next_id: 0,
            primary: None,
            refresh_tx,
        }
    }

    // ── Insertion / removal ──────────────────────────────────────

    /// Insert a new entry, wiring it up for change notification.
    pub fn insert(&mut self, mut entry: TrackedNetwork, visibility: Visibility) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        entry.attach(id, self.refresh_tx.clone());
        self.slots.insert(id, Slot { entry, visibility });
        id
    }

    pub fn remove(&mut self, id: EntryId) -> Option<TrackedNetwork> {
        if self.primary == Some(id) {
            self.primary = None;
        }
        // shift_remove keeps insertion order for the survivors.
        self.slots.shift_remove(&id).map(|slot| slot.entry)
    }

    /// Drop every entry, handing the drained records back.
    pub fn clear(&mut self) -> Vec<(EntryId, TrackedNetwork)> {
        self.primary = None;
        self.slots.drain(..).map(|(id, slot)| (id, slot.entry)).collect()
    }

    // ── Access ───────────────────────────────────────────────────

    pub fn get(&self, id: EntryId) -> Option<&TrackedNetwork> {
        self.slots.get(&id).map(|slot| &slot.entry)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut TrackedNetwork> {
        self.slots.get_mut(&id).map(|slot| &mut slot.entry)
    }

    pub fn set_visibility(&mut self, id: EntryId, visibility: Visibility) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.visibility = visibility;
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &TrackedNetwork)> {
        self.slots.iter().map(|(id, slot)| (*id, &slot.entry))
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.slots.keys().copied().collect()
    }

    pub fn ids_in(&self, visibility: Visibility) -> Vec<EntryId> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.visibility == visibility)
            .map(|(id, _)| *id)
            .collect()
    }

    // ── Matching lookups ─────────────────────────────────────────

    /// Find the entry in one population that best matches `key`.
    /// Returns the strongest match of at least [`MatchStrength::Weak`];
    /// an exact match short-circuits.
    pub fn find_in(&self, visibility: Visibility, key: &MatchKey) -> Option<EntryId> {
        let mut best: Option<(EntryId, MatchStrength)> = None;
        for (id, slot) in &self.slots {
            if slot.visibility != visibility {
                continue;
            }
            let strength = slot.entry.matches(key);
            if strength == MatchStrength::Exact {
                return Some(*id);
            }
            if strength > MatchStrength::None
                && best.is_none_or(|(_, prev)| strength > prev)
            {
                best = Some((*id, strength));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Find the best match across both populations, preferring an
    /// in-range entry over a remembered one of equal strength.
    pub fn find_any(&self, key: &MatchKey) -> Option<EntryId> {
        self.find_in(Visibility::Scanned, key)
            .or_else(|| self.find_in(Visibility::Remembered, key))
    }

    // ── Primary tracking ─────────────────────────────────────────

    pub fn primary(&self) -> Option<EntryId> {
        self.primary
    }

    /// Mark `id` as the primary (connected or connecting) network,
    /// demoting the previous one.
    pub fn set_primary(&mut self, id: Option<EntryId>) {
        if self.primary == id {
            return;
        }
        if let Some(old) = self.primary {
            if let Some(slot) = self.slots.get_mut(&old) {
                slot.entry.set_primary(false);
            }
        }
        self.primary = id;
        if let Some(new) = id {
            if let Some(slot) = self.slots.get_mut(&new) {
                slot.entry.set_primary(true);
            }
        }
    }

    // ── Derived views ────────────────────────────────────────────

    /// Configured entries holding a real network id, ordered by
    /// ascending saved priority. This is the order priority compaction
    /// renumbers in.
    pub fn configured_by_priority(&self) -> Vec<EntryId> {
        let mut ids: Vec<EntryId> = self
            .slots
            .iter()
            .filter(|(_, slot)| {
                slot.entry.configured && slot.entry.network_id.assigned().is_some()
            })
            .map(|(id, _)| *id)
            .collect();
        ids.sort_by_key(|id| self.slots[id].entry.priority);
        ids
    }

    /// Snapshot of every entry in user-facing display order.
    pub fn sorted_for_display(&self) -> Vec<(EntryId, TrackedNetwork)> {
        let mut list: Vec<(EntryId, TrackedNetwork)> = self
            .slots
            .iter()
            .map(|(id, slot)| (*id, slot.entry.clone()))
            .collect();
        list.sort_by(|(_, a), (_, b)| display_ordering(a, b));
        list
    }

    pub fn has_saved_networks(&self) -> bool {
        self.slots.values().any(|slot| slot.entry.configured)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;
    use wifitrack_platform::{NetworkId, SecurityKind};

    fn registry() -> NetworkRegistry {
        let (tx, _rx) = mpsc::unbounded_channel();
        NetworkRegistry::new(tx)
    }

    fn scanned(reg: &mut NetworkRegistry, ssid: &str) -> EntryId {
        let mut entry = TrackedNetwork::default();
        entry.set_ssid(ssid);
        entry.set_seen(true);
        reg.insert(entry, Visibility::Scanned)
    }

    fn remembered(reg: &mut NetworkRegistry, ssid: &str, id: i32, priority: i32) -> EntryId {
        let mut entry = TrackedNetwork::default();
        entry.set_ssid(ssid);
        entry.set_configured(true);
        entry.set_network_id(NetworkId(id).into());
        entry.set_priority(priority);
        reg.insert(entry, Visibility::Remembered)
    }

    #[test]
    fn ids_are_never_reused() {
        let mut reg = registry();
        let a = scanned(&mut reg, "a");
        reg.remove(a);
        let b = scanned(&mut reg, "b");
        assert_ne!(a, b);
    }

    #[test]
    fn find_prefers_scanned_population() {
        let mut reg = registry();
        let kept = remembered(&mut reg, "Cafe", 1, 0);
        let seen = scanned(&mut reg, "Cafe");

        let key = MatchKey::wildcard("\"Cafe\"", None);
        assert_eq!(reg.find_any(&key), Some(seen));
        assert_eq!(reg.find_in(Visibility::Remembered, &key), Some(kept));
    }

    #[test]
    fn find_returns_strongest_match() {
        let mut reg = registry();
        // Two saved profiles for one SSID, different security.
        let open = remembered(&mut reg, "Cafe", 1, 0);
        reg.get_mut(open).unwrap().set_security(SecurityKind::Open);
        let wpa = remembered(&mut reg, "Cafe", 2, 1);
        reg.get_mut(wpa).unwrap().set_security(SecurityKind::Wpa2);

        let key = MatchKey {
            network_id: NetworkId(2).into(),
            bssid: wifitrack_platform::Bssid::Any,
            ssid: "\"Cafe\"".into(),
            security: None,
        };
        assert_eq!(reg.find_in(Visibility::Remembered, &key), Some(wpa));
    }

    #[test]
    fn set_primary_demotes_previous() {
        let mut reg = registry();
        let a = scanned(&mut reg, "a");
        let b = scanned(&mut reg, "b");

        reg.set_primary(Some(a));
        assert!(reg.get(a).unwrap().primary);

        reg.set_primary(Some(b));
        assert!(!reg.get(a).unwrap().primary);
        assert!(reg.get(b).unwrap().primary);
        assert_eq!(reg.primary(), Some(b));
    }

    #[test]
    fn removing_primary_clears_tracking() {
        let mut reg = registry();
        let a = scanned(&mut reg, "a");
        reg.set_primary(Some(a));
        reg.remove(a);
        assert_eq!(reg.primary(), None);
    }

    #[test]
    fn configured_by_priority_is_ascending_and_skips_idless() {
        let mut reg = registry();
        let hi = remembered(&mut reg, "hi", 1, 9);
        let lo = remembered(&mut reg, "lo", 2, 2);
        scanned(&mut reg, "unconfigured");

        assert_eq!(reg.configured_by_priority(), vec![lo, hi]);
    }

    #[test]
    fn has_saved_networks_tracks_configured_entries() {
        let mut reg = registry();
        scanned(&mut reg, "a");
        assert!(!reg.has_saved_networks());
        remembered(&mut reg, "b", 1, 0);
        assert!(reg.has_saved_networks());
    }
}
