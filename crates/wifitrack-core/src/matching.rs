// ── Fuzzy network identity ──
//
// A `MatchKey` is the `(network id, bssid, ssid, security)` tuple used
// to decide whether two observations (a scan result, a saved
// configuration, a live connection) refer to the same network. The rule
// order below is load-bearing: later rules assume earlier ones already
// excluded their NONE cases, so reordering changes observable grouping.

use std::hash::{Hash, Hasher};

use wifitrack_platform::{Bssid, NetworkHandle, SecurityKind};

/// How strongly two match keys identify the same network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchStrength {
    /// Different networks.
    None,
    /// Both BSSIDs are wildcards and the SSIDs are equal.
    Weak,
    /// BSSIDs are equal and neither is the wildcard.
    Strong,
    /// Non-wildcard network ids are equal.
    Exact,
}

/// Identity tuple for one network observation. SSIDs are stored quoted
/// (see [`quote_ssid`](crate::entry::quote_ssid)).
#[derive(Debug, Clone)]
pub struct MatchKey {
    pub network_id: NetworkHandle,
    pub bssid: Bssid,
    pub ssid: String,
    pub security: Option<SecurityKind>,
}

impl MatchKey {
    /// Wildcard key for looking up a network by SSID and security only,
    /// the shape of every scan-derived observation.
    pub fn wildcard(ssid: impl Into<String>, security: Option<SecurityKind>) -> Self {
        Self {
            network_id: NetworkHandle::Any,
            bssid: Bssid::Any,
            ssid: ssid.into(),
            security,
        }
    }

    /// Determine how strongly `other` identifies the same network as
    /// `self`.
    ///
    /// The function is intentionally asymmetric in which side's
    /// wildcards are checked; callers treat `self` as the tracked entry
    /// and `other` as the candidate observation.
    pub fn match_against(&self, other: &MatchKey) -> MatchStrength {
        if other.ssid.is_empty() {
            return MatchStrength::None;
        }

        // If both sides carry a security kind it must agree exactly (an
        // open network still carries `Open`). An AP broadcasting
        // different security is never the same network for UI purposes.
        if let (Some(ours), Some(theirs)) = (self.security, other.security) {
            if ours != theirs {
                return MatchStrength::None;
            }
        }

        let network_id_matches = self.network_id == other.network_id;
        if !network_id_matches
            && !self.network_id.is_wildcard()
            && !other.network_id.is_wildcard()
        {
            // Distinct real ids (or unset vs. real): distinct saved
            // profiles for the same SSID must not merge.
            return MatchStrength::None;
        }

        if network_id_matches
            && other.network_id != NetworkHandle::NotSet
            && !other.network_id.is_wildcard()
        {
            return MatchStrength::Exact;
        }

        // Network ids are unset, or at least one is a wildcard.

        let bssid_matches = self.bssid == other.bssid;
        let other_is_wildcard = other.bssid.is_wildcard();
        if bssid_matches && !other_is_wildcard {
            return MatchStrength::Strong;
        }

        if !bssid_matches && !self.bssid.is_wildcard() && !other_is_wildcard {
            return MatchStrength::None;
        }

        // BSSIDs are both wildcards.

        if self.ssid == other.ssid {
            return MatchStrength::Weak;
        }

        MatchStrength::None
    }
}

// The broadest match is SSID equality; every finer-grained match
// implies it (the same network id means the same saved configuration
// which means the same SSID). Hashing over the SSID alone therefore
// keeps `match_against(a, b) >= Weak  =>  hash(a) == hash(b)`.
impl Hash for MatchKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ssid.hash(state);
    }
}
