// wifitrack-core: Access-point reconciliation engine between the
// platform radio/config services and UI consumers.

pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod matching;
pub mod observer;
pub mod priority;
pub mod registry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{CoreError, ErrorKind};
pub use observer::{EngineObserver, NullObserver, ObserverEvent, RecordingObserver};

// Re-export model types at the crate root for ergonomics.
pub use entry::{TrackedNetwork, display_ordering, quote_ssid};
pub use matching::{MatchKey, MatchStrength};
pub use priority::PriorityAllocator;
pub use registry::{EntryId, NetworkRegistry, Visibility};
