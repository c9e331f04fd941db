// Shared data contracts
// Types exchanged between the data pipeline, the signal engine and its collaborators

pub mod events;
pub mod instrument;
pub mod signal;
pub mod snapshot;

pub use events::{SignalEvent, SignalEventKind};
pub use instrument::{OptionType, SignalKey};
pub use signal::{ExpiryReason, PriceLevels, SignalDirection, TrackedSignal};
pub use snapshot::{IndicatorSnapshot, SnapshotError};
