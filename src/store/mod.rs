//! Expiring locale preference persistence.
//!
//! The preference is a single JSON record (`{"v": "<locale>", "exp": <millis>}`)
//! kept under one key of a [`Storage`] backend. Reads validate the record and
//! purge it on any failure.
mod clock;
mod preference;
mod storage;

pub use clock::{
    Clock,
    ManualClock,
    SystemClock,
};
pub use preference::{
    PreferenceStore,
    WriteOutcome,
};
pub use storage::{
    FileStorage,
    MemoryStorage,
    Storage,
    StorageError,
};
