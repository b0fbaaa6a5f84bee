//! Core data types shared across modules

pub mod record;
pub mod snapshot;

pub use record::{ClubRecord, Compliance};
pub use snapshot::Snapshot;
