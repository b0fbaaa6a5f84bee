//! Record store
//!
//! Source of truth for club financial records. Snapshots are loaded through
//! the `RecordSource` trait so tests can inject fixed data.

mod error;
mod source;
mod store;

#[cfg(test)]
mod tests;

pub use error::{RecordError, RecordResult};
pub use source::{RecordSource, StaticSource};
pub use store::JsonSnapshotStore;
