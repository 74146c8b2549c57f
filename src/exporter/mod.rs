// file: src/exporter/mod.rs
// description: file outputs of a run
// reference: internal module structure

pub mod change_log;
pub mod snapshot;

pub use change_log::ChangeLogWriter;
pub use snapshot::SnapshotStore;
