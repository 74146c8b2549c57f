// file: src/database/mod.rs
// description: database operations module exports
// reference: internal module structure

pub mod applier;
pub mod client;
pub mod loader;
pub mod schema;

pub use applier::{ApplyStats, ChangeApplier};
pub use client::NovelDbClient;
pub use loader::{Baseline, BaselineLoader};
pub use schema::SchemaManager;
