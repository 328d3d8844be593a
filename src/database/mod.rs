//! Database module exports.

pub mod models;
mod mongo;
mod repository;
mod store;

pub use models::*;
pub use mongo::Database;
pub use repository::SettingsRepository;
pub use store::SettingsStore;
