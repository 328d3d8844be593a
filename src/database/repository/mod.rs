//! Repository module - data access layer.

mod settings_repository;

pub use settings_repository::SettingsRepository;
