//! Bot module - Core bot functionality.

mod commands;
pub mod dispatcher;
mod handler;
mod runtime;

pub use dispatcher::{AppState, VoiceQueue};
pub use runtime::run;
