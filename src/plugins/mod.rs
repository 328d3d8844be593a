//! Plugin system for slash command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the command name to `command_handler()`

pub mod about;
pub mod ping;
pub mod settings;

use serenity::all::{CommandInteraction, Context};
use tracing::{debug, warn};

use crate::bot::dispatcher::AppState;

/// Route a slash command interaction to its plugin.
pub async fn command_handler(ctx: &Context, command: &CommandInteraction, state: &AppState) {
    let result = match command.data.name.as_str() {
        "set" => settings::set_command(ctx, command, state).await,
        "ping" => ping::ping_command(ctx, command).await,
        "about" => about::about_command(ctx, command).await,
        other => {
            debug!("Ignoring unknown command /{}", other);
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!(command = %command.data.name, "Command handler failed: {:#}", e);
    }
}
