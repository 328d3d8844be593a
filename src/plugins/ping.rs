//! Ping command plugin.
//!
//! Measures and displays Discord API latency.

use std::time::Instant;

use serenity::all::{
    CommandInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse,
};

/// Handle the /ping command - time the initial response round trip.
pub async fn ping_command(ctx: &Context, command: &CommandInteraction) -> anyhow::Result<()> {
    let start = Instant::now();
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().content("Pinging..."),
            ),
        )
        .await?;
    let ms = start.elapsed().as_millis();

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(latency_text(ms)))
        .await?;

    Ok(())
}

fn latency_text(ms: u128) -> String {
    let emoji = if ms < 100 {
        "🟢"
    } else if ms < 300 {
        "🟡"
    } else {
        "🔴"
    };
    format!("{} Latency is {}ms.", emoji, ms)
}
