//! About command plugin.

use serenity::all::{
    CommandInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
};

/// Handle the /about command.
pub async fn about_command(ctx: &Context, command: &CommandInteraction) -> anyhow::Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().content(about_text()),
            ),
        )
        .await?;
    Ok(())
}

fn about_text() -> String {
    format!(
        "**{}** v{}\n{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION"),
    )
}
