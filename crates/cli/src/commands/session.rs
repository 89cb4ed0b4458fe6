use clap::Subcommand;

use crate::commands::analyze::{render_steps, render_suggestions};
use crate::commands::{render_transcript, CommandResult, Context};
use crate::GlobalArgs;

#[derive(Clone, Debug, Subcommand)]
pub enum SessionCommand {
    #[command(about = "Show the snapshot in the configured slot")]
    Show,
    #[command(about = "List every saved slot")]
    List,
    #[command(about = "Delete the configured slot")]
    Clear,
    #[command(about = "Restore the slot and finish any interrupted playback")]
    Resume,
}

pub fn run(global: &GlobalArgs, command: &SessionCommand) -> CommandResult {
    let context = match Context::load("session", global) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let runtime = match context.runtime() {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let key = context.config.session.key.clone();

    let result = runtime.block_on(async {
        let store = context.session_store().await?;
        let store_failure = |error| context.store_failure(error);

        match command {
            SessionCommand::List => {
                let slots = store.list().await.map_err(store_failure)?;
                if slots.is_empty() {
                    return Ok(CommandResult::report("no saved sessions"));
                }
                let listing: Vec<String> = slots
                    .into_iter()
                    .map(|slot| {
                        format!(
                            "{}  {}  {}  {}",
                            slot.key,
                            slot.session_id,
                            slot.state,
                            slot.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
                        )
                    })
                    .collect();
                Ok(CommandResult::report(listing.join("\n")))
            }
            SessionCommand::Clear => {
                let removed = store.clear(&key).await.map_err(store_failure)?;
                let message = if removed {
                    format!("cleared slot `{key}`")
                } else {
                    format!("slot `{key}` was already empty")
                };
                Ok(CommandResult::success("session", message))
            }
            SessionCommand::Show | SessionCommand::Resume => {
                let Some(snapshot) = store.load(&key).await.map_err(store_failure)? else {
                    return Ok(CommandResult::report(format!("slot `{key}` is empty")));
                };
                let player = context.player()?;
                player.restore(snapshot).map_err(|error| context.playback_failure(error))?;

                if matches!(command, SessionCommand::Resume) {
                    player.resume().await.map_err(|error| context.playback_failure(error))?;
                    store.save(&key, &player.snapshot()).await.map_err(store_failure)?;
                }

                let view = player.view();
                let mut lines = vec![format!("slot `{key}`: {}", view.state.as_str())];
                let transcript = render_transcript(&player.transcript().messages());
                if !transcript.is_empty() {
                    lines.push(transcript);
                }
                lines.push(String::new());
                lines.extend(render_steps(&view));
                if !view.suggestions.is_empty() {
                    lines.push(String::new());
                    lines.extend(render_suggestions(&view));
                }
                if !view.tasks.is_empty() {
                    lines.push(String::new());
                    lines.push("Tasks".to_owned());
                    for task in &view.tasks {
                        lines.push(format!("  [{}] {}", task.status.as_str(), task.title));
                    }
                }
                Ok::<_, CommandResult>(CommandResult::report(lines.join("\n")))
            }
        }
    });

    result.unwrap_or_else(|failure| failure)
}
