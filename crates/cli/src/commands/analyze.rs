use guidepost_agent::{GuidedPlayer, PlayerView};

use crate::commands::{render_transcript, CommandResult, Context};
use crate::GlobalArgs;

pub fn run(global: &GlobalArgs) -> CommandResult {
    let context = match Context::load("analyze", global) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let runtime = match context.runtime() {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let player = context.player()?;
        player.run_analysis().await.map_err(|error| context.playback_failure(error))?;

        let store = context.session_store().await?;
        store
            .save(&context.config.session.key, &player.snapshot())
            .await
            .map_err(|error| context.store_failure(error))?;
        Ok::<_, CommandResult>(render(&player))
    });

    match result {
        Ok(output) => CommandResult::report(format!(
            "{output}\n\nsession saved to slot `{}`",
            context.config.session.key
        )),
        Err(failure) => failure,
    }
}

pub(crate) fn render(player: &GuidedPlayer) -> String {
    let view = player.view();
    let mut lines = vec![render_transcript(&player.transcript().messages()), String::new()];
    lines.extend(render_steps(&view));
    lines.push(String::new());
    lines.extend(render_suggestions(&view));
    lines.join("\n")
}

pub(crate) fn render_steps(view: &PlayerView) -> Vec<String> {
    let mut lines = vec![format!("Analysis ({:.0}% complete)", view.progress * 100.0)];
    for step in &view.steps {
        let result = step.result.as_deref().unwrap_or("");
        lines.push(format!("  [{}] {}: {}", step.status.as_str(), step.label, result));
    }
    lines
}

pub(crate) fn render_suggestions(view: &PlayerView) -> Vec<String> {
    let mut lines = vec!["Suggestions".to_owned()];
    for ranked in &view.suggestions {
        lines.push(format!(
            "  {}  {} ({:.0}%)  {}",
            ranked.suggestion.id.as_str(),
            ranked.tier.label(),
            ranked.suggestion.confidence * 100.0,
            ranked.suggestion.title
        ));
    }
    lines
}
