use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use guidepost_core::documents::TaskArtifact;
use guidepost_core::domain::customer::CustomerId;
use guidepost_core::domain::money::format_money;
use guidepost_core::domain::task::TaskItem;
use guidepost_core::flows::BranchKind;
use guidepost_core::script::ConversationScript;
use tracing::info;

use crate::commands::{render_transcript, CommandResult, Context};
use crate::GlobalArgs;

#[derive(Clone, Debug, Default, Args)]
pub struct UpgradeArgs {
    #[arg(long, help = "Upgrade SKU (defaults to the first offered)")]
    pub sku: Option<String>,
    #[arg(long = "customer", help = "Customer id to upgrade; repeat for several (defaults to every eligible customer)")]
    pub customers: Vec<String>,
    #[arg(long, help = "Do not write artifacts to the output directory")]
    pub no_write: bool,
}

pub fn run(global: &GlobalArgs, args: &UpgradeArgs) -> CommandResult {
    let context = match Context::load("upgrade", global) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let runtime = match context.runtime() {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let Some(suggestion) =
        ConversationScript::supplier_delay().suggestion_for(BranchKind::PremiumUpgrade).cloned()
    else {
        return CommandResult::failure("upgrade", "playback", "no suggestion opens the premium upgrade", 5);
    };

    let result = runtime.block_on(async {
        let player = context.player()?;
        let fail = |error| context.playback_failure(error);

        player.run_analysis().await.map_err(fail)?;
        player.choose_suggestion(&suggestion).await.map_err(fail)?;
        if let Some(sku) = &args.sku {
            player.select_sku(sku).map_err(fail)?;
        }
        let customers: Vec<CustomerId> = if args.customers.is_empty() {
            player
                .upgrade_options()
                .into_iter()
                .filter(|option| option.eligible)
                .map(|option| option.customer_id)
                .collect()
        } else {
            args.customers.iter().map(CustomerId::new).collect()
        };
        player.set_customers(&customers).map_err(fail)?;
        let preview = player.preview();
        player.confirm_selection().map_err(fail)?;
        player.execute_tasks().await.map_err(fail)?;

        let store = context.session_store().await?;
        store
            .save(&context.config.session.key, &player.snapshot())
            .await
            .map_err(|error| context.store_failure(error))?;

        let mut lines = vec![render_transcript(&player.transcript().messages()), String::new()];
        if let Some(preview) = preview {
            lines.push(format!(
                "Upgrade preview: {} for {} eligible customer(s), {}",
                preview.sku,
                preview.eligible_customers,
                format_money(preview.total)
            ));
        }
        lines.push("Tasks".to_owned());
        for task in player.view().tasks {
            lines.push(format!("  [{}] {}", task.status.as_str(), task.title));
        }

        let artifacts = player.artifacts();
        lines.push("Artifacts".to_owned());
        for (task, artifact) in &artifacts {
            lines.push(format!("  {}: {}", task.id.as_str(), artifact.title()));
        }
        if !args.no_write {
            let written = write_artifacts(&context.config.documents.output_dir, &artifacts)
                .map_err(|error| {
                    CommandResult::failure("upgrade", "artifact_write", format!("{error:#}"), 6)
                })?;
            for path in written {
                lines.push(format!("  wrote {}", path.display()));
            }
        }
        Ok::<_, CommandResult>(lines.join("\n"))
    });

    match result {
        Ok(output) => CommandResult::report(output),
        Err(failure) => failure,
    }
}

/// Writes the report and the email draft. Order updates have no file form.
pub fn write_artifacts(
    output_dir: &Path,
    artifacts: &[(TaskItem, TaskArtifact)],
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    let mut written = Vec::new();
    for (_, artifact) in artifacts {
        let (file_name, body) = match artifact {
            TaskArtifact::Report(document) => (document.file_name.clone(), document.body.clone()),
            TaskArtifact::Email(email) => (
                "customer-email.txt".to_owned(),
                format!("To: {}\nSubject: {}\n\n{}", email.to.join(", "), email.subject, email.body),
            ),
            TaskArtifact::OrderUpdate(_) => continue,
        };
        let path = output_dir.join(file_name);
        std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        info!(event_name = "cli.artifact.written", path = %path.display(), "artifact written");
        written.push(path);
    }
    Ok(written)
}
