use clap::Args;
use guidepost_agent::{InboxFilter, InboxView, StageRouter};
use guidepost_core::domain::email::Importance;

use crate::commands::{CommandResult, Context};
use crate::GlobalArgs;

#[derive(Clone, Debug, Default, Args)]
pub struct InboxArgs {
    #[arg(long, help = "Only unread emails")]
    pub unread: bool,
    #[arg(long, value_parser = parse_importance, help = "high | medium | low")]
    pub importance: Option<Importance>,
    #[arg(long, help = "Case-insensitive text search over sender, subject and body")]
    pub search: Option<String>,
    #[arg(long, help = "Email id to open")]
    pub select: Option<String>,
    #[arg(long, help = "Hand the open email to the copilot")]
    pub ask_copilot: bool,
}

fn parse_importance(raw: &str) -> Result<Importance, String> {
    Importance::parse(raw).ok_or_else(|| format!("unknown importance `{raw}`"))
}

pub fn run(global: &GlobalArgs, args: &InboxArgs) -> CommandResult {
    let context = match Context::load("inbox", global) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let mut inbox = InboxView::new(context.fixtures.emails.clone());
    if let Some(id) = &args.select {
        if !inbox.select(id) {
            return CommandResult::failure("inbox", "not_found", format!("no email with id `{id}`"), 1);
        }
    }
    inbox.set_filter(InboxFilter {
        unread_only: args.unread,
        importance: args.importance,
        query: args.search.clone().unwrap_or_default(),
    });

    let selected_id = inbox.selected().map(|email| email.id.clone());
    let mut lines = vec![format!("Inbox ({} unread)", inbox.unread_count())];
    for email in inbox.visible() {
        let marker = if Some(&email.id) == selected_id.as_ref() { ">" } else { " " };
        let unread = if email.read { " " } else { "\u{2022}" };
        lines.push(format!(
            "{marker}{unread} {:<10} {:<6} {:<38} {}",
            email.id.as_str(),
            email.importance.as_str(),
            email.from,
            email.subject
        ));
    }

    if let Some(email) = inbox.selected() {
        lines.push(String::new());
        lines.push(format!("From: {}", email.from));
        lines.push(format!("Subject: {}", email.subject));
        lines.push(format!("Date: {}", email.date.format("%Y-%m-%d %H:%M UTC")));
        lines.push(String::new());
        lines.push(email.body.clone());
    }

    if args.ask_copilot {
        let mut router = StageRouter::default();
        if inbox.ask_copilot(&mut router) {
            lines.push(format!("\nstage: {}", router.stage()));
        } else {
            lines.push("\nAsk Copilot is only offered on the supplier delay email".to_owned());
        }
    }
    CommandResult::report(lines.join("\n"))
}
