use clap::Args;
use guidepost_agent::{ChatError, CopilotChat};

use crate::commands::{render_transcript, CommandResult, Context};
use crate::GlobalArgs;

#[derive(Clone, Debug, Default, Args)]
pub struct ChatArgs {
    #[arg(long = "click", help = "Action id to click, in order; repeat for several")]
    pub clicks: Vec<String>,
    #[arg(long = "field", value_parser = parse_field, help = "Form value as field=value for the edit form")]
    pub fields: Vec<(String, String)>,
    #[arg(long = "say", help = "Free-text message sent after the clicks")]
    pub messages: Vec<String>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(field, value)| (field.trim().to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected field=value, got `{raw}`"))
}

pub fn run(global: &GlobalArgs, args: &ChatArgs) -> CommandResult {
    let context = match Context::load("chat", global) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let runtime = match context.runtime() {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let chat = CopilotChat::new(context.fixtures.clone(), context.systems(), context.pacing());
        let fail = |error: ChatError| CommandResult::failure("chat", "playback", error.to_string(), 5);

        chat.open().await.map_err(fail)?;
        let mut ignored = Vec::new();
        for action in &args.clicks {
            if !chat.click(action).await.map_err(fail)? {
                ignored.push(action.clone());
            }
        }
        if !args.fields.is_empty() {
            let values: Vec<(&str, &str)> =
                args.fields.iter().map(|(field, value)| (field.as_str(), value.as_str())).collect();
            chat.submit_form(&values).await.map_err(fail)?;
        }
        for message in &args.messages {
            chat.say(message).await.map_err(fail)?;
        }

        let mut output = render_transcript(&chat.messages());
        for action in ignored {
            output.push_str(&format!("\n(ignored `{action}`: not offered at that point)"));
        }
        Ok::<_, CommandResult>(output)
    });

    match result {
        Ok(output) => CommandResult::report(output),
        Err(failure) => failure,
    }
}
