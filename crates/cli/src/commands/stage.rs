use guidepost_agent::DemoStage;

use crate::commands::CommandResult;

pub fn run(stage: Option<&str>) -> CommandResult {
    let resolved = DemoStage::parse_or_default(stage);
    let mut output = format!("stage: {resolved}");
    if let Some(Err(error)) = stage.map(str::parse::<DemoStage>) {
        output.push_str(&format!("\n({error}; showing {resolved})"));
    }
    CommandResult::report(output)
}
