use std::process::ExitCode;

fn main() -> ExitCode {
    guidepost_cli::run()
}
