use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use guidepost_cli::commands::chat::ChatArgs;
use guidepost_cli::commands::inbox::InboxArgs;
use guidepost_cli::commands::order::OrderArgs;
use guidepost_cli::commands::session::SessionCommand;
use guidepost_cli::commands::upgrade::UpgradeArgs;
use guidepost_cli::commands::{analyze, chat, config, inbox, order, session, stage, upgrade};
use guidepost_cli::GlobalArgs;
use serde_json::Value;

fn fast() -> GlobalArgs {
    GlobalArgs { fast: true, ..GlobalArgs::default() }
}

/// Config file pointing the session slot and artifacts into `dir`.
fn sqlite_config(dir: &Path) -> PathBuf {
    let path = dir.join("guidepost.toml");
    let db = dir.join("guidepost.db");
    let body = format!(
        "[session]\nbackend = \"sqlite\"\nurl = \"sqlite://{}?mode=rwc\"\nkey = \"cli-test\"\n\n\
         [documents]\noutput_dir = \"{}\"\n",
        db.display(),
        dir.join("out").display()
    );
    fs::write(&path, body).expect("write config");
    path
}

#[test]
fn stage_resolves_aliases_and_falls_back_to_the_inbox() {
    let result = stage::run(Some("sales-order"));
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.output, "stage: salesOrder");

    let fallback = stage::run(Some("dashboard"));
    assert_eq!(fallback.exit_code, 0);
    assert!(fallback.output.starts_with("stage: email"));
    assert!(fallback.output.contains("unknown stage `dashboard`"));

    assert_eq!(stage::run(None).output, "stage: email");
}

#[test]
fn inbox_opens_on_the_supplier_email_and_hands_off() {
    with_env(&[], || {
        let args = InboxArgs { ask_copilot: true, ..InboxArgs::default() };
        let result = inbox::run(&GlobalArgs::default(), &args);
        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert!(result.output.contains("stage: suggestions"), "{}", result.output);

        let missing = InboxArgs { select: Some("email-999".to_owned()), ..InboxArgs::default() };
        let result = inbox::run(&GlobalArgs::default(), &missing);
        assert_eq!(result.exit_code, 1);
        assert_eq!(parse_payload(&result.output)["error_class"], "not_found");
    });
}

#[test]
fn order_commands_update_the_header() {
    with_env(&[], || {
        let args = OrderArgs {
            commands: vec![
                "please switch shipment to courier".to_owned(),
                "set the load time to 7 am".to_owned(),
                "what's the weather".to_owned(),
            ],
            highlight: Some("PX-500".to_owned()),
        };
        let result = order::run(&fast(), &args);
        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert!(result.output.contains("Shipment Method Code: COURIER"), "{}", result.output);
        assert!(result.output.contains("Load-in Time: 7:00 AM"), "{}", result.output);
        assert!(result.output.contains("changed from DELIVERY to COURIER"), "{}", result.output);
        assert!(result.output.contains("PX-500"));
    });
}

#[test]
fn chat_ignores_actions_that_are_not_offered() {
    with_env(&[], || {
        let args = ChatArgs {
            clicks: vec!["send-email".to_owned()],
            fields: Vec::new(),
            messages: vec!["Can we expedite?".to_owned()],
        };
        let result = chat::run(&fast(), &args);
        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert!(result.output.contains("You: Can we expedite?"), "{}", result.output);
        assert!(result.output.contains("ignored `send-email`"), "{}", result.output);
    });
}

#[test]
fn analyze_runs_every_step_with_fast_pacing() {
    with_env(&[], || {
        let result = analyze::run(&fast());
        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert!(result.output.contains("Analysis (100% complete)"), "{}", result.output);
        assert!(result.output.contains("sug-003"), "{}", result.output);
        assert!(result.output.contains("session saved to slot `guidepost-demo`"));
    });
}

#[test]
fn upgrade_writes_artifacts_and_the_session_survives() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("tempdir");
        let global = GlobalArgs { config: Some(sqlite_config(dir.path())), ..fast() };

        let args = UpgradeArgs {
            customers: vec!["CUST-001".to_owned(), "CUST-002".to_owned()],
            ..UpgradeArgs::default()
        };
        let result = upgrade::run(&global, &args);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let out = dir.path().join("out");
        let email = fs::read_to_string(out.join("customer-email.txt")).expect("email written");
        assert!(email.starts_with("To: "));
        let reports: Vec<_> = fs::read_dir(&out)
            .expect("output dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".html"))
            .collect();
        assert_eq!(reports.len(), 1);

        let shown = session::run(&global, &SessionCommand::Show);
        assert_eq!(shown.exit_code, 0, "{}", shown.output);
        assert!(shown.output.starts_with("slot `cli-test`: branch_complete"), "{}", shown.output);

        let listed = session::run(&global, &SessionCommand::List);
        assert!(listed.output.starts_with("cli-test"), "{}", listed.output);

        let cleared = session::run(&global, &SessionCommand::Clear);
        let payload = parse_payload(&cleared.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "cleared slot `cli-test`");
        assert_eq!(session::run(&global, &SessionCommand::Show).output, "slot `cli-test` is empty");
    });
}

#[test]
fn missing_config_file_is_a_validation_failure() {
    with_env(&[], || {
        let global = GlobalArgs { config: Some(PathBuf::from("does-not-exist.toml")), ..fast() };
        let result = analyze::run(&global);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "analyze");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn invalid_env_override_fails_before_playback() {
    with_env(&[("GUIDEPOST_PLAYER_THINK_MS", "soon")], || {
        let result = chat::run(&fast(), &ChatArgs::default());
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_sources() {
    with_env(&[("GUIDEPOST_SESSION_KEY", "from-env")], || {
        let global = GlobalArgs { log_level: Some("debug".to_owned()), ..GlobalArgs::default() };
        let result = config::run(&global);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let output = result.output;
        assert!(output.contains("- session.key = from-env (source: env (GUIDEPOST_SESSION_KEY))"), "{output}");
        assert!(output.contains("- logging.level = debug (source: flag)"), "{output}");
        assert!(output.contains("- player.think_ms = 1500 (source: default)"), "{output}");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys: Vec<String> =
        env::vars().map(|(key, _)| key).filter(|key| key.starts_with("GUIDEPOST_")).collect();
    let previous_values: Vec<(String, String)> =
        keys.iter().filter_map(|key| env::var(key).ok().map(|value| (key.clone(), value))).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, _) in vars {
        env::remove_var(key);
    }
    for (key, value) in previous_values {
        env::set_var(key, value);
    }
}
