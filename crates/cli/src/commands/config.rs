use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use guidepost_core::config::AppConfig;
use toml::Value;

use crate::commands::CommandResult;
use crate::GlobalArgs;

pub fn run(global: &GlobalArgs) -> CommandResult {
    let config = match AppConfig::load(global.load_options()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = detect_config_path(global.config.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let flags = FlagSources::from(global);

    let player = &config.player;
    let entries: Vec<(&str, String, bool)> = vec![
        ("player.step_delay_min_ms", player.step_delay_min_ms.to_string(), flags.fast),
        ("player.step_delay_max_ms", player.step_delay_max_ms.to_string(), flags.fast),
        ("player.settle_ms", player.settle_ms.to_string(), flags.fast),
        ("player.task_step_ms", player.task_step_ms.to_string(), flags.fast),
        ("player.stream_char_ms", player.stream_char_ms.to_string(), flags.fast),
        ("player.message_gap_ms", player.message_gap_ms.to_string(), flags.fast),
        ("player.stream_gap_ms", player.stream_gap_ms.to_string(), flags.fast),
        ("player.think_ms", player.think_ms.to_string(), flags.fast),
        ("player.opening_ms", player.opening_ms.to_string(), flags.fast),
        ("player.highlight_clear_ms", player.highlight_clear_ms.to_string(), false),
        ("player.simulate_latency", player.simulate_latency.to_string(), flags.fast),
        ("suggestions.strong", config.suggestions.strong.to_string(), false),
        ("suggestions.good", config.suggestions.good.to_string(), false),
        ("suggestions.moderate", config.suggestions.moderate.to_string(), false),
        ("session.backend", format!("{:?}", config.session.backend), false),
        ("session.url", config.session.url.clone(), false),
        ("session.key", config.session.key.clone(), flags.session_key),
        ("session.max_connections", config.session.max_connections.to_string(), false),
        ("documents.output_dir", config.documents.output_dir.display().to_string(), false),
        ("logging.level", config.logging.level.clone(), flags.log_level),
        ("logging.format", format!("{:?}", config.logging.format), false),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for (key_path, value, from_flag) in entries {
        let source = if from_flag {
            "flag".to_string()
        } else {
            field_source(
                key_path,
                &env_keys(key_path),
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            )
        };
        lines.push(render_line(key_path, &value, source));
    }

    CommandResult::report(lines.join("\n"))
}

struct FlagSources {
    fast: bool,
    log_level: bool,
    session_key: bool,
}

impl From<&GlobalArgs> for FlagSources {
    fn from(global: &GlobalArgs) -> Self {
        Self {
            fast: global.fast,
            log_level: global.log_level.is_some(),
            session_key: global.session_key.is_some(),
        }
    }
}

/// `logging.level` reads `GUIDEPOST_LOGGING_LEVEL` and the shorter `GUIDEPOST_LOG_LEVEL`.
fn env_keys(key_path: &str) -> Vec<String> {
    let primary = format!("GUIDEPOST_{}", key_path.replace('.', "_").to_ascii_uppercase());
    match key_path {
        "logging.level" => vec![primary, "GUIDEPOST_LOG_LEVEL".to_string()],
        "logging.format" => vec![primary, "GUIDEPOST_LOG_FORMAT".to_string()],
        _ => vec![primary],
    }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("guidepost.toml"), PathBuf::from("config/guidepost.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[String],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
