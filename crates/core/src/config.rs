use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::suggestion::MatchThresholds;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub player: PlayerConfig,
    pub suggestions: SuggestionConfig,
    pub session: SessionConfig,
    pub documents: DocumentsConfig,
    pub logging: LoggingConfig,
}

/// Pacing for the scripted playback, in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerConfig {
    pub step_delay_min_ms: u64,
    pub step_delay_max_ms: u64,
    pub settle_ms: u64,
    pub task_step_ms: u64,
    pub stream_char_ms: u64,
    pub message_gap_ms: u64,
    pub stream_gap_ms: u64,
    pub think_ms: u64,
    pub opening_ms: u64,
    pub highlight_clear_ms: u64,
    pub simulate_latency: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SuggestionConfig {
    pub strong: f64,
    pub good: f64,
    pub moderate: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub url: String,
    pub key: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentsConfig {
    pub output_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    Memory,
    Sqlite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub session_backend: Option<SessionBackend>,
    pub session_url: Option<String>,
    pub session_key: Option<String>,
    pub documents_output_dir: Option<PathBuf>,
    pub instant_pacing: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            step_delay_min_ms: 600,
            step_delay_max_ms: 1200,
            settle_ms: 800,
            task_step_ms: 1500,
            stream_char_ms: 20,
            message_gap_ms: 300,
            stream_gap_ms: 500,
            think_ms: 1500,
            opening_ms: 2000,
            highlight_clear_ms: 3000,
            simulate_latency: true,
        }
    }
}

impl PlayerConfig {
    /// Zero pacing everywhere except the highlight window, which is a display
    /// concern and not a wait.
    pub fn instant() -> Self {
        Self {
            step_delay_min_ms: 0,
            step_delay_max_ms: 0,
            settle_ms: 0,
            task_step_ms: 0,
            stream_char_ms: 0,
            message_gap_ms: 0,
            stream_gap_ms: 0,
            think_ms: 0,
            opening_ms: 0,
            simulate_latency: false,
            ..Self::default()
        }
    }
}

impl SuggestionConfig {
    pub fn thresholds(&self) -> MatchThresholds {
        MatchThresholds { strong: self.strong, good: self.good, moderate: self.moderate }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let thresholds = MatchThresholds::default();
        Self {
            player: PlayerConfig::default(),
            suggestions: SuggestionConfig {
                strong: thresholds.strong,
                good: thresholds.good,
                moderate: thresholds.moderate,
            },
            session: SessionConfig {
                backend: SessionBackend::Memory,
                url: "sqlite://guidepost.db".to_string(),
                key: "guidepost-demo".to_string(),
                max_connections: 5,
            },
            documents: DocumentsConfig { output_dir: PathBuf::from("artifacts") },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for SessionBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Validation(format!(
                "unsupported session backend `{other}` (expected memory|sqlite)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("guidepost.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(player) = patch.player {
            let target = &mut self.player;
            if let Some(value) = player.step_delay_min_ms {
                target.step_delay_min_ms = value;
            }
            if let Some(value) = player.step_delay_max_ms {
                target.step_delay_max_ms = value;
            }
            if let Some(value) = player.settle_ms {
                target.settle_ms = value;
            }
            if let Some(value) = player.task_step_ms {
                target.task_step_ms = value;
            }
            if let Some(value) = player.stream_char_ms {
                target.stream_char_ms = value;
            }
            if let Some(value) = player.message_gap_ms {
                target.message_gap_ms = value;
            }
            if let Some(value) = player.stream_gap_ms {
                target.stream_gap_ms = value;
            }
            if let Some(value) = player.think_ms {
                target.think_ms = value;
            }
            if let Some(value) = player.opening_ms {
                target.opening_ms = value;
            }
            if let Some(value) = player.highlight_clear_ms {
                target.highlight_clear_ms = value;
            }
            if let Some(value) = player.simulate_latency {
                target.simulate_latency = value;
            }
        }

        if let Some(suggestions) = patch.suggestions {
            if let Some(strong) = suggestions.strong {
                self.suggestions.strong = strong;
            }
            if let Some(good) = suggestions.good {
                self.suggestions.good = good;
            }
            if let Some(moderate) = suggestions.moderate {
                self.suggestions.moderate = moderate;
            }
        }

        if let Some(session) = patch.session {
            if let Some(backend) = session.backend {
                self.session.backend = backend;
            }
            if let Some(url) = session.url {
                self.session.url = url;
            }
            if let Some(key) = session.key {
                self.session.key = key;
            }
            if let Some(max_connections) = session.max_connections {
                self.session.max_connections = max_connections;
            }
        }

        if let Some(documents) = patch.documents {
            if let Some(output_dir) = documents.output_dir {
                self.documents.output_dir = output_dir;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let player_ms: [(&str, &mut u64); 10] = [
            ("GUIDEPOST_PLAYER_STEP_DELAY_MIN_MS", &mut self.player.step_delay_min_ms),
            ("GUIDEPOST_PLAYER_STEP_DELAY_MAX_MS", &mut self.player.step_delay_max_ms),
            ("GUIDEPOST_PLAYER_SETTLE_MS", &mut self.player.settle_ms),
            ("GUIDEPOST_PLAYER_TASK_STEP_MS", &mut self.player.task_step_ms),
            ("GUIDEPOST_PLAYER_STREAM_CHAR_MS", &mut self.player.stream_char_ms),
            ("GUIDEPOST_PLAYER_MESSAGE_GAP_MS", &mut self.player.message_gap_ms),
            ("GUIDEPOST_PLAYER_STREAM_GAP_MS", &mut self.player.stream_gap_ms),
            ("GUIDEPOST_PLAYER_THINK_MS", &mut self.player.think_ms),
            ("GUIDEPOST_PLAYER_OPENING_MS", &mut self.player.opening_ms),
            ("GUIDEPOST_PLAYER_HIGHLIGHT_CLEAR_MS", &mut self.player.highlight_clear_ms),
        ];
        for (key, slot) in player_ms {
            if let Some(value) = read_env(key) {
                *slot = parse_u64(key, &value)?;
            }
        }
        if let Some(value) = read_env("GUIDEPOST_PLAYER_SIMULATE_LATENCY") {
            self.player.simulate_latency =
                parse_bool("GUIDEPOST_PLAYER_SIMULATE_LATENCY", &value)?;
        }

        if let Some(value) = read_env("GUIDEPOST_SUGGESTIONS_STRONG") {
            self.suggestions.strong = parse_f64("GUIDEPOST_SUGGESTIONS_STRONG", &value)?;
        }
        if let Some(value) = read_env("GUIDEPOST_SUGGESTIONS_GOOD") {
            self.suggestions.good = parse_f64("GUIDEPOST_SUGGESTIONS_GOOD", &value)?;
        }
        if let Some(value) = read_env("GUIDEPOST_SUGGESTIONS_MODERATE") {
            self.suggestions.moderate = parse_f64("GUIDEPOST_SUGGESTIONS_MODERATE", &value)?;
        }

        if let Some(value) = read_env("GUIDEPOST_SESSION_BACKEND") {
            self.session.backend = value.parse()?;
        }
        if let Some(value) = read_env("GUIDEPOST_SESSION_URL") {
            self.session.url = value;
        }
        if let Some(value) = read_env("GUIDEPOST_SESSION_KEY") {
            self.session.key = value;
        }
        if let Some(value) = read_env("GUIDEPOST_SESSION_MAX_CONNECTIONS") {
            self.session.max_connections =
                parse_u32("GUIDEPOST_SESSION_MAX_CONNECTIONS", &value)?;
        }

        if let Some(value) = read_env("GUIDEPOST_DOCUMENTS_OUTPUT_DIR") {
            self.documents.output_dir = PathBuf::from(value);
        }

        let log_level =
            read_env("GUIDEPOST_LOGGING_LEVEL").or_else(|| read_env("GUIDEPOST_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("GUIDEPOST_LOGGING_FORMAT").or_else(|| read_env("GUIDEPOST_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(backend) = overrides.session_backend {
            self.session.backend = backend;
        }
        if let Some(url) = overrides.session_url {
            self.session.url = url;
        }
        if let Some(key) = overrides.session_key {
            self.session.key = key;
        }
        if let Some(output_dir) = overrides.documents_output_dir {
            self.documents.output_dir = output_dir;
        }
        if overrides.instant_pacing == Some(true) {
            let highlight_clear_ms = self.player.highlight_clear_ms;
            self.player = PlayerConfig { highlight_clear_ms, ..PlayerConfig::instant() };
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_player(&self.player)?;
        validate_suggestions(&self.suggestions)?;
        validate_session(&self.session)?;
        validate_documents(&self.documents)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("guidepost.toml"), PathBuf::from("config/guidepost.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_player(player: &PlayerConfig) -> Result<(), ConfigError> {
    if player.step_delay_min_ms > player.step_delay_max_ms {
        return Err(ConfigError::Validation(
            "player.step_delay_min_ms must not exceed player.step_delay_max_ms".to_string(),
        ));
    }

    if player.highlight_clear_ms == 0 {
        return Err(ConfigError::Validation(
            "player.highlight_clear_ms must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_suggestions(suggestions: &SuggestionConfig) -> Result<(), ConfigError> {
    let values = [suggestions.strong, suggestions.good, suggestions.moderate];
    if values.iter().any(|value| !(0.0..=1.0).contains(value)) {
        return Err(ConfigError::Validation(
            "suggestions thresholds must be within 0.0..=1.0".to_string(),
        ));
    }

    if !(suggestions.strong > suggestions.good && suggestions.good > suggestions.moderate) {
        return Err(ConfigError::Validation(
            "suggestions thresholds must be strictly descending (strong > good > moderate)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.key.trim().is_empty() {
        return Err(ConfigError::Validation("session.key must not be empty".to_string()));
    }

    if session.backend == SessionBackend::Sqlite {
        let url = session.url.trim();
        let sqlite_url =
            url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
        if !sqlite_url {
            return Err(ConfigError::Validation(
                "session.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                    .to_string(),
            ));
        }

        if session.max_connections == 0 {
            return Err(ConfigError::Validation(
                "session.max_connections must be greater than zero".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_documents(documents: &DocumentsConfig) -> Result<(), ConfigError> {
    if documents.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "documents.output_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    player: Option<PlayerPatch>,
    suggestions: Option<SuggestionsPatch>,
    session: Option<SessionPatch>,
    documents: Option<DocumentsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerPatch {
    step_delay_min_ms: Option<u64>,
    step_delay_max_ms: Option<u64>,
    settle_ms: Option<u64>,
    task_step_ms: Option<u64>,
    stream_char_ms: Option<u64>,
    message_gap_ms: Option<u64>,
    stream_gap_ms: Option<u64>,
    think_ms: Option<u64>,
    opening_ms: Option<u64>,
    highlight_clear_ms: Option<u64>,
    simulate_latency: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestionsPatch {
    strong: Option<f64>,
    good: Option<f64>,
    moderate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    backend: Option<SessionBackend>,
    url: Option<String>,
    key: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsPatch {
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{
        AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, SessionBackend,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_scripted_pacing() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.player.step_delay_min_ms == 600, "step delay floor should be 600ms")?;
        ensure(config.player.step_delay_max_ms == 1200, "step delay ceiling should be 1200ms")?;
        ensure(config.player.settle_ms == 800, "settle pause should be 800ms")?;
        ensure(config.player.task_step_ms == 1500, "task step should be 1500ms")?;
        ensure(config.player.stream_char_ms == 20, "stream rate should be 20ms per char")?;
        ensure(config.player.message_gap_ms == 300, "message gap should be 300ms")?;
        ensure(config.player.stream_gap_ms == 500, "streamed reply gap should be 500ms")?;
        ensure(config.player.highlight_clear_ms == 3000, "highlight should clear after 3s")?;
        ensure(config.session.backend == SessionBackend::Memory, "memory backend by default")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_GUIDEPOST_SESSION_DB", "sqlite://from-env.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("guidepost.toml");
            fs::write(
                &path,
                r#"
[session]
backend = "sqlite"
url = "${TEST_GUIDEPOST_SESSION_DB}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.session.url == "sqlite://from-env.db",
                "session url should be interpolated from environment",
            )?;
            ensure(config.session.backend == SessionBackend::Sqlite, "backend read from file")
        })();

        clear_vars(&["TEST_GUIDEPOST_SESSION_DB"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("guidepost.toml");
        fs::write(&path, "[session]\nurl = \"${GUIDEPOST_TEST_UNSET_VARIABLE}\"\n")
            .map_err(|err| err.to_string())?;

        match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
            Err(ConfigError::MissingEnvInterpolation { var }) => {
                ensure(var == "GUIDEPOST_TEST_UNSET_VARIABLE", "error should name the variable")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected interpolation failure".to_string()),
        }
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GUIDEPOST_LOG_LEVEL", "warn");
        env::set_var("GUIDEPOST_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["GUIDEPOST_LOG_LEVEL", "GUIDEPOST_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GUIDEPOST_PLAYER_TASK_STEP_MS", "900");
        env::set_var("GUIDEPOST_SESSION_KEY", "from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("guidepost.toml");
            fs::write(
                &path,
                r#"
[player]
task_step_ms = 2500
settle_ms = 400

[session]
key = "from-file"

[documents]
output_dir = "from-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    documents_output_dir: Some(PathBuf::from("from-override")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.player.settle_ms == 400, "file value should replace default")?;
            ensure(config.player.task_step_ms == 900, "env value should win over file")?;
            ensure(config.session.key == "from-env", "env session key should win over file")?;
            ensure(
                config.documents.output_dir == PathBuf::from("from-override"),
                "override output dir should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars(&["GUIDEPOST_PLAYER_TASK_STEP_MS", "GUIDEPOST_SESSION_KEY"]);
        result
    }

    #[test]
    fn instant_pacing_override_zeroes_waits() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { instant_pacing: Some(true), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.player.step_delay_max_ms == 0, "step delay should be zero")?;
        ensure(config.player.task_step_ms == 0, "task step should be zero")?;
        ensure(!config.player.simulate_latency, "latency simulation should be off")?;
        ensure(config.player.highlight_clear_ms == 3000, "highlight window is kept")
    }

    #[test]
    fn invalid_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GUIDEPOST_PLAYER_SETTLE_MS", "soon");
        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "GUIDEPOST_PLAYER_SETTLE_MS", "error should name the env key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected invalid override failure".to_string()),
        };

        clear_vars(&["GUIDEPOST_PLAYER_SETTLE_MS"]);
        result
    }

    #[test]
    fn validation_rejects_unordered_thresholds() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GUIDEPOST_SUGGESTIONS_GOOD", "0.85");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("strictly descending")
            );
            ensure(has_message, "validation failure should explain threshold ordering")
        })();

        clear_vars(&["GUIDEPOST_SUGGESTIONS_GOOD"]);
        result
    }

    #[test]
    fn sqlite_backend_requires_sqlite_url() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GUIDEPOST_SESSION_BACKEND", "sqlite");
        env::set_var("GUIDEPOST_SESSION_URL", "postgres://localhost/guidepost");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::Validation(message)) => {
                ensure(message.contains("session.url"), "error should mention session.url")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected validation failure".to_string()),
        };

        clear_vars(&["GUIDEPOST_SESSION_BACKEND", "GUIDEPOST_SESSION_URL"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        match AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        }) {
            Err(ConfigError::MissingConfigFile(missing)) => {
                ensure(missing == path, "error should carry the requested path")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected missing file failure".to_string()),
        }
    }
}
