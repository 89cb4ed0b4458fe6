pub mod analyze;
pub mod chat;
pub mod config;
pub mod inbox;
pub mod order;
pub mod session;
pub mod stage;
pub mod upgrade;

use std::sync::Arc;

use guidepost_agent::{GuidedPlayer, MockBusinessSystems, PacingProfile, PlayerError, PlayerOptions};
use guidepost_core::config::AppConfig;
use guidepost_core::domain::message::Message;
use guidepost_core::fixtures::FixtureSet;
use guidepost_core::render::render_message;
use guidepost_db::{open_session_store, SessionStore, SessionStoreError};
use serde::Serialize;
use tokio::runtime::Runtime;

use crate::GlobalArgs;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Human-readable report on stdout.
    pub fn report(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loaded configuration plus the immutable demo fixtures.
pub struct Context {
    pub command: &'static str,
    pub config: AppConfig,
    pub fixtures: Arc<FixtureSet>,
}

impl Context {
    pub fn load(command: &'static str, global: &GlobalArgs) -> Result<Self, CommandResult> {
        let config = AppConfig::load(global.load_options()).map_err(|error| {
            CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
        })?;
        Ok(Self { command, config, fixtures: Arc::new(FixtureSet::demo()) })
    }

    pub fn runtime(&self) -> Result<Runtime, CommandResult> {
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                self.command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        })
    }

    pub fn pacing(&self) -> PacingProfile {
        PacingProfile::from(&self.config.player)
    }

    pub fn systems(&self) -> Arc<MockBusinessSystems> {
        Arc::new(
            MockBusinessSystems::new(Arc::clone(&self.fixtures))
                .with_latency(self.config.player.simulate_latency),
        )
    }

    pub fn player(&self) -> Result<GuidedPlayer, CommandResult> {
        GuidedPlayer::new(
            Arc::clone(&self.fixtures),
            self.systems(),
            PlayerOptions::from_config(&self.config),
        )
        .map_err(|error| self.playback_failure(error))
    }

    pub async fn session_store(&self) -> Result<Arc<dyn SessionStore>, CommandResult> {
        open_session_store(&self.config.session).await.map_err(|error| self.store_failure(error))
    }

    pub fn playback_failure(&self, error: PlayerError) -> CommandResult {
        CommandResult::failure(self.command, "playback", error.to_string(), 5)
    }

    pub fn store_failure(&self, error: SessionStoreError) -> CommandResult {
        CommandResult::failure(self.command, "session_store", error.to_string(), 4)
    }
}

pub(crate) fn render_transcript(messages: &[Message]) -> String {
    messages.iter().map(render_message).collect::<Vec<_>>().join("\n")
}
