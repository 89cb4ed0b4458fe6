//! Cancellable waits for scripted playback.
//!
//! Every pause in the player, the chat script and the simulated systems goes
//! through a [`Pacer`]. A pause races the timer against the pacer's
//! cancellation token; whichever fires first decides the outcome.

use std::future::Future;
use std::time::Duration;

use guidepost_core::config::PlayerConfig;
use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("playback was cancelled")]
pub struct Cancelled;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayPolicy {
    Fixed(Duration),
    /// Inclusive millisecond range, sampled per pause.
    Uniform { min: Duration, max: Duration },
}

impl DelayPolicy {
    pub fn fixed_ms(millis: u64) -> Self {
        Self::Fixed(Duration::from_millis(millis))
    }

    pub fn uniform_ms(min: u64, max: u64) -> Self {
        if min >= max {
            return Self::fixed_ms(min);
        }
        Self::Uniform { min: Duration::from_millis(min), max: Duration::from_millis(max) }
    }

    pub fn sample(&self) -> Duration {
        match *self {
            Self::Fixed(duration) => duration,
            Self::Uniform { min, max } => {
                let min_ms = min.as_millis() as u64;
                let max_ms = max.as_millis() as u64;
                Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
            }
        }
    }

    pub fn max(&self) -> Duration {
        match *self {
            Self::Fixed(duration) => duration,
            Self::Uniform { max, .. } => max,
        }
    }
}

/// Every wait the demo makes, resolved from `[player]` configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacingProfile {
    pub analysis_step: DelayPolicy,
    pub settle: Duration,
    pub task_step: Duration,
    pub stream_char: Duration,
    pub message_gap: Duration,
    /// Pause after a streamed message finishes revealing.
    pub stream_gap: Duration,
    pub think: Duration,
    pub opening: Duration,
    pub highlight_clear: Duration,
    pub simulate_latency: bool,
}

impl PacingProfile {
    pub fn instant() -> Self {
        Self::from(&PlayerConfig::instant())
    }
}

impl Default for PacingProfile {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

impl From<&PlayerConfig> for PacingProfile {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            analysis_step: DelayPolicy::uniform_ms(config.step_delay_min_ms, config.step_delay_max_ms),
            settle: Duration::from_millis(config.settle_ms),
            task_step: Duration::from_millis(config.task_step_ms),
            stream_char: Duration::from_millis(config.stream_char_ms),
            message_gap: Duration::from_millis(config.message_gap_ms),
            stream_gap: Duration::from_millis(config.stream_gap_ms),
            think: Duration::from_millis(config.think_ms),
            opening: Duration::from_millis(config.opening_ms),
            highlight_clear: Duration::from_millis(config.highlight_clear_ms),
            simulate_latency: config.simulate_latency,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Pacer {
    token: CancellationToken,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    pub async fn pause(&self, duration: Duration) -> Result<(), Cancelled> {
        self.checkpoint()?;
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    pub async fn pause_for(&self, policy: DelayPolicy) -> Result<Duration, Cancelled> {
        let duration = policy.sample();
        self.pause(duration).await?;
        Ok(duration)
    }

    /// Runs `future` unless the pacer is cancelled first.
    pub async fn guard<F>(&self, future: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        self.checkpoint()?;
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Cancelled),
            output = future => Ok(output),
        }
    }
}
