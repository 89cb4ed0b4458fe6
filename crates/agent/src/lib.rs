//! Guidepost playback runtime.
//!
//! Everything here is timed: the guided player walks the analysis script and
//! the upgrade branch, the chat replays its scripted conversation, and the
//! simulated business systems answer after a fixed latency. All waits go
//! through a [`pacing::Pacer`] so a reset cancels them cleanly.
//!
//! # Key Types
//!
//! - `GuidedPlayer` - analysis, suggestions, configurator and task execution
//! - `CopilotChat` - scripted chat panel
//! - `BusinessSystems` - the mock remote-call surface
//! - `OrderScreen`, `InboxView`, `StageRouter` - screen-level state

pub mod chat;
pub mod pacing;
pub mod player;
pub mod shells;
pub mod systems;
pub mod transcript;

pub use chat::{ChatError, ChatStep, CopilotChat};
pub use pacing::{Cancelled, DelayPolicy, Pacer, PacingProfile};
pub use player::{GuidedPlayer, PlayerError, PlayerOptions, PlayerView};
pub use shells::{DemoStage, InboxFilter, InboxView, OrderChange, OrderScreen, StageRouter};
pub use systems::{dispatch, BusinessSystems, DispatchError, MockBusinessSystems};
pub use transcript::Transcript;
