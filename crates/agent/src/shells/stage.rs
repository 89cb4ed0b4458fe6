use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Which screen of the demo is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DemoStage {
    #[default]
    Email,
    Suggestions,
    Chat,
    SalesOrder,
}

impl DemoStage {
    pub const ALL: [DemoStage; 4] = [Self::Email, Self::Suggestions, Self::Chat, Self::SalesOrder];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Suggestions => "suggestions",
            Self::Chat => "chat",
            Self::SalesOrder => "salesOrder",
        }
    }

    /// Lenient parse for a `?stage=` value. Anything unknown lands on the inbox.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for DemoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown stage `{0}` (expected email, suggestions, chat or salesOrder)")]
pub struct UnknownStage(pub String);

impl FromStr for DemoStage {
    type Err = UnknownStage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "email" => Ok(Self::Email),
            "suggestions" => Ok(Self::Suggestions),
            "chat" => Ok(Self::Chat),
            "salesOrder" | "sales-order" | "sales_order" => Ok(Self::SalesOrder),
            other => Err(UnknownStage(other.to_owned())),
        }
    }
}

/// Top-level navigation between screens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageRouter {
    stage: DemoStage,
    conversation_step: u32,
}

impl StageRouter {
    pub fn new(stage: DemoStage) -> Self {
        Self { stage, conversation_step: 0 }
    }

    pub fn stage(&self) -> DemoStage {
        self.stage
    }

    pub fn conversation_step(&self) -> u32 {
        self.conversation_step
    }

    /// Both the inbox and the order screen hand off to the suggestion cards.
    pub fn ask_copilot(&mut self) -> bool {
        match self.stage {
            DemoStage::Email | DemoStage::SalesOrder => self.go(DemoStage::Suggestions),
            _ => false,
        }
    }

    pub fn start_chat(&mut self) -> bool {
        match self.stage {
            DemoStage::Suggestions => self.go(DemoStage::Chat),
            _ => false,
        }
    }

    pub fn advance_conversation(&mut self) {
        if self.stage == DemoStage::Chat {
            self.conversation_step += 1;
        }
    }

    pub fn open_sales_order(&mut self) -> bool {
        self.go(DemoStage::SalesOrder)
    }

    pub fn reset(&mut self) {
        self.go(DemoStage::Email);
    }

    fn go(&mut self, next: DemoStage) -> bool {
        let from = self.stage;
        self.stage = next;
        self.conversation_step = 0;
        info!(event_name = "shell.stage.changed", from = %from, to = %next, "stage changed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{DemoStage, StageRouter};

    #[test]
    fn stage_parses_query_values() {
        for stage in DemoStage::ALL {
            assert_eq!(stage.as_str().parse::<DemoStage>(), Ok(stage));
        }
        assert_eq!(DemoStage::parse_or_default(Some("bogus")), DemoStage::Email);
        assert_eq!(DemoStage::parse_or_default(None), DemoStage::Email);
        assert!("nope".parse::<DemoStage>().is_err());
    }

    #[test]
    fn router_follows_the_demo_path() {
        let mut router = StageRouter::default();
        assert!(!router.start_chat());
        assert!(router.ask_copilot());
        assert_eq!(router.stage(), DemoStage::Suggestions);
        assert!(router.start_chat());
        router.advance_conversation();
        assert_eq!(router.conversation_step(), 1);

        router.reset();
        assert_eq!(router.stage(), DemoStage::Email);
        assert_eq!(router.conversation_step(), 0);
    }

    #[test]
    fn order_screen_asks_copilot_too() {
        let mut router = StageRouter::new(DemoStage::SalesOrder);
        assert!(router.ask_copilot());
        assert_eq!(router.stage(), DemoStage::Suggestions);
    }
}
