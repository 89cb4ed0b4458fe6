use serde::{Deserialize, Serialize};

use crate::domain::analysis::IconRef;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SuggestionId(pub String);

impl SuggestionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub icon: IconRef,
}

impl Suggestion {
    pub fn new(
        id: SuggestionId,
        title: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, DomainError> {
        validate_confidence(&id, confidence)?;
        let icon = IconRef::for_suggestion_id(id.as_str());
        Ok(Self { id, title: title.into(), description: description.into(), confidence, icon })
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_confidence(&self.id, self.confidence)
    }
}

fn validate_confidence(id: &SuggestionId, confidence: f64) -> Result<(), DomainError> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(DomainError::InvariantViolation(format!(
            "suggestion `{}` confidence {confidence} is outside 0.0..=1.0",
            id.as_str()
        )))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Strong,
    Good,
    Moderate,
    Low,
}

impl MatchTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Strong => "Strong Match",
            Self::Good => "Good Match",
            Self::Moderate => "Moderate Match",
            Self::Low => "Low Match",
        }
    }
}

/// Inclusive lower bounds for each display tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchThresholds {
    pub strong: f64,
    pub good: f64,
    pub moderate: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self { strong: 0.8, good: 0.6, moderate: 0.4 }
    }
}

impl MatchThresholds {
    pub fn tier(&self, confidence: f64) -> MatchTier {
        if confidence >= self.strong {
            MatchTier::Strong
        } else if confidence >= self.good {
            MatchTier::Good
        } else if confidence >= self.moderate {
            MatchTier::Moderate
        } else {
            MatchTier::Low
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedSuggestion {
    pub suggestion: Suggestion,
    pub tier: MatchTier,
}

#[cfg(test)]
mod tests {
    use super::{MatchThresholds, MatchTier, Suggestion, SuggestionId};
    use crate::domain::analysis::IconRef;

    #[test]
    fn tier_boundaries_are_inclusive() {
        let thresholds = MatchThresholds::default();

        assert_eq!(thresholds.tier(0.95), MatchTier::Strong);
        assert_eq!(thresholds.tier(0.87), MatchTier::Strong);
        assert_eq!(thresholds.tier(0.8), MatchTier::Strong);
        assert_eq!(thresholds.tier(0.79), MatchTier::Good);
        assert_eq!(thresholds.tier(0.6), MatchTier::Good);
        assert_eq!(thresholds.tier(0.42), MatchTier::Moderate);
        assert_eq!(thresholds.tier(0.4), MatchTier::Moderate);
        assert_eq!(thresholds.tier(0.39), MatchTier::Low);
        assert_eq!(thresholds.tier(0.0), MatchTier::Low);
    }

    #[test]
    fn tier_follows_configured_thresholds() {
        let thresholds = MatchThresholds { strong: 0.9, good: 0.85, moderate: 0.5 };

        assert_eq!(thresholds.tier(0.87), MatchTier::Good);
        assert_eq!(thresholds.tier(0.42), MatchTier::Low);
        assert_eq!(MatchTier::Good.label(), "Good Match");
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        assert!(Suggestion::new(SuggestionId::new("sug-009"), "t", "d", 1.2).is_err());
        assert!(Suggestion::new(SuggestionId::new("sug-009"), "t", "d", -0.1).is_err());

        let suggestion =
            Suggestion::new(SuggestionId::new("sug-003"), "Upgrade", "Premium", 0.87)
                .expect("valid confidence");
        assert_eq!(suggestion.icon, IconRef::ArrowUpload);
    }
}
