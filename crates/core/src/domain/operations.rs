use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Named operations exposed by the simulated back-office systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationName {
    QueryAffectedOrders,
    QueryAlternateSuppliers,
    GetInventoryStatus,
    GetPremiumUpgradeOptions,
    CalculateRevenueImpact,
    GetSupplierComparison,
    GenerateDraftEmail,
    SubmitApproval,
    CheckTeamAvailability,
}

impl OperationName {
    pub const ALL: [OperationName; 9] = [
        Self::QueryAffectedOrders,
        Self::QueryAlternateSuppliers,
        Self::GetInventoryStatus,
        Self::GetPremiumUpgradeOptions,
        Self::CalculateRevenueImpact,
        Self::GetSupplierComparison,
        Self::GenerateDraftEmail,
        Self::SubmitApproval,
        Self::CheckTeamAvailability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryAffectedOrders => "queryAffectedOrders",
            Self::QueryAlternateSuppliers => "queryAlternateSuppliers",
            Self::GetInventoryStatus => "getInventoryStatus",
            Self::GetPremiumUpgradeOptions => "getPremiumUpgradeOptions",
            Self::CalculateRevenueImpact => "calculateRevenueImpact",
            Self::GetSupplierComparison => "getSupplierComparison",
            Self::GenerateDraftEmail => "generateDraftEmail",
            Self::SubmitApproval => "submitApproval",
            Self::CheckTeamAvailability => "checkTeamAvailability",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|operation| operation.as_str().eq_ignore_ascii_case(value))
    }

    /// Simulated round-trip time of the operation.
    pub fn latency(&self) -> Duration {
        let millis = match self {
            Self::QueryAffectedOrders => 1500,
            Self::QueryAlternateSuppliers => 1800,
            Self::GetInventoryStatus => 1200,
            Self::GetPremiumUpgradeOptions => 1600,
            Self::CalculateRevenueImpact => 1400,
            Self::GetSupplierComparison => 1300,
            Self::GenerateDraftEmail => 2000,
            Self::SubmitApproval => 1000,
            Self::CheckTeamAvailability => 800,
        };
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::OperationName;

    #[test]
    fn wire_names_round_trip_through_parse() {
        for operation in OperationName::ALL {
            assert_eq!(OperationName::parse(operation.as_str()), Some(operation));
        }
        assert_eq!(OperationName::parse("dropTables"), None);
    }

    #[test]
    fn serde_uses_wire_names() {
        let value = serde_json::to_value(OperationName::GenerateDraftEmail).expect("serialize");
        assert_eq!(value, "generateDraftEmail");
    }

    #[test]
    fn latencies_follow_operation_table() {
        assert_eq!(OperationName::QueryAlternateSuppliers.latency(), Duration::from_millis(1800));
        assert_eq!(OperationName::CheckTeamAvailability.latency(), Duration::from_millis(800));
    }
}
