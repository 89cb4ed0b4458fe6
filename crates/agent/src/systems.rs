//! Simulated back-office systems (order management, supplier network,
//! inventory, collaboration).
//!
//! Calls never fail. Each one waits for its fixed latency and answers from the
//! injected [`FixtureSet`]. Callers bound a call with [`Pacer::guard`] so a
//! reset abandons it.

use std::sync::Arc;

use async_trait::async_trait;
use guidepost_core::documents::draft_customer_email;
use guidepost_core::domain::customer::{AffectedOrder, CustomerId, RevenueImpact};
use guidepost_core::domain::operations::OperationName;
use guidepost_core::domain::supply::{
    ApprovalReceipt, InventoryItem, Supplier, SupplierComparison, TeamAvailability,
};
use guidepost_core::domain::upgrade::UpgradeOption;
use guidepost_core::fixtures::FixtureSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::pacing::{Cancelled, Pacer};

#[async_trait]
pub trait BusinessSystems: Send + Sync {
    async fn query_affected_orders(&self, part_number: &str) -> Vec<AffectedOrder>;
    async fn query_alternate_suppliers(&self, part_number: &str) -> Vec<Supplier>;
    async fn get_inventory_status(&self, sku: Option<&str>) -> Vec<InventoryItem>;
    async fn get_premium_upgrade_options(&self) -> Vec<UpgradeOption>;
    async fn calculate_revenue_impact(&self, customer_ids: &[CustomerId]) -> Vec<RevenueImpact>;
    async fn get_supplier_comparison(&self, part_number: &str) -> Vec<SupplierComparison>;
    async fn generate_draft_email(&self, customer_id: &CustomerId) -> String;
    async fn submit_approval(&self, action: &str, data: &Value) -> ApprovalReceipt;
    async fn check_team_availability(&self, team_member: &str) -> TeamAvailability;
}

#[derive(Clone, Debug)]
pub struct MockBusinessSystems {
    fixtures: Arc<FixtureSet>,
    simulate_latency: bool,
}

impl MockBusinessSystems {
    pub fn new(fixtures: Arc<FixtureSet>) -> Self {
        Self { fixtures, simulate_latency: true }
    }

    pub fn with_latency(mut self, simulate_latency: bool) -> Self {
        self.simulate_latency = simulate_latency;
        self
    }

    async fn delay(&self, operation: OperationName) {
        if self.simulate_latency {
            tokio::time::sleep(operation.latency()).await;
        }
    }
}

#[async_trait]
impl BusinessSystems for MockBusinessSystems {
    async fn query_affected_orders(&self, part_number: &str) -> Vec<AffectedOrder> {
        self.delay(OperationName::QueryAffectedOrders).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::QueryAffectedOrders.as_str(),
            part_number,
            "querying orders affected by part"
        );
        self.fixtures.affected_orders.clone()
    }

    async fn query_alternate_suppliers(&self, part_number: &str) -> Vec<Supplier> {
        self.delay(OperationName::QueryAlternateSuppliers).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::QueryAlternateSuppliers.as_str(),
            part_number,
            "searching supplier network for alternatives"
        );
        self.fixtures.alternate_suppliers.clone()
    }

    async fn get_inventory_status(&self, sku: Option<&str>) -> Vec<InventoryItem> {
        self.delay(OperationName::GetInventoryStatus).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::GetInventoryStatus.as_str(),
            sku = sku.unwrap_or("*"),
            "fetching inventory levels"
        );
        match sku {
            Some(sku) => {
                self.fixtures.inventory.iter().filter(|item| item.sku == sku).cloned().collect()
            }
            None => self.fixtures.inventory.clone(),
        }
    }

    async fn get_premium_upgrade_options(&self) -> Vec<UpgradeOption> {
        self.delay(OperationName::GetPremiumUpgradeOptions).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::GetPremiumUpgradeOptions.as_str(),
            "analyzing premium upgrade eligibility"
        );
        self.fixtures.upgrade_options.clone()
    }

    /// The ids are logged only; every impact record comes back.
    async fn calculate_revenue_impact(&self, customer_ids: &[CustomerId]) -> Vec<RevenueImpact> {
        self.delay(OperationName::CalculateRevenueImpact).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::CalculateRevenueImpact.as_str(),
            customers = customer_ids.len(),
            "calculating revenue impact"
        );
        self.fixtures.revenue_impact.clone()
    }

    async fn get_supplier_comparison(&self, part_number: &str) -> Vec<SupplierComparison> {
        self.delay(OperationName::GetSupplierComparison).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::GetSupplierComparison.as_str(),
            part_number,
            "comparing supplier options"
        );
        self.fixtures.supplier_comparison.clone()
    }

    async fn generate_draft_email(&self, customer_id: &CustomerId) -> String {
        self.delay(OperationName::GenerateDraftEmail).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::GenerateDraftEmail.as_str(),
            customer_id = customer_id.as_str(),
            "generating personalized email"
        );
        draft_customer_email(&self.fixtures, customer_id)
    }

    async fn submit_approval(&self, action: &str, _data: &Value) -> ApprovalReceipt {
        self.delay(OperationName::SubmitApproval).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::SubmitApproval.as_str(),
            action,
            "submitting approval"
        );
        ApprovalReceipt {
            success: true,
            message: format!(
                "Approval submitted successfully. {action} has been queued for processing."
            ),
        }
    }

    async fn check_team_availability(&self, team_member: &str) -> TeamAvailability {
        self.delay(OperationName::CheckTeamAvailability).await;
        info!(
            event_name = "systems.call",
            operation = OperationName::CheckTeamAvailability.as_str(),
            team_member,
            "checking team availability"
        );
        TeamAvailability {
            available: true,
            status: "Available - In a meeting until 3:00 PM".to_owned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("invalid input for `{operation}`: {source}")]
    InvalidInput { operation: &'static str, source: serde_json::Error },
    #[error("could not encode result of `{operation}`: {source}")]
    Encode { operation: &'static str, source: serde_json::Error },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartNumberInput {
    part_number: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryInput {
    #[serde(default)]
    sku: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevenueImpactInput {
    #[serde(default)]
    customer_ids: Vec<CustomerId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftEmailInput {
    customer_id: CustomerId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalInput {
    action: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamMemberInput {
    team_member: String,
}

/// Calls an operation by wire name with JSON arguments.
///
/// `Null` input is treated as `{}` so argument-free operations can be called
/// without a payload.
pub async fn dispatch(
    systems: &dyn BusinessSystems,
    pacer: &Pacer,
    name: &str,
    input: Value,
) -> Result<Value, DispatchError> {
    let operation =
        OperationName::parse(name).ok_or_else(|| DispatchError::UnknownOperation(name.to_owned()))?;
    let input = if input.is_null() { Value::Object(Default::default()) } else { input };

    match operation {
        OperationName::QueryAffectedOrders => {
            let args: PartNumberInput = decode(operation, input)?;
            encode(operation, pacer.guard(systems.query_affected_orders(&args.part_number)).await?)
        }
        OperationName::QueryAlternateSuppliers => {
            let args: PartNumberInput = decode(operation, input)?;
            encode(operation, pacer.guard(systems.query_alternate_suppliers(&args.part_number)).await?)
        }
        OperationName::GetInventoryStatus => {
            let args: InventoryInput = decode(operation, input)?;
            encode(operation, pacer.guard(systems.get_inventory_status(args.sku.as_deref())).await?)
        }
        OperationName::GetPremiumUpgradeOptions => {
            encode(operation, pacer.guard(systems.get_premium_upgrade_options()).await?)
        }
        OperationName::CalculateRevenueImpact => {
            let args: RevenueImpactInput = decode(operation, input)?;
            encode(operation, pacer.guard(systems.calculate_revenue_impact(&args.customer_ids)).await?)
        }
        OperationName::GetSupplierComparison => {
            let args: PartNumberInput = decode(operation, input)?;
            encode(operation, pacer.guard(systems.get_supplier_comparison(&args.part_number)).await?)
        }
        OperationName::GenerateDraftEmail => {
            let args: DraftEmailInput = decode(operation, input)?;
            encode(operation, pacer.guard(systems.generate_draft_email(&args.customer_id)).await?)
        }
        OperationName::SubmitApproval => {
            let args: ApprovalInput = decode(operation, input)?;
            encode(operation, pacer.guard(systems.submit_approval(&args.action, &args.data)).await?)
        }
        OperationName::CheckTeamAvailability => {
            let args: TeamMemberInput = decode(operation, input)?;
            encode(operation, pacer.guard(systems.check_team_availability(&args.team_member)).await?)
        }
    }
}

fn decode<T: DeserializeOwned>(operation: OperationName, input: Value) -> Result<T, DispatchError> {
    serde_json::from_value(input)
        .map_err(|source| DispatchError::InvalidInput { operation: operation.as_str(), source })
}

fn encode<T: Serialize>(operation: OperationName, output: T) -> Result<Value, DispatchError> {
    serde_json::to_value(output)
        .map_err(|source| DispatchError::Encode { operation: operation.as_str(), source })
}
