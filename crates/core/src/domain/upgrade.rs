use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::errors::DomainError;
use crate::flows::{FlowTransitionError, PlayerState};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSku {
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub in_stock: u32,
}

/// Per-customer premium replacement offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeOption {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub order_number: String,
    pub quantity: u32,
    pub current_product: String,
    pub upgrade_product: String,
    pub additional_cost: Decimal,
    pub benefits: String,
    pub eligible: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradePreview {
    pub sku: String,
    pub eligible_customers: usize,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedUpgrade {
    pub sku: UpgradeSku,
    pub customers: Vec<UpgradeOption>,
    pub preview: UpgradePreview,
}

/// Selection state of the premium-upgrade branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeConfigurator {
    skus: Vec<UpgradeSku>,
    options: Vec<UpgradeOption>,
    selected_sku: String,
    selected_customers: BTreeSet<CustomerId>,
}

impl UpgradeConfigurator {
    pub fn new(skus: Vec<UpgradeSku>, options: Vec<UpgradeOption>) -> Result<Self, DomainError> {
        let selected_sku = skus
            .first()
            .map(|sku| sku.sku.clone())
            .ok_or_else(|| DomainError::InvariantViolation("no upgrade SKU configured".to_owned()))?;
        Ok(Self { skus, options, selected_sku, selected_customers: BTreeSet::new() })
    }

    pub fn skus(&self) -> &[UpgradeSku] {
        &self.skus
    }

    pub fn options(&self) -> &[UpgradeOption] {
        &self.options
    }

    pub fn selected_sku(&self) -> &str {
        &self.selected_sku
    }

    pub fn selected_customers(&self) -> impl Iterator<Item = &CustomerId> {
        self.selected_customers.iter()
    }

    pub fn select_sku(&mut self, sku: &str) -> Result<(), DomainError> {
        if !self.skus.iter().any(|candidate| candidate.sku == sku) {
            return Err(DomainError::UnknownId { kind: "upgrade sku", id: sku.to_owned() });
        }
        sku.clone_into(&mut self.selected_sku);
        Ok(())
    }

    /// Returns whether the customer is selected after the toggle.
    pub fn toggle_customer(&mut self, customer_id: &CustomerId) -> Result<bool, DomainError> {
        self.ensure_selectable(customer_id)?;
        if self.selected_customers.remove(customer_id) {
            Ok(false)
        } else {
            self.selected_customers.insert(customer_id.clone());
            Ok(true)
        }
    }

    pub fn set_customers<'a, I>(&mut self, customer_ids: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = &'a CustomerId>,
    {
        let mut next = BTreeSet::new();
        for customer_id in customer_ids {
            self.ensure_selectable(customer_id)?;
            next.insert(customer_id.clone());
        }
        self.selected_customers = next;
        Ok(())
    }

    pub fn can_confirm(&self) -> bool {
        !self.selected_customers.is_empty()
    }

    pub fn preview(&self) -> UpgradePreview {
        let unit_price = self.current_sku().map(|sku| sku.unit_price).unwrap_or_default();
        let eligible_customers = self.eligible_selection().count();
        UpgradePreview {
            sku: self.selected_sku.clone(),
            eligible_customers,
            unit_price,
            total: unit_price * Decimal::from(eligible_customers),
        }
    }

    pub fn confirm(&self) -> Result<ConfirmedUpgrade, DomainError> {
        if !self.can_confirm() {
            return Err(FlowTransitionError::EmptySelection {
                state: PlayerState::BranchConfiguring,
            }
            .into());
        }
        let sku = self.current_sku().cloned().ok_or_else(|| DomainError::UnknownId {
            kind: "upgrade sku",
            id: self.selected_sku.clone(),
        })?;

        Ok(ConfirmedUpgrade {
            sku,
            customers: self
                .options
                .iter()
                .filter(|option| self.selected_customers.contains(&option.customer_id))
                .cloned()
                .collect(),
            preview: self.preview(),
        })
    }

    fn current_sku(&self) -> Option<&UpgradeSku> {
        self.skus.iter().find(|sku| sku.sku == self.selected_sku)
    }

    fn eligible_selection(&self) -> impl Iterator<Item = &UpgradeOption> {
        self.options
            .iter()
            .filter(|option| option.eligible && self.selected_customers.contains(&option.customer_id))
    }

    /// Only customers with an eligible offer can be selected.
    fn ensure_selectable(&self, customer_id: &CustomerId) -> Result<(), DomainError> {
        match self.options.iter().find(|option| &option.customer_id == customer_id) {
            Some(option) if option.eligible => Ok(()),
            Some(_) => Err(DomainError::InvariantViolation(format!(
                "customer `{customer_id}` has no eligible upgrade offer"
            ))),
            None => Err(DomainError::UnknownId { kind: "customer", id: customer_id.to_string() }),
        }
    }
}
