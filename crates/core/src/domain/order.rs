use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentMethod {
    Delivery,
    Courier,
    Pickup,
}

impl ShipmentMethod {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Delivery => "DELIVERY",
            Self::Courier => "COURIER",
            Self::Pickup => "PICKUP",
        }
    }
}

/// Editable header fields of the sales order screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadata {
    pub shipment_method: ShipmentMethod,
    pub load_in_time: String,
    pub location_code: String,
    pub salesperson_code: String,
    pub requested_delivery_date: NaiveDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    ShipmentMethod,
    LoadInTime,
}

impl OrderField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ShipmentMethod => "Shipment Method Code",
            Self::LoadInTime => "Load-in Time",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Item,
    Service,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderLine {
    pub line_no: u32,
    pub kind: LineKind,
    pub no: String,
    pub description: String,
    pub quantity: u32,
    pub unit_of_measure: String,
    pub unit_price: Decimal,
    pub line_discount_pct: Decimal,
}

impl SalesOrderLine {
    pub fn line_amount(&self) -> Decimal {
        let gross = Decimal::from(self.quantity) * self.unit_price;
        let discount = gross * self.line_discount_pct / Decimal::ONE_HUNDRED;
        round_cents(gross - discount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub number: String,
    pub status: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub address: String,
    pub city: String,
    pub contact: String,
    pub order_date: NaiveDate,
    pub tax_rate_pct: Decimal,
    pub lines: Vec<SalesOrderLine>,
    pub metadata: OrderMetadata,
}

impl SalesOrder {
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(SalesOrderLine::line_amount).sum()
    }

    pub fn tax(&self) -> Decimal {
        round_cents(self.subtotal() * self.tax_rate_pct / Decimal::ONE_HUNDRED)
    }

    pub fn total(&self) -> Decimal {
        self.subtotal() + self.tax()
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
