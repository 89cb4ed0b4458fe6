//! Outbound artifacts produced by the premium-upgrade branch.
//!
//! Nothing here is transmitted. The report is rendered to HTML with `tera`
//! from an embedded template; emails are returned as compose payloads.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;

use crate::domain::customer::CustomerId;
use crate::domain::email::EmailCompose;
use crate::domain::money::format_money;
use crate::domain::task::TaskAction;
use crate::domain::upgrade::{ConfirmedUpgrade, UpgradeOption};
use crate::fixtures::{FixtureSet, DELAYED_PART};

pub const MITIGATION_REPORT_TEMPLATE: &str = "mitigation_report.html.tera";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const CUSTOMER_NOT_FOUND: &str = "Error: Customer not found";

const SUPPLIER_ORDER_REFERENCE: &str = "SW-2847";
const INCIDENT_SUMMARY: &str = "ProSound PX-500 shipment delayed one week by East Coast snowstorm";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("template error: {0}")]
    Template(String),
    #[error("customer `{0}` is not part of the confirmed upgrade")]
    MissingCustomer(CustomerId),
}

impl From<tera::Error> for DocumentError {
    fn from(error: tera::Error) -> Self {
        Self::Template(error.to_string())
    }
}

/// A rendered file, ready to be written or attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub file_name: String,
    pub content_type: String,
    pub body: String,
}

/// Output a completed task exposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskArtifact {
    OrderUpdate(OrderUpdateSummary),
    Report(Document),
    Email(EmailCompose),
}

impl TaskArtifact {
    pub fn title(&self) -> String {
        match self {
            Self::OrderUpdate(summary) => format!("Sales order {} updated", summary.order_number),
            Self::Report(document) => document.file_name.clone(),
            Self::Email(email) => email.subject.clone(),
        }
    }
}

/// What changed on one customer's sales order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdateSummary {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub order_number: String,
    pub quantity: u32,
    pub from_product: String,
    pub to_product: String,
    pub additional_cost: Decimal,
}

impl OrderUpdateSummary {
    pub fn headline(&self) -> String {
        format!(
            "{} ({}): {} x {} replaced with {}, additional cost {}",
            self.order_number,
            self.customer_name,
            self.quantity,
            self.from_product,
            self.to_product,
            format_money(self.additional_cost)
        )
    }
}

pub fn order_update_summary(
    confirmed: &ConfirmedUpgrade,
    customer_id: &CustomerId,
) -> Option<OrderUpdateSummary> {
    let option = confirmed.customers.iter().find(|option| &option.customer_id == customer_id)?;
    Some(OrderUpdateSummary {
        customer_id: option.customer_id.clone(),
        customer_name: option.customer_name.clone(),
        order_number: option.order_number.clone(),
        quantity: option.quantity,
        from_product: option.current_product.clone(),
        to_product: confirmed.sku.name.clone(),
        additional_cost: option.additional_cost,
    })
}

/// Upgrade notice addressed to every confirmed customer's contact.
pub fn compose_customer_email(confirmed: &ConfirmedUpgrade, fixtures: &FixtureSet) -> EmailCompose {
    let to = confirmed
        .customers
        .iter()
        .filter_map(|option| fixtures.customer(&option.customer_id))
        .map(|customer| customer.contact_email.clone())
        .collect();

    let mut body = String::from("Hello,\n\n");
    body.push_str(&format!(
        "Our supplier has notified us of a one-week delay on the {DELAYED_PART} speakers reserved \
         for your event. To keep your event on schedule we are upgrading your order to the {} \
         at no disruption to your plans.\n\n",
        confirmed.sku.name
    ));
    for option in &confirmed.customers {
        body.push_str(&format!(
            "- {} (order {}): {} units\n",
            option.customer_name, option.order_number, option.quantity
        ));
    }
    body.push_str("\nThe upgraded equipment is in stock and will ship on the original schedule.\n\n");
    body.push_str("Best regards,\nEvents Operations");

    EmailCompose {
        to,
        subject: format!("Equipment upgrade for your upcoming event: {}", confirmed.sku.name),
        body,
    }
}

/// Personalized draft for a single affected customer.
pub fn draft_customer_email(fixtures: &FixtureSet, customer_id: &CustomerId) -> String {
    let Some(customer) = fixtures.customer(customer_id) else {
        return CUSTOMER_NOT_FOUND.to_owned();
    };
    let upgrade = fixtures
        .upgrade_skus
        .first()
        .map(|sku| sku.name.as_str())
        .unwrap_or("our premium model");

    format!(
        "Subject: Important Update on Your Order {number}

Dear {name} Team,

I wanted to reach out personally regarding your order for {quantity} units of {product} (Order #{number}).

Due to a supply chain delay with a critical component, we're offering you an exclusive upgrade to the {upgrade} at a reduced additional cost. This upgraded product:

\u{2713} Is available for immediate shipment
\u{2713} Exceeds the specifications of the original {product}
\u{2713} Comes with extended warranty coverage

We value your partnership and want to ensure zero disruption to your event. I'm available to discuss this upgrade or explore other options that work best for your needs.

Please let me know your preference, and I'll expedite the necessary arrangements.

Best regards,
Your Account Manager",
        number = customer.order_number,
        name = customer.name,
        quantity = customer.quantity,
        product = customer.product,
    )
}

/// Register the filters used by the embedded templates.
///
/// - `money`: `amount | money` renders `$12,500` style amounts
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("money", tera_money_filter);
}

fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::String(text) => Decimal::from_str(text)
            .map_err(|error| tera::Error::msg(format!("money filter: {error}")))?,
        tera::Value::Number(number) => number
            .as_f64()
            .and_then(|float| Decimal::try_from(float).ok())
            .unwrap_or_default(),
        tera::Value::Null => Decimal::ZERO,
        _ => return Err(tera::Error::msg("money filter expects a number or decimal string")),
    };
    Ok(tera::Value::String(format_money(amount)))
}

#[derive(Serialize)]
struct ReportCustomer<'a> {
    name: &'a str,
    order_number: &'a str,
    quantity: u32,
    additional_cost: Decimal,
    eligible: bool,
}

impl<'a> From<&'a UpgradeOption> for ReportCustomer<'a> {
    fn from(option: &'a UpgradeOption) -> Self {
        Self {
            name: &option.customer_name,
            order_number: &option.order_number,
            quantity: option.quantity,
            additional_cost: option.additional_cost,
            eligible: option.eligible,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DocumentRenderer {
    tera: Tera,
}

impl DocumentRenderer {
    pub fn with_embedded_templates() -> Result<Self, DocumentError> {
        let mut tera = Tera::default();
        register_template_filters(&mut tera);
        tera.add_raw_template(
            MITIGATION_REPORT_TEMPLATE,
            include_str!("../../../templates/mitigation_report.html.tera"),
        )?;
        Ok(Self { tera })
    }

    /// Builds the artifact for a completed task from the confirmed selection.
    pub fn artifact_for(
        &self,
        action: &TaskAction,
        confirmed: &ConfirmedUpgrade,
        fixtures: &FixtureSet,
        generated_on: NaiveDate,
    ) -> Result<TaskArtifact, DocumentError> {
        match action {
            TaskAction::UpdateOrder { customer_id, .. } => order_update_summary(confirmed, customer_id)
                .map(TaskArtifact::OrderUpdate)
                .ok_or_else(|| DocumentError::MissingCustomer(customer_id.clone())),
            TaskAction::MitigationReport => self
                .render_mitigation_report(confirmed, fixtures, generated_on)
                .map(TaskArtifact::Report),
            TaskAction::CustomerEmail => {
                Ok(TaskArtifact::Email(compose_customer_email(confirmed, fixtures)))
            }
        }
    }

    pub fn render_mitigation_report(
        &self,
        confirmed: &ConfirmedUpgrade,
        fixtures: &FixtureSet,
        generated_on: NaiveDate,
    ) -> Result<Document, DocumentError> {
        let revenue_protected: Decimal = confirmed
            .customers
            .iter()
            .filter_map(|option| fixtures.customer(&option.customer_id))
            .map(|customer| customer.revenue)
            .sum();
        let additional_cost: Decimal =
            confirmed.customers.iter().map(|option| option.additional_cost).sum();
        let customers: Vec<ReportCustomer<'_>> =
            confirmed.customers.iter().map(ReportCustomer::from).collect();

        let mut context = Context::new();
        context.insert(
            "incident",
            &serde_json::json!({
                "summary": INCIDENT_SUMMARY,
                "order_reference": SUPPLIER_ORDER_REFERENCE,
                "delayed_part": DELAYED_PART,
            }),
        );
        context.insert("generated_on", &generated_on.format("%B %-d, %Y").to_string());
        context.insert("sku", &confirmed.sku);
        context.insert("customers", &customers);
        context.insert(
            "preview",
            &serde_json::json!({
                "eligible_customers": confirmed.preview.eligible_customers,
                "total": confirmed.preview.total,
            }),
        );
        context.insert(
            "totals",
            &serde_json::json!({
                "additional_cost": additional_cost,
                "revenue_protected": revenue_protected,
            }),
        );

        let body = self.tera.render(MITIGATION_REPORT_TEMPLATE, &context)?;
        tracing::debug!(
            event_name = "documents.report.rendered",
            sku = %confirmed.sku.sku,
            customers = confirmed.customers.len(),
            "mitigation report rendered"
        );

        Ok(Document {
            file_name: format!("mitigation-report-{}.html", generated_on.format("%Y%m%d")),
            content_type: HTML_CONTENT_TYPE.to_owned(),
            body,
        })
    }
}
