//! Static knowledge base for the supplier-delay scenario.
//!
//! Everything the demo "looks up" comes from a [`FixtureSet`]. Shells and the
//! player receive it as `Arc<FixtureSet>` so tests can hand in their own data.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::customer::{AffectedOrder, CustomerId, Priority, RevenueImpact, RiskStatus};
use crate::domain::email::{Email, EmailId, Importance};
use crate::domain::order::{
    LineKind, OrderMetadata, SalesOrder, SalesOrderLine, ShipmentMethod,
};
use crate::domain::suggestion::{Suggestion, SuggestionId};
use crate::domain::supply::{InventoryItem, StockStatus, Supplier, SupplierComparison};
use crate::domain::upgrade::{ConfirmedUpgrade, UpgradeConfigurator, UpgradeOption, UpgradeSku};
use crate::errors::DomainError;

pub const SUPPLIER_EMAIL_ID: &str = "email-001";
pub const DELAYED_PART: &str = "PX-500";

#[derive(Clone, Debug, PartialEq)]
pub struct FixtureSet {
    pub emails: Vec<Email>,
    pub affected_orders: Vec<AffectedOrder>,
    pub alternate_suppliers: Vec<Supplier>,
    pub inventory: Vec<InventoryItem>,
    pub upgrade_skus: Vec<UpgradeSku>,
    pub upgrade_options: Vec<UpgradeOption>,
    pub suggestions: Vec<Suggestion>,
    pub revenue_impact: Vec<RevenueImpact>,
    pub supplier_comparison: Vec<SupplierComparison>,
    pub sales_order: SalesOrder,
}

impl FixtureSet {
    pub fn demo() -> Self {
        Self {
            emails: demo_emails(),
            affected_orders: demo_affected_orders(),
            alternate_suppliers: demo_suppliers(),
            inventory: demo_inventory(),
            upgrade_skus: vec![
                UpgradeSku {
                    sku: "PX-800".to_owned(),
                    name: "ProSound PX-800 Premium Speakers".to_owned(),
                    unit_price: Decimal::new(2_850, 0),
                    in_stock: 65,
                },
                UpgradeSku {
                    sku: "PX-1000".to_owned(),
                    name: "ProSound PX-1000 Line Array".to_owned(),
                    unit_price: Decimal::new(3_400, 0),
                    in_stock: 20,
                },
            ],
            upgrade_options: demo_upgrade_options(),
            suggestions: demo_suggestions(),
            revenue_impact: vec![
                impact("CUST-001", "TechCon Summit", 125_000, RiskStatus::AtRisk),
                impact("CUST-002", "Music Festival", 62_500, RiskStatus::AtRisk),
                impact("CUST-003", "Awards Gala", 37_500, RiskStatus::LowRisk),
            ],
            supplier_comparison: vec![
                comparison("AudioPro Express", 3, 2_750, 98),
                comparison("West Coast Sound", 4, 2_600, 95),
                comparison("QuickShip Audio", 5, 2_450, 92),
                comparison("SoundWave Pro", 7, 2_400, 85),
            ],
            sales_order: demo_sales_order(),
        }
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), DomainError> {
        for suggestion in &self.suggestions {
            suggestion.validate()?;
        }
        if self.upgrade_skus.is_empty() {
            return Err(DomainError::InvariantViolation("fixture set has no upgrade SKU".to_owned()));
        }
        if self.supplier_email().is_none() {
            return Err(DomainError::InvariantViolation(format!(
                "fixture set is missing supplier email `{SUPPLIER_EMAIL_ID}`"
            )));
        }
        for option in &self.upgrade_options {
            if self.customer(&option.customer_id).is_none() {
                return Err(DomainError::UnknownId {
                    kind: "customer",
                    id: option.customer_id.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn supplier_email(&self) -> Option<&Email> {
        self.email(SUPPLIER_EMAIL_ID)
    }

    pub fn email(&self, id: &str) -> Option<&Email> {
        self.emails.iter().find(|email| email.id.as_str() == id)
    }

    pub fn customer(&self, id: &CustomerId) -> Option<&AffectedOrder> {
        self.affected_orders.iter().find(|order| &order.id == id)
    }

    pub fn suggestion(&self, id: &SuggestionId) -> Option<&Suggestion> {
        self.suggestions.iter().find(|suggestion| &suggestion.id == id)
    }

    pub fn total_revenue_at_risk(&self) -> Decimal {
        self.affected_orders.iter().map(|order| order.revenue).sum()
    }

    pub fn configurator(&self) -> Result<UpgradeConfigurator, DomainError> {
        UpgradeConfigurator::new(self.upgrade_skus.clone(), self.upgrade_options.clone())
    }

    /// Confirms the default SKU for the given customers.
    pub fn confirmed_upgrade_for(&self, customer_ids: &[&str]) -> Result<ConfirmedUpgrade, DomainError> {
        let ids: Vec<CustomerId> = customer_ids.iter().map(|id| CustomerId::new(*id)).collect();
        let mut configurator = self.configurator()?;
        configurator.set_customers(&ids)?;
        configurator.confirm()
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn timestamp(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).map(|value| value.with_timezone(&Utc)).unwrap_or_default()
}

const SUPPLIER_EMAIL_BODY: &str = "Dear Events Team,

We regret to inform you that due to a severe snowstorm impacting the East Coast, there will be a 1-week delay in delivering the portable speaker systems for Order #SW-2847.

Affected Equipment: ProSound PX-500 Portable Speaker Systems
Original Delivery Date: February 10, 2026
Revised Delivery Date: February 17, 2026

The snowstorm has caused significant disruptions to our distribution network, and our warehouse facility in New Jersey has been temporarily closed due to unsafe road conditions.

We understand this may impact your upcoming event schedule and are committed to working with you to find alternative solutions.

Please contact us immediately if you need to discuss expedited shipping options or alternative arrangements.

Best regards,
SoundWave Pro Audio";

type EmailRow = (&'static str, &'static str, &'static str, &'static str, &'static str, Importance);

const INBOX: [EmailRow; 19] = [
    ("email-002", "sarah.chen@contoso.com", "RE: Q1 Sales Meeting - Agenda Items",
        "Thanks for the agenda. I'd like to add a discussion point about the new CRM integration timeline.",
        "2026-02-04T08:15:00Z", Importance::Medium),
    ("email-003", "notifications@dynamics.com", "Daily Inventory Report - February 4, 2026",
        "Your daily inventory summary is ready. Low stock items: 3. Out of stock items: 1.",
        "2026-02-04T07:00:00Z", Importance::Low),
    ("email-004", "john.martinez@fabrikam.com", "Order Confirmation - ORD-8834",
        "Thank you for your order ORD-8834. Expected delivery: February 25, 2026.",
        "2026-02-03T16:45:00Z", Importance::Medium),
    ("email-005", "hr@company.com", "Reminder: Annual Training Compliance Due Feb 15",
        "Your annual compliance training is due by February 15, 2026.",
        "2026-02-03T14:30:00Z", Importance::Low),
    ("email-006", "lisa.wong@northwindtraders.com", "Partnership Opportunity - Q2 2026",
        "I wanted to reach out about a potential partnership opportunity for Q2.",
        "2026-02-03T11:20:00Z", Importance::Medium),
    ("email-007", "noreply@office365.com", "Your weekly digest - 7 updates",
        "Here's what happened in your organization this week: 3 new documents, 2 meetings, 5 tasks.",
        "2026-02-03T09:00:00Z", Importance::Low),
    ("email-008", "michael.brown@adventureworks.com", "Budget Approval Request - Marketing Campaign Q1",
        "I'm requesting approval for the Q1 marketing campaign budget of $45,000.",
        "2026-02-02T15:30:00Z", Importance::High),
    ("email-009", "emily.johnson@tailspintoys.com", "Thank you for the demo!",
        "Thank you for the excellent product demonstration yesterday.",
        "2026-02-02T13:20:00Z", Importance::Medium),
    ("email-010", "finance@company.com", "Expense Report Submitted - Awaiting Approval",
        "Your expense report for January 2026 has been submitted. Total amount: $1,247.85.",
        "2026-02-02T10:45:00Z", Importance::Low),
    ("email-011", "david.kim@wideworldimporters.com", "RE: Contract Renewal Discussion",
        "We're ready to move forward with the 3-year renewal option.",
        "2026-02-01T16:00:00Z", Importance::High),
    ("email-012", "noreply@teams.microsoft.com", "You have been added to \"Project Phoenix\" team",
        "You've been added to the Project Phoenix team in Microsoft Teams.",
        "2026-02-01T14:15:00Z", Importance::Low),
    ("email-013", "rachel.green@proseware.com", "Product Demo Scheduled - February 10th",
        "This is to confirm our product demonstration on February 10, 2026 at 2:00 PM (EST).",
        "2026-02-01T11:30:00Z", Importance::Medium),
    ("email-014", "it-helpdesk@company.com", "System Maintenance - This Sunday",
        "Scheduled system maintenance this Sunday, February 8th from 2:00 AM to 6:00 AM EST.",
        "2026-01-31T17:00:00Z", Importance::Medium),
    ("email-015", "jennifer.lopez@lucernepublishing.com", "Invoice #INV-2026-0234",
        "Please find attached invoice #INV-2026-0234. Amount due: $12,500.00.",
        "2026-01-31T14:20:00Z", Importance::Medium),
    ("email-016", "newsletter@techinsights.com", "Tech Insights Weekly - AI Trends & Cloud Computing",
        "This week in technology: AI integration, cloud cost optimization, cybersecurity.",
        "2026-01-31T09:00:00Z", Importance::Low),
    ("email-017", "alex.morgan@blueyonderairlines.com", "Travel Itinerary - Chicago Trip",
        "Your travel arrangements have been confirmed: flight BY-1523 on February 15, 2026.",
        "2026-01-30T16:30:00Z", Importance::Medium),
    ("email-018", "robert.williams@wingtiptoys.com", "Quarterly Business Review - Action Items",
        "Thank you for a productive QBR session yesterday. Here are the key action items.",
        "2026-01-30T13:45:00Z", Importance::High),
    ("email-019", "amanda.clark@fourthcoffee.com", "Catering for Office Event - February 20",
        "Thank you for choosing Fourth Coffee for your office event catering!",
        "2026-01-30T10:15:00Z", Importance::Low),
    ("email-020", "security@company.com", "Security Alert: Password Expiration",
        "Your password will expire in 7 days.",
        "2026-01-29T16:00:00Z", Importance::Medium),
];

fn demo_emails() -> Vec<Email> {
    let supplier = Email {
        id: EmailId::new(SUPPLIER_EMAIL_ID),
        from: "orders@soundwavepro.com".to_owned(),
        subject: "URGENT: Delivery Delay - Order #SW-2847".to_owned(),
        body: SUPPLIER_EMAIL_BODY.to_owned(),
        date: timestamp("2026-02-04T09:30:00Z"),
        importance: Importance::High,
        read: false,
    };

    std::iter::once(supplier)
        .chain(INBOX.iter().map(|(id, from, subject, body, date, importance)| Email {
            id: EmailId::new(*id),
            from: (*from).to_owned(),
            subject: (*subject).to_owned(),
            body: (*body).to_owned(),
            date: timestamp(date),
            importance: *importance,
            read: true,
        }))
        .collect()
}

fn demo_affected_orders() -> Vec<AffectedOrder> {
    let order = |id: &str, name: &str, email: &str, number: &str, quantity: u32, due: NaiveDate, revenue: i64, priority| {
        AffectedOrder {
            id: CustomerId::new(id),
            name: name.to_owned(),
            contact_email: email.to_owned(),
            order_number: number.to_owned(),
            product: "ProSound PX-500 Speakers".to_owned(),
            quantity,
            due_date: due,
            revenue: Decimal::new(revenue, 0),
            priority,
        }
    };

    vec![
        order("CUST-001", "TechCon 2026 Summit", "sarah.mitchell@techcon2026.com", "EVT-2201", 50, date(2026, 2, 15), 125_000, Priority::High),
        order("CUST-002", "City Music Festival", "bookings@citymusicfest.org", "EVT-2215", 30, date(2026, 2, 18), 62_500, Priority::Medium),
        order("CUST-003", "Corporate Awards Gala", "events@corporateawards.com", "EVT-2228", 20, date(2026, 2, 22), 37_500, Priority::Low),
    ]
}

fn demo_suppliers() -> Vec<Supplier> {
    let supplier = |id: &str, name: &str, lead_time_days, price: i64, reliability_pct, certified| Supplier {
        id: id.to_owned(),
        name: name.to_owned(),
        lead_time_days,
        price_per_unit: Decimal::new(price, 0),
        reliability_pct,
        certified,
    };

    vec![
        supplier("SUP-101", "AudioPro Express", 3, 2_750, 98, true),
        supplier("SUP-102", "West Coast Sound Systems", 4, 2_600, 95, true),
        supplier("SUP-103", "QuickShip Audio Rentals", 5, 2_450, 92, false),
    ]
}

fn demo_inventory() -> Vec<InventoryItem> {
    let item = |id: &str, sku: &str, name: &str, current_stock, reorder_point, status| InventoryItem {
        id: id.to_owned(),
        sku: sku.to_owned(),
        name: name.to_owned(),
        current_stock,
        reorder_point,
        status,
    };

    vec![
        item("INV-001", "PX-500", "ProSound PX-500 Speakers", 15, 50, StockStatus::Low),
        item("INV-002", "PX-800", "ProSound PX-800 Premium Speakers", 65, 30, StockStatus::InStock),
        item("INV-003", "PX-500-RENTAL", "ProSound PX-500 (Rental Stock)", 0, 100, StockStatus::OutOfStock),
    ]
}

fn demo_upgrade_options() -> Vec<UpgradeOption> {
    let option = |id: &str, name: &str, number: &str, quantity, cost: i64, eligible| UpgradeOption {
        customer_id: CustomerId::new(id),
        customer_name: name.to_owned(),
        order_number: number.to_owned(),
        quantity,
        current_product: "ProSound PX-500 Speakers".to_owned(),
        upgrade_product: "ProSound PX-800 Premium Speakers".to_owned(),
        additional_cost: Decimal::new(cost, 0),
        benefits: "Immediate availability, superior sound quality".to_owned(),
        eligible,
    };

    vec![
        option("CUST-001", "TechCon 2026 Summit", "EVT-2201", 50, 18_000, true),
        option("CUST-002", "City Music Festival", "EVT-2215", 30, 11_000, true),
        option("CUST-003", "Corporate Awards Gala", "EVT-2228", 20, 0, false),
    ]
}

fn demo_suggestions() -> Vec<Suggestion> {
    let suggestion = |id: &str, title: &str, description: &str, confidence| {
        let id = SuggestionId::new(id);
        let icon = crate::domain::analysis::IconRef::for_suggestion_id(id.as_str());
        Suggestion {
            id,
            title: title.to_owned(),
            description: description.to_owned(),
            confidence,
            icon,
        }
    };

    vec![
        suggestion(
            "sug-001",
            "Find alternate suppliers",
            "Search for audio equipment suppliers with faster delivery for PX-500 speakers",
            0.92,
        ),
        suggestion(
            "sug-002",
            "Identify affected events",
            "Analyze event bookings impacted by the 1-week speaker delay",
            0.95,
        ),
        suggestion(
            "sug-003",
            "Premium speaker upgrade",
            "Offer clients upgrade to PX-800 Premium speakers with immediate availability",
            0.87,
        ),
        suggestion(
            "sug-004",
            "Client notifications",
            "Draft personalized delay notices for affected event clients",
            0.90,
        ),
    ]
}

fn impact(id: &str, customer: &str, revenue: i64, status: RiskStatus) -> RevenueImpact {
    RevenueImpact {
        customer_id: CustomerId::new(id),
        customer: customer.to_owned(),
        revenue: Decimal::new(revenue, 0),
        status,
    }
}

fn comparison(supplier: &str, lead_time_days: u32, price: i64, reliability_pct: u8) -> SupplierComparison {
    SupplierComparison {
        supplier: supplier.to_owned(),
        lead_time_days,
        price: Decimal::new(price, 0),
        reliability_pct,
    }
}

fn demo_sales_order() -> SalesOrder {
    let line = |line_no, kind, no: &str, description: &str, quantity, unit_price: i64, discount: i64| {
        SalesOrderLine {
            line_no,
            kind,
            no: no.to_owned(),
            description: description.to_owned(),
            quantity,
            unit_of_measure: "EA".to_owned(),
            unit_price: Decimal::new(unit_price, 0),
            line_discount_pct: Decimal::new(discount, 0),
        }
    };

    SalesOrder {
        number: "EVT-2201".to_owned(),
        status: "Open".to_owned(),
        customer_id: CustomerId::new("CUST-001"),
        customer_name: "TechCon 2026 Summit".to_owned(),
        address: "1500 Convention Center Drive".to_owned(),
        city: "San Francisco, CA 94102".to_owned(),
        contact: "Sarah Mitchell".to_owned(),
        order_date: date(2026, 2, 1),
        tax_rate_pct: Decimal::new(875, 2),
        lines: vec![
            line(10000, LineKind::Item, "PX-500", "ProSound PX-500 Portable Speaker System", 50, 2_500, 0),
            line(20000, LineKind::Item, "PROJ-4K-01", "Professional 4K Laser Projector - 8000 Lumens", 3, 4_500, 5),
            line(30000, LineKind::Item, "SCRN-120", "120\" Motorized Projection Screen", 3, 1_200, 0),
            line(40000, LineKind::Item, "MIC-WRLSS-12", "Wireless Lavalier Microphone System (12-pack)", 2, 3_200, 0),
            line(50000, LineKind::Item, "MIC-HANDHELD", "Professional Handheld Wireless Microphone", 8, 450, 10),
            line(60000, LineKind::Item, "MIXER-32CH", "Digital Audio Mixer - 32 Channel", 1, 5_800, 0),
            line(70000, LineKind::Item, "LIGHTING-PKG", "Stage Lighting Package - Premium", 1, 8_500, 0),
            line(80000, LineKind::Service, "SETUP-FULL", "Full Event Setup and Technical Support (3 days)", 1, 9_500, 0),
        ],
        metadata: OrderMetadata {
            shipment_method: ShipmentMethod::Delivery,
            load_in_time: "9:00 AM".to_owned(),
            location_code: "WAREHOUSE-01".to_owned(),
            salesperson_code: "JD - James Davis".to_owned(),
            requested_delivery_date: date(2026, 2, 15),
        },
    }
}
