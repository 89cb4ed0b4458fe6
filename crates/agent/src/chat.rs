//! Scripted copilot chat.
//!
//! The conversation is a fixed tree keyed on action ids. Each click is only
//! honoured if the id belongs to the latest action row and the current step
//! knows it; anything else is ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use guidepost_core::domain::content::{
    row, Action, ActionData, ChartData, ChartKind, Column, DynamicContent, FormData, FormField,
    SelectOption, TableData,
};
use guidepost_core::domain::customer::{CustomerId, RiskStatus};
use guidepost_core::domain::message::{Message, Role};
use guidepost_core::domain::money::format_money;
use guidepost_core::fixtures::{FixtureSet, DELAYED_PART};
use guidepost_core::render::{ActionRow, FormError, FormRecord, FormSession};
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::pacing::{Cancelled, Pacer, PacingProfile};
use crate::systems::BusinessSystems;
use crate::transcript::Transcript;

pub const CHAT_ANALYZING_NOTICE: &str = "Copilot is analyzing the situation...";
pub const SCRIPTED_REPLY: &str = "I understand your question. In this demo, I'm following a scripted \
conversation flow. Please use the action buttons to explore the different scenarios I can help with!";

pub const ACTION_FIND_SUPPLIERS: &str = "find-suppliers";
pub const ACTION_UPGRADE_PREMIUM: &str = "upgrade-premium";
pub const ACTION_NOTIFY_CUSTOMERS: &str = "notify-customers";
pub const ACTION_SELECT_SUPPLIER: &str = "select-supplier";
pub const ACTION_SEND_EMAIL: &str = "send-email";
pub const ACTION_EDIT_EMAIL: &str = "edit-email";
pub const APPROVE_PREFIX: &str = "approve-";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatStep {
    NotStarted,
    Overview,
    Suppliers,
    UpgradeOffer,
    EmailDraft,
    EmailEditing,
    Sent,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("there is no open form to submit")]
    NoOpenForm,
}

struct ChatInner {
    step: ChatStep,
    open_form: Option<FormData>,
}

pub struct CopilotChat {
    fixtures: Arc<FixtureSet>,
    systems: Arc<dyn BusinessSystems>,
    pacing: PacingProfile,
    pacer: Mutex<Pacer>,
    inner: Mutex<ChatInner>,
    transcript: Transcript,
    thinking: watch::Sender<bool>,
}

impl CopilotChat {
    pub fn new(
        fixtures: Arc<FixtureSet>,
        systems: Arc<dyn BusinessSystems>,
        pacing: PacingProfile,
    ) -> Self {
        let (thinking, _) = watch::channel(false);
        Self {
            fixtures,
            systems,
            pacing,
            pacer: Mutex::new(Pacer::new()),
            inner: Mutex::new(ChatInner { step: ChatStep::NotStarted, open_form: None }),
            transcript: Transcript::new(),
            thinking,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> Vec<Message> {
        self.transcript.messages()
    }

    pub fn step(&self) -> ChatStep {
        self.lock().step
    }

    pub fn subscribe_thinking(&self) -> watch::Receiver<bool> {
        self.thinking.subscribe()
    }

    pub fn is_thinking(&self) -> bool {
        *self.thinking.borrow()
    }

    /// Opening analysis: affected customers, revenue at risk, first actions.
    pub async fn open(&self) -> Result<(), ChatError> {
        let pacer = self.current_pacer();
        self.post(&pacer, Message::system(CHAT_ANALYZING_NOTICE)).await?;
        pacer.pause(self.pacing.opening).await?;

        let orders = pacer.guard(self.systems.query_affected_orders(DELAYED_PART)).await?;
        self.say_streamed(
            &pacer,
            "I've analyzed the supplier delay email for Order #SW-2847. The 1-week delay affects the \
             ProSound PX-500 speakers booked for your upcoming events.\n\nHere are the customers with \
             orders that will be impacted:",
        )
        .await?;

        let at_risk: Vec<String> = self
            .fixtures
            .revenue_impact
            .iter()
            .filter(|impact| impact.status == RiskStatus::AtRisk)
            .map(|impact| impact.customer_id.to_string())
            .collect();
        let rows = orders
            .iter()
            .map(|order| {
                row(json!({
                    "id": order.id.as_str(),
                    "name": order.name,
                    "orderNumber": order.order_number,
                    "quantity": order.quantity,
                    "dueDate": order.due_date.format("%b %-d, %Y").to_string(),
                    "revenue": format_money(order.revenue),
                    "priority": order.priority.as_str(),
                }))
            })
            .collect();
        let table = TableData::new(
            vec![
                Column::new("name", "Customer").width(200),
                Column::new("orderNumber", "Order #").width(120),
                Column::new("quantity", "Quantity").width(100),
                Column::new("dueDate", "Due Date").width(120),
                Column::new("revenue", "Revenue").width(120),
                Column::new("priority", "Priority").width(100),
            ],
            rows,
        )
        .highlight(at_risk);
        self.post_content(&pacer, DynamicContent::Table(table)).await?;

        let chart = ChartData {
            kind: ChartKind::Bar,
            title: "Revenue at Risk by Customer".to_owned(),
            data: self
                .fixtures
                .revenue_impact
                .iter()
                .map(|impact| row(json!({ "customer": impact.customer, "revenue": impact.revenue })))
                .collect(),
            x_axis_key: Some("customer".to_owned()),
            y_axis_key: Some("revenue".to_owned()),
        };
        self.post_content(&pacer, DynamicContent::Chart(chart)).await?;

        let total = orders.iter().map(|order| order.revenue).sum();
        self.say_streamed(
            &pacer,
            &format!(
                "Total revenue at risk: {} across {} customer orders.\n\nWhat would you like to do? I can help you:",
                format_money(total),
                orders.len()
            ),
        )
        .await?;
        self.post_actions(
            &pacer,
            vec![
                Action::primary(ACTION_FIND_SUPPLIERS, "Find Alternate Suppliers"),
                Action::secondary(ACTION_UPGRADE_PREMIUM, "Explore Premium Upgrade"),
                Action::outline(ACTION_NOTIFY_CUSTOMERS, "Draft Customer Notifications"),
            ],
        )
        .await?;

        self.set_step(ChatStep::Overview);
        Ok(())
    }

    /// Returns whether the click advanced the conversation.
    pub async fn click(&self, action_id: &str) -> Result<bool, ChatError> {
        let Some(action_id) = self.latest_action(action_id) else {
            debug!(event_name = "chat.action.ignored", action_id, "action is not on the latest row");
            return Ok(false);
        };
        let pacer = self.current_pacer();
        let step = self.step();
        info!(event_name = "chat.action", action_id = %action_id, step = ?step, "chat action clicked");

        match (step, action_id.as_str()) {
            (ChatStep::Overview, ACTION_FIND_SUPPLIERS) => self.show_suppliers(&pacer).await?,
            (ChatStep::Overview, ACTION_UPGRADE_PREMIUM)
            | (ChatStep::Suppliers, ACTION_UPGRADE_PREMIUM | ACTION_SELECT_SUPPLIER) => {
                self.offer_upgrade(&pacer).await?
            }
            (ChatStep::Overview, ACTION_NOTIFY_CUSTOMERS) => self.draft_notifications(&pacer).await?,
            (ChatStep::UpgradeOffer, id) if id.starts_with(APPROVE_PREFIX) => {
                let customer_id = CustomerId::new(&id[APPROVE_PREFIX.len()..]);
                self.approve(&pacer, &customer_id).await?
            }
            (ChatStep::EmailDraft, ACTION_SEND_EMAIL) => self.send_email(&pacer).await?,
            (ChatStep::EmailDraft, ACTION_EDIT_EMAIL) => self.open_edit_form(&pacer).await?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Free text gets the same scripted answer after a thinking pause.
    pub async fn say(&self, text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let pacer = self.current_pacer();
        self.post(&pacer, Message::user(text)).await?;
        self.think(&pacer, pacer.pause(self.pacing.think)).await??;
        self.say_streamed(&pacer, SCRIPTED_REPLY).await
    }

    /// Submits the open email-edit form.
    pub async fn submit_form(&self, values: &[(&str, &str)]) -> Result<FormRecord, ChatError> {
        let form = self.lock().open_form.clone().ok_or(ChatError::NoOpenForm)?;
        let mut session = FormSession::new(&form);
        for (field, value) in values {
            session.set(field, *value)?;
        }
        let record = session.submit()?;

        let pacer = self.current_pacer();
        {
            let mut inner = self.lock();
            pacer.checkpoint()?;
            inner.open_form = None;
            inner.step = ChatStep::EmailDraft;
        }
        let tone = record.get("tone").map(String::as_str).unwrap_or("friendly");
        self.post(&pacer, Message::user(format!("Update the draft: {}", summarize_record(&record))))
            .await?;
        self.say_streamed(
            &pacer,
            &format!("Done. I've rewritten the draft with a {tone} tone. Ready to send when you are."),
        )
        .await?;
        self.post_actions(&pacer, vec![Action::primary(ACTION_SEND_EMAIL, "Send Email")]).await?;
        Ok(record)
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        let mut pacer = self.pacer.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *pacer).cancel();
        inner.step = ChatStep::NotStarted;
        inner.open_form = None;
        drop(pacer);
        drop(inner);
        self.transcript.clear();
        self.thinking.send_replace(false);
        info!(event_name = "chat.reset", "chat reset");
    }

    async fn show_suppliers(&self, pacer: &Pacer) -> Result<(), ChatError> {
        self.post(pacer, Message::user(format!("Find alternate suppliers for {DELAYED_PART}")))
            .await?;
        let suppliers =
            self.think(pacer, self.systems.query_alternate_suppliers(DELAYED_PART)).await?;
        self.say_streamed(
            pacer,
            &format!(
                "I've searched our supplier network and found {} alternate suppliers who can provide \
                 {DELAYED_PART} speakers with faster lead times:",
                suppliers.len()
            ),
        )
        .await?;

        let rows = suppliers
            .iter()
            .map(|supplier| {
                row(json!({
                    "id": supplier.id,
                    "name": supplier.name,
                    "leadTime": format!("{} days", supplier.lead_time_days),
                    "pricePerUnit": format_money(supplier.price_per_unit),
                    "reliability": format!("{}%", supplier.reliability_pct),
                    "certified": if supplier.certified { "\u{2713} Yes" } else { "\u{2717} No" },
                }))
            })
            .collect();
        let table = TableData::new(
            vec![
                Column::new("name", "Supplier").width(200),
                Column::new("leadTime", "Lead Time").width(120),
                Column::new("pricePerUnit", "Price/Unit").width(120),
                Column::new("reliability", "Reliability").width(120),
                Column::new("certified", "Certified").width(100),
            ],
            rows,
        );
        self.post_content(pacer, DynamicContent::Table(table)).await?;

        let comparison = pacer.guard(self.systems.get_supplier_comparison(DELAYED_PART)).await?;
        let chart = ChartData {
            kind: ChartKind::Bar,
            title: "Supplier Lead Time Comparison (days)".to_owned(),
            data: comparison
                .iter()
                .map(|entry| row(json!({ "supplier": entry.supplier, "leadTime": entry.lead_time_days })))
                .collect(),
            x_axis_key: Some("supplier".to_owned()),
            y_axis_key: Some("leadTime".to_owned()),
        };
        self.post_content(pacer, DynamicContent::Chart(chart)).await?;

        let fastest = suppliers.iter().min_by_key(|supplier| supplier.lead_time_days);
        let recommendation = match fastest {
            Some(supplier) => format!(
                "{} offers the fastest delivery ({} days) with {}% reliability. Would you like to proceed \
                 with them, or explore other options?",
                supplier.name, supplier.lead_time_days, supplier.reliability_pct
            ),
            None => "No alternate supplier can beat the current delivery date.".to_owned(),
        };
        self.say_streamed(pacer, &recommendation).await?;

        let mut actions = Vec::new();
        if let Some(supplier) = fastest {
            actions.push(Action::primary(ACTION_SELECT_SUPPLIER, format!("Select {}", supplier.name)));
        }
        actions.push(Action::secondary(ACTION_UPGRADE_PREMIUM, "Explore Premium Upgrade Instead"));
        self.post_actions(pacer, actions).await?;

        self.set_step(ChatStep::Suppliers);
        Ok(())
    }

    async fn offer_upgrade(&self, pacer: &Pacer) -> Result<(), ChatError> {
        self.post(pacer, Message::user("What about upgrading customers to the premium product?"))
            .await?;
        let options = self.think(pacer, self.systems.get_premium_upgrade_options()).await?;
        let upgrade = options
            .first()
            .map(|option| option.upgrade_product.clone())
            .unwrap_or_else(|| "premium model".to_owned());
        self.say_streamed(
            pacer,
            &format!(
                "Great idea! I've analyzed which customers would benefit from upgrading to the {upgrade}. \
                 It is in stock and exceeds the PX-500 specifications:"
            ),
        )
        .await?;

        let rows = options
            .iter()
            .map(|option| {
                row(json!({
                    "id": option.customer_id.as_str(),
                    "name": option.customer_name,
                    "currentProduct": option.current_product,
                    "upgradeProduct": option.upgrade_product,
                    "additionalCost": format_money(option.additional_cost),
                    "eligible": if option.eligible { "\u{2713} Yes" } else { "\u{2717} No" },
                }))
            })
            .collect();
        let table = TableData::new(
            vec![
                Column::new("name", "Customer").width(200),
                Column::new("currentProduct", "Current Product").width(180),
                Column::new("upgradeProduct", "Upgrade To").width(180),
                Column::new("additionalCost", "Additional Cost").width(140),
                Column::new("eligible", "Eligible").width(100),
            ],
            rows,
        );
        self.post_content(pacer, DynamicContent::Table(table)).await?;

        let eligible: Vec<_> = options.iter().filter(|option| option.eligible).collect();
        self.say_streamed(
            pacer,
            &format!(
                "{} customers are eligible for the upgrade. The {upgrade} offers:\n\n\
                 \u{2022} Immediate availability (no delay)\n\
                 \u{2022} Higher output and wider coverage\n\
                 \u{2022} Extended 3-year warranty\n\
                 \u{2022} Priority on-site support\n\n\
                 Would you like to approve this upgrade for any customers?",
                eligible.len()
            ),
        )
        .await?;
        let actions = eligible
            .iter()
            .map(|option| {
                Action::primary(
                    format!("{APPROVE_PREFIX}{}", option.customer_id),
                    format!("Approve for {}", option.customer_name),
                )
            })
            .collect();
        self.post_actions(pacer, actions).await?;

        self.set_step(ChatStep::UpgradeOffer);
        Ok(())
    }

    async fn approve(&self, pacer: &Pacer, customer_id: &CustomerId) -> Result<(), ChatError> {
        let name = self
            .fixtures
            .customer(customer_id)
            .map(|customer| customer.name.clone())
            .unwrap_or_else(|| customer_id.to_string());
        self.post(pacer, Message::user(format!("Approve premium upgrade for {name}"))).await?;
        let draft = self.think(pacer, self.systems.generate_draft_email(customer_id)).await?;

        self.say_streamed(
            pacer,
            &format!("Perfect! I've drafted a personalized email for {name}. Here's what I've prepared:"),
        )
        .await?;
        self.post(pacer, Message::assistant(draft)).await?;
        self.offer_send(pacer).await
    }

    async fn draft_notifications(&self, pacer: &Pacer) -> Result<(), ChatError> {
        self.post(pacer, Message::user("Draft notifications for every affected customer")).await?;
        let customers: Vec<CustomerId> =
            self.fixtures.affected_orders.iter().map(|order| order.id.clone()).collect();

        let mut drafts = Vec::with_capacity(customers.len());
        for customer_id in &customers {
            drafts.push(self.think(pacer, self.systems.generate_draft_email(customer_id)).await?);
        }
        self.say_streamed(
            pacer,
            &format!("I've drafted {} customer notifications. Here they are:", drafts.len()),
        )
        .await?;
        for draft in drafts {
            self.post(pacer, Message::assistant(draft)).await?;
        }
        self.offer_send(pacer).await
    }

    async fn offer_send(&self, pacer: &Pacer) -> Result<(), ChatError> {
        self.say_streamed(
            pacer,
            "The email is ready to send. Would you like me to send it now, or would you like to make any \
             changes first?",
        )
        .await?;
        self.post_actions(
            pacer,
            vec![
                Action::primary(ACTION_SEND_EMAIL, "Send Email"),
                Action::secondary(ACTION_EDIT_EMAIL, "Edit First"),
            ],
        )
        .await?;
        self.set_step(ChatStep::EmailDraft);
        Ok(())
    }

    async fn send_email(&self, pacer: &Pacer) -> Result<(), ChatError> {
        self.post(pacer, Message::user("Send it")).await?;
        let receipt = self
            .think(pacer, self.systems.submit_approval(ACTION_SEND_EMAIL, &json!({ "channel": "email" })))
            .await?;
        self.say_streamed(pacer, &format!("Sent. {}", receipt.message)).await?;
        self.set_step(ChatStep::Sent);
        Ok(())
    }

    async fn open_edit_form(&self, pacer: &Pacer) -> Result<(), ChatError> {
        self.post(pacer, Message::user("Let me edit it first")).await?;
        self.say_streamed(pacer, "Sure. Tell me what to change:").await?;
        let form = FormData {
            fields: vec![
                FormField::text("subject", "Subject")
                    .placeholder("Important update on your order")
                    .required(),
                FormField::select(
                    "tone",
                    "Tone",
                    vec![
                        SelectOption { label: "Friendly".to_owned(), value: "friendly".to_owned() },
                        SelectOption { label: "Formal".to_owned(), value: "formal".to_owned() },
                    ],
                )
                .required(),
                FormField::text("note", "Extra note").placeholder("Optional"),
            ],
            submit_label: "Update Draft".to_owned(),
        };
        self.post_content(pacer, DynamicContent::Form(form.clone())).await?;
        let mut inner = self.lock();
        pacer.checkpoint()?;
        inner.open_form = Some(form);
        inner.step = ChatStep::EmailEditing;
        Ok(())
    }

    /// Shows the thinking indicator while `future` runs.
    async fn think<F>(&self, pacer: &Pacer, future: F) -> Result<F::Output, Cancelled>
    where
        F: std::future::Future,
    {
        self.thinking.send_replace(true);
        let result = pacer.guard(future).await;
        self.thinking.send_replace(false);
        result
    }

    async fn post(&self, pacer: &Pacer, message: Message) -> Result<(), Cancelled> {
        pacer.checkpoint()?;
        self.transcript.push(message);
        pacer.pause(self.pacing.message_gap).await
    }

    async fn post_content(&self, pacer: &Pacer, content: DynamicContent) -> Result<(), Cancelled> {
        self.post(pacer, Message::assistant("").with_dynamic_content(content)).await
    }

    async fn post_actions(&self, pacer: &Pacer, actions: Vec<Action>) -> Result<(), Cancelled> {
        self.post_content(pacer, DynamicContent::Actions(ActionData { actions })).await
    }

    async fn say_streamed(&self, pacer: &Pacer, text: &str) -> Result<(), ChatError> {
        self.transcript.stream(pacer, Role::Assistant, text, self.pacing.stream_char).await?;
        pacer.pause(self.pacing.stream_gap).await?;
        Ok(())
    }

    /// Resolves a click against the most recent action row.
    fn latest_action(&self, action_id: &str) -> Option<String> {
        let messages = self.transcript.messages();
        let data = messages.iter().rev().find_map(|message| match &message.dynamic_content {
            Some(DynamicContent::Actions(data)) => Some(data),
            _ => None,
        })?;
        let mut clicked = None;
        ActionRow::new(data, |id: &str| clicked = Some(id.to_owned())).click(action_id);
        clicked
    }

    fn set_step(&self, step: ChatStep) {
        self.lock().step = step;
    }

    fn current_pacer(&self) -> Pacer {
        self.pacer.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn lock(&self) -> MutexGuard<'_, ChatInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CopilotChat {
    fn drop(&mut self) {
        self.current_pacer().cancel();
    }
}

fn summarize_record(record: &FormRecord) -> String {
    record
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(field, value)| format!("{field}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use guidepost_core::domain::content::DynamicContent;
    use guidepost_core::domain::message::Role;
    use guidepost_core::fixtures::FixtureSet;
    use guidepost_core::render::FormError;

    use super::{ChatError, ChatStep, CopilotChat, CHAT_ANALYZING_NOTICE, SCRIPTED_REPLY};
    use crate::pacing::PacingProfile;
    use crate::systems::MockBusinessSystems;

    fn instant_chat() -> CopilotChat {
        let fixtures = Arc::new(FixtureSet::demo());
        let systems = Arc::new(MockBusinessSystems::new(Arc::clone(&fixtures)).with_latency(false));
        CopilotChat::new(fixtures, systems, PacingProfile::instant())
    }

    #[tokio::test]
    async fn opening_shows_table_chart_and_actions() {
        let chat = instant_chat();
        chat.open().await.expect("open");

        let messages = chat.messages();
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, CHAT_ANALYZING_NOTICE);
        let kinds: Vec<&str> = messages
            .iter()
            .filter_map(|message| message.dynamic_content.as_ref().map(DynamicContent::kind))
            .collect();
        assert_eq!(kinds, vec!["table", "chart", "actions"]);
        match &messages[2].dynamic_content {
            Some(DynamicContent::Table(table)) => {
                assert_eq!(table.highlight_rows, vec!["CUST-001".to_owned(), "CUST-002".to_owned()]);
            }
            other => panic!("expected affected customer table, got {other:?}"),
        }
        assert!(messages.iter().any(|message| message.content.contains("$225,000")));
        assert_eq!(chat.step(), ChatStep::Overview);
    }

    #[tokio::test]
    async fn unknown_or_stale_clicks_are_ignored() {
        let chat = instant_chat();
        chat.open().await.expect("open");

        assert!(!chat.click("send-email").await.expect("ignored"));
        assert!(chat.click("find-suppliers").await.expect("handled"));
        assert_eq!(chat.step(), ChatStep::Suppliers);
        assert!(!chat.click("notify-customers").await.expect("stale row"));
    }

    #[tokio::test]
    async fn upgrade_approval_drafts_an_email() {
        let chat = instant_chat();
        chat.open().await.expect("open");
        chat.click("upgrade-premium").await.expect("upgrade");
        assert_eq!(chat.step(), ChatStep::UpgradeOffer);

        assert!(!chat.click("approve-CUST-003").await.expect("ineligible has no button"));
        assert!(chat.click("approve-CUST-002").await.expect("approve"));
        assert_eq!(chat.step(), ChatStep::EmailDraft);
        assert!(chat
            .messages()
            .iter()
            .any(|message| message.content.starts_with("Subject: Important Update on Your Order EVT-2215")));

        assert!(chat.click("send-email").await.expect("send"));
        assert_eq!(chat.step(), ChatStep::Sent);
    }

    #[tokio::test]
    async fn notify_drafts_one_email_per_customer() {
        let chat = instant_chat();
        chat.open().await.expect("open");
        chat.click("notify-customers").await.expect("notify");

        let drafts = chat
            .messages()
            .iter()
            .filter(|message| message.content.starts_with("Subject: Important Update"))
            .count();
        assert_eq!(drafts, 3);
        assert_eq!(chat.step(), ChatStep::EmailDraft);
    }

    #[tokio::test]
    async fn edit_form_validates_required_fields() {
        let chat = instant_chat();
        chat.open().await.expect("open");
        chat.click("upgrade-premium").await.expect("upgrade");
        chat.click("approve-CUST-001").await.expect("approve");
        chat.click("edit-email").await.expect("edit");
        assert_eq!(chat.step(), ChatStep::EmailEditing);

        let error = chat.submit_form(&[("note", "call first")]).await.expect_err("missing fields");
        assert!(matches!(error, ChatError::Form(FormError::MissingRequired(_))));

        let record = chat
            .submit_form(&[("subject", "Your speaker upgrade"), ("tone", "formal")])
            .await
            .expect("submit");
        assert_eq!(record.get("tone").map(String::as_str), Some("formal"));
        assert_eq!(chat.step(), ChatStep::EmailDraft);
        assert!(matches!(chat.submit_form(&[]).await, Err(ChatError::NoOpenForm)));
    }

    #[tokio::test]
    async fn free_text_gets_the_scripted_reply() {
        let chat = instant_chat();
        chat.say("Can you call the supplier?").await.expect("reply");

        let last = chat.messages().pop().expect("reply posted");
        assert_eq!(last.content, SCRIPTED_REPLY);
        assert!(!chat.is_thinking());
    }

    #[tokio::test]
    async fn reset_clears_the_conversation() {
        let chat = instant_chat();
        chat.open().await.expect("open");
        chat.reset();

        assert!(chat.messages().is_empty());
        assert_eq!(chat.step(), ChatStep::NotStarted);
        chat.open().await.expect("reopen after reset");
        assert_eq!(chat.step(), ChatStep::Overview);
    }
}
