//! Sales order screen with its small command chat.

use std::time::Duration;

use guidepost_core::domain::message::Message;
use guidepost_core::domain::order::{OrderField, OrderMetadata, SalesOrder, ShipmentMethod};
use guidepost_core::intents::{
    recognize, OrderIntent, Recognition, FALLBACK_REPLY, SLOT_LOAD_IN_TIME,
};
use tokio::time::Instant;
use tracing::info;

/// Load-in time used when the command names no clock time.
pub const DEFAULT_LOAD_IN_TIME: &str = "6:00 AM";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderChange {
    pub field: OrderField,
    pub previous: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Highlight {
    field: OrderField,
    expires_at: Instant,
}

pub struct OrderScreen {
    order: SalesOrder,
    highlight_clear: Duration,
    highlight: Option<Highlight>,
    highlighted_line: Option<String>,
    messages: Vec<Message>,
}

impl OrderScreen {
    pub fn new(order: SalesOrder, highlight_clear: Duration) -> Self {
        Self { order, highlight_clear, highlight: None, highlighted_line: None, messages: Vec::new() }
    }

    /// Marks the line whose item number matches, as the `?highlight=` link does.
    pub fn with_highlighted_line(mut self, item_no: Option<&str>) -> Self {
        self.highlighted_line = item_no
            .filter(|no| self.order.lines.iter().any(|line| line.no == *no))
            .map(str::to_owned);
        self
    }

    pub fn order(&self) -> &SalesOrder {
        &self.order
    }

    pub fn metadata(&self) -> &OrderMetadata {
        &self.order.metadata
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn highlighted_line(&self) -> Option<&str> {
        self.highlighted_line.as_deref()
    }

    /// The field still inside its highlight window, if any.
    pub fn highlighted(&self) -> Option<OrderField> {
        self.highlight
            .filter(|highlight| Instant::now() < highlight.expires_at)
            .map(|highlight| highlight.field)
    }

    /// Waits out the current highlight.
    pub async fn settle(&mut self) {
        if let Some(highlight) = self.highlight.take() {
            tokio::time::sleep_until(highlight.expires_at).await;
        }
    }

    /// Handles one chat line. `None` means the fallback reply was posted.
    pub fn submit(&mut self, text: &str) -> Option<OrderChange> {
        self.messages.push(Message::user(text));

        let change = match recognize(text) {
            Recognition::Recognized { intent, slots } => {
                let change = match intent {
                    OrderIntent::SwitchShipmentToCourier => {
                        let previous = self.order.metadata.shipment_method.code().to_owned();
                        self.order.metadata.shipment_method = ShipmentMethod::Courier;
                        OrderChange {
                            field: OrderField::ShipmentMethod,
                            previous,
                            value: ShipmentMethod::Courier.code().to_owned(),
                        }
                    }
                    OrderIntent::ChangeLoadInTime => {
                        let value = slots
                            .get(SLOT_LOAD_IN_TIME)
                            .cloned()
                            .unwrap_or_else(|| DEFAULT_LOAD_IN_TIME.to_owned());
                        let previous =
                            std::mem::replace(&mut self.order.metadata.load_in_time, value.clone());
                        OrderChange { field: OrderField::LoadInTime, previous, value }
                    }
                };
                info!(
                    event_name = "shell.order.updated",
                    action = intent.action_key(),
                    previous = %change.previous,
                    value = %change.value,
                    "order field updated"
                );
                Some(change)
            }
            Recognition::Unrecognized => None,
        };

        match &change {
            Some(change) => {
                self.highlight = Some(Highlight {
                    field: change.field,
                    expires_at: Instant::now() + self.highlight_clear,
                });
                self.messages.push(Message::assistant(format!(
                    "Done. {} changed from {} to {}.",
                    change.field.label(),
                    change.previous,
                    change.value
                )));
            }
            None => self.messages.push(Message::assistant(FALLBACK_REPLY)),
        }
        change
    }
}
