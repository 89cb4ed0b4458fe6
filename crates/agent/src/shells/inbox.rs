use guidepost_core::domain::email::{Email, EmailId, Importance};
use guidepost_core::fixtures::SUPPLIER_EMAIL_ID;
use tracing::debug;

use crate::shells::stage::StageRouter;

/// Client-side inbox filters. All active filters must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboxFilter {
    pub unread_only: bool,
    pub importance: Option<Importance>,
    pub query: String,
}

impl InboxFilter {
    pub fn matches(&self, email: &Email) -> bool {
        if self.unread_only && email.read {
            return false;
        }
        if self.importance.is_some_and(|importance| importance != email.importance) {
            return false;
        }
        let query = self.query.trim().to_lowercase();
        query.is_empty()
            || [&email.from, &email.subject, &email.body]
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
    }
}

pub struct InboxView {
    emails: Vec<Email>,
    filter: InboxFilter,
    selected: EmailId,
}

impl InboxView {
    /// Opens on the supplier-delay email when present.
    pub fn new(emails: Vec<Email>) -> Self {
        let selected = emails
            .iter()
            .find(|email| email.id.as_str() == SUPPLIER_EMAIL_ID)
            .or_else(|| emails.first())
            .map(|email| email.id.clone())
            .unwrap_or_else(|| EmailId::new(SUPPLIER_EMAIL_ID));
        let mut view = Self { emails, filter: InboxFilter::default(), selected };
        view.mark_read();
        view
    }

    pub fn filter(&self) -> &InboxFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: InboxFilter) {
        self.filter = filter;
    }

    pub fn visible(&self) -> Vec<&Email> {
        self.emails.iter().filter(|email| self.filter.matches(email)).collect()
    }

    pub fn unread_count(&self) -> usize {
        self.emails.iter().filter(|email| !email.read).count()
    }

    pub fn selected(&self) -> Option<&Email> {
        self.emails.iter().find(|email| email.id == self.selected)
    }

    pub fn select(&mut self, id: &str) -> bool {
        if !self.emails.iter().any(|email| email.id.as_str() == id) {
            return false;
        }
        self.selected = EmailId::new(id);
        self.mark_read();
        debug!(event_name = "shell.inbox.selected", email_id = id, "email selected");
        true
    }

    /// Only the supplier-delay email offers the copilot hand-off.
    pub fn can_ask_copilot(&self) -> bool {
        self.selected.as_str() == SUPPLIER_EMAIL_ID
    }

    pub fn ask_copilot(&self, router: &mut StageRouter) -> bool {
        self.can_ask_copilot() && router.ask_copilot()
    }

    fn mark_read(&mut self) {
        if let Some(email) = self.emails.iter_mut().find(|email| email.id == self.selected) {
            email.read = true;
        }
    }
}
