use serde::{Deserialize, Serialize};

use crate::domain::analysis::StepStatus;
use crate::domain::customer::CustomerId;
use crate::domain::upgrade::ConfirmedUpgrade;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What a task does once it completes, and which artifact it exposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskAction {
    UpdateOrder { customer_id: CustomerId, order_number: String },
    MitigationReport,
    CustomerEmail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: TaskId,
    pub title: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub action: TaskAction,
}

impl TaskItem {
    pub fn advance(&mut self, next: StepStatus) -> Result<(), DomainError> {
        let id = self.id.0.clone();
        self.status.advance(&id, next)
    }
}

/// One order update per selected customer, then the report, then the email.
pub fn plan_tasks(confirmed: &ConfirmedUpgrade) -> Vec<TaskItem> {
    let mut tasks: Vec<TaskItem> = confirmed
        .customers
        .iter()
        .enumerate()
        .map(|(index, option)| TaskItem {
            id: TaskId(format!("task-{:02}", index + 1)),
            title: format!("Update sales order {} for {}", option.order_number, option.customer_name),
            status: StepStatus::Pending,
            details: Some(format!(
                "Replace {} x {} with {}",
                option.quantity, option.current_product, confirmed.sku.name
            )),
            action: TaskAction::UpdateOrder {
                customer_id: option.customer_id.clone(),
                order_number: option.order_number.clone(),
            },
        })
        .collect();

    let next = tasks.len();
    tasks.push(TaskItem {
        id: TaskId(format!("task-{:02}", next + 1)),
        title: "Generate supply mitigation report".to_owned(),
        status: StepStatus::Pending,
        details: Some("HTML summary of the upgrade decision".to_owned()),
        action: TaskAction::MitigationReport,
    });
    tasks.push(TaskItem {
        id: TaskId(format!("task-{:02}", next + 2)),
        title: "Draft customer upgrade email".to_owned(),
        status: StepStatus::Pending,
        details: Some(format!("{} recipient(s)", confirmed.customers.len())),
        action: TaskAction::CustomerEmail,
    });
    tasks
}

#[cfg(test)]
mod tests {
    use super::{plan_tasks, TaskAction};
    use crate::domain::analysis::StepStatus;
    use crate::fixtures::FixtureSet;

    #[test]
    fn plan_has_one_update_per_customer_plus_two() {
        let fixtures = FixtureSet::demo();
        let confirmed = fixtures.confirmed_upgrade_for(&["CUST-001", "CUST-002"]).expect("confirm");

        let tasks = plan_tasks(&confirmed);
        assert_eq!(tasks.len(), 4);
        assert!(tasks.iter().all(|task| task.status == StepStatus::Pending));
        assert!(matches!(tasks[0].action, TaskAction::UpdateOrder { .. }));
        assert_eq!(tasks[2].action, TaskAction::MitigationReport);
        assert_eq!(tasks[3].action, TaskAction::CustomerEmail);
        assert_eq!(tasks[3].id.as_str(), "task-04");
    }
}
