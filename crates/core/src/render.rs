//! Terminal rendering for messages and their structured content blocks.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::domain::content::{
    ActionData, ActionVariant, ChartData, ChartKind, DynamicContent, FieldKind, FormData, Row,
    TableData,
};
use crate::domain::message::{Message, Role};

const BAR_WIDTH: usize = 30;
const HIGHLIGHT_MARK: &str = "> ";
const PLAIN_MARK: &str = "  ";

pub fn render_message(message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Assistant => "Copilot",
        Role::System => "System",
    };
    let mut out = String::new();
    if !message.content.is_empty() {
        out.push_str(&format!("{speaker}: {}", message.content));
        if message.streaming {
            out.push('\u{258c}');
        }
        out.push('\n');
    }
    if let Some(content) = &message.dynamic_content {
        out.push_str(&render_content(content));
    }
    out
}

pub fn render_content(content: &DynamicContent) -> String {
    match content {
        DynamicContent::Table(table) => render_table(table),
        DynamicContent::Chart(chart) => render_chart(chart),
        DynamicContent::Actions(actions) => render_actions(actions),
        DynamicContent::Form(form) => render_form(form),
    }
}

/// Column widths come from `width` (pixels, ten per character) but never cut
/// the header label. Unsized columns fit their widest cell.
pub fn render_table(table: &TableData) -> String {
    let widths: Vec<usize> = table
        .columns
        .iter()
        .map(|column| {
            let label = column.label.chars().count();
            match column.width {
                Some(px) => (usize::from(px) / 10).max(label),
                None => table
                    .rows
                    .iter()
                    .map(|row| cell_text(row, &column.key).chars().count())
                    .fold(label, usize::max),
            }
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> =
        table.columns.iter().zip(&widths).map(|(column, width)| fit(&column.label, *width)).collect();
    out.push_str(PLAIN_MARK);
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(PLAIN_MARK);
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for row in &table.rows {
        let mark = if table.is_highlighted(row) { HIGHLIGHT_MARK } else { PLAIN_MARK };
        let cells: Vec<String> = table
            .columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| fit(&cell_text(row, &column.key), *width))
            .collect();
        out.push_str(mark);
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }
    out
}

pub fn render_chart(chart: &ChartData) -> String {
    let points: Vec<(String, f64)> = chart
        .data
        .iter()
        .map(|record| (cell_text(record, chart.x_key()), numeric(record.get(chart.y_key()))))
        .collect();
    let label_width = points.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);

    let mut out = format!("{}\n", chart.title);
    match chart.kind {
        ChartKind::Bar => {
            let max = points.iter().map(|(_, value)| *value).fold(0.0_f64, f64::max);
            for (label, value) in &points {
                out.push_str(&format!(
                    "  {} {} {}\n",
                    fit(label, label_width),
                    bar(*value, max),
                    format_number(*value)
                ));
            }
        }
        ChartKind::Line => {
            let max = points.iter().map(|(_, value)| *value).fold(f64::MIN, f64::max);
            let min = points.iter().map(|(_, value)| *value).fold(f64::MAX, f64::min);
            let spark: String = points.iter().map(|(_, value)| spark(*value, min, max)).collect();
            out.push_str(&format!("  {spark}\n"));
            for (label, value) in &points {
                out.push_str(&format!("  {} {}\n", fit(label, label_width), format_number(*value)));
            }
        }
        ChartKind::Pie => {
            let total: f64 = points.iter().map(|(_, value)| value.max(0.0)).sum();
            for (label, value) in &points {
                let share = if total > 0.0 { value.max(0.0) / total } else { 0.0 };
                out.push_str(&format!(
                    "  {} {:>5.1}% {}\n",
                    fit(label, label_width),
                    share * 100.0,
                    bar(share, 1.0)
                ));
            }
        }
    }
    out
}

pub fn render_actions(actions: &ActionData) -> String {
    let buttons: Vec<String> = actions
        .actions
        .iter()
        .map(|action| {
            let face = match action.variant {
                ActionVariant::Primary => format!("[* {} *]", action.label),
                ActionVariant::Secondary => format!("[ {} ]", action.label),
                ActionVariant::Outline => format!("( {} )", action.label),
            };
            if action.disabled {
                format!("{face}~")
            } else {
                format!("{face} <{}>", action.id)
            }
        })
        .collect();
    format!("  {}\n", buttons.join("  "))
}

pub fn render_form(form: &FormData) -> String {
    let mut out = String::new();
    for field in &form.fields {
        let required = if field.required { "*" } else { "" };
        let hint = match field.kind {
            FieldKind::Select => {
                let values: Vec<&str> = field.options.iter().map(|option| option.value.as_str()).collect();
                format!("one of: {}", values.join(", "))
            }
            FieldKind::Number => "number".to_owned(),
            FieldKind::Date => "YYYY-MM-DD".to_owned(),
            FieldKind::Text => field.placeholder.clone().unwrap_or_default(),
        };
        out.push_str(&format!("  {}{required} [{}] {hint}\n", field.label, field.id));
    }
    out.push_str(&format!("  [* {} *]\n", form.submit_label));
    out
}

/// Dispatches clicks on an action row to a handler. Disabled or unknown
/// buttons emit nothing.
pub struct ActionRow<'a, H> {
    data: &'a ActionData,
    handler: H,
}

impl<'a, H> ActionRow<'a, H>
where
    H: FnMut(&str),
{
    pub fn new(data: &'a ActionData, handler: H) -> Self {
        Self { data, handler }
    }

    /// Returns whether the click reached the handler.
    pub fn click(&mut self, action_id: &str) -> bool {
        match self.data.actions.iter().find(|action| action.id == action_id) {
            Some(action) if !action.disabled => {
                (self.handler)(&action.id);
                true
            }
            _ => false,
        }
    }
}

pub type FormRecord = BTreeMap<String, String>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("form has no field `{0}`")]
    UnknownField(String),
    #[error("required fields are empty: {0:?}")]
    MissingRequired(Vec<String>),
    #[error("`{value}` is not an option of `{field}`")]
    InvalidOption { field: String, value: String },
}

/// Collects field values for a form block and validates on submit.
#[derive(Clone, Debug)]
pub struct FormSession<'a> {
    form: &'a FormData,
    values: FormRecord,
}

impl<'a> FormSession<'a> {
    pub fn new(form: &'a FormData) -> Self {
        Self { form, values: FormRecord::new() }
    }

    pub fn set(&mut self, field_id: &str, value: impl Into<String>) -> Result<(), FormError> {
        if !self.form.fields.iter().any(|field| field.id == field_id) {
            return Err(FormError::UnknownField(field_id.to_owned()));
        }
        self.values.insert(field_id.to_owned(), value.into());
        Ok(())
    }

    pub fn submit(self) -> Result<FormRecord, FormError> {
        let missing: Vec<String> = self
            .form
            .fields
            .iter()
            .filter(|field| field.required)
            .filter(|field| self.values.get(&field.id).map_or(true, |value| value.trim().is_empty()))
            .map(|field| field.id.clone())
            .collect();
        if !missing.is_empty() {
            return Err(FormError::MissingRequired(missing));
        }

        for field in self.form.fields.iter().filter(|field| field.kind == FieldKind::Select) {
            if let Some(value) = self.values.get(&field.id).filter(|value| !value.is_empty()) {
                if !field.options.iter().any(|option| &option.value == value) {
                    return Err(FormError::InvalidOption {
                        field: field.id.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        Ok(self.values)
    }
}

fn cell_text(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(Value::Number(number)) => format_number(number.as_f64().unwrap_or_default()),
        Some(other) => other.to_string(),
    }
}

fn numeric(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or_default(),
        Some(Value::String(text)) => {
            let cleaned: String =
                text.chars().filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-')).collect();
            cleaned.parse().unwrap_or_default()
        }
        _ => 0.0,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{text}{}", " ".repeat(width - count))
    } else if width == 0 {
        String::new()
    } else {
        let mut clipped: String = text.chars().take(width - 1).collect();
        clipped.push('\u{2026}');
        clipped
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "\u{2588}".repeat(cells.clamp(1, BAR_WIDTH))
}

fn spark(value: f64, min: f64, max: f64) -> char {
    const LEVELS: [char; 8] =
        ['\u{2581}', '\u{2582}', '\u{2583}', '\u{2584}', '\u{2585}', '\u{2586}', '\u{2587}', '\u{2588}'];
    if max <= min {
        return LEVELS[LEVELS.len() / 2];
    }
    let index = (((value - min) / (max - min)) * (LEVELS.len() - 1) as f64).round() as usize;
    LEVELS[index.min(LEVELS.len() - 1)]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_actions, render_chart, render_table, ActionRow, FormError, FormSession};
    use crate::domain::content::{
        row, Action, ActionData, ChartData, ChartKind, Column, FormData, FormField, SelectOption,
        TableData,
    };

    fn customers() -> TableData {
        TableData::new(
            vec![Column::new("name", "Customer").width(120), Column::new("priority", "Priority")],
            vec![
                row(json!({"id": "CUST-001", "name": "TechCon 2026 Summit", "priority": "high"})),
                row(json!({"id": "CUST-003", "name": "Corporate Awards Gala", "priority": "low"})),
            ],
        )
        .highlight(["CUST-001"])
    }

    #[test]
    fn table_honors_column_order_width_and_highlight() {
        let rendered = render_table(&customers());
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "  Customer     | Priority");
        assert!(lines[2].starts_with("> TechCon 202\u{2026} | high"));
        assert!(lines[3].starts_with("  Corporate A\u{2026} | low"));
    }

    #[test]
    fn narrow_width_never_cuts_the_label() {
        let table = TableData::new(
            vec![Column::new("revenue", "Revenue at risk").width(40)],
            vec![row(json!({"id": "x", "revenue": 125000}))],
        );
        let rendered = render_table(&table);

        assert!(rendered.lines().next().is_some_and(|line| line.contains("Revenue at risk")));
        assert!(rendered.contains("125000"));
    }

    #[test]
    fn bar_chart_uses_configured_keys() {
        let chart = ChartData {
            kind: ChartKind::Bar,
            title: "Revenue at Risk by Customer".to_owned(),
            data: vec![
                row(json!({"customer": "TechCon Summit", "revenue": 125000})),
                row(json!({"customer": "Awards Gala", "revenue": 37500})),
            ],
            x_axis_key: Some("customer".to_owned()),
            y_axis_key: Some("revenue".to_owned()),
        };
        let rendered = render_chart(&chart);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Revenue at Risk by Customer");
        assert!(lines[1].contains("TechCon Summit") && lines[1].ends_with("125000"));
        assert_eq!(lines[1].matches('\u{2588}').count(), 30);
        assert_eq!(lines[2].matches('\u{2588}').count(), 9);
    }

    #[test]
    fn pie_chart_reports_shares_with_default_keys() {
        let chart = ChartData {
            kind: ChartKind::Pie,
            title: "Split".to_owned(),
            data: vec![row(json!({"name": "a", "value": 1})), row(json!({"name": "b", "value": 3}))],
            x_axis_key: None,
            y_axis_key: None,
        };
        let rendered = render_chart(&chart);

        assert!(rendered.contains(" 25.0%"));
        assert!(rendered.contains(" 75.0%"));
    }

    #[test]
    fn disabled_actions_emit_nothing() {
        let data = ActionData {
            actions: vec![
                Action::primary("find-suppliers", "Find Alternate Suppliers"),
                Action::outline("notify-customers", "Notify Customers").disabled(),
            ],
        };
        let mut clicked = Vec::new();
        {
            let mut row = ActionRow::new(&data, |id: &str| clicked.push(id.to_owned()));
            assert!(row.click("find-suppliers"));
            assert!(!row.click("notify-customers"));
            assert!(!row.click("missing"));
        }

        assert_eq!(clicked, vec!["find-suppliers".to_owned()]);
        assert!(render_actions(&data).contains("<find-suppliers>"));
        assert!(!render_actions(&data).contains("<notify-customers>"));
    }

    #[test]
    fn form_validates_required_and_select_membership() {
        let form = FormData {
            fields: vec![
                FormField::text("subject", "Subject").required(),
                FormField::select(
                    "tone",
                    "Tone",
                    vec![
                        SelectOption { label: "Formal".to_owned(), value: "formal".to_owned() },
                        SelectOption { label: "Friendly".to_owned(), value: "friendly".to_owned() },
                    ],
                ),
                FormField::text("notes", "Notes"),
            ],
            submit_label: "Save Draft".to_owned(),
        };

        let empty = FormSession::new(&form).submit();
        assert_eq!(empty, Err(FormError::MissingRequired(vec!["subject".to_owned()])));

        let mut session = FormSession::new(&form);
        session.set("subject", "Update").expect("known field");
        session.set("tone", "sarcastic").expect("known field");
        assert!(matches!(session.submit(), Err(FormError::InvalidOption { .. })));

        let mut session = FormSession::new(&form);
        assert_eq!(session.set("cc", "x"), Err(FormError::UnknownField("cc".to_owned())));
        session.set("subject", "Update").expect("known field");
        session.set("tone", "formal").expect("known field");
        let record = session.submit().expect("valid submission");
        assert_eq!(record.get("tone").map(String::as_str), Some("formal"));
        assert!(!record.contains_key("notes"));
    }
}
