//! Structured blocks attached to assistant messages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DynamicContent {
    Table(TableData),
    Chart(ChartData),
    Actions(ActionData),
    Form(FormData),
}

impl DynamicContent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Chart(_) => "chart",
            Self::Actions(_) => "actions",
            Self::Form(_) => "form",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self { key: key.into(), label: label.into(), width: None }
    }

    pub fn width(mut self, px: u16) -> Self {
        self.width = Some(px);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Matched against each row's `id` field.
    #[serde(default)]
    pub highlight_rows: Vec<String>,
}

impl TableData {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self { columns, rows, highlight_rows: Vec::new() }
    }

    pub fn highlight<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight_rows = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_highlighted(&self, row: &Row) -> bool {
        row.get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| self.highlight_rows.iter().any(|candidate| candidate == id))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub data: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_key: Option<String>,
}

impl ChartData {
    pub fn x_key(&self) -> &str {
        self.x_axis_key.as_deref().unwrap_or("name")
    }

    pub fn y_key(&self) -> &str {
        self.y_axis_key.as_deref().unwrap_or("value")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVariant {
    Primary,
    Secondary,
    Outline,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub label: String,
    pub variant: ActionVariant,
    #[serde(default)]
    pub disabled: bool,
}

impl Action {
    pub fn new(id: impl Into<String>, label: impl Into<String>, variant: ActionVariant) -> Self {
        Self { id: id.into(), label: label.into(), variant, disabled: false }
    }

    pub fn primary(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, ActionVariant::Primary)
    }

    pub fn secondary(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, ActionVariant::Secondary)
    }

    pub fn outline(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, ActionVariant::Outline)
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionData {
    pub actions: Vec<Action>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Select,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub required: bool,
}

impl FormField {
    pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: FieldKind::Text,
            label: label.into(),
            placeholder: None,
            options: Vec::new(),
            required: false,
        }
    }

    pub fn select(id: impl Into<String>, label: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self { kind: FieldKind::Select, options, ..Self::text(id, label) }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    pub fields: Vec<FormField>,
    pub submit_label: String,
}

/// Turns a `json!` object literal into a row; non-objects land under `value`.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_owned(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{row, ChartData, ChartKind, Column, DynamicContent, TableData};

    #[test]
    fn content_serializes_with_type_tag() {
        let content = DynamicContent::Table(TableData::new(
            vec![Column::new("name", "Customer").width(200)],
            vec![row(json!({"id": "CUST-001", "name": "TechCon 2026 Summit"}))],
        ));

        let value = serde_json::to_value(&content).expect("serialize content");
        assert_eq!(value["type"], "table");
        assert_eq!(value["data"]["columns"][0]["width"], 200);
        assert_eq!(value["data"]["highlightRows"], json!([]));
    }

    #[test]
    fn chart_keys_default_to_name_and_value() {
        let chart = ChartData {
            kind: ChartKind::Pie,
            title: "Share".to_owned(),
            data: Vec::new(),
            x_axis_key: None,
            y_axis_key: Some("revenue".to_owned()),
        };

        assert_eq!(chart.x_key(), "name");
        assert_eq!(chart.y_key(), "revenue");
    }

    #[test]
    fn highlight_matches_row_id() {
        let table = TableData::new(
            vec![Column::new("name", "Customer")],
            vec![row(json!({"id": "CUST-001"})), row(json!({"id": "CUST-003"}))],
        )
        .highlight(["CUST-001"]);

        assert!(table.is_highlighted(&table.rows[0]));
        assert!(!table.is_highlighted(&table.rows[1]));
    }
}
