use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Board schema ───────────────────────────────────────────────────────────

/// Broad classification of a board column, derived from the remote `type`
/// discriminator. Anything that is not plain text or a date collapses to
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Date,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
}

// ─── Items ──────────────────────────────────────────────────────────────────

/// One cell of an item. `text` is the remote's human-readable rendering of the
/// cell and is `None` (or empty) when the cell is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub id: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub column_values: Vec<ColumnValue>,
}

impl Item {
    /// Non-blank text of the given column, if the item has one.
    pub fn column_text(&self, column_id: &str) -> Option<&str> {
        self.column_values
            .iter()
            .find(|cv| cv.id == column_id)
            .and_then(|cv| cv.text.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// One page of the paginated item query. A present cursor means more pages
/// remain.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsPage {
    pub cursor: Option<String>,
    pub items: Vec<Item>,
}

// ─── Field configuration ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Month,
    Week,
    Day,
}

impl DisplayMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Month => "Month",
            Self::Week => "Week",
            Self::Day => "Day",
        }
    }
}

/// The user's per-board choice of which columns to surface on events and which
/// date columns anchor them. Both selection lists hold at most two column ids,
/// in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldConfig {
    pub detail_columns: Vec<String>,
    pub date_fields: Vec<String>,
    pub display_mode: DisplayMode,
}

// ─── Calendar events ────────────────────────────────────────────────────────

/// A date-anchored view of one item through one of its date fields. Rebuilt
/// wholesale on every transform; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    /// `"{item_id}-{date_field_id}"`, unique even when one item lands on the
    /// calendar twice through two date fields.
    pub id: String,
    pub item_id: String,
    pub date_field_id: String,
    /// Item name plus selected detail texts, newline-joined.
    pub title: String,
    /// The bare item name, for detail views that show fields separately.
    pub name: String,
    pub when: DateTime<Utc>,
    /// Full cell set of the source item, for the detail view.
    pub column_values: Vec<ColumnValue>,
}
