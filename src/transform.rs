use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::models::{CalendarEvent, FieldConfig, Item};

/// Joins the item name and its selected detail texts inside an event title.
const TITLE_SEPARATOR: &str = "\n";
/// Joins item id and date-field id inside an event id.
const EVENT_ID_SEPARATOR: &str = "-";

/// Map fetched items plus the active field configuration onto calendar events.
///
/// Pure and deterministic: items are walked in fetched order, date fields in
/// configured order, and the output is rebuilt from scratch on every call.
/// An item lacking a configured date field, or carrying text that does not
/// parse as a date, simply contributes no event for that pair.
pub fn transform(items: &[Item], config: &FieldConfig) -> Vec<CalendarEvent> {
    let mut events = Vec::new();

    for item in items {
        for field_id in &config.date_fields {
            let Some(text) = item.column_text(field_id) else {
                continue;
            };
            let Some(when) = parse_event_date(text) else {
                debug!(item = %item.id, field = %field_id, text, "unparseable date text, skipping");
                continue;
            };
            events.push(CalendarEvent {
                id: format!("{}{EVENT_ID_SEPARATOR}{}", item.id, field_id),
                item_id: item.id.clone(),
                date_field_id: field_id.clone(),
                title: compose_title(item, config),
                name: item.name.clone(),
                when,
                column_values: item.column_values.clone(),
            });
        }
    }

    events
}

/// Item name first, then each selected detail column's text in selection
/// order, blanks omitted.
fn compose_title(item: &Item, config: &FieldConfig) -> String {
    let mut parts = vec![item.name.as_str()];
    parts.extend(
        config
            .detail_columns
            .iter()
            .filter_map(|id| item.column_text(id)),
    );
    parts.join(TITLE_SEPARATOR)
}

/// Accepted date spellings, most specific first. The remote renders date cells
/// as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM[:SS]`; RFC 3339 covers API exports.
/// Naive spellings are read as UTC.
fn parse_event_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// ─── Tests ──────────────────────────────────────────────────────────────────
