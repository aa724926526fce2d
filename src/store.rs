use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::models::{Column, DisplayMode, FieldConfig};

/// Hard cap on each selection list.
pub const MAX_SELECTED: usize = 2;

// ─── Store ──────────────────────────────────────────────────────────────────

/// Persisted per-board field choices, kept as three independent JSON records
/// per board (`<id>-details.json`, `<id>-dates.json`, `<id>-mode.json`) so
/// each toggle rewrites only the record it touched. A missing or unreadable
/// record is a valid default, never an error.
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn open_default() -> Result<Self> {
        let root = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("boardcal")
            .join("boards");
        Ok(Self { root })
    }

    /// Store rooted at an explicit directory.
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    fn record_path(&self, board_id: u64, record: &str) -> PathBuf {
        self.root.join(format!("{board_id}-{record}.json"))
    }

    fn read_record<T: DeserializeOwned>(&self, board_id: u64, record: &str) -> Option<T> {
        let contents = std::fs::read_to_string(self.record_path(board_id, record)).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn write_record<T: Serialize>(&self, board_id: u64, record: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        let json = serde_json::to_string_pretty(value)?;
        let path = self.record_path(board_id, record);
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Assemble the board's persisted configuration; any missing record falls
    /// back to its default.
    pub fn load(&self, board_id: u64) -> FieldConfig {
        FieldConfig {
            detail_columns: self.read_record(board_id, "details").unwrap_or_default(),
            date_fields: self.read_record(board_id, "dates").unwrap_or_default(),
            display_mode: self.read_record(board_id, "mode").unwrap_or_default(),
        }
    }

    /// Flip a column in the detail selection and persist the result. Adding
    /// past the cap is silently refused.
    pub fn toggle_detail_column(&self, board_id: u64, column_id: &str) -> Result<FieldConfig> {
        let mut config = self.load(board_id);
        toggle(&mut config.detail_columns, column_id);
        self.write_record(board_id, "details", &config.detail_columns)?;
        Ok(config)
    }

    /// Same semantics as [`Self::toggle_detail_column`], separate record.
    pub fn toggle_date_field(&self, board_id: u64, column_id: &str) -> Result<FieldConfig> {
        let mut config = self.load(board_id);
        toggle(&mut config.date_fields, column_id);
        self.write_record(board_id, "dates", &config.date_fields)?;
        Ok(config)
    }

    pub fn set_display_mode(&self, board_id: u64, mode: DisplayMode) -> Result<FieldConfig> {
        let mut config = self.load(board_id);
        config.display_mode = mode;
        self.write_record(board_id, "mode", &mode)?;
        Ok(config)
    }
}

fn toggle(selection: &mut Vec<String>, column_id: &str) {
    if let Some(pos) = selection.iter().position(|c| c == column_id) {
        selection.remove(pos);
    } else if selection.len() < MAX_SELECTED {
        selection.push(column_id.to_string());
    }
}

// ─── Reconciliation ─────────────────────────────────────────────────────────

/// Drop selections whose column no longer exists in the current schema.
/// Columns get renamed and removed between fetches; a stale id is not an
/// error, it just falls out of the active configuration.
pub fn reconcile(config: &FieldConfig, columns: &[Column]) -> FieldConfig {
    FieldConfig {
        detail_columns: retained(&config.detail_columns, columns),
        date_fields: retained(&config.date_fields, columns),
        display_mode: config.display_mode,
    }
}

fn retained(selection: &[String], columns: &[Column]) -> Vec<String> {
    selection
        .iter()
        .filter(|id| columns.iter().any(|c| &c.id == *id))
        .cloned()
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnKind;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("boards"));
        (dir, store)
    }

    fn column(id: &str) -> Column {
        Column {
            id: id.into(),
            title: id.to_uppercase(),
            kind: ColumnKind::Text,
        }
    }

    #[test]
    fn absent_records_load_as_defaults() {
        let (_dir, store) = store();

        let config = store.load(1);

        assert_eq!(config, FieldConfig::default());
        assert_eq!(config.display_mode, DisplayMode::Month);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let (_dir, store) = store();

        let config = store.toggle_detail_column(1, "loc").unwrap();
        assert_eq!(config.detail_columns, ["loc"]);

        let config = store.toggle_detail_column(1, "loc").unwrap();
        assert!(config.detail_columns.is_empty());
    }

    #[test]
    fn selection_never_exceeds_the_cap() {
        let (_dir, store) = store();

        store.toggle_detail_column(1, "a").unwrap();
        store.toggle_detail_column(1, "b").unwrap();
        let config = store.toggle_detail_column(1, "c").unwrap();

        // Third add is a silent no-op.
        assert_eq!(config.detail_columns, ["a", "b"]);

        // Removing one frees a slot again.
        store.toggle_detail_column(1, "a").unwrap();
        let config = store.toggle_detail_column(1, "c").unwrap();
        assert_eq!(config.detail_columns, ["b", "c"]);
    }

    #[test]
    fn date_fields_are_a_separate_namespace() {
        let (_dir, store) = store();

        store.toggle_detail_column(1, "due").unwrap();
        let config = store.toggle_date_field(1, "due").unwrap();

        assert_eq!(config.detail_columns, ["due"]);
        assert_eq!(config.date_fields, ["due"]);

        let config = store.toggle_date_field(1, "due").unwrap();
        assert_eq!(config.detail_columns, ["due"]);
        assert!(config.date_fields.is_empty());
    }

    #[test]
    fn boards_do_not_share_selections() {
        let (_dir, store) = store();

        store.toggle_detail_column(1, "a").unwrap();
        store.set_display_mode(1, DisplayMode::Week).unwrap();

        let other = store.load(2);
        assert!(other.detail_columns.is_empty());
        assert_eq!(other.display_mode, DisplayMode::Month);
    }

    #[test]
    fn display_mode_overwrites_and_persists() {
        let (_dir, store) = store();

        store.set_display_mode(1, DisplayMode::Week).unwrap();
        store.set_display_mode(1, DisplayMode::Day).unwrap();

        assert_eq!(store.load(1).display_mode, DisplayMode::Day);
    }

    #[test]
    fn corrupt_record_degrades_to_default() {
        let (_dir, store) = store();

        store.toggle_detail_column(1, "a").unwrap();
        std::fs::write(store.record_path(1, "details"), "not json").unwrap();

        assert!(store.load(1).detail_columns.is_empty());
    }

    #[test]
    fn reconcile_strips_stale_ids_and_is_idempotent() {
        let columns = vec![column("loc"), column("due")];
        let config = FieldConfig {
            detail_columns: vec!["loc".into(), "gone".into()],
            date_fields: vec!["gone".into(), "due".into()],
            display_mode: DisplayMode::Week,
        };

        let once = reconcile(&config, &columns);
        assert_eq!(once.detail_columns, ["loc"]);
        assert_eq!(once.date_fields, ["due"]);
        assert_eq!(once.display_mode, DisplayMode::Week);

        let twice = reconcile(&once, &columns);
        assert_eq!(once, twice);
    }

    #[test]
    fn reconcile_against_empty_schema_clears_selections() {
        let config = FieldConfig {
            detail_columns: vec!["a".into()],
            date_fields: vec!["b".into()],
            display_mode: DisplayMode::Month,
        };

        let reconciled = reconcile(&config, &[]);

        assert!(reconciled.detail_columns.is_empty());
        assert!(reconciled.date_fields.is_empty());
    }
}
