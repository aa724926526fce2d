use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::pagination::{fetch_board, BoardData};
use crate::api::{BoardSource, MondayError};
use crate::models::{CalendarEvent, Column, DisplayMode, FieldConfig, Item};
use crate::store::{reconcile, ConfigStore};
use crate::transform::transform;

// ─── Messages ───────────────────────────────────────────────────────────────

/// Inbound notifications from the host and the surrounding UI.
#[derive(Debug, Clone)]
pub enum AppMsg {
    /// The host switched the active board. Repeats of the current id are
    /// ignored.
    BoardChanged(u64),
    /// Explicit re-fetch of the active board.
    Refresh,
    ToggleDetailColumn(String),
    ToggleDateField(String),
    SetDisplayMode(DisplayMode),
    SelectEvent(String),
    ClearSelection,
}

// ─── Fetch plumbing ─────────────────────────────────────────────────────────

/// Result of one background fetch cycle, tagged with the generation that
/// spawned it.
pub struct FetchOutcome {
    generation: u64,
    board_id: u64,
    result: Result<BoardData, MondayError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Fetching,
    Ready,
    Error,
}

// ─── Snapshot ───────────────────────────────────────────────────────────────

/// Read-only view handed to the rendering boundary after each pipeline step.
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub events: &'a [CalendarEvent],
    pub loading: bool,
    pub error: bool,
    pub highlighted: Option<&'a str>,
    pub display_mode: DisplayMode,
}

// ─── Controller ─────────────────────────────────────────────────────────────

/// Single mutable owner of the visible calendar state. Fetches run in
/// background tasks and report over a channel; every spawned fetch carries the
/// generation it was started under, and anything arriving with a stale tag is
/// dropped on the floor. The last-triggered cycle wins.
pub struct App {
    source: Arc<dyn BoardSource>,
    store: ConfigStore,

    board_id: Option<u64>,
    items: Vec<Item>,
    columns: Vec<Column>,
    field_config: FieldConfig,

    events: Vec<CalendarEvent>,
    highlighted: Option<String>,
    phase: Phase,

    generation: u64,
    result_tx: mpsc::UnboundedSender<FetchOutcome>,
    result_rx: Option<mpsc::UnboundedReceiver<FetchOutcome>>,
}

impl App {
    pub fn new(source: Arc<dyn BoardSource>, store: ConfigStore) -> Self {
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        Self {
            source,
            store,
            board_id: None,
            items: Vec::new(),
            columns: Vec::new(),
            field_config: FieldConfig::default(),
            events: Vec::new(),
            highlighted: None,
            phase: Phase::Idle,
            generation: 0,
            result_tx,
            result_rx: Some(result_rx),
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            events: &self.events,
            loading: self.phase == Phase::Fetching,
            error: self.phase == Phase::Error,
            highlighted: self.highlighted.as_deref(),
            display_mode: self.field_config.display_mode,
        }
    }

    /// Drive the controller: react to host/UI messages and background fetch
    /// results, pushing a fresh snapshot after every step. Returns once the
    /// inbox closes and no fetch is in flight.
    pub async fn run<F>(mut self, mut inbox: mpsc::UnboundedReceiver<AppMsg>, mut on_update: F)
    where
        F: FnMut(Snapshot<'_>),
    {
        let Some(mut results) = self.result_rx.take() else {
            return;
        };
        let mut inbox_open = true;

        loop {
            tokio::select! {
                maybe = inbox.recv(), if inbox_open => match maybe {
                    Some(msg) => self.handle(msg),
                    None => inbox_open = false,
                },
                Some(outcome) = results.recv() => self.apply_fetch(outcome),
            }
            on_update(self.snapshot());
            if !inbox_open && self.phase != Phase::Fetching {
                break;
            }
        }
    }

    pub fn handle(&mut self, msg: AppMsg) {
        match msg {
            AppMsg::BoardChanged(board_id) => {
                if self.board_id == Some(board_id) {
                    return;
                }
                self.board_id = Some(board_id);
                self.items.clear();
                self.columns.clear();
                self.events.clear();
                self.highlighted = None;
                self.field_config = self.store.load(board_id);
                self.start_fetch();
            }
            AppMsg::Refresh => self.start_fetch(),
            AppMsg::ToggleDetailColumn(column_id) => {
                let Some(board_id) = self.board_id else { return };
                match self.store.toggle_detail_column(board_id, &column_id) {
                    Ok(config) => self.apply_config(config),
                    Err(e) => warn!(error = %e, "failed to persist detail selection"),
                }
            }
            AppMsg::ToggleDateField(column_id) => {
                let Some(board_id) = self.board_id else { return };
                match self.store.toggle_date_field(board_id, &column_id) {
                    Ok(config) => self.apply_config(config),
                    Err(e) => warn!(error = %e, "failed to persist date-field selection"),
                }
            }
            AppMsg::SetDisplayMode(mode) => {
                let Some(board_id) = self.board_id else { return };
                match self.store.set_display_mode(board_id, mode) {
                    Ok(config) => self.apply_config(config),
                    Err(e) => warn!(error = %e, "failed to persist display mode"),
                }
            }
            AppMsg::SelectEvent(event_id) => {
                if self.events.iter().any(|e| e.id == event_id) {
                    self.highlighted = Some(event_id);
                }
            }
            AppMsg::ClearSelection => self.highlighted = None,
        }
    }

    /// Spawn a background fetch for the active board under a fresh generation.
    fn start_fetch(&mut self) {
        let Some(board_id) = self.board_id else { return };
        self.generation += 1;
        let generation = self.generation;
        self.phase = Phase::Fetching;

        let source = Arc::clone(&self.source);
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = fetch_board(source.as_ref(), board_id).await;
            let _ = tx.send(FetchOutcome {
                generation,
                board_id,
                result,
            });
        });
    }

    /// Commit a fetch outcome, unless a newer cycle has been started since.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome) {
        if outcome.generation != self.generation {
            debug!(
                generation = outcome.generation,
                current = self.generation,
                "discarding stale fetch result"
            );
            return;
        }
        match outcome.result {
            Ok(data) => {
                self.items = data.items;
                self.columns = data.columns;
                // Stale persisted column ids fall away against the schema the
                // items were fetched under.
                self.field_config =
                    reconcile(&self.store.load(outcome.board_id), &self.columns);
                self.phase = Phase::Ready;
                self.retransform();
            }
            Err(e) => {
                warn!(board = outcome.board_id, error = %e, "board fetch failed");
                // Previous events stay visible; only the flag flips.
                self.phase = Phase::Error;
            }
        }
    }

    /// Config edits re-run only the transformer against already-held items;
    /// item retrieval is field-agnostic, so no re-fetch.
    fn apply_config(&mut self, config: FieldConfig) {
        self.field_config = reconcile(&config, &self.columns);
        self.retransform();
    }

    fn retransform(&mut self) {
        self.events = transform(&self.items, &self.field_config);
        if let Some(id) = &self.highlighted {
            if !self.events.iter().any(|e| &e.id == id) {
                self.highlighted = None;
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
