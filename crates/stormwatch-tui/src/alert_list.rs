//! Alert list presentation.
//!
//! [`AlertListView`] turns store contents into table rows and detail text and
//! owns the focus cursor. The store holds records only; the empty-state
//! placeholder row and all cursor bookkeeping live here.

use ratatui::widgets::TableState;
use stormwatch_core::{AlertField, AlertRecord, AlertStore};
use thiserror::Error;
use tracing::debug;

/// Rendering errors. Recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Focus index {index} out of range for {len} alerts")]
    InvalidFocus { index: usize, len: usize },
}

/// Row/detail projection of the alert store plus the focus cursor.
#[derive(Debug)]
pub struct AlertListView {
    columns: Vec<AlertField>,
    focus_contents: Vec<AlertField>,
    /// `None` only while the store is empty
    cursor: Option<usize>,
    detail_scroll: u16,
    table_state: TableState,
    clear_requested: bool,
}

impl AlertListView {
    pub fn new(columns: Vec<AlertField>, focus_contents: Vec<AlertField>) -> Self {
        Self {
            columns,
            focus_contents,
            cursor: None,
            detail_scroll: 0,
            table_state: TableState::default(),
            clear_requested: false,
        }
    }

    pub fn columns(&self) -> &[AlertField] {
        &self.columns
    }

    /// Index of the focused alert.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// First visible line of the detail pane.
    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    /// Table state for rendering; selection mirrors the cursor.
    pub fn table_state_mut(&mut self) -> &mut TableState {
        &mut self.table_state
    }

    /// Capitalized column labels for the header row.
    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(AlertField::label).collect()
    }

    /// Record `index` projected onto the configured columns.
    pub fn row_at(&self, store: &AlertStore, index: usize) -> Option<Vec<String>> {
        store
            .record_at(index)
            .map(|record| self.columns.iter().map(|f| f.display(record)).collect())
    }

    /// One row per record, or a single blank placeholder row when empty.
    pub fn rows(&self, store: &AlertStore) -> Vec<Vec<String>> {
        if store.is_empty() {
            return vec![vec![String::new(); self.columns.len()]];
        }
        store
            .iter()
            .map(|record| self.columns.iter().map(|f| f.display(record)).collect())
            .collect()
    }

    /// `"<Label>\n<value>\n\n"` for each configured detail field.
    pub fn detail_for(&self, record: &AlertRecord) -> String {
        self.focus_contents
            .iter()
            .map(|field| format!("{}\n{}\n\n", field.label(), field.display(record)))
            .collect()
    }

    /// The focused record, if any.
    pub fn focused_record<'a>(&self, store: &'a AlertStore) -> Option<&'a AlertRecord> {
        self.cursor.and_then(|i| store.record_at(i))
    }

    /// Detail text for the focused record; empty when nothing is focused.
    pub fn focused_detail(&self, store: &AlertStore) -> String {
        self.focused_record(store)
            .map(|record| self.detail_for(record))
            .unwrap_or_default()
    }

    /// Move focus to `new_index` and return the detail text to show.
    ///
    /// An out-of-range index is reported and clamped to the first alert.
    pub fn on_focus_changed(&mut self, store: &AlertStore, new_index: usize) -> String {
        let index = match checked_focus(new_index, store.len()) {
            Ok(index) => Some(index),
            Err(RenderError::InvalidFocus { len: 0, .. }) => None,
            Err(e) => {
                debug!(error = %e, "clamping focus");
                Some(0)
            }
        };
        self.set_cursor(index);
        self.detail_scroll = 0;
        self.focused_detail(store)
    }

    /// Keep the same record focused after `batch_len` records were prepended.
    pub fn on_new_records(&mut self, batch_len: usize, len: usize) {
        if batch_len == 0 {
            return;
        }
        match self.cursor {
            Some(cursor) => {
                self.set_cursor(Some(cursor + batch_len));
                // Shift the viewport with the rows so the screen does not jump
                *self.table_state.offset_mut() += batch_len;
            }
            None => {
                self.set_cursor(Some(0));
                self.detail_scroll = 0;
            }
        }
        self.ensure_valid(len);
    }

    /// Reset focus after the list was cleared and refilled.
    pub fn on_user_refresh(&mut self, len: usize) {
        self.table_state = TableState::default();
        self.set_cursor((len > 0).then_some(0));
        self.detail_scroll = 0;
        self.clear_requested = true;
    }

    /// Whether a full screen clear is pending; resets the request.
    pub fn take_clear_request(&mut self) -> bool {
        std::mem::take(&mut self.clear_requested)
    }

    /// Request a full screen clear without touching focus.
    pub fn request_clear(&mut self) {
        self.clear_requested = true;
    }

    pub fn move_up(&mut self, store: &AlertStore, by: usize) {
        if let Some(cursor) = self.cursor {
            self.on_focus_changed(store, cursor.saturating_sub(by));
        }
    }

    pub fn move_down(&mut self, store: &AlertStore, by: usize) {
        let last = match store.len() {
            0 => return,
            len => len - 1,
        };
        let target = self.cursor.map_or(0, |c| c.saturating_add(by).min(last));
        self.on_focus_changed(store, target);
    }

    pub fn first(&mut self, store: &AlertStore) {
        if !store.is_empty() {
            self.on_focus_changed(store, 0);
        }
    }

    pub fn last(&mut self, store: &AlertStore) {
        if let Some(last) = store.len().checked_sub(1) {
            self.on_focus_changed(store, last);
        }
    }

    pub fn scroll_detail_up(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_sub(1);
    }

    /// Scroll down, stopping at the last line of the focused detail.
    pub fn scroll_detail_down(&mut self, store: &AlertStore) {
        let lines = self.focused_detail(store).lines().count();
        let max = u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX);
        self.detail_scroll = self.detail_scroll.saturating_add(1).min(max);
    }

    /// Re-establish `cursor < len` (or `None` when empty).
    fn ensure_valid(&mut self, len: usize) {
        match self.cursor {
            None if len > 0 => self.set_cursor(Some(0)),
            Some(_) if len == 0 => self.set_cursor(None),
            Some(cursor) => {
                if let Err(e) = checked_focus(cursor, len) {
                    debug!(error = %e, "clamping focus");
                    self.set_cursor(Some(0));
                    self.detail_scroll = 0;
                }
            }
            None => {}
        }
    }

    fn set_cursor(&mut self, cursor: Option<usize>) {
        self.cursor = cursor;
        self.table_state.select(cursor);
    }
}

fn checked_focus(index: usize, len: usize) -> Result<usize, RenderError> {
    if index < len {
        Ok(index)
    } else {
        Err(RenderError::InvalidFocus { index, len })
    }
}
