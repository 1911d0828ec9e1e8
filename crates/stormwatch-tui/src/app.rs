//! Main application state and logic for the stormwatch TUI.
//!
//! The `App` owns the alert store and the list view. Poll outcomes arrive
//! from the poller thread and are applied here, so every mutation of the
//! store and cursor happens on the UI thread between frames.

use std::io;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table, Wrap,
    },
};
use stormwatch_config::{SplitDirection, StormConfig};
use stormwatch_core::AlertStore;
use tracing::{debug, info};

use crate::alert_list::AlertListView;
use crate::event::{AppEvent, InputHandler};
use crate::notify::{Notifier, fire_and_forget};
use crate::poller::{PollKind, PollOutcome, PollerHandle};
use crate::theme::Palette;

/// Result type for app operations.
pub type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Target frame rate.
const TARGET_FPS: u64 = 30;
const FRAME_DURATION: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// Footer hint text.
pub const FOOTER_HINT: &str = " Q to exit - R to clear and refresh - Scroll Up to view new alerts";

/// Main application state.
pub struct App {
    store: AlertStore,
    list: AlertListView,
    palette: Palette,
    split: SplitDirection,
    weights: (u16, u16),
    notifier: Box<dyn Notifier>,
    poller: Option<PollerHandle>,
    input_handler: InputHandler,
    should_quit: bool,
    /// Dirty flag - whether UI needs redraw
    dirty: bool,
    /// Whether a snapshot has been applied yet
    loaded: bool,
    /// Time of the last successful fetch
    last_update: Option<DateTime<Local>>,
    /// Rows visible in the alert table, from the last draw
    page_size: usize,
}

impl App {
    /// Create an app with an empty store and no poller attached.
    pub fn new(config: &StormConfig, palette: Palette, notifier: Box<dyn Notifier>) -> Self {
        Self {
            store: AlertStore::new(),
            list: AlertListView::new(config.columns.clone(), config.focus_contents.clone()),
            palette,
            split: config.split,
            weights: config.weights,
            notifier,
            poller: None,
            input_handler: InputHandler::new(),
            should_quit: false,
            dirty: true,
            loaded: false,
            last_update: None,
            page_size: 10,
        }
    }

    /// Attach a running poller whose outcomes drive the store.
    pub fn with_poller(mut self, poller: PollerHandle) -> Self {
        self.poller = Some(poller);
        self
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    pub fn list(&self) -> &AlertListView {
        &self.list
    }

    /// Returns whether the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Mark the UI as dirty (needs redraw).
    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if UI needs redraw and clear the dirty flag.
    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Apply one poll cycle and return how many alerts were added by merge.
    ///
    /// A failed cycle leaves the store, cursor and footer untouched. The
    /// first successful snapshot replaces the list without notifying. A user
    /// refresh replaces the list too, but still announces ids it has never
    /// seen. Scheduled cycles diff, notify, and merge at the head.
    pub fn apply_poll_outcome(&mut self, outcome: PollOutcome) -> usize {
        let records = match outcome.result {
            Ok(records) => records,
            // Already logged by the poller
            Err(_) => return 0,
        };
        self.mark_dirty();
        self.last_update = Some(Local::now());

        if self.loaded && outcome.kind == PollKind::Scheduled {
            let batch = self.store.diff(&records);
            let added = batch.len();
            if added > 0 {
                info!(cycle = outcome.cycle, count = added, "new alerts");
                fire_and_forget(self.notifier.as_ref(), &batch);
                self.store.merge(batch);
                self.list.on_new_records(added, self.store.len());
            }
            return added;
        }

        if self.loaded {
            let unseen = self.store.diff(&records);
            if !unseen.is_empty() {
                info!(cycle = outcome.cycle, count = unseen.len(), "new alerts in refresh");
                fire_and_forget(self.notifier.as_ref(), &unseen);
            }
        }

        self.store.replace(&records);
        self.loaded = true;
        let len = self.store.len();
        self.list.on_user_refresh(len);
        if outcome.kind != PollKind::Refresh {
            // Startup draws onto a fresh screen already
            self.list.take_clear_request();
        }
        debug!(cycle = outcome.cycle, kind = ?outcome.kind, count = len, "alert list replaced");
        0
    }

    /// Drain every waiting poll outcome. Returns whether any arrived.
    pub fn poll_outcomes(&mut self) -> bool {
        let mut outcomes = Vec::new();
        if let Some(poller) = &self.poller {
            while let Some(outcome) = poller.try_recv() {
                outcomes.push(outcome);
            }
        }
        let any = !outcomes.is_empty();
        for outcome in outcomes {
            self.apply_poll_outcome(outcome);
        }
        any
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let event = self.input_handler.handle_key(key);
        self.handle_app_event(event);
    }

    /// Handle an app event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit | AppEvent::ForceQuit => {
                info!("quit requested");
                self.should_quit = true;
            }
            AppEvent::Refresh => match &self.poller {
                Some(poller) => {
                    debug!("user refresh requested");
                    poller.request_refresh();
                }
                None => debug!("no poller attached, refresh ignored"),
            },
            AppEvent::Redraw => self.list.request_clear(),
            AppEvent::ShowHelp | AppEvent::HideHelp => {}
            AppEvent::NavigateUp => self.list.move_up(&self.store, 1),
            AppEvent::NavigateDown => self.list.move_down(&self.store, 1),
            AppEvent::PageUp => self.list.move_up(&self.store, self.page_size),
            AppEvent::PageDown => self.list.move_down(&self.store, self.page_size),
            AppEvent::GoToTop => self.list.first(&self.store),
            AppEvent::GoToBottom => self.list.last(&self.store),
            AppEvent::DetailScrollUp => self.list.scroll_detail_up(),
            AppEvent::DetailScrollDown => self.list.scroll_detail_down(&self.store),
            AppEvent::None => return,
        }
        self.mark_dirty();
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        // Setup terminal
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(
            stdout,
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal);

        // Restore terminal
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }

        result
    }

    /// The inner event loop with frame-rate limiting.
    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> AppResult<()> {
        while !self.should_quit {
            let frame_start = Instant::now();

            self.poll_outcomes();

            if self.list.take_clear_request() {
                terminal.clear()?;
                self.mark_dirty();
            }

            if self.take_dirty() {
                terminal.draw(|frame| self.draw(frame))?;
            }

            let elapsed = frame_start.elapsed();
            let event_timeout = FRAME_DURATION
                .checked_sub(elapsed)
                .filter(|t| !t.is_zero())
                .unwrap_or(Duration::from_millis(10));

            if event::poll(event_timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
                    Event::Mouse(mouse) => {
                        let event = self.input_handler.handle_mouse(mouse);
                        self.handle_app_event(event);
                    }
                    Event::Resize(..) => self.mark_dirty(),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(self.palette.bg), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Panes
                Constraint::Length(1), // Footer
            ])
            .split(area);

        let direction = match self.split {
            SplitDirection::Horizontal => Direction::Horizontal,
            SplitDirection::Vertical => Direction::Vertical,
        };
        let panes = Layout::default()
            .direction(direction)
            .constraints([
                Constraint::Fill(self.weights.0),
                Constraint::Fill(self.weights.1),
            ])
            .split(chunks[0]);

        self.draw_alert_list(frame, panes[0]);
        self.draw_detail(frame, panes[1]);
        self.draw_footer(frame, chunks[1]);

        if self.input_handler.is_help_visible() {
            self.draw_help_overlay(frame, area);
        }
    }

    /// Draw the alert table: header row, one row per alert.
    fn draw_alert_list(&mut self, frame: &mut Frame, area: Rect) {
        let header = Row::new(self.list.header().into_iter().map(Cell::from)).style(self.palette.header);
        let rows: Vec<Row> = self
            .list
            .rows(&self.store)
            .into_iter()
            .map(|cells| Row::new(cells.into_iter().map(Cell::from)).style(self.palette.alert))
            .collect();
        let widths = vec![Constraint::Fill(1); self.list.columns().len()];

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(self.palette.alert_selected)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.palette.bg)
                    .title(format!(" Alerts ({}) ", self.store.len())),
            );

        // Borders and the header row
        self.page_size = usize::from(area.height.saturating_sub(3).max(1));
        frame.render_stateful_widget(table, area, self.list.table_state_mut());
    }

    /// Draw the detail pane for the focused alert.
    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let detail = self.list.focused_detail(&self.store);
        let line_count = detail.lines().count();
        let scroll = self.list.detail_scroll();

        let paragraph = Paragraph::new(detail)
            .style(self.palette.alert)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.palette.bg)
                    .title(" Alert Details "),
            );
        frame.render_widget(paragraph, area);

        let mut scrollbar_state = ScrollbarState::new(line_count).position(usize::from(scroll));
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }

    /// Draw the footer: key hints left, time of the last good fetch right.
    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let status = match self.last_update {
            Some(at) => format!("{} alerts, updated {} ", self.store.len(), at.format("%H:%M:%S")),
            None => "Loading alerts... ".to_string(),
        };

        let used = FOOTER_HINT.chars().count() + status.chars().count();
        let spacing = usize::from(area.width).saturating_sub(used);

        let footer = Paragraph::new(Line::from(vec![
            Span::raw(FOOTER_HINT),
            Span::raw(" ".repeat(spacing)),
            Span::raw(status),
        ]))
        .style(self.palette.header);

        frame.render_widget(footer, area);
    }

    /// Draw the help overlay.
    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let overlay_width = 50.min(area.width.saturating_sub(4));
        let overlay_height = 17.min(area.height.saturating_sub(2));
        let overlay_x = (area.width - overlay_width) / 2;
        let overlay_y = (area.height - overlay_height) / 2;
        let overlay_area = Rect::new(overlay_x, overlay_y, overlay_width, overlay_height);

        frame.render_widget(Clear, overlay_area);

        let help_text = "\
Alerts:
  ↑ k      Previous alert
  ↓ j      Next alert
  PgUp     Page up
  PgDn     Page down
  Home g   Newest alert
  End G    Oldest alert
  K / J    Scroll details

General:
  r        Clear and refresh
  Ctrl+L   Repaint screen
  ?  h     Show this help
  q        Quit

Press any key to close this help.";

        let help = Paragraph::new(help_text)
            .style(self.palette.alert)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.palette.header)
                    .title(Span::styled(" Help ", self.palette.header.add_modifier(Modifier::BOLD)))
                    .style(Style::default().bg(Color::Black)),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(help, overlay_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationError, NullNotifier};
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::{Arc, Mutex};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use stormwatch_core::{AlertField, AlertRecord};

    /// Records the size of every notified batch.
    struct RecordingNotifier(Arc<Mutex<Vec<usize>>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, batch: &[AlertRecord]) -> Result<(), NotificationError> {
            self.0.lock().unwrap().push(batch.len());
            Ok(())
        }
    }

    fn test_app() -> App {
        App::new(&StormConfig::default(), Palette::default(), Box::new(NullNotifier))
    }

    fn render_app(app: &mut App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn buffer_to_string(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut result = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                result.push(buffer[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            result.push('\n');
        }
        result
    }

    fn buffer_contains(buffer: &Buffer, text: &str) -> bool {
        buffer_to_string(buffer).contains(text)
    }

    fn outcome(cycle: u64, kind: PollKind, ids: &[&str]) -> PollOutcome {
        PollOutcome {
            cycle,
            kind,
            result: Ok(ids
                .iter()
                .map(|id| {
                    AlertRecord::new(*id, "Flood Watch")
                        .with_area(format!("County {id}"))
                        .with_description(format!("Details for {id}"))
                })
                .collect()),
            elapsed: Duration::from_millis(5),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_empty_app_renders_headers_and_footer() {
        let mut app = test_app();
        let buffer = render_app(&mut app, 160, 20);

        assert!(buffer_contains(&buffer, "Areadesc"));
        assert!(buffer_contains(&buffer, "Event"));
        assert!(buffer_contains(&buffer, "Certainty"));
        assert!(buffer_contains(&buffer, "Q to exit - R to clear and refresh"));
        assert!(buffer_contains(&buffer, "Loading alerts..."));
        assert_eq!(app.list().cursor(), None);
    }

    #[test]
    fn test_initial_snapshot_focuses_first_alert() {
        let mut app = test_app();
        let added = app.apply_poll_outcome(outcome(1, PollKind::Initial, &["A1", "B2"]));

        assert_eq!(added, 0);
        assert_eq!(app.store().len(), 2);
        assert_eq!(app.list().cursor(), Some(0));

        let buffer = render_app(&mut app, 160, 20);
        assert!(buffer_contains(&buffer, "County A1"));
        assert!(buffer_contains(&buffer, "Details for A1"));
        assert!(buffer_contains(&buffer, "2 alerts, updated"));
    }

    #[test]
    fn test_navigation_updates_detail_pane() {
        let mut app = test_app();
        app.apply_poll_outcome(outcome(1, PollKind::Initial, &["A1", "B2"]));

        app.handle_key_event(key(KeyCode::Down));
        assert_eq!(app.list().cursor(), Some(1));

        let buffer = render_app(&mut app, 160, 20);
        assert!(buffer_contains(&buffer, "Details for B2"));
        assert!(!buffer_contains(&buffer, "Details for A1"));
    }

    #[test]
    fn test_scheduled_cycle_merges_at_head_and_keeps_focus() {
        let mut app = test_app();
        app.apply_poll_outcome(outcome(1, PollKind::Initial, &["A1", "B2"]));
        app.handle_key_event(key(KeyCode::Down));

        let added = app.apply_poll_outcome(outcome(2, PollKind::Scheduled, &["N1", "A1", "B2"]));

        assert_eq!(added, 1);
        let ids: Vec<_> = app.store().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["N1", "A1", "B2"]);
        assert_eq!(app.list().cursor(), Some(2));
        assert_eq!(app.list().focused_record(app.store()).unwrap().id, "B2");
    }

    #[test]
    fn test_failed_cycle_leaves_store_alone() {
        let mut app = test_app();
        app.apply_poll_outcome(outcome(1, PollKind::Initial, &["A1"]));
        let updated_at = app.last_update;

        let failed = PollOutcome {
            cycle: 2,
            kind: PollKind::Scheduled,
            result: Err(stormwatch_fetch::FetchError::http_status(503, "down")),
            elapsed: Duration::from_millis(5),
        };
        assert_eq!(app.apply_poll_outcome(failed), 0);
        assert_eq!(app.store().len(), 1);
        assert_eq!(app.list().cursor(), Some(0));
        assert_eq!(app.last_update, updated_at);

        // Nothing on screen mentions the failure
        let buffer = render_app(&mut app, 160, 20);
        assert!(buffer_contains(&buffer, "1 alerts, updated"));
        assert!(!buffer_contains(&buffer, "503"));
        assert!(!buffer_contains(&buffer, "fail"));
    }

    #[test]
    fn test_refresh_announces_unseen_alerts() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut app = App::new(
            &StormConfig::default(),
            Palette::default(),
            Box::new(RecordingNotifier(calls.clone())),
        );

        app.apply_poll_outcome(outcome(1, PollKind::Initial, &["A1"]));
        app.apply_poll_outcome(outcome(2, PollKind::Refresh, &["B2", "A1"]));
        assert_eq!(*calls.lock().unwrap(), vec![1]);

        // B2 is known now, so the next cycle stays quiet
        assert_eq!(app.apply_poll_outcome(outcome(3, PollKind::Scheduled, &["B2", "A1"])), 0);
        assert_eq!(*calls.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_refresh_before_first_load_is_silent() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut app = App::new(
            &StormConfig::default(),
            Palette::default(),
            Box::new(RecordingNotifier(calls.clone())),
        );

        app.apply_poll_outcome(outcome(1, PollKind::Refresh, &["A1", "B2"]));
        assert_eq!(app.store().len(), 2);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_refresh_outcome_replaces_and_resets_focus() {
        let mut app = test_app();
        app.apply_poll_outcome(outcome(1, PollKind::Initial, &["A1", "B2", "C3"]));
        app.handle_key_event(key(KeyCode::End));
        assert_eq!(app.list().cursor(), Some(2));

        app.apply_poll_outcome(outcome(2, PollKind::Refresh, &["C3"]));

        let ids: Vec<_> = app.store().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["C3"]);
        assert_eq!(app.list().cursor(), Some(0));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = test_app();
        app.handle_key_event(key(KeyCode::Char('Q')));
        assert!(app.should_quit());

        let mut app = test_app();
        app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }

    #[test]
    fn test_custom_columns_and_vertical_split() {
        let config = StormConfig {
            columns: vec![AlertField::Headline, AlertField::Severity],
            split: SplitDirection::Vertical,
            ..Default::default()
        };
        let mut app = App::new(&config, Palette::default(), Box::new(NullNotifier));
        let buffer = render_app(&mut app, 80, 30);

        assert!(buffer_contains(&buffer, "Headline"));
        assert!(buffer_contains(&buffer, "Severity"));
        assert!(!buffer_contains(&buffer, "Areadesc"));
        assert!(buffer_contains(&buffer, "Alert Details"));
    }

    #[test]
    fn test_help_overlay_renders() {
        let mut app = test_app();
        app.handle_key_event(key(KeyCode::Char('?')));

        let buffer = render_app(&mut app, 120, 30);
        assert!(buffer_contains(&buffer, "Help"));
        assert!(buffer_contains(&buffer, "Clear and refresh"));

        app.handle_key_event(key(KeyCode::Esc));
        let buffer = render_app(&mut app, 120, 30);
        assert!(!buffer_contains(&buffer, "Clear and refresh"));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let mut app = test_app();
        app.apply_poll_outcome(outcome(1, PollKind::Initial, &["A1"]));
        render_app(&mut app, 20, 4);
    }
}
