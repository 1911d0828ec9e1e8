//! Terminal UI for stormwatch.
//!
//! A two-pane Ratatui interface over the active-alert feed: the alert list on
//! one side, details of the focused alert on the other. A background poller
//! fetches snapshots; new alerts are merged at the top of the list without
//! moving the focused row.
//!
//! ## Hotkeys
//!
//! - `q` - Quit
//! - `r` - Clear the list and refetch
//! - `↑`/`↓` or `k`/`j` - Move focus
//! - `PgUp`/`PgDn` - Page
//! - `Home`/`End` or `g`/`G` - Newest/oldest alert
//! - `K`/`J` - Scroll the detail pane
//! - `?` or `h` - Help

pub mod alert_list;
pub mod app;
pub mod event;
pub mod notify;
pub mod poller;
pub mod theme;


pub use alert_list::{AlertListView, RenderError};
pub use app::{App, AppResult};
pub use notify::{NotificationError, Notifier, notifier_from_config};
pub use poller::{PollCommand, PollKind, PollOutcome, PollSettings, PollerHandle, run_poll_loop};
pub use theme::{Palette, ThemeError};
