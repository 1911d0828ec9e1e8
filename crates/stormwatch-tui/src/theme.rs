//! Color palette for the stormwatch TUI.
//!
//! Colors are configured with the classic 16-color terminal names
//! (`"dark blue"`, `"light gray"`, `"brown"`, ...) plus `"default"` for the
//! terminal's own color. A foreground spec may carry comma-separated
//! attributes: `"white, bold"`. `#rrggbb` is accepted as well.

use ratatui::style::{Color, Modifier, Style};
use stormwatch_config::{ColorSpec, PaletteConfig};
use thiserror::Error;

/// Errors parsing palette entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    #[error("Unknown color '{name}' for palette role '{role}'")]
    UnknownColor { role: String, name: String },

    #[error("Unknown attribute '{name}' for palette role '{role}'")]
    UnknownAttribute { role: String, name: String },
}

/// Resolved styles for each palette role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Screen background and pane borders
    pub bg: Style,
    /// Unselected alert rows
    pub alert: Style,
    /// The focused alert row
    pub alert_selected: Style,
    /// Column header row and footer
    pub header: Style,
}

impl Palette {
    /// Resolve a palette from configuration.
    pub fn from_config(config: &PaletteConfig) -> Result<Self, ThemeError> {
        Ok(Self {
            bg: resolve("bg", &config.bg)?,
            alert: resolve("alert", &config.alert)?,
            alert_selected: resolve("alert_selected", &config.alert_selected)?,
            header: resolve("header", &config.header)?,
        })
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            bg: Style::default().fg(Color::White),
            alert: Style::default(),
            alert_selected: Style::default().fg(Color::Blue).bg(Color::White),
            header: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        }
    }
}

fn resolve(role: &str, spec: &ColorSpec) -> Result<Style, ThemeError> {
    let (fg, modifiers) = parse_color_spec(role, &spec.fg)?;
    let (bg, bg_modifiers) = parse_color_spec(role, &spec.bg)?;

    let mut style = Style::default().add_modifier(modifiers | bg_modifiers);
    if let Some(fg) = fg {
        style = style.fg(fg);
    }
    if let Some(bg) = bg {
        style = style.bg(bg);
    }
    Ok(style)
}

/// Parse `"<color>[, <attr>...]"`. `None` means the terminal default.
pub fn parse_color_spec(role: &str, spec: &str) -> Result<(Option<Color>, Modifier), ThemeError> {
    let mut color = None;
    let mut modifiers = Modifier::empty();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let lower = part.to_lowercase();
        if let Some(m) = parse_attribute(&lower) {
            modifiers |= m;
            continue;
        }
        match parse_color(&lower) {
            Some(c) => color = c,
            // Anything after the color must be an attribute
            None if color.is_some() => {
                return Err(ThemeError::UnknownAttribute {
                    role: role.to_string(),
                    name: part.to_string(),
                });
            }
            None => {
                return Err(ThemeError::UnknownColor {
                    role: role.to_string(),
                    name: part.to_string(),
                });
            }
        }
    }

    Ok((color, modifiers))
}

fn parse_attribute(name: &str) -> Option<Modifier> {
    match name {
        "bold" => Some(Modifier::BOLD),
        "underline" => Some(Modifier::UNDERLINED),
        "italics" | "italic" => Some(Modifier::ITALIC),
        "standout" | "reverse" => Some(Modifier::REVERSED),
        "blink" => Some(Modifier::SLOW_BLINK),
        _ => None,
    }
}

/// `Some(None)` is the terminal default color.
fn parse_color(name: &str) -> Option<Option<Color>> {
    let color = match name {
        "default" => return Some(None),
        "black" => Color::Black,
        "dark red" => Color::Red,
        "dark green" => Color::Green,
        "brown" => Color::Yellow,
        "dark blue" => Color::Blue,
        "dark magenta" => Color::Magenta,
        "dark cyan" => Color::Cyan,
        "light gray" | "light grey" => Color::Gray,
        "dark gray" | "dark grey" => Color::DarkGray,
        "light red" => Color::LightRed,
        "light green" => Color::LightGreen,
        "yellow" => Color::LightYellow,
        "light blue" => Color::LightBlue,
        "light magenta" => Color::LightMagenta,
        "light cyan" => Color::LightCyan,
        "white" => Color::White,
        hex if hex.starts_with('#') && hex.len() == 7 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Color::Rgb(channel(1)?, channel(3)?, channel(5)?)
        }
        _ => return None,
    };
    Some(Some(color))
}
