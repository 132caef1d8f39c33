//! ANSI styles shared by diff previews and manifest output

use anstyle::{AnsiColor, Color, Style};

pub const ADDED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
pub const REMOVED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
pub const HUNK: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
pub const HEADER: Style = Style::new().bold();
pub const MARKER: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

/// Wrap `text` in `style` when `color` is set
pub fn paint(style: Style, text: &str, color: bool) -> String {
  if color {
    format!("{}{}{}", style.render(), text, style.render_reset())
  } else {
    text.to_string()
  }
}
