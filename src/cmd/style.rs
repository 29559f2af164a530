use ansi_term::{Color, Style};
use once_cell::sync::Lazy;

use crate::tracker::parsing::Decor;

pub static GREEN: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Green));
pub static RED: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Red));
pub static YELLOW: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Yellow));
pub static BLUE: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Blue));

pub static BOLD: Lazy<Style> = Lazy::new(|| Style::new().bold());
pub static DIM: Lazy<Style> = Lazy::new(|| Style::new().fg(Color::Black).bold());

/// Folds a decoration list onto a single style, in order; `def` resets
/// everything accumulated so far.
pub fn combine(decors: &[Decor]) -> Style {
    decors.iter().fold(Style::new(), |style, decor| match decor {
        Decor::Bold => style.bold(),
        Decor::Inv => style.reverse(),
        Decor::Def => Style::new(),
        Decor::FgBlack => style.fg(Color::Black),
        Decor::FgRed => style.fg(Color::Red),
        Decor::FgGreen => style.fg(Color::Green),
        Decor::FgYellow => style.fg(Color::Yellow),
        Decor::FgBlue => style.fg(Color::Blue),
        Decor::FgMagenta => style.fg(Color::Purple),
        Decor::FgCyan => style.fg(Color::Cyan),
        Decor::FgWhite => style.fg(Color::White),
        Decor::BgBlack => style.on(Color::Black),
        Decor::BgRed => style.on(Color::Red),
        Decor::BgGreen => style.on(Color::Green),
        Decor::BgYellow => style.on(Color::Yellow),
        Decor::BgBlue => style.on(Color::Blue),
        Decor::BgMagenta => style.on(Color::Purple),
        Decor::BgCyan => style.on(Color::Cyan),
        Decor::BgWhite => style.on(Color::White),
    })
}

/// Paints `text` unless decorations are disabled.
pub fn paint(style: &Style, text: &str, enabled: bool) -> String {
    if enabled && *style != Style::default() {
        style.paint(text).to_string()
    } else {
        text.to_string()
    }
}
