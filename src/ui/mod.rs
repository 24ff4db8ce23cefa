mod browse;
mod help;
pub mod layout;
mod modal;
mod notice;

use crate::app::App;
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

/// Top-level render dispatch.
pub fn render(app: &App, frame: &mut Frame) {
    let screen = layout::screen(app, frame.area());
    browse::render(app, frame, &screen);

    if app.modal.is_open() {
        modal::render(app, frame);
    }
    if let Some(message) = &app.notice {
        notice::render(frame, message);
    }
    // Render help overlay on top if active
    if app.show_help {
        help::render(frame);
    }
}

/// Truncate a string to `max_width` terminal columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    let width: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        result.push(c);
    }
    result.push('…');
    result
}
