use super::layout::centered_rect;
use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const GROUPS: &[(&str, &[(&str, &str)])] = &[
    (
        "Browsing",
        &[
            ("?", "Toggle this help"),
            ("q", "Quit"),
            ("↑/↓", "Move between rows"),
            ("←/→", "Select card in row"),
            ("[ ]", "Scroll row by one page"),
            ("g", "Back to top"),
            ("Enter / i", "More info on selected movie"),
            ("f", "Add to favorites"),
            ("w", "Add to watch later"),
        ],
    ),
    (
        "Search",
        &[
            ("/", "Focus search box"),
            ("Enter", "Run search"),
            ("Esc", "Leave search box"),
            ("c", "Clear search and restore rows"),
        ],
    ),
    (
        "Movie details",
        &[
            ("Esc / x", "Close"),
            ("j/k", "Scroll"),
            ("t", "Open trailer in browser"),
            ("p", "Open poster in browser"),
        ],
    ),
];

pub fn render(frame: &mut Frame) {
    let area = centered_rect(60, 80, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    for (group, bindings) in GROUPS {
        lines.push(Line::from(Span::styled(
            format!("  {}", group),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for (keys, action) in *bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("    {:<12}", keys), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "  Mouse: click cards, icons, ❮ ❯ and ↑ Top",
        Style::default().fg(Color::DarkGray),
    )));

    let help = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Keybindings ")
                .title_bottom(
                    Line::from(" Press ? or Esc to close ").style(Style::default().fg(Color::DarkGray)),
                ),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(help, area);
}
