use super::layout::{modal_area, modal_close};
use crate::app::{App, DetailState};
use crate::view::{DETAILS_ERROR, DetailView, PosterState};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Width of the label column in the details table.
const FACT_LABEL_WIDTH: usize = 19;

pub fn render(app: &App, frame: &mut Frame) {
    let area = modal_area(frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Movie Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new("[×]").style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        modal_close(area),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    match &app.modal.state {
        DetailState::Idle => {}
        DetailState::Loading { title, .. } => {
            let text = match title {
                Some(title) => format!("Loading {}…", title),
                None => "Loading…".to_string(),
            };
            render_centered(frame, chunks[0], text, Color::Yellow);
            render_footer(frame, chunks[1], false);
        }
        DetailState::Failed => {
            render_centered(frame, chunks[0], DETAILS_ERROR.to_string(), Color::Red);
            render_footer(frame, chunks[1], false);
        }
        DetailState::Loaded(view) => {
            let body = Paragraph::new(detail_lines(view))
                .wrap(Wrap { trim: false })
                .scroll((app.modal.scroll, 0));
            frame.render_widget(body, chunks[0]);
            render_footer(frame, chunks[1], view.trailer.is_some());
        }
    }
}

fn render_centered(frame: &mut Frame, area: Rect, text: String, color: Color) {
    let y = area.y + area.height / 2;
    let line = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1.min(area.height));
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color)),
        line,
    );
}

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

fn detail_lines(view: &DetailView) -> Vec<Line<'_>> {
    let dim = Style::default().fg(Color::DarkGray);
    let poster_style = match view.poster.state {
        PosterState::Loaded => Style::default().fg(Color::Green),
        PosterState::Pending => dim,
        PosterState::Fallback => Style::default().fg(Color::Red),
    };

    let mut poster = vec![Span::styled(view.poster.caption(), poster_style)];
    if !view.poster.is_placeholder() {
        poster.push(Span::styled(format!("  {}", view.poster.src), dim));
    }
    let mut lines = vec![
        Line::from(poster),
        Line::from(""),
        Line::from(Span::styled(
            view.title.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(original) = &view.original_title {
        lines.push(Line::from(vec![
            Span::styled("Original title: ", dim),
            Span::styled(original.as_str(), Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::from(vec![
        Span::raw(view.release.as_str()),
        Span::styled(" • ", dim),
        Span::raw(view.runtime.as_str()),
        Span::styled(" • ", dim),
        Span::raw(view.genres.as_str()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("★ ", Style::default().fg(Color::Yellow)),
        Span::styled(
            view.rating.as_str(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    lines.push(Line::from(""));
    lines.push(heading("Synopsis"));
    lines.push(Line::from(view.overview.as_str()));

    lines.push(Line::from(""));
    lines.push(heading("Details"));
    for (label, value) in &view.facts {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<width$}", label, width = FACT_LABEL_WIDTH),
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            ),
            Span::raw(value.as_str()),
        ]));
    }

    if let Some(trailer) = &view.trailer {
        lines.push(Line::from(""));
        lines.push(heading("Trailer"));
        lines.push(Line::from(Span::styled(
            trailer.embed_url(),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }
    lines
}

fn render_footer(frame: &mut Frame, area: Rect, has_trailer: bool) {
    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    };
    let mut spans = vec![key(" Esc"), Span::raw(" Close  "), key("j/k"), Span::raw(" Scroll  ")];
    if has_trailer {
        spans.push(key("t"));
        spans.push(Span::raw(" Watch trailer  "));
    }
    spans.push(key("p"));
    spans.push(Span::raw(" Open poster"));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
