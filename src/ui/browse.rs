use super::layout::{CardLayout, ScreenLayout, SectionLayout};
use super::truncate_str;
use crate::app::{App, InputMode, NavDirection, Section};
use crate::view::{CardAction, CardView, PosterState};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn render(app: &App, frame: &mut Frame, screen: &ScreenLayout) {
    render_search_bar(app, frame, screen);

    for section in &screen.sections {
        render_section(app, frame, section);
    }

    if let Some(area) = screen.scroll_top {
        let control = Paragraph::new(" ↑ Top ")
            .style(Style::default().bg(Color::Cyan).fg(Color::Black))
            .alignment(Alignment::Center);
        frame.render_widget(control, area);
    }

    render_status_bar(app, frame, screen.status);
}

fn render_search_bar(app: &App, frame: &mut Frame, screen: &ScreenLayout) {
    let input_style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default().fg(Color::DarkGray),
    };
    let label = if app.input_mode == InputMode::Editing {
        " 🔍 "
    } else {
        " 🔍 (/) "
    };
    let input = Paragraph::new(format!("{}{}", label, app.search_input))
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(input_style)
                .title(" Cinema Explorer · Search movies "),
        );
    frame.render_widget(input, screen.search_input);

    // Set cursor position when editing
    if app.input_mode == InputMode::Editing {
        let label_width = unicode_width::UnicodeWidthStr::width(label) as u16;
        let typed = unicode_width::UnicodeWidthStr::width(app.search_input.as_str()) as u16;
        let cursor_x = (screen.search_input.x + 1 + label_width + typed)
            .min(screen.search_input.right().saturating_sub(2));
        frame.set_cursor_position((cursor_x, screen.search_input.y + 1));
    }

    let button = |text: &'static str, color: Color| {
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
    };
    frame.render_widget(button("Search", Color::Cyan), screen.search_button);
    frame.render_widget(button("Clear", Color::Red), screen.clear_button);
}

fn render_section(app: &App, frame: &mut Frame, layout: &SectionLayout) {
    let section = &app.sections[layout.index];
    let focused = app.focused == layout.index && !app.modal.is_open();
    let border = if focused { Color::Cyan } else { Color::DarkGray };

    let count = section.cards().len();
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", section.id.title()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            if count > 0 { format!("({}) ", count) } else { String::new() },
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
        .title_bottom(Line::from(scroll_info(app, section)).alignment(Alignment::Right));
    let inner = block.inner(layout.area);
    frame.render_widget(block, layout.area);

    let cards = section.cards();
    if let Some(message) = section.message() {
        let text = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true });
        frame.render_widget(text, centered_line(inner));
    } else if cards.is_empty() {
        let text = Paragraph::new("No movies available right now.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(text, centered_line(inner));
    } else {
        if let Some(area) = layout.prev {
            render_nav(frame, area, NavDirection::Prev, section.scroll.target > 0);
        }
        if let Some(area) = layout.next {
            let more = section.scroll.target < section.max_offset(app.cards_per_row());
            render_nav(frame, area, NavDirection::Next, more);
        }
        for card_layout in &layout.cards {
            if let Some(card) = cards.get(card_layout.index) {
                let selected = focused && section.selected == card_layout.index;
                render_card(frame, card_layout, card, selected);
            }
        }
    }
}

fn scroll_info(app: &App, section: &Section) -> String {
    let count = section.cards().len();
    if count == 0 {
        return String::new();
    }
    let range = section.visible_range(app.cards_per_row());
    format!(" {}-{} of {} ", range.start + 1, range.end, count)
}

fn centered_line(area: Rect) -> Rect {
    let y = area.y + area.height / 2;
    Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1.min(area.height))
}

fn render_nav(frame: &mut Frame, area: Rect, direction: NavDirection, enabled: bool) {
    let style = if enabled {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let glyph = Paragraph::new(direction.glyph())
        .alignment(Alignment::Center)
        .style(style);
    frame.render_widget(glyph, centered_line(area));
}

fn render_card(frame: &mut Frame, layout: &CardLayout, card: &CardView, selected: bool) {
    let border = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default().borders(Borders::ALL).border_style(border);
    let inner = block.inner(layout.area);
    frame.render_widget(block, layout.area);

    // title(1) + poster(1) + release(1) + rating(1) + synopsis(min) + actions(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);
    let width = inner.width as usize;

    let title = Paragraph::new(truncate_str(&card.title, width)).style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(title, chunks[0]);

    let poster_color = match card.poster.state {
        PosterState::Loaded => Color::Green,
        PosterState::Pending => Color::DarkGray,
        PosterState::Fallback => Color::Red,
    };
    frame.render_widget(
        Paragraph::new(truncate_str(&card.poster.caption(), width))
            .style(Style::default().fg(poster_color)),
        chunks[1],
    );

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Release: ", Style::default().fg(Color::DarkGray)),
            Span::raw(truncate_str(&card.release, width.saturating_sub(9))),
        ])),
        chunks[2],
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Rating: ", Style::default().fg(Color::DarkGray)),
            Span::styled(&card.rating, Style::default().fg(Color::Yellow)),
        ])),
        chunks[3],
    );

    let synopsis = Paragraph::new(card.synopsis.as_str())
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    frame.render_widget(synopsis, chunks[4]);

    for (action, rect) in &layout.actions {
        let style = match action {
            CardAction::MoreInfo => Style::default().fg(Color::Cyan),
            CardAction::Favorite => Style::default().fg(Color::Red),
            CardAction::WatchLater => Style::default().fg(Color::Magenta),
        };
        let rect = rect.intersection(layout.area);
        if rect.area() > 0 {
            frame.render_widget(Paragraph::new(action.icon()).style(style), rect);
        }
    }
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    };
    let mut spans = vec![
        key(" ←→"),
        Span::raw(" Select  "),
        key("[ ]"),
        Span::raw(" Page  "),
        key("↑↓"),
        Span::raw(" Rows  "),
        key("Enter"),
        Span::raw(" Details  "),
    ];
    for action in CardAction::ALL {
        spans.push(Span::styled(
            action.key().to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {}  ", action.tooltip())));
    }
    if app.is_searching() {
        spans.push(key("c"));
        spans.push(Span::raw(" Clear  "));
    } else {
        spans.push(key("/"));
        spans.push(Span::raw(" Search  "));
    }
    spans.push(key("?"));
    spans.push(Span::raw(" Help  "));
    spans.push(Span::styled(
        &app.status_msg,
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
