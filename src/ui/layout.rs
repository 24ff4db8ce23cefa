//! Screen geometry shared by drawing and mouse hit-testing.

use crate::app::{
    App, CARD_COLUMNS, CHROME_ROWS, NAV_COLUMNS, NavDirection, SECTION_ROWS, SectionContent,
};
use crate::view::{CardAction, CardTarget};
use ratatui::layout::{Constraint, Direction, Layout, Rect};

const SEARCH_BUTTON_COLUMNS: u16 = 10;
const CLEAR_BUTTON_COLUMNS: u16 = 9;
const SCROLL_TOP_COLUMNS: u16 = 9;
/// Columns taken by one action icon, spacing included.
const ACTION_COLUMNS: u16 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLayout {
    pub index: usize,
    pub area: Rect,
    pub actions: [(CardAction, Rect); 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLayout {
    pub index: usize,
    pub area: Rect,
    pub prev: Option<Rect>,
    pub next: Option<Rect>,
    pub cards: Vec<CardLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLayout {
    pub search_input: Rect,
    pub search_button: Rect,
    pub clear_button: Rect,
    pub rows: Rect,
    pub sections: Vec<SectionLayout>,
    pub scroll_top: Option<Rect>,
    pub status: Rect,
}

/// What a click at a screen position lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    SearchInput,
    SearchButton,
    ClearButton,
    ScrollTop,
    Nav {
        section: usize,
        direction: NavDirection,
    },
    Card {
        section: usize,
        card: usize,
        target: CardTarget,
    },
    Nothing,
}

/// Where a click lands relative to the details modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalHit {
    Close,
    Inside,
    Outside,
}

pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

pub fn screen(app: &App, area: Rect) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(CHROME_ROWS - 1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let bar = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(SEARCH_BUTTON_COLUMNS),
            Constraint::Length(CLEAR_BUTTON_COLUMNS),
        ])
        .split(chunks[0]);

    let rows = chunks[1];
    let sections = section_layouts(app, rows);

    let scroll_top = app.show_scroll_top().then(|| {
        let width = SCROLL_TOP_COLUMNS.min(rows.width);
        Rect::new(rows.right() - width, rows.bottom().saturating_sub(1), width, 1)
    });

    ScreenLayout {
        search_input: bar[0],
        search_button: bar[1],
        clear_button: bar[2],
        rows,
        sections,
        scroll_top,
        status: chunks[2],
    }
}

fn section_layouts(app: &App, rows: Rect) -> Vec<SectionLayout> {
    let per_row = app.cards_per_row();

    let mut out = Vec::new();
    let mut y = rows.y;
    for index in app.on_screen_sections() {
        if y >= rows.bottom() || (y + SECTION_ROWS > rows.bottom() && !out.is_empty()) {
            break;
        }
        let height = SECTION_ROWS.min(rows.bottom() - y);
        let area = Rect::new(rows.x, y, rows.width, height);
        out.push(section_layout(app, index, area, per_row));
        y += SECTION_ROWS;
    }
    out
}

fn section_layout(app: &App, index: usize, area: Rect, per_row: usize) -> SectionLayout {
    let section = &app.sections[index];
    let inner = Rect::new(
        area.x + 1,
        area.y + 1,
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    );

    let has_cards = matches!(&section.content, SectionContent::Cards(c) if !c.is_empty());
    let has_nav = has_cards && !section.nav_controls.is_empty() && inner.width > 2 * NAV_COLUMNS;
    let (prev, next) = if has_nav {
        (
            Some(Rect::new(inner.x, inner.y, NAV_COLUMNS, inner.height)),
            Some(Rect::new(
                inner.right() - NAV_COLUMNS,
                inner.y,
                NAV_COLUMNS,
                inner.height,
            )),
        )
    } else {
        (None, None)
    };

    let cards_x = inner.x + NAV_COLUMNS;
    let cards_width = inner.width.saturating_sub(2 * NAV_COLUMNS);
    let mut cards = Vec::new();
    if has_cards {
        for (slot, card_index) in section.visible_range(per_row).enumerate() {
            let x = cards_x + slot as u16 * CARD_COLUMNS;
            if x + CARD_COLUMNS > cards_x + cards_width {
                break;
            }
            let card_area = Rect::new(x, inner.y, CARD_COLUMNS, inner.height);
            cards.push(CardLayout {
                index: card_index,
                area: card_area,
                actions: action_rects(card_area),
            });
        }
    }

    SectionLayout {
        index,
        area,
        prev,
        next,
        cards,
    }
}

/// Icons sit on the last row inside the card border.
fn action_rects(card: Rect) -> [(CardAction, Rect); 3] {
    let y = card.bottom().saturating_sub(2);
    CardAction::ALL.map(|action| {
        let slot = CardAction::ALL
            .iter()
            .position(|a| *a == action)
            .unwrap_or(0) as u16;
        (action, Rect::new(card.x + 2 + slot * ACTION_COLUMNS, y, 2, 1))
    })
}

pub fn hit_test(layout: &ScreenLayout, column: u16, row: u16) -> Hit {
    if contains(layout.search_button, column, row) {
        return Hit::SearchButton;
    }
    if contains(layout.clear_button, column, row) {
        return Hit::ClearButton;
    }
    if contains(layout.search_input, column, row) {
        return Hit::SearchInput;
    }
    if let Some(rect) = layout.scroll_top {
        if contains(rect, column, row) {
            return Hit::ScrollTop;
        }
    }

    for section in &layout.sections {
        if !contains(section.area, column, row) {
            continue;
        }
        if section.prev.is_some_and(|r| contains(r, column, row)) {
            return Hit::Nav {
                section: section.index,
                direction: NavDirection::Prev,
            };
        }
        if section.next.is_some_and(|r| contains(r, column, row)) {
            return Hit::Nav {
                section: section.index,
                direction: NavDirection::Next,
            };
        }
        for card in &section.cards {
            if !contains(card.area, column, row) {
                continue;
            }
            // Affordances take the click before the card body does.
            let target = card
                .actions
                .iter()
                .find(|(_, rect)| contains(*rect, column, row))
                .map(|(action, _)| CardTarget::Action(*action))
                .unwrap_or(CardTarget::Body);
            return Hit::Card {
                section: section.index,
                card: card.index,
                target,
            };
        }
    }
    Hit::Nothing
}

/// Create a centered rectangle using percentage of parent area.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

pub fn modal_area(area: Rect) -> Rect {
    centered_rect(80, 86, area)
}

/// The `[×]` control on the modal's top border.
pub fn modal_close(modal: Rect) -> Rect {
    Rect::new(modal.right().saturating_sub(5), modal.y, 3, 1)
}

pub fn modal_hit(area: Rect, column: u16, row: u16) -> ModalHit {
    let modal = modal_area(area);
    if contains(modal_close(modal), column, row) {
        ModalHit::Close
    } else if contains(modal, column, row) {
        ModalHit::Inside
    } else {
        ModalHit::Outside
    }
}

pub fn notice_area(area: Rect) -> Rect {
    centered_rect(50, 24, area)
}
