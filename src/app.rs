use crate::catalog::{CatalogApi, CatalogError, Category, MovieDetail, MovieSummary};
use crate::view::{
    CardCommand, CardTarget, CardView, DetailView, PosterState, no_results_message,
    searching_message,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Horizontal scroll units taken by one card.
pub const CARD_UNITS: u32 = 200;
/// Distance covered by one activation of a nav control.
pub const SCROLL_STEP: i32 = 800;
/// Terminal columns taken by one card.
pub const CARD_COLUMNS: u16 = 30;
pub const NAV_COLUMNS: u16 = 3;
/// Rows taken by one section, borders included.
pub const SECTION_ROWS: u16 = 14;
/// Search bar (3) + status bar (1).
pub const CHROME_ROWS: u16 = 4;
/// Page scroll (in rows) past which the scroll-to-top control appears.
pub const SCROLL_TOP_THRESHOLD: u16 = SECTION_ROWS;

/// Which row a section is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Category(Category),
    SearchResults,
}

impl SectionId {
    pub fn title(self) -> &'static str {
        match self {
            Self::Category(c) => c.label(),
            Self::SearchResults => "Search Results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Prev,
    Next,
}

impl NavDirection {
    pub fn delta(self) -> i32 {
        match self {
            Self::Prev => -SCROLL_STEP,
            Self::Next => SCROLL_STEP,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Prev => "❮",
            Self::Next => "❯",
        }
    }
}

/// What a section currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Cards(Vec<CardView>),
    Message(String),
}

/// Smoothly animated horizontal offset, in card units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HorizontalScroll {
    pub offset: u32,
    pub target: u32,
}

impl HorizontalScroll {
    pub fn scroll_by(&mut self, delta: i32, max: u32) {
        let target = self.target as i64 + delta as i64;
        self.target = target.clamp(0, max as i64) as u32;
    }

    pub fn jump_to(&mut self, target: u32) {
        self.target = target;
    }

    /// Advance one animation frame. Returns true while still moving.
    pub fn tick(&mut self) -> bool {
        if !self.is_animating() {
            return false;
        }
        let distance = self.offset.abs_diff(self.target);
        let step = (distance / 2).max(CARD_UNITS / 2).min(distance);
        if self.offset < self.target {
            self.offset += step;
        } else {
            self.offset -= step;
        }
        self.offset != self.target
    }

    pub fn is_animating(&self) -> bool {
        self.offset != self.target
    }
}

/// One horizontally scrollable row of cards.
#[derive(Debug, Clone)]
pub struct Section {
    pub id: SectionId,
    pub content: SectionContent,
    pub nav_controls: Vec<NavDirection>,
    pub visible: bool,
    pub scroll: HorizontalScroll,
    pub selected: usize,
}

impl Section {
    pub fn new(id: SectionId, visible: bool) -> Self {
        Self {
            id,
            content: SectionContent::Cards(Vec::new()),
            nav_controls: Vec::new(),
            visible,
            scroll: HorizontalScroll::default(),
            selected: 0,
        }
    }

    /// Replace the content with one card per movie, in order.
    pub fn render(&mut self, movies: &[MovieSummary], date_format: &str) {
        self.clear();
        self.install_nav_controls();
        self.content = SectionContent::Cards(
            movies
                .iter()
                .map(|m| CardView::from_summary(m, date_format))
                .collect(),
        );
    }

    pub fn show_message(&mut self, message: String) {
        self.clear();
        self.content = SectionContent::Message(message);
    }

    fn clear(&mut self) {
        self.content = SectionContent::Cards(Vec::new());
        self.scroll = HorizontalScroll::default();
        self.selected = 0;
    }

    /// Controls are installed once per section; re-rendering keeps them.
    fn install_nav_controls(&mut self) {
        if self.nav_controls.is_empty() {
            self.nav_controls = vec![NavDirection::Prev, NavDirection::Next];
        }
    }

    pub fn cards(&self) -> &[CardView] {
        match &self.content {
            SectionContent::Cards(cards) => cards,
            SectionContent::Message(_) => &[],
        }
    }

    fn cards_mut(&mut self) -> &mut [CardView] {
        match &mut self.content {
            SectionContent::Cards(cards) => cards,
            SectionContent::Message(_) => &mut [],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.content {
            SectionContent::Message(m) => Some(m),
            SectionContent::Cards(_) => None,
        }
    }

    pub fn max_offset(&self, visible_cards: usize) -> u32 {
        self.cards().len().saturating_sub(visible_cards) as u32 * CARD_UNITS
    }

    /// Index of the left-most card currently drawn.
    pub fn first_visible(&self) -> usize {
        (self.scroll.offset / CARD_UNITS) as usize
    }

    /// Cards inside the window the row is scrolling towards.
    pub fn visible_range(&self, visible_cards: usize) -> std::ops::Range<usize> {
        let start = self.first_visible().min(self.cards().len());
        let end = (start + visible_cards).min(self.cards().len());
        start..end
    }

    /// Activate one of the nav controls.
    pub fn page(&mut self, direction: NavDirection, visible_cards: usize) {
        let max = self.max_offset(visible_cards);
        self.scroll.scroll_by(direction.delta(), max);
        if !self.cards().is_empty() {
            let first = (self.scroll.target / CARD_UNITS) as usize;
            self.selected = first.min(self.cards().len() - 1);
        }
    }

    pub fn select_next(&mut self, visible_cards: usize) {
        if self.selected + 1 < self.cards().len() {
            self.selected += 1;
            self.keep_selected_in_view(visible_cards);
        }
    }

    pub fn select_prev(&mut self, visible_cards: usize) {
        if self.selected > 0 {
            self.selected -= 1;
            self.keep_selected_in_view(visible_cards);
        }
    }

    fn keep_selected_in_view(&mut self, visible_cards: usize) {
        let visible_cards = visible_cards.max(1);
        let first = (self.scroll.target / CARD_UNITS) as usize;
        if self.selected < first {
            self.scroll.jump_to(self.selected as u32 * CARD_UNITS);
        } else if self.selected >= first + visible_cards {
            self.scroll
                .jump_to((self.selected + 1 - visible_cards) as u32 * CARD_UNITS);
        }
    }
}

/// Input mode for the search bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Details modal lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Idle,
    Loading { id: i64, title: Option<String> },
    Loaded(Box<DetailView>),
    Failed,
}

/// The details overlay. Built once at startup and reused for every movie.
#[derive(Debug)]
pub struct Modal {
    pub state: DetailState,
    pub scroll: u16,
    request: u64,
    task: Option<JoinHandle<()>>,
}

impl Modal {
    pub fn new() -> Self {
        Self {
            state: DetailState::Idle,
            scroll: 0,
            request: 0,
            task: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state != DetailState::Idle
    }

    #[cfg(test)]
    pub fn request(&self) -> u64 {
        self.request
    }

    fn begin(&mut self, id: i64, title: Option<String>) -> u64 {
        self.abort();
        self.request += 1;
        self.scroll = 0;
        self.state = DetailState::Loading { id, title };
        self.request
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn close(&mut self) {
        self.abort();
        self.state = DetailState::Idle;
        self.scroll = 0;
    }

    /// Apply a fetch result. Results for a closed modal or a superseded
    /// request are dropped; returns whether the result was applied.
    fn accept(
        &mut self,
        request: u64,
        result: Result<MovieDetail, CatalogError>,
        date_format: &str,
    ) -> bool {
        let DetailState::Loading { id, .. } = self.state else {
            return false;
        };
        if request != self.request {
            return false;
        }
        self.task = None;
        self.state = match result {
            Ok(detail) => DetailState::Loaded(Box::new(DetailView::from_detail(&detail, date_format))),
            Err(e) => {
                error!(id, error = %e, "movie details unavailable");
                DetailState::Failed
            }
        };
        true
    }

    pub fn detail(&self) -> Option<&DetailView> {
        match &self.state {
            DetailState::Loaded(view) => Some(view),
            _ => None,
        }
    }
}

impl Default for Modal {
    fn default() -> Self {
        Self::new()
    }
}

/// Results delivered back to the UI loop by background tasks.
#[derive(Debug)]
pub enum AppEvent {
    DetailLoaded {
        request: u64,
        result: Result<MovieDetail, CatalogError>,
    },
    PosterChecked {
        url: String,
        ok: bool,
    },
    SearchLoaded {
        request: u64,
        query: String,
        results: Vec<MovieSummary>,
    },
}

/// Main application state.
pub struct App {
    pub catalog: Arc<dyn CatalogApi>,
    pub date_format: String,
    pub should_quit: bool,
    pub show_help: bool,

    /// The four category rows followed by the search results row.
    pub sections: Vec<Section>,
    pub focused: usize,
    /// Vertical page scroll, in rows.
    pub page_scroll: u16,
    pub viewport: (u16, u16),

    /// Every movie loaded at startup, in category order.
    pub all_movies: Vec<MovieSummary>,

    pub search_input: String,
    pub input_mode: InputMode,

    pub modal: Modal,
    /// Acknowledgement popup, dismissed by any key.
    pub notice: Option<String>,

    pub status_msg: String,

    posters_in_flight: HashSet<String>,
    search_request: u64,
    search_task: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(catalog: Arc<dyn CatalogApi>, date_format: String) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut sections: Vec<Section> = Category::ALL
            .iter()
            .map(|c| Section::new(SectionId::Category(*c), true))
            .collect();
        sections.push(Section::new(SectionId::SearchResults, false));

        Self {
            catalog,
            date_format,
            should_quit: false,
            show_help: false,

            sections,
            focused: 0,
            page_scroll: 0,
            viewport: (120, 40), // Updated on first resize

            all_movies: Vec::new(),

            search_input: String::new(),
            input_mode: InputMode::Normal,

            modal: Modal::new(),
            notice: None,

            status_msg: "Loading catalog...".to_string(),

            posters_in_flight: HashSet::new(),
            search_request: 0,
            search_task: None,
            events_tx,
            events_rx,
        }
    }

    /// Initial data load: the four categories, one after another.
    pub async fn init(&mut self) {
        let mut all_movies = Vec::new();
        for category in Category::ALL {
            let movies = self.catalog.list(category).await;
            let date_format = self.date_format.clone();
            if let Some(section) = self.section_mut(SectionId::Category(category)) {
                section.render(&movies, &date_format);
            }
            all_movies.extend(movies);
        }
        self.all_movies = all_movies;
        self.status_msg = format!("{} movies loaded", self.all_movies.len());
        info!(count = self.all_movies.len(), "catalog loaded");
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn visible_sections(&self) -> Vec<usize> {
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.visible)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of whole cards that fit in a row at the current width.
    pub fn cards_per_row(&self) -> usize {
        let inner = self.viewport.0.saturating_sub(2 + 2 * NAV_COLUMNS);
        (inner / CARD_COLUMNS).max(1) as usize
    }

    pub fn update_viewport(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
        let visible = self.cards_per_row();
        for section in &mut self.sections {
            let max = section.max_offset(visible);
            section.scroll.target = section.scroll.target.min(max);
            section.scroll.offset = section.scroll.offset.min(max);
        }
        self.ensure_focus_visible();
    }

    // ── Search ──

    /// Search bar trigger: ignores blank input.
    pub fn submit_search(&mut self) {
        let query = self.search_input.trim().to_string();
        self.input_mode = InputMode::Normal;
        if query.is_empty() {
            return;
        }
        self.search(&query);
    }

    /// Reveal the results row in its searching state and fetch the matches in
    /// the background. Any earlier search still in flight is abandoned.
    pub fn search(&mut self, query: &str) {
        self.abort_search();
        self.search_request += 1;
        let request = self.search_request;

        for section in &mut self.sections {
            section.visible = section.id == SectionId::SearchResults;
        }
        if let Some(section) = self.section_mut(SectionId::SearchResults) {
            section.show_message(searching_message(query));
        }
        self.focus_first_visible();
        self.status_msg = searching_message(query);
        debug!(query, request, "search started");

        let catalog = Arc::clone(&self.catalog);
        let tx = self.events_tx.clone();
        let query = query.to_string();
        self.search_task = Some(tokio::spawn(async move {
            let results = catalog.search(&query).await;
            let _ = tx.send(AppEvent::SearchLoaded {
                request,
                query,
                results,
            });
        }));
    }

    /// Fill the results row. Results of a superseded or cleared search are dropped;
    /// returns whether they were applied.
    fn apply_search(&mut self, request: u64, query: &str, results: Vec<MovieSummary>) -> bool {
        if request != self.search_request || !self.is_searching() {
            return false;
        }
        self.search_task = None;

        let date_format = self.date_format.clone();
        if let Some(section) = self.section_mut(SectionId::SearchResults) {
            if results.is_empty() {
                section.show_message(no_results_message(query));
            } else {
                section.render(&results, &date_format);
            }
        }
        self.status_msg = format!("{} results for \"{}\"", results.len(), query);
        true
    }

    fn abort_search(&mut self) {
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
    }

    /// Reset the search bar and bring back the category rows.
    pub fn clear_search(&mut self) {
        self.abort_search();
        self.search_input.clear();
        self.input_mode = InputMode::Normal;
        for section in &mut self.sections {
            section.visible = section.id != SectionId::SearchResults;
        }
        self.focus_first_visible();
        self.status_msg = format!("{} movies loaded", self.all_movies.len());
    }

    pub fn is_searching(&self) -> bool {
        self.section(SectionId::SearchResults)
            .is_some_and(|s| s.visible)
    }

    // ── Focus and scrolling ──

    fn focus_first_visible(&mut self) {
        self.focused = self.visible_sections().first().copied().unwrap_or(0);
        self.page_scroll = 0;
    }

    pub fn focus_next(&mut self) {
        let visible = self.visible_sections();
        if let Some(pos) = visible.iter().position(|&i| i == self.focused) {
            if let Some(&next) = visible.get(pos + 1) {
                self.focused = next;
            }
        }
        self.ensure_focus_visible();
    }

    pub fn focus_prev(&mut self) {
        let visible = self.visible_sections();
        if let Some(pos) = visible.iter().position(|&i| i == self.focused) {
            if pos > 0 {
                self.focused = visible[pos - 1];
            }
        }
        self.ensure_focus_visible();
    }

    /// Visible rows inside the current page window, top to bottom.
    pub fn on_screen_sections(&self) -> Vec<usize> {
        self.visible_sections()
            .into_iter()
            .skip((self.page_scroll / SECTION_ROWS) as usize)
            .take(self.rows_per_page())
            .collect()
    }

    /// Rows that fit on screen at the current height, at least one.
    pub fn rows_per_page(&self) -> usize {
        (self.viewport.1.saturating_sub(CHROME_ROWS) / SECTION_ROWS).max(1) as usize
    }

    /// Adjust the page scroll so the focused row is on screen. The page
    /// always scrolls by whole rows.
    fn ensure_focus_visible(&mut self) {
        let visible = self.visible_sections();
        let Some(pos) = visible.iter().position(|&i| i == self.focused) else {
            return;
        };
        let fit = self.rows_per_page();
        let mut first = (self.page_scroll / SECTION_ROWS) as usize;
        if pos < first {
            first = pos;
        } else if pos >= first + fit {
            first = pos + 1 - fit;
        }
        self.page_scroll = first as u16 * SECTION_ROWS;
    }

    pub fn show_scroll_top(&self) -> bool {
        self.page_scroll >= SCROLL_TOP_THRESHOLD
    }

    pub fn scroll_to_top(&mut self) {
        self.focus_first_visible();
    }

    pub fn page_section(&mut self, index: usize, direction: NavDirection) {
        let visible = self.cards_per_row();
        if let Some(section) = self.sections.get_mut(index) {
            section.page(direction, visible);
        }
    }

    pub fn select_next_card(&mut self) {
        let visible = self.cards_per_row();
        if let Some(section) = self.sections.get_mut(self.focused) {
            section.select_next(visible);
        }
    }

    pub fn select_prev_card(&mut self) {
        let visible = self.cards_per_row();
        if let Some(section) = self.sections.get_mut(self.focused) {
            section.select_prev(visible);
        }
    }

    /// Advance scroll animations. Returns true while any row is moving.
    pub fn tick(&mut self) -> bool {
        let mut animating = false;
        for section in &mut self.sections {
            animating |= section.scroll.tick();
        }
        animating
    }

    // ── Cards ──

    /// Activate a card in the given section, either its body or one of its affordances.
    pub fn activate_card(&mut self, section: usize, card: usize, target: CardTarget) {
        let command = match self
            .sections
            .get(section)
            .and_then(|s| s.cards().get(card))
        {
            Some(card) => card.activate(target),
            None => return,
        };
        if let Some(s) = self.sections.get_mut(section) {
            s.selected = card;
        }
        self.focused = section;

        match command {
            CardCommand::ShowDetails(id) => self.show_details(id),
            CardCommand::Acknowledge(message) => {
                info!(%message, "collection request acknowledged");
                self.notice = Some(message);
            }
        }
    }

    /// Activate the selected card of the focused section.
    pub fn activate_selected(&mut self, target: CardTarget) {
        if let Some(section) = self.sections.get(self.focused) {
            let card = section.selected;
            self.activate_card(self.focused, card, target);
        }
    }

    fn known_title(&self, id: i64) -> Option<String> {
        self.all_movies
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.title.clone())
            .or_else(|| {
                self.section(SectionId::SearchResults)
                    .and_then(|s| s.cards().iter().find(|c| c.id == id))
                    .map(|c| c.title.clone())
            })
    }

    // ── Details ──

    /// Open the modal in its loading state and fetch the details in the background.
    pub fn show_details(&mut self, id: i64) {
        let title = self.known_title(id);
        let request = self.modal.begin(id, title);
        debug!(id, request, "loading movie details");

        let catalog = Arc::clone(&self.catalog);
        let tx = self.events_tx.clone();
        let task = tokio::spawn(async move {
            let result = catalog.details(id).await;
            // The receiver only goes away on shutdown.
            let _ = tx.send(AppEvent::DetailLoaded { request, result });
        });
        self.modal.task = Some(task);
    }

    pub fn close_modal(&mut self) {
        self.modal.close();
    }

    pub fn modal_scroll_down(&mut self) {
        self.modal.scroll = self.modal.scroll.saturating_add(1);
    }

    pub fn modal_scroll_up(&mut self) {
        self.modal.scroll = self.modal.scroll.saturating_sub(1);
    }

    // ── Posters ──

    /// Check posters of the cards currently on screen that have not been checked yet.
    pub fn request_visible_posters(&mut self) {
        let visible = self.cards_per_row();
        let mut urls = Vec::new();
        for index in self.on_screen_sections() {
            let section = &self.sections[index];
            for card in &section.cards()[section.visible_range(visible)] {
                if card.poster.state == PosterState::Pending
                    && !self.posters_in_flight.contains(&card.poster.src)
                {
                    urls.push(card.poster.src.clone());
                }
            }
        }

        if let Some(view) = self.modal.detail() {
            if view.poster.state == PosterState::Pending
                && !self.posters_in_flight.contains(&view.poster.src)
            {
                urls.push(view.poster.src.clone());
            }
        }

        for url in urls {
            if !self.posters_in_flight.insert(url.clone()) {
                continue;
            }
            let catalog = Arc::clone(&self.catalog);
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let ok = catalog.poster_available(&url).await;
                let _ = tx.send(AppEvent::PosterChecked { url, ok });
            });
        }
    }

    // ── Events ──

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::DetailLoaded { request, result } => {
                let date_format = self.date_format.clone();
                if !self.modal.accept(request, result, &date_format) {
                    debug!(request, "discarding stale details result");
                }
            }
            AppEvent::SearchLoaded {
                request,
                query,
                results,
            } => {
                if !self.apply_search(request, &query, results) {
                    debug!(request, %query, "discarding stale search results");
                }
            }
            AppEvent::PosterChecked { url, ok } => {
                self.posters_in_flight.remove(&url);
                let modal_poster = match &mut self.modal.state {
                    DetailState::Loaded(view) => Some(&mut view.poster),
                    _ => None,
                };
                let card_posters = self
                    .sections
                    .iter_mut()
                    .flat_map(|s| s.cards_mut().iter_mut().map(|c| &mut c.poster));
                for poster in card_posters.chain(modal_poster) {
                    if poster.src == url {
                        if ok {
                            poster.on_load();
                        } else {
                            poster.on_load_error();
                        }
                    }
                }
            }
        }
    }

    /// Apply every event that has already arrived.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Wait for the next background event.
    #[cfg(test)]
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::{CastMember, CrewMember, Video, PLACEHOLDER_POSTER};
    use crate::view::{CardAction, DETAILS_ERROR};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) fn movie(id: i64, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            original_title: title.to_string(),
            poster_url: format!("https://img.test/{id}.jpg"),
            release_date: Some("2024-05-01".to_string()),
            overview: Some(format!("About {title}")),
            rating: Some(7.0),
            popularity: 10.0,
            original_language: "en".to_string(),
            adult: false,
            genre_ids: vec![18],
        }
    }

    pub(crate) fn detail(id: i64, videos: Vec<Video>) -> MovieDetail {
        MovieDetail {
            summary: movie(id, "Detailed"),
            runtime: Some(120),
            genres: vec!["Drama".to_string()],
            production_countries: vec!["Brazil".to_string()],
            budget: None,
            revenue: Some(1_500_000),
            crew: vec![CrewMember {
                name: "Director Person".to_string(),
                job: "Director".to_string(),
            }],
            cast: vec![CastMember {
                name: "Lead Actor".to_string(),
            }],
            videos,
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeCatalog {
        pub lists: HashMap<Category, Vec<MovieSummary>>,
        pub search_results: Vec<MovieSummary>,
        pub detail: Option<MovieDetail>,
        pub calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CatalogApi for FakeCatalog {
        async fn list(&self, category: Category) -> Vec<MovieSummary> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("list:{}", category.path()));
            self.lists.get(&category).cloned().unwrap_or_default()
        }

        async fn search(&self, query: &str) -> Vec<MovieSummary> {
            self.calls.lock().unwrap().push(format!("search:{query}"));
            self.search_results.clone()
        }

        async fn details(&self, id: i64) -> Result<MovieDetail, CatalogError> {
            self.calls.lock().unwrap().push(format!("details:{id}"));
            self.detail.clone().ok_or(CatalogError::Status {
                status: 404,
                message: "not found".to_string(),
            })
        }

        async fn poster_available(&self, url: &str) -> bool {
            !url.contains("broken")
        }
    }

    pub(crate) fn seeded_catalog() -> FakeCatalog {
        let mut lists = HashMap::new();
        lists.insert(Category::NowPlaying, vec![movie(1, "One"), movie(2, "Two")]);
        lists.insert(Category::Popular, vec![movie(3, "Three")]);
        lists.insert(Category::TopRated, Vec::new());
        lists.insert(
            Category::Upcoming,
            (10..22).map(|i| movie(i, &format!("Soon {i}"))).collect(),
        );
        FakeCatalog {
            lists,
            ..FakeCatalog::default()
        }
    }

    pub(crate) async fn loaded_app(catalog: FakeCatalog) -> App {
        let mut app = App::new(Arc::new(catalog), "%d/%m/%Y".to_string());
        app.update_viewport(100, 40);
        app.init().await;
        app
    }

    #[tokio::test]
    async fn test_init_loads_categories_in_fixed_order() {
        let app = loaded_app(seeded_catalog()).await;
        let ids: Vec<i64> = app.all_movies.iter().map(|m| m.id).collect();
        let mut expected = vec![1, 2, 3];
        expected.extend(10..22);
        assert_eq!(ids, expected);

        let now_playing = app.section(SectionId::Category(Category::NowPlaying)).unwrap();
        assert_eq!(now_playing.cards().len(), 2);
        assert_eq!(now_playing.cards()[0].title, "One");
        assert!(now_playing.visible);
        assert!(!app.section(SectionId::SearchResults).unwrap().visible);
        assert_eq!(app.status_msg, "15 movies loaded");
    }

    #[tokio::test]
    async fn test_init_fetches_sequentially() {
        let catalog = Arc::new(seeded_catalog());
        let mut app = App::new(catalog.clone(), "%d/%m/%Y".to_string());
        app.init().await;
        let calls = catalog.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "list:movie/now_playing",
                "list:movie/popular",
                "list:movie/top_rated",
                "list:movie/upcoming"
            ]
        );
    }

    #[test]
    fn test_rerender_keeps_single_pair_of_nav_controls() {
        let mut section = Section::new(SectionId::Category(Category::Popular), true);
        section.render(&[movie(1, "A")], "%d/%m/%Y");
        section.render(&[movie(2, "B"), movie(3, "C")], "%d/%m/%Y");
        assert_eq!(section.nav_controls, vec![NavDirection::Prev, NavDirection::Next]);
        let ids: Vec<i64> = section.cards().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_nav_controls_scroll_by_step_and_clamp() {
        let movies: Vec<MovieSummary> = (0..12).map(|i| movie(i, "M")).collect();
        let mut section = Section::new(SectionId::Category(Category::Upcoming), true);
        section.render(&movies, "%d/%m/%Y");

        // 3 visible of 12: max offset is 9 cards.
        section.page(NavDirection::Next, 3);
        assert_eq!(section.scroll.target, 800);
        assert_eq!(section.selected, 4);
        section.page(NavDirection::Next, 3);
        section.page(NavDirection::Next, 3);
        assert_eq!(section.scroll.target, 9 * CARD_UNITS);
        section.page(NavDirection::Prev, 3);
        assert_eq!(section.scroll.target, 9 * CARD_UNITS - 800);
        section.page(NavDirection::Prev, 3);
        section.page(NavDirection::Prev, 3);
        assert_eq!(section.scroll.target, 0);
    }

    #[test]
    fn test_scroll_animation_converges() {
        let mut scroll = HorizontalScroll::default();
        scroll.scroll_by(SCROLL_STEP, 10_000);
        assert_eq!(scroll.offset, 0);
        let mut frames = 0;
        while scroll.tick() {
            frames += 1;
            assert!(frames < 20);
        }
        assert!(frames > 0);
        assert_eq!(scroll.offset, 800);
        assert!(!scroll.is_animating());
    }

    #[test]
    fn test_selection_drags_scroll_window() {
        let movies: Vec<MovieSummary> = (0..6).map(|i| movie(i, "M")).collect();
        let mut section = Section::new(SectionId::Category(Category::Popular), true);
        section.render(&movies, "%d/%m/%Y");
        for _ in 0..3 {
            section.select_next(2);
        }
        assert_eq!(section.selected, 3);
        assert_eq!(section.scroll.target, 2 * CARD_UNITS);
        for _ in 0..3 {
            section.select_prev(2);
        }
        assert_eq!(section.selected, 0);
        assert_eq!(section.scroll.target, 0);
    }

    /// Wait for the background search and apply its results.
    async fn finish_search(app: &mut App) {
        let event = app.next_event().await.unwrap();
        assert!(matches!(event, AppEvent::SearchLoaded { .. }));
        app.handle_event(event);
    }

    #[tokio::test]
    async fn test_search_without_matches_shows_message() {
        let mut app = loaded_app(seeded_catalog()).await;
        app.search_input = "batman".to_string();
        app.submit_search();
        finish_search(&mut app).await;

        let results = app.section(SectionId::SearchResults).unwrap();
        assert!(results.visible);
        assert!(results.cards().is_empty());
        assert_eq!(results.message(), Some("No movies found for \"batman\"."));
        assert!(app
            .sections
            .iter()
            .filter(|s| s.id != SectionId::SearchResults)
            .all(|s| !s.visible));
    }

    #[tokio::test]
    async fn test_search_shows_pending_state_until_results_arrive() {
        let mut catalog = seeded_catalog();
        catalog.search_results = vec![movie(272, "Batman Begins"), movie(155, "The Dark Knight")];
        let mut app = loaded_app(catalog).await;
        app.search("batman");

        let results = app.section(SectionId::SearchResults).unwrap();
        assert!(results.visible);
        assert!(results.cards().is_empty());
        assert_eq!(results.message(), Some("Searching for \"batman\"..."));
        assert_eq!(app.focused, 4);

        finish_search(&mut app).await;
        let results = app.section(SectionId::SearchResults).unwrap();
        assert_eq!(results.cards().len(), 2);
        assert!(results.message().is_none());
        assert!(app.is_searching());
        assert_eq!(app.status_msg, "2 results for \"batman\"");
    }

    #[tokio::test]
    async fn test_superseded_search_results_are_dropped() {
        let mut app = loaded_app(seeded_catalog()).await;
        app.search("alien");
        app.search("batman");

        let late = AppEvent::SearchLoaded {
            request: 1,
            query: "alien".to_string(),
            results: vec![movie(348, "Alien")],
        };
        app.handle_event(late);
        let results = app.section(SectionId::SearchResults).unwrap();
        assert!(results.cards().is_empty());
        assert_eq!(results.message(), Some("Searching for \"batman\"..."));

        let current = AppEvent::SearchLoaded {
            request: 2,
            query: "batman".to_string(),
            results: vec![movie(272, "Batman Begins")],
        };
        app.handle_event(current);
        let results = app.section(SectionId::SearchResults).unwrap();
        assert_eq!(results.cards().len(), 1);
        assert_eq!(results.cards()[0].id, 272);
    }

    #[tokio::test]
    async fn test_results_after_clear_are_dropped() {
        let mut app = loaded_app(seeded_catalog()).await;
        app.search("batman");
        app.clear_search();

        app.handle_event(AppEvent::SearchLoaded {
            request: 1,
            query: "batman".to_string(),
            results: vec![movie(272, "Batman Begins")],
        });
        assert!(!app.is_searching());
        assert!(app.sections[..4].iter().all(|s| s.visible));
        assert!(app.sections[4].cards().is_empty());
        assert_eq!(app.status_msg, "15 movies loaded");
    }

    #[tokio::test]
    async fn test_blank_query_is_ignored() {
        let catalog = Arc::new(seeded_catalog());
        let mut app = App::new(catalog.clone(), "%d/%m/%Y".to_string());
        app.search_input = "   ".to_string();
        app.submit_search();
        assert!(!app.is_searching());
        assert!(app.events_rx.try_recv().is_err());
        assert!(catalog.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let catalog = Arc::new(seeded_catalog());
        let mut app = App::new(catalog.clone(), "%d/%m/%Y".to_string());
        app.search_input = "  alien ".to_string();
        app.submit_search();
        finish_search(&mut app).await;
        assert_eq!(catalog.calls.lock().unwrap().clone(), vec!["search:alien"]);
    }

    #[tokio::test]
    async fn test_clear_search_restores_sections() {
        let mut app = loaded_app(seeded_catalog()).await;

        // From the initial state.
        app.clear_search();
        assert!(app.sections[..4].iter().all(|s| s.visible));
        assert!(!app.sections[4].visible);

        // After a search.
        app.search_input = "batman".to_string();
        app.submit_search();
        finish_search(&mut app).await;
        app.clear_search();
        assert!(app.search_input.is_empty());
        assert!(app.sections[..4].iter().all(|s| s.visible));
        assert!(!app.sections[4].visible);
        assert_eq!(app.focused, 0);

        // Twice in a row.
        app.clear_search();
        assert!(app.sections[..4].iter().all(|s| s.visible));
        assert!(!app.sections[4].visible);
    }

    #[tokio::test]
    async fn test_details_failure_keeps_modal_open() {
        let mut app = loaded_app(seeded_catalog()).await;
        app.show_details(1);
        assert_eq!(
            app.modal.state,
            DetailState::Loading {
                id: 1,
                title: Some("One".to_string())
            }
        );

        let event = app.next_event().await.unwrap();
        app.handle_event(event);
        assert_eq!(app.modal.state, DetailState::Failed);
        assert!(app.modal.is_open());
        assert!(!DETAILS_ERROR.is_empty());
    }

    #[tokio::test]
    async fn test_details_success_without_trailer() {
        let mut catalog = seeded_catalog();
        catalog.detail = Some(detail(
            1,
            vec![Video {
                video_type: "Featurette".to_string(),
                site: "YouTube".to_string(),
                key: "x".to_string(),
            }],
        ));
        let mut app = loaded_app(catalog).await;
        app.show_details(1);
        let event = app.next_event().await.unwrap();
        app.handle_event(event);

        let view = app.modal.detail().unwrap();
        assert_eq!(view.runtime, "120 min");
        assert!(view.trailer.is_none());
    }

    #[tokio::test]
    async fn test_result_after_close_is_discarded() {
        let mut catalog = seeded_catalog();
        catalog.detail = Some(detail(1, Vec::new()));
        let mut app = loaded_app(catalog).await;

        app.show_details(1);
        let request = app.modal.request();
        app.close_modal();
        app.handle_event(AppEvent::DetailLoaded {
            request,
            result: Ok(detail(1, Vec::new())),
        });
        assert!(!app.modal.is_open());
    }

    #[tokio::test]
    async fn test_superseded_request_is_discarded() {
        let mut app = loaded_app(seeded_catalog()).await;
        app.show_details(1);
        let first = app.modal.request();
        app.show_details(2);

        app.handle_event(AppEvent::DetailLoaded {
            request: first,
            result: Ok(detail(1, Vec::new())),
        });
        assert!(matches!(app.modal.state, DetailState::Loading { id: 2, .. }));
    }

    #[tokio::test]
    async fn test_repeat_view_refetches() {
        let mut catalog = seeded_catalog();
        catalog.detail = Some(detail(3, Vec::new()));
        let catalog = Arc::new(catalog);
        let mut app = App::new(catalog.clone(), "%d/%m/%Y".to_string());
        app.init().await;

        for _ in 0..2 {
            app.show_details(3);
            let event = app.next_event().await.unwrap();
            app.handle_event(event);
            app.close_modal();
        }
        let detail_calls = catalog
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with("details:"))
            .count();
        assert_eq!(detail_calls, 2);
    }

    #[tokio::test]
    async fn test_affordances_do_not_open_details() {
        let mut app = loaded_app(seeded_catalog()).await;
        app.activate_card(0, 1, CardTarget::Action(CardAction::Favorite));
        assert_eq!(app.notice.as_deref(), Some("Two added to favorites!"));
        assert!(!app.modal.is_open());

        app.notice = None;
        app.activate_card(0, 0, CardTarget::Action(CardAction::WatchLater));
        assert!(app.notice.as_deref().unwrap().contains("One"));
        assert!(!app.modal.is_open());

        app.notice = None;
        app.activate_card(1, 0, CardTarget::Body);
        assert!(app.notice.is_none());
        assert!(matches!(app.modal.state, DetailState::Loading { id: 3, .. }));
        assert_eq!(app.focused, 1);
    }

    #[tokio::test]
    async fn test_broken_poster_falls_back_to_placeholder() {
        let mut catalog = seeded_catalog();
        let mut broken = movie(99, "Broken");
        broken.poster_url = "https://img.test/broken.jpg".to_string();
        catalog.lists.insert(Category::NowPlaying, vec![broken, movie(1, "One")]);
        let mut app = loaded_app(catalog).await;

        app.request_visible_posters();
        let visible = app.cards_per_row();
        let expected = app
            .on_screen_sections()
            .iter()
            .map(|&i| app.sections[i].visible_range(visible).len())
            .sum::<usize>();
        for _ in 0..expected {
            let event = app.next_event().await.unwrap();
            app.handle_event(event);
        }

        let row = &app.sections[0];
        assert_eq!(row.cards()[0].poster.src, PLACEHOLDER_POSTER);
        assert_eq!(row.cards()[0].poster.state, PosterState::Fallback);
        assert_eq!(row.cards()[1].poster.state, PosterState::Loaded);
    }

    #[tokio::test]
    async fn test_posters_checked_only_for_rows_on_screen() {
        let mut app = loaded_app(seeded_catalog()).await;
        assert_eq!(app.rows_per_page(), 2);
        assert_eq!(app.on_screen_sections(), vec![0, 1]);

        app.request_visible_posters();
        assert_eq!(app.posters_in_flight.len(), 3);
        assert!(app.posters_in_flight.contains("https://img.test/1.jpg"));
        assert!(app.posters_in_flight.contains("https://img.test/3.jpg"));
        assert!(!app.posters_in_flight.contains("https://img.test/10.jpg"));

        // Scrolling the upcoming row into view brings its posters in.
        for _ in 0..3 {
            app.focus_next();
        }
        assert_eq!(app.on_screen_sections(), vec![2, 3]);
        app.request_visible_posters();
        assert!(app.posters_in_flight.contains("https://img.test/10.jpg"));
    }

    #[tokio::test]
    async fn test_modal_poster_is_checked_once_loaded() {
        let mut catalog = seeded_catalog();
        let mut broken = detail(5, Vec::new());
        broken.summary.poster_url = "https://img.test/broken-detail.jpg".to_string();
        catalog.detail = Some(broken);
        let mut app = loaded_app(catalog).await;

        app.show_details(5);
        let event = app.next_event().await.unwrap();
        app.handle_event(event);
        app.request_visible_posters();
        while app.modal.detail().unwrap().poster.state == PosterState::Pending {
            let event = app.next_event().await.unwrap();
            app.handle_event(event);
        }

        let poster = &app.modal.detail().unwrap().poster;
        assert_eq!(poster.state, PosterState::Fallback);
        assert_eq!(poster.src, PLACEHOLDER_POSTER);
    }

    #[tokio::test]
    async fn test_focus_moves_between_visible_rows() {
        let mut app = loaded_app(seeded_catalog()).await;
        app.update_viewport(100, 20);
        app.focus_next();
        app.focus_next();
        assert_eq!(app.focused, 2);
        assert!(app.page_scroll > 0);
        app.focus_next();
        app.focus_next();
        // The hidden results row is skipped.
        assert_eq!(app.focused, 3);
        assert!(app.show_scroll_top());
        app.scroll_to_top();
        assert_eq!(app.focused, 0);
        assert_eq!(app.page_scroll, 0);
    }
}
