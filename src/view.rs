//! Pure mapping from catalog records to what the screen shows.
//!
//! Nothing in here touches the terminal; `ui` materializes these models.

use crate::catalog::{CastMember, CrewMember, MovieDetail, MovieSummary, PLACEHOLDER_POSTER, Video};
use chrono::NaiveDate;

pub const NOT_AVAILABLE: &str = "Not available";
pub const DATE_NOT_AVAILABLE: &str = "Release date not available";
pub const SYNOPSIS_NOT_AVAILABLE: &str = "Synopsis not available.";
pub const DETAILS_ERROR: &str = "Could not load movie details. Please try again later.";
const WRITER_JOBS: [&str; 3] = ["Screenplay", "Writer", "Story"];
const TOP_CAST: usize = 5;
const EXCERPT_CHARS: usize = 160;

/// Shown in place of result cards when a search matches nothing.
pub fn no_results_message(query: &str) -> String {
    format!("No movies found for \"{}\".", query)
}

pub fn searching_message(query: &str) -> String {
    format!("Searching for \"{}\"...", query)
}

// ── Field formatting ──

/// Release date in the configured local format.
pub fn format_release_date(date: Option<&str>, format: &str) -> String {
    date.and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .map(|d| d.format(format).to_string())
        .unwrap_or_else(|| DATE_NOT_AVAILABLE.to_string())
}

/// Rating to one decimal place, or `N/A`.
pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("{:.1}", r),
        None => "N/A".to_string(),
    }
}

pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) => format!("{} min", m),
        None => "Runtime N/A".to_string(),
    }
}

/// Dollar amount with thousands separators, e.g. `$63,000,000`.
pub fn format_currency(amount: Option<u64>) -> String {
    let Some(amount) = amount else {
        return NOT_AVAILABLE.to_string();
    };
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

fn join_or_placeholder<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let joined = names.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        joined
    }
}

pub fn directors(crew: &[CrewMember]) -> String {
    join_or_placeholder(
        crew.iter()
            .filter(|c| c.job == "Director")
            .map(|c| c.name.as_str()),
    )
}

pub fn writers(crew: &[CrewMember]) -> String {
    join_or_placeholder(
        crew.iter()
            .filter(|c| WRITER_JOBS.contains(&c.job.as_str()))
            .map(|c| c.name.as_str()),
    )
}

pub fn top_cast(cast: &[CastMember]) -> String {
    join_or_placeholder(cast.iter().take(TOP_CAST).map(|c| c.name.as_str()))
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out = out.trim_end().to_string();
    out.push('…');
    out
}

// ── Poster ──

/// Load state of a card's poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterState {
    /// Not checked yet; cards are only checked once they scroll into view.
    Pending,
    Loaded,
    /// The original URL failed and the placeholder is shown instead.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poster {
    pub src: String,
    pub state: PosterState,
}

impl Poster {
    pub fn new(src: &str) -> Self {
        let state = if src == PLACEHOLDER_POSTER {
            PosterState::Fallback
        } else {
            PosterState::Pending
        };
        Self {
            src: src.to_string(),
            state,
        }
    }

    pub fn on_load(&mut self) {
        if self.state == PosterState::Pending {
            self.state = PosterState::Loaded;
        }
    }

    pub fn on_load_error(&mut self) {
        self.src = PLACEHOLDER_POSTER.to_string();
        self.state = PosterState::Fallback;
    }

    pub fn is_placeholder(&self) -> bool {
        self.src == PLACEHOLDER_POSTER
    }

    /// Short description for the terminal, where the image itself cannot be drawn.
    pub fn caption(&self) -> String {
        match self.state {
            PosterState::Pending => "▤ loading poster…".to_string(),
            PosterState::Loaded => {
                let name = self.src.rsplit('/').next().unwrap_or(&self.src);
                format!("▣ {}", name)
            }
            PosterState::Fallback => "▢ no image".to_string(),
        }
    }
}

// ── Card ──

/// The three clickable affordances on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    MoreInfo,
    Favorite,
    WatchLater,
}

impl CardAction {
    pub const ALL: [CardAction; 3] = [Self::MoreInfo, Self::Favorite, Self::WatchLater];

    pub fn icon(self) -> &'static str {
        match self {
            Self::MoreInfo => "ℹ",
            Self::Favorite => "♥",
            Self::WatchLater => "◷",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            Self::MoreInfo => "More information",
            Self::Favorite => "Add to favorites",
            Self::WatchLater => "Add to watch later",
        }
    }

    pub fn key(self) -> char {
        match self {
            Self::MoreInfo => 'i',
            Self::Favorite => 'f',
            Self::WatchLater => 'w',
        }
    }
}

/// Where on a card an activation landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTarget {
    Body,
    Action(CardAction),
}

/// What activating a card asks the application to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardCommand {
    ShowDetails(i64),
    /// Acknowledge a collection request. Nothing is stored.
    Acknowledge(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: i64,
    pub title: String,
    pub poster: Poster,
    pub release: String,
    pub rating: String,
    pub synopsis: String,
}

impl CardView {
    pub fn from_summary(movie: &MovieSummary, date_format: &str) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster: Poster::new(&movie.poster_url),
            release: format_release_date(movie.release_date.as_deref(), date_format),
            rating: format_rating(movie.rating),
            synopsis: movie
                .overview
                .as_deref()
                .map(|o| excerpt(o, EXCERPT_CHARS))
                .unwrap_or_else(|| SYNOPSIS_NOT_AVAILABLE.to_string()),
        }
    }

    /// Resolve an activation to exactly one command. Affordances never fall
    /// through to the card body.
    pub fn activate(&self, target: CardTarget) -> CardCommand {
        match target {
            CardTarget::Body | CardTarget::Action(CardAction::MoreInfo) => {
                CardCommand::ShowDetails(self.id)
            }
            CardTarget::Action(CardAction::Favorite) => {
                CardCommand::Acknowledge(format!("{} added to favorites!", self.title))
            }
            CardTarget::Action(CardAction::WatchLater) => {
                CardCommand::Acknowledge(format!("{} added to your watch later list!", self.title))
            }
        }
    }
}

// ── Details ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub key: String,
}

impl Trailer {
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.key)
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }
}

/// First YouTube video whose type is exactly `Trailer`.
pub fn select_trailer(videos: &[Video]) -> Option<Trailer> {
    videos
        .iter()
        .find(|v| v.video_type == "Trailer" && v.site == "YouTube" && !v.key.is_empty())
        .map(|v| Trailer { key: v.key.clone() })
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub id: i64,
    pub poster: Poster,
    pub title: String,
    /// Present only when it differs from `title`.
    pub original_title: Option<String>,
    pub release: String,
    pub runtime: String,
    pub genres: String,
    pub rating: String,
    pub overview: String,
    pub facts: Vec<(&'static str, String)>,
    pub trailer: Option<Trailer>,
}

impl DetailView {
    pub fn from_detail(detail: &MovieDetail, date_format: &str) -> Self {
        let movie = &detail.summary;
        let genres = join_or_placeholder(detail.genres.iter().map(String::as_str));
        let language = if movie.original_language.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            movie.original_language.to_uppercase()
        };
        let facts = vec![
            ("Director", directors(&detail.crew)),
            ("Screenplay", writers(&detail.crew)),
            ("Main cast", top_cast(&detail.cast)),
            ("Genres", genres.clone()),
            (
                "Country of origin",
                join_or_placeholder(detail.production_countries.iter().map(String::as_str)),
            ),
            ("Original language", language),
            ("Budget", format_currency(detail.budget)),
            ("Revenue", format_currency(detail.revenue)),
        ];

        Self {
            id: movie.id,
            poster: Poster::new(&movie.poster_url),
            title: movie.title.clone(),
            original_title: Some(movie.original_title.clone())
                .filter(|o| !o.is_empty() && *o != movie.title),
            release: format_release_date(movie.release_date.as_deref(), date_format),
            runtime: format_runtime(detail.runtime),
            genres,
            rating: format!("{}/10", format_rating(movie.rating)),
            overview: movie
                .overview
                .clone()
                .unwrap_or_else(|| SYNOPSIS_NOT_AVAILABLE.to_string()),
            facts,
            trailer: select_trailer(&detail.videos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn summary() -> MovieSummary {
        MovieSummary {
            id: 603,
            title: "Matrix".to_string(),
            original_title: "The Matrix".to_string(),
            poster_url: "https://image.tmdb.org/t/p/w500/m.jpg".to_string(),
            release_date: Some("1999-03-30".to_string()),
            overview: Some("A hacker learns the truth.".to_string()),
            rating: Some(8.216),
            popularity: 80.5,
            original_language: "en".to_string(),
            adult: false,
            genre_ids: vec![28, 878],
        }
    }

    fn crew(name: &str, job: &str) -> CrewMember {
        CrewMember {
            name: name.to_string(),
            job: job.to_string(),
        }
    }

    fn video(video_type: &str, site: &str, key: &str) -> Video {
        Video {
            video_type: video_type.to_string(),
            site: site.to_string(),
            key: key.to_string(),
        }
    }

    fn detail() -> MovieDetail {
        MovieDetail {
            summary: summary(),
            runtime: Some(136),
            genres: vec!["Action".to_string(), "Science Fiction".to_string()],
            production_countries: vec!["United States of America".to_string()],
            budget: Some(63_000_000),
            revenue: None,
            crew: vec![
                crew("Lana Wachowski", "Director"),
                crew("Lilly Wachowski", "Director"),
                crew("Lana Wachowski", "Writer"),
                crew("Bill Pope", "Director of Photography"),
            ],
            cast: ["A", "B", "C", "D", "E", "F"]
                .iter()
                .map(|n| CastMember { name: n.to_string() })
                .collect(),
            videos: vec![
                video("Teaser", "YouTube", "teaser"),
                video("Trailer", "Vimeo", "vimeo"),
                video("Trailer", "YouTube", "first"),
                video("Trailer", "YouTube", "second"),
            ],
        }
    }

    #[test]
    fn test_rating_none_is_na() {
        assert_eq!(format_rating(None), "N/A");
        assert_eq!(format_rating(Some(7.26)), "7.3");
        assert_eq!(format_rating(Some(0.0)), "0.0");
        assert_eq!(format_rating(Some(10.0)), "10.0");
    }

    #[test]
    fn test_release_date_formats() {
        assert_eq!(format_release_date(Some("1999-03-30"), "%d/%m/%Y"), "30/03/1999");
        assert_eq!(format_release_date(Some("1999-03-30"), "%m/%d/%Y"), "03/30/1999");
        assert_eq!(format_release_date(None, "%d/%m/%Y"), DATE_NOT_AVAILABLE);
        assert_eq!(format_release_date(Some("soon"), "%d/%m/%Y"), DATE_NOT_AVAILABLE);
    }

    #[test]
    fn test_currency() {
        assert_eq!(format_currency(Some(63_000_000)), "$63,000,000");
        assert_eq!(format_currency(Some(999)), "$999");
        assert_eq!(format_currency(Some(1_000)), "$1,000");
        assert_eq!(format_currency(None), NOT_AVAILABLE);
    }

    #[test]
    fn test_crew_filters() {
        let d = detail();
        assert_eq!(directors(&d.crew), "Lana Wachowski, Lilly Wachowski");
        assert_eq!(writers(&d.crew), "Lana Wachowski");
        assert_eq!(top_cast(&d.cast), "A, B, C, D, E");
        assert_eq!(directors(&[]), NOT_AVAILABLE);
    }

    #[test]
    fn test_trailer_is_first_youtube_trailer() {
        let d = detail();
        assert_eq!(select_trailer(&d.videos), Some(Trailer { key: "first".to_string() }));
        assert_eq!(
            select_trailer(&d.videos).unwrap().embed_url(),
            "https://www.youtube.com/embed/first"
        );
    }

    #[test]
    fn test_no_youtube_trailer_means_no_trailer_block() {
        let mut d = detail();
        d.videos = vec![video("Teaser", "YouTube", "t"), video("Trailer", "Vimeo", "v")];
        let view = DetailView::from_detail(&d, "%d/%m/%Y");
        assert!(view.trailer.is_none());
    }

    #[test]
    fn test_detail_view_fields() {
        let view = DetailView::from_detail(&detail(), "%d/%m/%Y");
        assert_eq!(view.title, "Matrix");
        assert_eq!(view.original_title.as_deref(), Some("The Matrix"));
        assert_eq!(view.runtime, "136 min");
        assert_eq!(view.rating, "8.2/10");
        assert_eq!(view.genres, "Action, Science Fiction");
        let fact = |label: &str| {
            view.facts
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(fact("Original language"), "EN");
        assert_eq!(fact("Budget"), "$63,000,000");
        assert_eq!(fact("Revenue"), NOT_AVAILABLE);
        assert_eq!(fact("Main cast"), "A, B, C, D, E");
    }

    #[test]
    fn test_same_original_title_hidden() {
        let mut d = detail();
        d.summary.original_title = d.summary.title.clone();
        d.runtime = None;
        d.summary.overview = None;
        let view = DetailView::from_detail(&d, "%d/%m/%Y");
        assert!(view.original_title.is_none());
        assert_eq!(view.runtime, "Runtime N/A");
        assert_eq!(view.overview, SYNOPSIS_NOT_AVAILABLE);
    }

    #[test]
    fn test_card_view_placeholders() {
        let mut movie = summary();
        movie.rating = None;
        movie.release_date = None;
        movie.overview = None;
        let card = CardView::from_summary(&movie, "%d/%m/%Y");
        assert_eq!(card.rating, "N/A");
        assert_eq!(card.release, DATE_NOT_AVAILABLE);
        assert_eq!(card.synopsis, SYNOPSIS_NOT_AVAILABLE);
    }

    #[test]
    fn test_long_synopsis_excerpted() {
        let mut movie = summary();
        movie.overview = Some("word ".repeat(100));
        let card = CardView::from_summary(&movie, "%d/%m/%Y");
        assert!(card.synopsis.chars().count() <= EXCERPT_CHARS);
        assert!(card.synopsis.ends_with('…'));
    }

    #[test]
    fn test_card_actions_resolve_to_single_command() {
        let card = CardView::from_summary(&summary(), "%d/%m/%Y");
        assert_eq!(card.activate(CardTarget::Body), CardCommand::ShowDetails(603));
        assert_eq!(
            card.activate(CardTarget::Action(CardAction::MoreInfo)),
            CardCommand::ShowDetails(603)
        );
        assert_eq!(
            card.activate(CardTarget::Action(CardAction::Favorite)),
            CardCommand::Acknowledge("Matrix added to favorites!".to_string())
        );
        assert!(matches!(
            card.activate(CardTarget::Action(CardAction::WatchLater)),
            CardCommand::Acknowledge(msg) if msg.contains("watch later")
        ));
    }

    #[test]
    fn test_poster_fallback() {
        let mut poster = Poster::new("https://image.tmdb.org/t/p/w500/m.jpg");
        assert_eq!(poster.state, PosterState::Pending);
        poster.on_load_error();
        assert_eq!(poster.src, PLACEHOLDER_POSTER);
        assert_eq!(poster.state, PosterState::Fallback);
        // A late success does not resurrect the broken URL.
        poster.on_load();
        assert!(poster.is_placeholder());

        let placeholder = Poster::new(PLACEHOLDER_POSTER);
        assert_eq!(placeholder.state, PosterState::Fallback);
    }

    proptest! {
        #[test]
        fn prop_rating_has_one_decimal(r in 0.0f64..=10.0) {
            let text = format_rating(Some(r));
            let (_, decimals) = text.split_once('.').unwrap();
            prop_assert_eq!(decimals.len(), 1);
            prop_assert!((text.parse::<f64>().unwrap() - r).abs() <= 0.05 + 1e-9);
        }

        #[test]
        fn prop_currency_round_trips_digits(amount in 1u64..u64::MAX) {
            let text = format_currency(Some(amount));
            prop_assert!(text.starts_with('$'));
            let digits: String = text[1..].chars().filter(|c| *c != ',').collect();
            prop_assert_eq!(digits.parse::<u64>().unwrap(), amount);
            for group in text[1..].split(',').skip(1) {
                prop_assert_eq!(group.len(), 3);
            }
        }
    }
}
