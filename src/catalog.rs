use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Substituted whenever a record has no poster or its poster fails to load.
pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/200x300?text=No+Image";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// The four fixed category rows, in startup fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    NowPlaying,
    Popular,
    TopRated,
    Upcoming,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::NowPlaying,
        Self::Popular,
        Self::TopRated,
        Self::Upcoming,
    ];

    /// Endpoint path under the API base.
    pub fn path(self) -> &'static str {
        match self {
            Self::NowPlaying => "movie/now_playing",
            Self::Popular => "movie/popular",
            Self::TopRated => "movie/top_rated",
            Self::Upcoming => "movie/upcoming",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NowPlaying => "Now Playing",
            Self::Popular => "Popular",
            Self::TopRated => "Top Rated",
            Self::Upcoming => "Coming Soon",
        }
    }

    /// Parse the command-line spelling (`now-playing`, `top_rated`, ...).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().replace('_', "-").as_str() {
            "now-playing" | "nowplaying" => Some(Self::NowPlaying),
            "popular" => Some(Self::Popular),
            "top-rated" | "toprated" => Some(Self::TopRated),
            "upcoming" => Some(Self::Upcoming),
            _ => None,
        }
    }
}

/// A normalized list entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub original_title: String,
    pub poster_url: String,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub popularity: f64,
    pub original_language: String,
    pub adult: bool,
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CastMember {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Video {
    #[serde(rename = "type", default)]
    pub video_type: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub key: String,
}

/// Extended record fetched when the details modal opens.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub summary: MovieSummary,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub production_countries: Vec<String>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub crew: Vec<CrewMember>,
    pub cast: Vec<CastMember>,
    pub videos: Vec<Video>,
}

// ── Wire shapes ──

/// A catalog item as sent by the API. Only `id` is required; entries
/// without one are skipped by the list fetcher.
#[derive(Debug, Default, Deserialize)]
pub struct RawMovie {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub original_language: Option<String>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    results: Vec<RawMovie>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    #[serde(default)]
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProductionCountry {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Credits {
    cast: Vec<CastMember>,
    crew: Vec<CrewMember>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Videos {
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct RawDetail {
    #[serde(flatten)]
    movie: RawMovie,
    runtime: Option<u32>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    production_countries: Vec<ProductionCountry>,
    budget: Option<u64>,
    revenue: Option<u64>,
    #[serde(default)]
    credits: Credits,
    #[serde(default)]
    videos: Videos,
}

// ── Normalization ──

/// Full poster URL for a path, or the placeholder when there is none.
pub fn poster_url(image_base_url: &str, poster_path: Option<&str>) -> String {
    match poster_path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => format!("{image_base_url}{path}"),
        None => PLACEHOLDER_POSTER.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Map a raw catalog item onto a [`MovieSummary`]. Items without an id
/// cannot be correlated with their details and yield `None`.
pub fn normalize(raw: RawMovie, image_base_url: &str) -> Option<MovieSummary> {
    let id = raw.id?;
    let poster_url = poster_url(image_base_url, raw.poster_path.as_deref());
    let title = raw.title.unwrap_or_default();
    Some(MovieSummary {
        id,
        original_title: raw.original_title.unwrap_or_else(|| title.clone()),
        title,
        poster_url,
        release_date: non_empty(raw.release_date),
        overview: non_empty(raw.overview),
        rating: raw.vote_average,
        popularity: raw.popularity.unwrap_or_default(),
        original_language: raw.original_language.unwrap_or_default(),
        adult: raw.adult,
        genre_ids: raw.genre_ids,
    })
}

fn normalize_detail(raw: RawDetail, image_base_url: &str) -> Result<MovieDetail, CatalogError> {
    let Some(mut summary) = normalize(raw.movie, image_base_url) else {
        return Err(CatalogError::MissingId);
    };
    if summary.genre_ids.is_empty() {
        summary.genre_ids = raw.genres.iter().map(|g| g.id).collect();
    }
    Ok(MovieDetail {
        summary,
        runtime: raw.runtime.filter(|m| *m > 0),
        genres: raw.genres.into_iter().map(|g| g.name).collect(),
        production_countries: raw
            .production_countries
            .into_iter()
            .map(|c| c.name)
            .collect(),
        // TMDB reports unknown amounts as 0.
        budget: raw.budget.filter(|b| *b > 0),
        revenue: raw.revenue.filter(|r| *r > 0),
        crew: raw.credits.crew,
        cast: raw.credits.cast,
        videos: raw.videos.results,
    })
}

// ── Errors ──

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog API error: HTTP {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Malformed catalog response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog record has no id")]
    MissingId,
}

impl CatalogError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Http(e) => format!("Network error: {}", e),
            CatalogError::Status { status, .. } => {
                format!("The catalog answered with HTTP {}", status)
            }
            CatalogError::Parse(_) | CatalogError::MissingId => {
                "The catalog sent an unreadable response".to_string()
            }
        }
    }
}

// ── Client ──

/// Read-only access to the movie catalog.
///
/// List operations never fail: any transport or decoding problem is logged
/// and reported as an empty list.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list(&self, category: Category) -> Vec<MovieSummary>;
    async fn search(&self, query: &str) -> Vec<MovieSummary>;
    async fn details(&self, id: i64) -> Result<MovieDetail, CatalogError>;
    /// Whether the poster at `url` can be loaded.
    async fn poster_available(&self, url: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    config: Config,
}

impl CatalogClient {
    pub fn new(config: Config) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn list_url(&self, category: Category) -> String {
        format!(
            "{}/{}?api_key={}&language={}&page=1",
            self.config.api_base_url,
            category.path(),
            self.config.api_key,
            urlencoding::encode(&self.config.language)
        )
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search/movie?api_key={}&language={}&query={}&page=1",
            self.config.api_base_url,
            self.config.api_key,
            urlencoding::encode(&self.config.language),
            urlencoding::encode(query)
        )
    }

    pub fn detail_url(&self, id: i64) -> String {
        format!(
            "{}/movie/{id}?api_key={}&language={}&append_to_response=credits,videos",
            self.config.api_base_url,
            self.config.api_key,
            urlencoding::encode(&self.config.language)
        )
    }

    /// The URL with the API key masked, for logs.
    fn redact(&self, url: &str) -> String {
        if self.config.api_key.is_empty() {
            return url.to_string();
        }
        url.replace(&self.config.api_key, "***")
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, CatalogError> {
        debug!(url = %self.redact(url), "catalog request");
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch a list endpoint and normalize its `results`.
    pub async fn fetch_movies(&self, url: &str) -> Vec<MovieSummary> {
        match self.get_json::<ListResponse>(url).await {
            Ok(data) => {
                let received = data.results.len();
                let movies: Vec<MovieSummary> = data
                    .results
                    .into_iter()
                    .filter_map(|raw| normalize(raw, &self.config.image_base_url))
                    .collect();
                if movies.len() < received {
                    warn!(
                        url = %self.redact(url),
                        skipped = received - movies.len(),
                        "catalog entries without an id skipped"
                    );
                }
                debug!(url = %self.redact(url), count = movies.len(), "catalog list loaded");
                movies
            }
            Err(e) => {
                warn!(url = %self.redact(url), error = %e, "catalog list unavailable, using empty list");
                Vec::new()
            }
        }
    }

    pub async fn fetch_detail(&self, id: i64) -> Result<MovieDetail, CatalogError> {
        let raw: RawDetail = self.get_json(&self.detail_url(id)).await?;
        normalize_detail(raw, &self.config.image_base_url)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn list(&self, category: Category) -> Vec<MovieSummary> {
        let movies = self.fetch_movies(&self.list_url(category)).await;
        info!(category = category.label(), count = movies.len(), "category loaded");
        movies
    }

    async fn search(&self, query: &str) -> Vec<MovieSummary> {
        let movies = self.fetch_movies(&self.search_url(query)).await;
        info!(query, count = movies.len(), "search finished");
        movies
    }

    async fn details(&self, id: i64) -> Result<MovieDetail, CatalogError> {
        self.fetch_detail(id).await
    }

    async fn poster_available(&self, url: &str) -> bool {
        if url == PLACEHOLDER_POSTER {
            return true;
        }
        match self.client.head(url).send().await {
            Ok(res) => res.status().is_success(),
            Err(e) => {
                debug!(url, error = %e, "poster check failed");
                false
            }
        }
    }
}
