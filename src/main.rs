mod app;
mod catalog;
mod config;
mod ui;
mod view;

use app::{App, InputMode, NavDirection};
use catalog::{CatalogApi, CatalogClient, Category, MovieSummary};
use chrono::{Duration as DateDuration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use config::{Config, Overrides};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Rect;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use ui::layout::{self, Hit, ModalHit};
use view::{CardAction, CardTarget, CardView, DETAILS_ERROR, DetailView, no_results_message};

const DEFAULT_LOG_FILTER: &str = "cinema_explorer=info";
const LOG_FILE: &str = "cinema-explorer.log";
const LOG_RETENTION_DAYS: i64 = 7;
/// Poll interval while a row is sliding.
const FRAME_INTERVAL: Duration = Duration::from_millis(30);
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Terminal browser for movie catalog rows, search and details
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config.toml (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// TMDB API key, overrides the config file and TMDB_API_KEY
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Response language, e.g. en-US
    #[arg(short, long, global = true)]
    language: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the TUI browser (default)
    Run,
    /// Print one category row
    List {
        /// now-playing, popular, top-rated or upcoming
        #[arg(value_parser = parse_category)]
        category: Category,
    },
    /// Print search results for a title
    Search {
        query: String,
    },
    /// Print the full details of one movie
    Details {
        id: i64,
    },
}

fn parse_category(input: &str) -> Result<Category, String> {
    Category::parse(input).ok_or_else(|| {
        format!(
            "unknown category '{}' (expected now-playing, popular, top-rated or upcoming)",
            input
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);
    let _log_guard = init_tracing(!matches!(command, Commands::Run));

    let overrides = Overrides {
        api_key: cli.api_key,
        language: cli.language,
    };
    let config = match Config::load(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        language = %config.language,
        "cinema-explorer starting"
    );

    let date_format = config.date_format.clone();
    let client = CatalogClient::new(config)?;

    match command {
        Commands::List { category } => {
            let movies = client.list(category).await;
            println!("{}", category.label());
            if movies.is_empty() {
                println!("No movies available right now.");
            }
            print_movies(&movies, &date_format);
        }
        Commands::Search { query } => {
            let query = query.trim();
            if query.is_empty() {
                eprintln!("Error: search query is empty");
                std::process::exit(1);
            }
            let movies = client.search(query).await;
            if movies.is_empty() {
                println!("{}", no_results_message(query));
            }
            print_movies(&movies, &date_format);
        }
        Commands::Details { id } => match client.details(id).await {
            Ok(detail) => print_detail(&DetailView::from_detail(&detail, &date_format)),
            Err(e) => {
                eprintln!("{}", DETAILS_ERROR);
                eprintln!("({})", e.user_message());
                std::process::exit(1);
            }
        },
        Commands::Run => run_tui(Arc::new(client), date_format).await?,
    }

    Ok(())
}

/// The TUI owns stdout, so it logs to a daily file. Headless commands log to stderr.
fn init_tracing(headless: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if headless {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .init();
        return None;
    }

    let log_dir = config::project_dirs()
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("cinema-explorer"));
    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .init();

    prune_old_logs(&log_dir);
    Some(guard)
}

/// Remove rolled log files older than the retention window.
fn prune_old_logs(log_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };
    let cutoff = Local::now().date_naive() - DateDuration::days(LOG_RETENTION_DAYS);
    let prefix = format!("{}.", LOG_FILE);
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(date) = name
            .strip_prefix(&prefix)
            .and_then(|suffix| NaiveDate::parse_from_str(suffix, "%Y-%m-%d").ok())
        else {
            continue;
        };
        if date < cutoff {
            if let Err(e) = std::fs::remove_file(entry.path()) {
                warn!(file = %name, error = %e, "could not remove old log file");
            }
        }
    }
}

fn print_movies(movies: &[MovieSummary], date_format: &str) {
    for movie in movies {
        let card = CardView::from_summary(movie, date_format);
        println!();
        println!("{:>8}  {}", card.id, card.title);
        println!("          Release: {}   Rating: {}", card.release, card.rating);
        println!("          {}", card.synopsis);
        println!("          {}", card.poster.src);
    }
}

fn print_detail(view: &DetailView) {
    println!("{}", view.title);
    if let Some(original) = &view.original_title {
        println!("Original title: {}", original);
    }
    println!("{} • {} • {}", view.release, view.runtime, view.genres);
    println!("★ {}", view.rating);
    println!("Poster: {}", view.poster.src);
    println!();
    println!("Synopsis");
    println!("{}", view.overview);
    println!();
    println!("Details");
    for (label, value) in &view.facts {
        println!("  {:<19}{}", label, value);
    }
    if let Some(trailer) = &view.trailer {
        println!();
        println!("Trailer: {}", trailer.watch_url());
    }
}

async fn run_tui(
    catalog: Arc<dyn CatalogApi>,
    date_format: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(catalog, date_format);
    eprintln!("Loading catalog...");
    app.init().await;

    // Leave the terminal usable if anything panics inside the loop
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        ratatui::restore();
        default_hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = match execute!(std::io::stdout(), EnableMouseCapture) {
        Ok(()) => run_app(&mut terminal, &mut app),
        Err(e) => Err(e.into()),
    };

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    info!("cinema-explorer exiting");

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    let size = terminal.size()?;
    app.update_viewport(size.width, size.height);

    loop {
        app.drain_events();
        app.request_visible_posters();
        let animating = app.tick();

        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        let timeout = if animating { FRAME_INTERVAL } else { IDLE_POLL };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.update_viewport(width, height),
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Notices are acknowledged by any key
    if app.notice.is_some() {
        app.notice = None;
        return;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.input_mode == InputMode::Editing {
        handle_search_input(app, key);
        return;
    }

    if key.code == KeyCode::Char('?') {
        app.show_help = !app.show_help;
        return;
    }
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.modal.is_open() {
        handle_modal_key(app, key);
    } else {
        handle_browse_key(app, key);
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_search(),
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => app.search_input.push(c),
        _ => {}
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
    if let KeyCode::Char(c) = key.code {
        if let Some(action) = CardAction::ALL.into_iter().find(|a| a.key() == c) {
            app.activate_selected(CardTarget::Action(action));
            return;
        }
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('/') => app.input_mode = InputMode::Editing,
        KeyCode::Up | KeyCode::Char('k') => app.focus_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.focus_next(),
        KeyCode::Left | KeyCode::Char('h') => app.select_prev_card(),
        KeyCode::Right | KeyCode::Char('l') => app.select_next_card(),
        KeyCode::Char('[') => app.page_section(app.focused, NavDirection::Prev),
        KeyCode::Char(']') => app.page_section(app.focused, NavDirection::Next),
        KeyCode::Enter => app.activate_selected(CardTarget::Body),
        KeyCode::Char('c') | KeyCode::Esc => app.clear_search(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        _ => {}
    }
}

fn handle_modal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('x') | KeyCode::Char('q') => app.close_modal(),
        KeyCode::Down | KeyCode::Char('j') => app.modal_scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.modal_scroll_up(),
        KeyCode::Char('t') => {
            let url = app
                .modal
                .detail()
                .and_then(|d| d.trailer.as_ref())
                .map(|t| t.watch_url());
            if let Some(url) = url {
                open_in_browser(app, &url);
            }
        }
        KeyCode::Char('p') => {
            let url = app
                .modal
                .detail()
                .filter(|d| !d.poster.is_placeholder())
                .map(|d| d.poster.src.clone());
            if let Some(url) = url {
                open_in_browser(app, &url);
            }
        }
        _ => {}
    }
}

fn open_in_browser(app: &mut App, url: &str) {
    match webbrowser::open(url) {
        Ok(()) => app.status_msg = format!("Opened {}", url),
        Err(e) => {
            warn!(url, error = %e, "could not open browser");
            app.status_msg = format!("Could not open {} ({})", url, e);
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {}
        MouseEventKind::ScrollDown => {
            if app.modal.is_open() {
                app.modal_scroll_down();
            } else {
                app.focus_next();
            }
            return;
        }
        MouseEventKind::ScrollUp => {
            if app.modal.is_open() {
                app.modal_scroll_up();
            } else {
                app.focus_prev();
            }
            return;
        }
        _ => return,
    }

    if app.notice.is_some() {
        app.notice = None;
        return;
    }
    if app.show_help {
        app.show_help = false;
        return;
    }

    let area = Rect::new(0, 0, app.viewport.0, app.viewport.1);
    if app.modal.is_open() {
        match layout::modal_hit(area, mouse.column, mouse.row) {
            ModalHit::Close | ModalHit::Outside => app.close_modal(),
            ModalHit::Inside => {}
        }
        return;
    }

    let screen = layout::screen(app, area);
    match layout::hit_test(&screen, mouse.column, mouse.row) {
        Hit::SearchInput => app.input_mode = InputMode::Editing,
        Hit::SearchButton => app.submit_search(),
        Hit::ClearButton => app.clear_search(),
        Hit::ScrollTop => app.scroll_to_top(),
        Hit::Nav { section, direction } => {
            app.focused = section;
            app.page_section(section, direction);
        }
        Hit::Card {
            section,
            card,
            target,
        } => {
            app.input_mode = InputMode::Normal;
            app.activate_card(section, card, target);
        }
        Hit::Nothing => app.input_mode = InputMode::Normal,
    }
}
