mod app;
mod catalog;
mod config;
mod cosmetic;
mod error;
mod fetch;
mod platform;
mod session;
mod ui;
mod view;

use app::{App, InputMode};
use catalog::{Catalog, SortKey};
use clap::{Parser, Subcommand};
use config::ExplorerConfig;
use cosmetic::{Popup, PopupBody, SettingsAction};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use fetch::HttpSource;
use platform::TerminalPlatform;
use ratatui::layout::{Position, Rect};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

type TuiApp = App<HttpSource, TerminalPlatform>;

/// Browse, search and open zones from a remote catalog
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Zone id to open once the catalog is loaded
    #[arg(long, global = true)]
    id: Option<String>,

    /// Initial sort order: name, id or popular
    #[arg(short, long, global = true)]
    sort: Option<SortKey>,

    /// Catalog JSON endpoint
    #[arg(long, global = true)]
    catalog_url: Option<String>,

    /// Base URL substituted for {COVER_URL}
    #[arg(long, global = true)]
    cover_url: Option<String>,

    /// Base URL substituted for {HTML_URL}
    #[arg(long, global = true)]
    html_url: Option<String>,

    /// Popularity statistics endpoint
    #[arg(long, global = true)]
    popularity_url: Option<String>,

    /// Directory downloads are saved to
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,

    /// Path to the JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the TUI explorer (default)
    Run,
    /// Print the sorted catalog without starting the TUI
    List {
        /// Only show zones whose name or tags contain this text
        #[arg(short, long, default_value = "")]
        query: String,
    },
}

impl Cli {
    /// Config file values, overridden by any flags given on the command line.
    fn resolve_config(&self) -> Result<ExplorerConfig, error::ExplorerError> {
        let path = self.config.clone().or_else(ExplorerConfig::default_path);
        let mut config = ExplorerConfig::load(path.as_deref())?;

        if let Some(url) = &self.catalog_url {
            config.catalog_url = url.clone();
        }
        if let Some(url) = &self.cover_url {
            config.cover_url = url.clone();
        }
        if let Some(url) = &self.html_url {
            config.html_url = url.clone();
        }
        if let Some(url) = &self.popularity_url {
            config.popularity_url = url.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if let Some(sort) = self.sort {
            config.default_sort = sort;
        }
        Ok(config)
    }
}

/// Log to a file in the cache dir; the terminal belongs to the TUI.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_file = directories::ProjectDirs::from("com", "zone-explorer", "zone-explorer")
        .and_then(|dirs| {
            let dir = dirs.cache_dir();
            std::fs::create_dir_all(dir).ok()?;
            std::fs::File::create(dir.join("zone-explorer.log")).ok()
        });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    let config = match cli.resolve_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::List { query } => {
            let source = HttpSource::new(&config)?;
            let mut catalog = match Catalog::load(&source, &config).await {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            };
            catalog.sort(config.default_sort);

            let rows = catalog.filter(&query);
            for zone in &rows {
                let popularity = catalog.popularity(zone.id);
                println!(
                    "{:>6}  {:<40} {:>8}  {}",
                    zone.id,
                    ui::truncate_str(&zone.name, 40),
                    popularity,
                    zone.tags.join(", ")
                );
            }
            println!("{}", view::count_label(rows.len()));
        }
        Commands::Run => {
            let source = HttpSource::new(&config)?;
            let mut app = App::new(config, source, TerminalPlatform::new(), cli.id);
            info!("Starting TUI");

            // Init terminal
            let mut terminal = ratatui::init();
            crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;

            // Show the loading screen while the catalog is fetched, then run the main loop
            let result = match terminal.draw(|frame| ui::render(&app, frame)) {
                Ok(_) => {
                    app.init().await;
                    run_app(&mut terminal, &mut app)
                }
                Err(e) => Err(e.into()),
            };

            // Restore terminal
            crossterm::execute!(std::io::stdout(), DisableMouseCapture)?;
            ratatui::restore();

            if let Err(e) = result {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut TuiApp,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let size = terminal.size()?;
        let screen = Rect::new(0, 0, size.width, size.height);
        let (columns, rows) = ui::grid::grid_shape(ui::grid::grid_inner(screen));
        app.update_grid_size(columns, rows);

        app.drain_messages();
        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Poll for events with a 250ms timeout
        if event::poll(std::time::Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse, screen),
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut TuiApp, key: KeyEvent) {
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Any key dismisses an alert
    if app.alert.is_some() {
        app.alert = None;
        return;
    }

    if app.cosmetic.is_popup_open() {
        handle_popup_key(app, key);
        return;
    }

    if app.input_mode == InputMode::Editing {
        handle_search_input(app, key);
        return;
    }

    // Help toggle (global)
    if key.code == KeyCode::Char('?') {
        app.show_help = !app.show_help;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('o') => app.cosmetic.open_settings(),
        KeyCode::Char('c') => app.cosmetic.open_tab_cloak(),
        _ if app.viewer_active() => handle_viewer_key(app, key),
        _ => handle_grid_key(app, key),
    }
}

fn handle_popup_key(app: &mut TuiApp, key: KeyEvent) {
    let body = app.cosmetic.popup().map(|p| &p.body);
    let on_settings = matches!(body, Some(PopupBody::Settings { .. }));
    let on_cloak = matches!(body, Some(PopupBody::TabCloak { .. }));

    match key.code {
        KeyCode::Esc => app.cosmetic.close_popup(),
        KeyCode::Tab | KeyCode::BackTab if on_cloak => app.cosmetic.switch_cloak_field(),
        KeyCode::Backspace if on_cloak => app.cloak_key(|s| {
            s.pop();
        }),
        KeyCode::Char(c) if on_cloak => app.cloak_key(|s| s.push(c)),
        KeyCode::Down | KeyCode::Char('j') => app.cosmetic.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.cosmetic.select_prev(),
        KeyCode::Enter if on_settings => app.cosmetic.activate_selected(),
        KeyCode::Enter | KeyCode::Char('q') => app.cosmetic.close_popup(),
        _ => {}
    }
}

fn handle_search_input(app: &mut TuiApp, key: KeyEvent) {
    let mut changed = false;
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.query.pop();
            changed = true;
        }
        KeyCode::Char(c) => {
            app.query.push(c);
            changed = true;
        }
        _ => {}
    }

    if changed {
        app.apply_filter();
    }
}

fn handle_grid_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Right | KeyCode::Char('l') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_down(),
        KeyCode::Up | KeyCode::Char('k') => app.select_up(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Char('g') => app.select_first(),
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Esc => {
            // Clear search
            if !app.query.is_empty() {
                app.query.clear();
                app.apply_filter();
            }
        }
        _ => {}
    }
}

fn handle_viewer_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc if app.session.is_fullscreen() => app.session.exit_fullscreen(),
        KeyCode::Esc | KeyCode::Char('q') => app.close_zone(),
        KeyCode::Down | KeyCode::Char('j') => app.viewer_scroll_down(1),
        KeyCode::Up | KeyCode::Char('k') => app.viewer_scroll_up(1),
        KeyCode::PageDown => app.viewer_scroll_down(10),
        KeyCode::PageUp => app.viewer_scroll_up(10),
        KeyCode::Char('f') => app.fullscreen(),
        KeyCode::Char('b') => app.open_in_blank_tab(),
        KeyCode::Char('d') => app.download(),
        _ => {}
    }
}

fn handle_mouse(app: &mut TuiApp, mouse: MouseEvent, screen: Rect) {
    let position = Position::new(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.alert.is_some() {
                app.alert = None;
                return;
            }
            if app.show_help {
                app.show_help = false;
                return;
            }
            if app.cosmetic.is_popup_open() {
                let area = ui::popup::popup_area(screen);
                let inside = area.contains(position);
                app.cosmetic.click(inside);
                // Settings entries start on the first line inside the border
                if inside
                    && mouse.row > area.y
                    && matches!(
                        app.cosmetic.popup(),
                        Some(Popup {
                            body: PopupBody::Settings { .. },
                            ..
                        })
                    )
                {
                    let row = (mouse.row - area.y - 1) as usize;
                    if let Some(action) = SettingsAction::ALL.get(row) {
                        app.cosmetic.run_setting(*action);
                    }
                }
                return;
            }
            if !app.viewer_active() {
                if let Some((index, target)) =
                    ui::grid::hit_test(app, screen, mouse.column, mouse.row)
                {
                    app.activate_tile(index, target);
                }
            }
        }
        MouseEventKind::ScrollDown => {
            if app.viewer_active() {
                app.viewer_scroll_down(3);
            } else {
                app.select_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if app.viewer_active() {
                app.viewer_scroll_up(3);
            } else {
                app.select_up();
            }
        }
        _ => {}
    }
}
