use crate::catalog::{Catalog, SortKey, ZoneRecord};
use crate::config::ExplorerConfig;
use crate::cosmetic::CosmeticController;
use crate::error::ExplorerError;
use crate::fetch::{FetchedText, ZoneSource};
use crate::platform::Platform;
use crate::session::{
    BlankTabRequest, DownloadRequest, FullscreenOutcome, OpenCompletion, ZoneSession,
};
use crate::view::{self, GridView, TileTarget};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

/// Input mode for the search bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Results of background fetches, delivered to the UI loop.
#[derive(Debug)]
pub enum AppMessage {
    ContentLoaded {
        token: u64,
        result: Result<FetchedText, ExplorerError>,
    },
    BlankTabLoaded {
        request: BlankTabRequest,
        result: Result<FetchedText, ExplorerError>,
    },
    DownloadLoaded {
        request: DownloadRequest,
        result: Result<FetchedText, ExplorerError>,
    },
}

/// Main application state.
pub struct App<S, P> {
    pub config: ExplorerConfig,
    source: S,
    pub platform: P,
    pub should_quit: bool,
    pub show_help: bool,

    pub catalog: Catalog,
    /// Shown in place of the grid when the catalog could not be loaded.
    pub load_error: Option<String>,
    pub sort_key: SortKey,
    requested_id: Option<String>,

    pub query: String,
    pub input_mode: InputMode,

    // Rendered grid and the records behind each tile
    pub grid: GridView,
    visible: Vec<ZoneRecord>,
    pub selected: usize,
    pub scroll_row: usize,
    pub grid_columns: usize,
    pub grid_rows: usize,

    pub session: ZoneSession,
    pub cosmetic: CosmeticController,

    /// Modal message dismissed by any key.
    pub alert: Option<String>,
    pub status_msg: String,

    tx: UnboundedSender<AppMessage>,
    rx: UnboundedReceiver<AppMessage>,
}

impl<S, P> App<S, P>
where
    S: ZoneSource + Clone + Send + Sync + 'static,
    P: Platform,
{
    pub fn new(config: ExplorerConfig, source: S, platform: P, requested_id: Option<String>) -> Self {
        let (tx, rx) = unbounded_channel();
        let sort_key = config.default_sort;
        Self {
            config,
            source,
            platform,
            should_quit: false,
            show_help: false,

            catalog: Catalog::default(),
            load_error: None,
            sort_key,
            requested_id,

            query: String::new(),
            input_mode: InputMode::Normal,

            grid: GridView::default(),
            visible: Vec::new(),
            selected: 0,
            scroll_row: 0,
            grid_columns: 1,
            grid_rows: 1,

            session: ZoneSession::new(),
            cosmetic: CosmeticController::new(),

            alert: None,
            status_msg: "Loading zones...".to_string(),

            tx,
            rx,
        }
    }

    /// Initial data load, then sort, render and the requested auto-open.
    pub async fn init(&mut self) {
        match Catalog::load(&self.source, &self.config).await {
            Ok(catalog) => {
                self.catalog = catalog;
                self.load_error = None;
                self.sort_zones();
                self.status_msg = format!("{} zones loaded", self.catalog.len());
            }
            Err(e) => {
                warn!("{}", e);
                self.load_error = Some(e.user_message());
                self.grid = GridView::default();
                self.visible.clear();
                self.status_msg = "Catalog unavailable".to_string();
                return;
            }
        }

        if let Some(id) = self.requested_id.take() {
            match self.catalog.find_by_requested_id(&id).cloned() {
                Some(zone) => self.open_zone(zone),
                None => debug!("Requested zone {} not in catalog", id),
            }
        }
    }

    /// Sort the catalog by the current key and re-render the visible subset.
    pub fn sort_zones(&mut self) {
        self.catalog.sort(self.sort_key);
        self.refresh_view();
    }

    pub fn cycle_sort(&mut self) {
        self.sort_key = self.sort_key.next();
        self.sort_zones();
        self.status_msg = format!("Sorted by {}", self.sort_key.label());
    }

    /// Apply the search query and reset the selection.
    pub fn apply_filter(&mut self) {
        self.refresh_view();
        self.selected = 0;
        self.scroll_row = 0;
    }

    fn refresh_view(&mut self) {
        if self.load_error.is_some() {
            return;
        }
        let matches = self.catalog.filter(&self.query);
        self.grid = view::render(&matches, &self.config, self.catalog.loaded_at());
        self.visible = matches.into_iter().cloned().collect();
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
        self.ensure_selection_visible();
    }

    /// Update the number of tile columns and rows that fit on screen.
    pub fn update_grid_size(&mut self, columns: usize, rows: usize) {
        self.grid_columns = columns.max(1);
        self.grid_rows = rows.max(1);
        self.ensure_selection_visible();
    }

    fn ensure_selection_visible(&mut self) {
        let row = self.selected / self.grid_columns;
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + self.grid_rows {
            self.scroll_row = row + 1 - self.grid_rows;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() - 1;
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, last as isize) as usize;
        self.ensure_selection_visible();
    }

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }

    pub fn select_down(&mut self) {
        self.move_selection(self.grid_columns as isize);
    }

    pub fn select_up(&mut self) {
        self.move_selection(-(self.grid_columns as isize));
    }

    pub fn page_down(&mut self) {
        self.move_selection((self.grid_columns * self.grid_rows) as isize);
    }

    pub fn page_up(&mut self) {
        self.move_selection(-((self.grid_columns * self.grid_rows) as isize));
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_row = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
        self.ensure_selection_visible();
    }

    /// Open the zone behind a clicked tile.
    pub fn activate_tile(&mut self, index: usize, target: TileTarget) {
        if self.grid.activate(index, target).is_none() {
            return;
        }
        if let Some(zone) = self.visible.get(index).cloned() {
            self.selected = index;
            self.open_zone(zone);
        }
    }

    pub fn open_selected(&mut self) {
        self.activate_tile(self.selected, TileTarget::Label);
    }

    pub fn open_zone(&mut self, zone: ZoneRecord) {
        match self.session.begin_open(&zone, &self.config, &mut self.platform) {
            Ok(Some(request)) => {
                self.status_msg = format!("Loading {}...", zone.name);
                let token = request.token;
                self.spawn_fetch(request.url, move |result| AppMessage::ContentLoaded { token, result });
            }
            Ok(None) => {
                self.status_msg = format!("Opened {} in browser", zone.name);
            }
            Err(e) => self.show_alert(e),
        }
    }

    pub fn close_zone(&mut self) {
        self.session.close();
        self.status_msg.clear();
    }

    pub fn fullscreen(&mut self) {
        match self.session.fullscreen(&mut self.platform) {
            FullscreenOutcome::NoSession => {}
            FullscreenOutcome::Entered => {
                self.status_msg = "Fullscreen (Esc to leave)".to_string();
            }
            FullscreenOutcome::Unavailable(msg) => self.alert = Some(msg),
        }
    }

    pub fn open_in_blank_tab(&mut self) {
        match self.session.begin_blank_tab(&self.config, &mut self.platform) {
            Ok(request) => {
                let url = request.url.clone();
                self.spawn_fetch(url, move |result| AppMessage::BlankTabLoaded { request, result });
            }
            Err(e) => self.show_alert(e),
        }
    }

    pub fn download(&mut self) {
        match self.session.begin_download(&self.config) {
            Ok(request) => {
                self.status_msg = format!("Downloading {}...", request.file_name);
                let url = request.url.clone();
                self.spawn_fetch(url, move |result| AppMessage::DownloadLoaded { request, result });
            }
            Err(e) => self.show_alert(e),
        }
    }

    fn spawn_fetch<F>(&self, url: String, wrap: F)
    where
        F: FnOnce(Result<FetchedText, ExplorerError>) -> AppMessage + Send + 'static,
    {
        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.get_text(&url).await;
            if tx.send(wrap(result)).is_err() {
                debug!("UI gone before fetch of {} finished", url);
            }
        });
    }

    fn show_alert(&mut self, error: ExplorerError) {
        warn!("{}", error);
        self.alert = Some(error.user_message());
    }

    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::ContentLoaded { token, result } => {
                match self.session.complete_open(token, result) {
                    Ok(OpenCompletion::Embedded) => {
                        if let Some(meta) = self.session.meta() {
                            self.status_msg = format!("Playing {}", meta.name);
                        }
                    }
                    Ok(OpenCompletion::Stale) => {}
                    Err(e) => self.show_alert(e),
                }
            }
            AppMessage::BlankTabLoaded { request, result } => {
                match request.finish(result, &mut self.platform) {
                    Ok(path) => self.status_msg = format!("Opened blank tab {}", path.display()),
                    Err(e) => self.show_alert(e),
                }
            }
            AppMessage::DownloadLoaded { request, result } => {
                match request.save(&self.config.download_dir, result) {
                    Ok(path) => {
                        info!("Saved {}", path.display());
                        self.status_msg = format!("Saved {}", path.display());
                    }
                    Err(e) => self.show_alert(e),
                }
            }
        }
    }

    /// Apply every fetch result that has arrived so far.
    pub fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
    }

    /// Wait for the next fetch result and apply it.
    #[cfg(test)]
    pub async fn process_next_message(&mut self) -> bool {
        match self.rx.recv().await {
            Some(message) => {
                self.handle_message(message);
                true
            }
            None => false,
        }
    }

    pub fn cloak_key(&mut self, edit: impl FnOnce(&mut String)) {
        self.cosmetic.edit_cloak_input(edit, &mut self.platform);
    }

    pub fn viewer_scroll_down(&mut self, lines: u16) {
        self.session.scroll_down(lines);
    }

    pub fn viewer_scroll_up(&mut self, lines: u16) {
        self.session.scroll_up(lines);
    }
}

impl<S, P> App<S, P> {
    /// True until the first catalog load has finished, successfully or not.
    pub fn is_catalog_pending(&self) -> bool {
        self.load_error.is_none() && self.catalog.loaded_at() == 0
    }

    /// True while the zone viewer owns the screen.
    pub fn viewer_active(&self) -> bool {
        self.session.is_viewer_visible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeSource;
    use crate::platform::testing::RecordingPlatform;

    const CATALOG: &str = r#"[
        {"id": 5, "name": "Alpha", "cover": "{COVER_URL}/5.png", "url": "{HTML_URL}/5.html", "tags": ["puzzle"]},
        {"id": -1, "name": "Zeta", "cover": "{COVER_URL}/p.png", "url": "{HTML_URL}/p.html"},
        {"id": "2", "name": "Beta", "cover": "{COVER_URL}/2.png", "url": "https://beta.test/play", "tags": ["platformer"]}
    ]"#;

    fn config() -> ExplorerConfig {
        ExplorerConfig {
            catalog_url: "https://catalog.test/games.json".to_string(),
            popularity_url: "https://stats.test/files".to_string(),
            cover_url: "https://covers.test".to_string(),
            html_url: "https://html.test".to_string(),
            ..ExplorerConfig::default()
        }
    }

    fn source() -> FakeSource {
        FakeSource::default()
            .with("https://catalog.test/games.json", 200, CATALOG)
            .with("https://stats.test/files", 200, r#"[{"name": "/5.html", "hits": {"total": 3}}]"#)
            .with("https://html.test/5.html", 200, "<p>alpha</p>")
    }

    fn app(requested: Option<&str>) -> App<FakeSource, RecordingPlatform> {
        App::new(
            config(),
            source(),
            RecordingPlatform::default(),
            requested.map(str::to_string),
        )
    }

    fn labels(app: &App<FakeSource, RecordingPlatform>) -> Vec<String> {
        app.grid.tiles.iter().map(|t| t.label.clone()).collect()
    }

    #[tokio::test]
    async fn test_init_sorts_and_renders() {
        let mut app = app(None);
        app.init().await;
        assert!(app.load_error.is_none());
        assert_eq!(labels(&app), ["Zeta", "Alpha", "Beta"]);
        assert_eq!(app.grid.count_label, "Zones Loaded: 3");
    }

    #[tokio::test]
    async fn test_catalog_failure_replaces_grid() {
        let mut app = App::new(
            config(),
            FakeSource::default(),
            RecordingPlatform::default(),
            Some("5".to_string()),
        );
        app.init().await;
        assert!(app.load_error.as_deref().unwrap().starts_with("Error loading games"));
        assert!(app.grid.is_empty());
        assert!(app.session.current().is_none());
    }

    #[tokio::test]
    async fn test_requested_id_auto_opens() {
        let mut app = app(Some("5"));
        app.init().await;
        assert!(app.session.is_loading());
        assert!(app.process_next_message().await);
        assert_eq!(app.session.frame().unwrap().document().html(), "<p>alpha</p>");
        assert_eq!(app.status_msg, "Playing Alpha");
    }

    #[tokio::test]
    async fn test_search_by_tag_and_sort_keep_filter() {
        let mut app = app(None);
        app.init().await;
        app.query = "pla".to_string();
        app.apply_filter();
        assert_eq!(labels(&app), ["Beta"]);

        app.cycle_sort();
        assert_eq!(app.sort_key, SortKey::Id);
        assert_eq!(labels(&app), ["Beta"]);

        app.query = "nothing".to_string();
        app.apply_filter();
        assert_eq!(app.grid.count_label, "No zones found");
    }

    #[tokio::test]
    async fn test_external_tile_goes_to_browser() {
        let mut app = app(None);
        app.init().await;
        app.activate_tile(2, TileTarget::Label);
        assert_eq!(app.platform.external, ["https://beta.test/play"]);
        assert!(app.session.frame().is_none());
    }

    #[tokio::test]
    async fn test_missing_content_alerts_and_closes() {
        let mut app = app(None);
        app.init().await;
        app.activate_tile(0, TileTarget::Cover);
        assert!(app.process_next_message().await);
        assert_eq!(app.alert.as_deref(), Some("Failed to load game: Game not found"));
        assert!(app.session.frame().is_none());
        assert!(!app.session.is_viewer_visible());
    }

    #[tokio::test]
    async fn test_blank_tab_and_download_without_zone() {
        let mut app = app(None);
        app.init().await;
        app.open_in_blank_tab();
        assert_eq!(app.alert.as_deref(), Some("No game open"));
        app.alert = None;
        app.download();
        assert_eq!(app.alert.as_deref(), Some("No game open"));
    }

    #[tokio::test]
    async fn test_download_saves_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(None);
        app.config.download_dir = dir.path().to_path_buf();
        app.init().await;
        app.activate_tile(1, TileTarget::Label);
        assert!(app.process_next_message().await);

        app.download();
        assert!(app.process_next_message().await);
        let saved = std::fs::read_to_string(dir.path().join("Alpha.html")).unwrap();
        assert_eq!(saved, "<p>alpha</p>");
    }

    #[tokio::test]
    async fn test_grid_navigation_scrolls() {
        let mut app = app(None);
        app.init().await;
        app.update_grid_size(2, 1);
        app.select_down();
        assert_eq!(app.selected, 2);
        assert_eq!(app.scroll_row, 1);
        app.select_up();
        assert_eq!(app.selected, 0);
        assert_eq!(app.scroll_row, 0);
        app.select_last();
        assert_eq!(app.selected, 2);
    }
}
