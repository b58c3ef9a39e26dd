use crate::catalog::ZoneRecord;
use crate::config::ExplorerConfig;
use crate::error::ExplorerError;
use crate::fetch::{
    FetchedText, cache_bust, is_external, now_stamp, substitute_html_only, substitute_placeholders,
};
use crate::platform::{BlankTab, Platform};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

pub const FULLSCREEN_FALLBACK: &str = "Fullscreen blocked. Try pressing F11.";

/// Lifecycle of a frame's document: opened, written, then closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentState {
    Blank,
    Open,
    Closed,
}

/// The document living inside a content frame.
#[derive(Debug, Clone)]
pub struct FrameDocument {
    state: DocumentState,
    html: String,
}

impl FrameDocument {
    fn new() -> Self {
        Self {
            state: DocumentState::Blank,
            html: String::new(),
        }
    }

    fn open(&mut self) {
        self.html.clear();
        self.state = DocumentState::Open;
    }

    fn write(&mut self, html: &str) {
        debug_assert_eq!(self.state, DocumentState::Open);
        self.html.push_str(html);
    }

    fn close(&mut self) {
        self.state = DocumentState::Closed;
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.state == DocumentState::Closed
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// A live embedded frame holding one zone's document.
#[derive(Debug, Clone)]
pub struct ContentFrame {
    id: u64,
    document: FrameDocument,
    text: Vec<String>,
}

impl ContentFrame {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn document(&self) -> &FrameDocument {
        &self.document
    }

    /// Readable text of the document, one entry per line.
    pub fn text_lines(&self) -> &[String] {
        &self.text
    }
}

/// Display metadata for the open zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMeta {
    pub name: String,
    pub author: String,
    pub author_link: String,
}

impl ZoneMeta {
    fn for_zone(zone: &ZoneRecord) -> Self {
        let name = if zone.name.is_empty() {
            "Untitled Game".to_string()
        } else {
            zone.name.clone()
        };
        let author = match zone.author.as_deref() {
            Some(a) if !a.is_empty() => format!("by {}", a),
            _ => "by Unknown".to_string(),
        };
        let author_link = match zone.author_link.as_deref() {
            Some(l) if !l.is_empty() => l.to_string(),
            _ => "#".to_string(),
        };
        Self {
            name,
            author,
            author_link,
        }
    }
}

/// Content fetch issued by `begin_open`, to be answered with `complete_open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub token: u64,
    pub url: String,
}

/// What `complete_open` did with a finished fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenCompletion {
    Embedded,
    /// A newer open or a close happened since the fetch was issued.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullscreenOutcome {
    NoSession,
    Entered,
    Unavailable(String),
}

/// Blank tab created for the open zone, waiting for its content.
#[derive(Debug, Clone)]
pub struct BlankTabRequest {
    pub tab: BlankTab,
    pub url: String,
    pub title: String,
}

impl BlankTabRequest {
    /// Write the fetched content into the tab and show it.
    pub fn finish(
        &self,
        result: Result<FetchedText, ExplorerError>,
        platform: &mut impl Platform,
    ) -> Result<PathBuf, ExplorerError> {
        let written = result
            .map_err(|e| ExplorerError::ZoneContent(e.to_string()))
            .and_then(|fetched| self.tab.write_document(&fetched.body, &self.title));
        if let Err(e) = written {
            self.tab.discard();
            return Err(e);
        }
        platform.reveal_tab(&self.tab)?;
        info!("Opened {} in blank tab {}", self.title, self.tab.path().display());
        Ok(self.tab.path().to_path_buf())
    }
}

/// Download of the open zone's raw HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub file_name: String,
}

impl DownloadRequest {
    /// Save the fetched body under `dir`.
    pub fn save(
        &self,
        dir: &Path,
        result: Result<FetchedText, ExplorerError>,
    ) -> Result<PathBuf, ExplorerError> {
        let fetched = result.map_err(|e| ExplorerError::ZoneContent(e.to_string()))?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, fetched.body)?;
        info!("Downloaded {}", path.display());
        Ok(path)
    }
}

/// File name for a downloaded zone: every char outside `[A-Za-z0-9]` becomes `_`.
pub fn download_file_name(name: &str) -> String {
    let name = if name.is_empty() { "game" } else { name };
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.html", stem)
}

/// The single open zone and its embedded frame.
#[derive(Debug, Default)]
pub struct ZoneSession {
    current: Option<ZoneRecord>,
    frame: Option<ContentFrame>,
    meta: Option<ZoneMeta>,
    viewer_visible: bool,
    fullscreen: bool,
    loading: bool,
    scroll: u16,
    /// Bumped on every open and close; completions carrying an older value are dropped.
    token: u64,
    next_frame_id: u64,
}

impl ZoneSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ZoneRecord> {
        self.current.as_ref()
    }

    pub fn frame(&self) -> Option<&ContentFrame> {
        self.frame.as_ref()
    }

    pub fn meta(&self) -> Option<&ZoneMeta> {
        self.meta.as_ref()
    }

    pub fn is_viewer_visible(&self) -> bool {
        self.viewer_visible
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Make `zone` the current session.
    ///
    /// External zones go straight to the platform and return `None`; nothing
    /// is embedded for them. Other zones show the viewer and return the
    /// content fetch to perform.
    pub fn begin_open(
        &mut self,
        zone: &ZoneRecord,
        config: &ExplorerConfig,
        platform: &mut impl Platform,
    ) -> Result<Option<ContentRequest>, ExplorerError> {
        self.current = Some(zone.clone());
        self.token += 1;

        if is_external(&zone.url) {
            self.loading = false;
            // A superseded pending embed leaves nothing to show
            if self.frame.is_none() {
                self.viewer_visible = false;
                self.fullscreen = false;
            }
            platform.open_external(&zone.url)?;
            return Ok(None);
        }

        self.viewer_visible = true;
        self.loading = true;
        let url = cache_bust(&substitute_placeholders(&zone.url, config), now_stamp());
        info!("Opening zone {} ({})", zone.id, zone.name);
        Ok(Some(ContentRequest {
            token: self.token,
            url,
        }))
    }

    /// Apply the result of the fetch issued by `begin_open`.
    ///
    /// Failures close the session and are returned for the caller to show.
    pub fn complete_open(
        &mut self,
        token: u64,
        result: Result<FetchedText, ExplorerError>,
    ) -> Result<OpenCompletion, ExplorerError> {
        if token != self.token {
            debug!("Dropping stale content for request {} (current {})", token, self.token);
            return Ok(OpenCompletion::Stale);
        }
        self.loading = false;

        let fetched = match result {
            Ok(f) if f.is_success() => f,
            Ok(f) => {
                warn!("Zone content returned HTTP {}", f.status);
                self.close();
                return Err(ExplorerError::ZoneContent("Game not found".to_string()));
            }
            Err(e) => {
                warn!("Zone content fetch failed: {}", e);
                self.close();
                return Err(match e {
                    ExplorerError::ZoneContent(msg) => ExplorerError::ZoneContent(msg),
                    other => ExplorerError::ZoneContent(other.to_string()),
                });
            }
        };

        self.replace_embedded(&fetched.body);
        self.meta = self.current.as_ref().map(ZoneMeta::for_zone);
        self.scroll = 0;
        Ok(OpenCompletion::Embedded)
    }

    /// Tear down the live frame, then create a fresh one holding `html`.
    pub fn replace_embedded(&mut self, html: &str) {
        if let Some(old) = self.frame.take() {
            debug!("Detached content frame {}", old.id);
        }

        self.next_frame_id += 1;
        let mut document = FrameDocument::new();
        document.open();
        document.write(html);
        document.close();

        let text = document_text(document.html());
        self.frame = Some(ContentFrame {
            id: self.next_frame_id,
            document,
            text,
        });
        debug!("Attached content frame {}", self.next_frame_id);
    }

    /// Hide the viewer and drop the frame. Safe to call when nothing is open.
    pub fn close(&mut self) {
        if self.current.is_none() && self.frame.is_none() && !self.viewer_visible {
            return;
        }
        self.viewer_visible = false;
        self.fullscreen = false;
        self.loading = false;
        if let Some(frame) = self.frame.take() {
            debug!("Detached content frame {}", frame.id);
        }
        self.meta = None;
        self.current = None;
        self.token += 1;
        info!("Zone session closed");
    }

    pub fn fullscreen(&mut self, platform: &mut impl Platform) -> FullscreenOutcome {
        if self.frame.is_none() {
            return FullscreenOutcome::NoSession;
        }
        if platform.request_fullscreen() {
            self.fullscreen = true;
            FullscreenOutcome::Entered
        } else {
            FullscreenOutcome::Unavailable(FULLSCREEN_FALLBACK.to_string())
        }
    }

    pub fn exit_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    /// Create a blank tab for the open zone and describe what to fetch into it.
    pub fn begin_blank_tab(
        &self,
        config: &ExplorerConfig,
        platform: &mut impl Platform,
    ) -> Result<BlankTabRequest, ExplorerError> {
        let zone = self.current.as_ref().ok_or(ExplorerError::NoZoneOpen)?;
        let tab = platform.open_blank_tab().ok_or(ExplorerError::PopupBlocked)?;
        let url = cache_bust(&substitute_placeholders(&zone.url, config), now_stamp());
        let title = if zone.name.is_empty() {
            "Game".to_string()
        } else {
            zone.name.clone()
        };
        Ok(BlankTabRequest { tab, url, title })
    }

    pub fn begin_download(&self, config: &ExplorerConfig) -> Result<DownloadRequest, ExplorerError> {
        let zone = self.current.as_ref().ok_or(ExplorerError::NoZoneOpen)?;
        Ok(DownloadRequest {
            url: cache_bust(&substitute_html_only(&zone.url, config), now_stamp()),
            file_name: download_file_name(&zone.name),
        })
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }
}

static HIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>").expect("static regex")
});
static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|title|section|article|header|footer)\s*>")
        .expect("static regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));

/// Visible text of an HTML document, blank lines collapsed.
fn document_text(html: &str) -> Vec<String> {
    let without_hidden = HIDDEN_RE.replace_all(html, "");
    let with_breaks = BREAK_RE.replace_all(&without_hidden, "\n");
    let text = TAG_RE.replace_all(&with_breaks, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let mut lines = Vec::new();
    for line in text.lines() {
        let trimmed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if trimmed.is_empty() && lines.last().is_none_or(|l: &String| l.is_empty()) {
            continue;
        }
        lines.push(trimmed);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ZoneSource;
    use crate::fetch::testing::FakeSource;
    use crate::platform::testing::RecordingPlatform;

    fn zone(id: i64, name: &str, url: &str) -> ZoneRecord {
        ZoneRecord {
            id,
            name: name.to_string(),
            tags: Vec::new(),
            cover: String::new(),
            url: url.to_string(),
            author: None,
            author_link: None,
        }
    }

    fn config() -> ExplorerConfig {
        ExplorerConfig {
            cover_url: "https://covers.test".to_string(),
            html_url: "https://html.test".to_string(),
            ..ExplorerConfig::default()
        }
    }

    fn ok(body: &str) -> Result<FetchedText, ExplorerError> {
        Ok(FetchedText {
            status: 200,
            body: body.to_string(),
        })
    }

    async fn open_via(
        session: &mut ZoneSession,
        record: &ZoneRecord,
        source: &FakeSource,
        platform: &mut RecordingPlatform,
    ) -> Result<Option<OpenCompletion>, ExplorerError> {
        match session.begin_open(record, &config(), platform)? {
            Some(req) => {
                let result = source.get_text(&req.url).await;
                session.complete_open(req.token, result).map(Some)
            }
            None => Ok(None),
        }
    }

    #[tokio::test]
    async fn test_open_embeds_fetched_html() {
        let source = FakeSource::default().with("https://html.test/3.html", 200, "<h1>Snake</h1><p>Go</p>");
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        let record = zone(3, "Snake", "{HTML_URL}/3.html");

        let outcome = open_via(&mut session, &record, &source, &mut platform).await.unwrap();
        assert_eq!(outcome, Some(OpenCompletion::Embedded));
        assert!(session.is_viewer_visible());
        assert!(!session.is_loading());

        let frame = session.frame().unwrap();
        assert!(frame.document().is_closed());
        assert_eq!(frame.document().html(), "<h1>Snake</h1><p>Go</p>");
        assert_eq!(frame.text_lines(), ["Snake", "Go"]);
        assert!(source.requested()[0].starts_with("https://html.test/3.html?t="));

        let meta = session.meta().unwrap();
        assert_eq!(meta.name, "Snake");
        assert_eq!(meta.author, "by Unknown");
        assert_eq!(meta.author_link, "#");
    }

    #[tokio::test]
    async fn test_external_url_never_embeds() {
        let source = FakeSource::default();
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        let record = zone(8, "Portal", "https://elsewhere.test/play");

        let outcome = open_via(&mut session, &record, &source, &mut platform).await.unwrap();
        assert_eq!(outcome, None);
        assert!(session.frame().is_none());
        assert!(!session.is_viewer_visible());
        assert_eq!(platform.external, ["https://elsewhere.test/play"]);
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_closes_session() {
        let source = FakeSource::default();
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        let record = zone(4, "Missing", "{HTML_URL}/4.html");

        let err = open_via(&mut session, &record, &source, &mut platform).await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to load game: Game not found");
        assert!(session.frame().is_none());
        assert!(session.current().is_none());
        assert!(!session.is_viewer_visible());
    }

    #[tokio::test]
    async fn test_transport_error_closes_session() {
        let source = FakeSource::default().failing("https://html.test/4.html");
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        let record = zone(4, "Flaky", "{HTML_URL}/4.html");

        let err = open_via(&mut session, &record, &source, &mut platform).await.unwrap_err();
        assert!(matches!(err, ExplorerError::ZoneContent(_)));
        assert!(session.frame().is_none());
        assert!(session.current().is_none());
    }

    #[test]
    fn test_reopen_replaces_frame() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();

        let first = session
            .begin_open(&zone(1, "One", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap()
            .unwrap();
        session.complete_open(first.token, ok("<p>one</p>")).unwrap();
        let first_id = session.frame().unwrap().id();

        let second = session
            .begin_open(&zone(2, "Two", "{HTML_URL}/2.html"), &config(), &mut platform)
            .unwrap()
            .unwrap();
        session.complete_open(second.token, ok("<p>two</p>")).unwrap();

        let frame = session.frame().unwrap();
        assert_ne!(frame.id(), first_id);
        assert_eq!(frame.document().html(), "<p>two</p>");
        assert_eq!(session.meta().unwrap().name, "Two");
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();

        let slow = session
            .begin_open(&zone(1, "Slow", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap()
            .unwrap();
        let fast = session
            .begin_open(&zone(2, "Fast", "{HTML_URL}/2.html"), &config(), &mut platform)
            .unwrap()
            .unwrap();

        assert_eq!(session.complete_open(fast.token, ok("fast")).unwrap(), OpenCompletion::Embedded);
        assert_eq!(session.complete_open(slow.token, ok("slow")).unwrap(), OpenCompletion::Stale);
        assert_eq!(session.frame().unwrap().document().html(), "fast");
        assert_eq!(session.current().unwrap().id, 2);
    }

    #[test]
    fn test_completion_after_close_is_dropped() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        let req = session
            .begin_open(&zone(1, "One", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap()
            .unwrap();
        session.close();

        assert_eq!(session.complete_open(req.token, ok("late")).unwrap(), OpenCompletion::Stale);
        assert!(session.frame().is_none());
    }

    #[test]
    fn test_external_open_while_loading_hides_viewer() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        let pending = session
            .begin_open(&zone(1, "One", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap()
            .unwrap();
        assert!(session.is_viewer_visible());

        let external = zone(2, "Portal", "https://elsewhere.test/play");
        assert!(session.begin_open(&external, &config(), &mut platform).unwrap().is_none());
        assert!(!session.is_viewer_visible());
        assert!(!session.is_loading());

        assert_eq!(session.complete_open(pending.token, ok("late")).unwrap(), OpenCompletion::Stale);
        assert!(session.frame().is_none());
    }

    #[test]
    fn test_external_open_keeps_live_frame() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        let req = session
            .begin_open(&zone(1, "One", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap()
            .unwrap();
        session.complete_open(req.token, ok("<p>one</p>")).unwrap();

        let external = zone(2, "Portal", "https://elsewhere.test/play");
        session.begin_open(&external, &config(), &mut platform).unwrap();
        assert!(session.is_viewer_visible());
        assert_eq!(session.frame().unwrap().document().html(), "<p>one</p>");
    }

    #[test]
    fn test_close_without_session_is_noop() {
        let mut session = ZoneSession::new();
        session.close();
        session.close();
        assert!(session.current().is_none());
        assert!(!session.is_viewer_visible());
    }

    #[test]
    fn test_meta_uses_author_fields() {
        let mut record = zone(1, "", "{HTML_URL}/1.html");
        record.author = Some("Ada".to_string());
        record.author_link = Some("https://ada.test".to_string());
        let meta = ZoneMeta::for_zone(&record);
        assert_eq!(meta.name, "Untitled Game");
        assert_eq!(meta.author, "by Ada");
        assert_eq!(meta.author_link, "https://ada.test");
    }

    #[test]
    fn test_open_resets_scroll() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        session.scroll_down(12);
        let req = session
            .begin_open(&zone(1, "One", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap()
            .unwrap();
        session.complete_open(req.token, ok("x")).unwrap();
        assert_eq!(session.scroll(), 0);
    }

    #[test]
    fn test_fullscreen_paths() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        assert_eq!(session.fullscreen(&mut platform), FullscreenOutcome::NoSession);
        assert_eq!(platform.fullscreen_requests, 0);

        session.replace_embedded("<p>x</p>");
        assert_eq!(session.fullscreen(&mut platform), FullscreenOutcome::Entered);
        assert!(session.is_fullscreen());

        session.exit_fullscreen();
        platform.fullscreen_available = false;
        assert_eq!(
            session.fullscreen(&mut platform),
            FullscreenOutcome::Unavailable(FULLSCREEN_FALLBACK.to_string())
        );
        assert!(!session.is_fullscreen());
    }

    #[test]
    fn test_blank_tab_requires_open_zone() {
        let mut platform = RecordingPlatform::default();
        let session = ZoneSession::new();
        let err = session.begin_blank_tab(&config(), &mut platform).unwrap_err();
        assert!(matches!(err, ExplorerError::NoZoneOpen));
    }

    #[test]
    fn test_blank_tab_popup_blocked() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        session
            .begin_open(&zone(1, "One", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap();

        platform.block_popups = true;
        let err = session.begin_blank_tab(&config(), &mut platform).unwrap_err();
        assert!(matches!(err, ExplorerError::PopupBlocked));
    }

    #[tokio::test]
    async fn test_blank_tab_written_and_revealed() {
        let source = FakeSource::default().with("https://html.test/1.html", 200, "<p>one</p>");
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        session
            .begin_open(&zone(1, "One", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap();

        let req = session.begin_blank_tab(&config(), &mut platform).unwrap();
        assert!(req.url.starts_with("https://html.test/1.html?t="));
        let result = source.get_text(&req.url).await;
        let path = req.finish(result, &mut platform).unwrap();

        assert_eq!(platform.revealed, [path.clone()]);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<title>One</title><p>one</p>");
    }

    #[test]
    fn test_failed_blank_tab_fetch_removes_file() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        session
            .begin_open(&zone(1, "One", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap();

        let req = session.begin_blank_tab(&config(), &mut platform).unwrap();
        assert!(req.tab.path().exists());
        let err = req
            .finish(Err(ExplorerError::ZoneContent("refused".to_string())), &mut platform)
            .unwrap_err();

        assert!(matches!(err, ExplorerError::ZoneContent(_)));
        assert!(!req.tab.path().exists());
        assert!(platform.revealed.is_empty());
    }

    #[test]
    fn test_download_requires_open_zone() {
        let session = ZoneSession::new();
        assert!(matches!(
            session.begin_download(&config()),
            Err(ExplorerError::NoZoneOpen)
        ));
    }

    #[test]
    fn test_download_substitutes_html_only() {
        let mut platform = RecordingPlatform::default();
        let mut session = ZoneSession::new();
        session
            .begin_open(&zone(1, "My Game!", "{HTML_URL}/1.html"), &config(), &mut platform)
            .unwrap();

        let req = session.begin_download(&config()).unwrap();
        assert_eq!(req.file_name, "My_Game_.html");
        assert!(req.url.starts_with("https://html.test/1.html?t="));

        let dir = tempfile::tempdir().unwrap();
        let path = req.save(&dir.path().join("downloads"), ok("<p>1</p>")).unwrap();
        assert_eq!(path.file_name().unwrap(), "My_Game_.html");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<p>1</p>");
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(download_file_name("My Game!"), "My_Game_.html");
        assert_eq!(download_file_name(""), "game.html");
        assert_eq!(download_file_name("Café 2"), "Caf__2.html");
    }

    #[test]
    fn test_document_text_drops_scripts() {
        let html = "<html><head><title>T</title><style>p{}</style></head><body><script>var a = 1;</script><p>Hello&nbsp;there</p><!-- c --><div>A &amp; B</div></body></html>";
        assert_eq!(document_text(html), ["T", "Hello there", "A & B"]);
    }
}
