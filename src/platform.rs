use crate::error::ExplorerError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>.*?</title>").expect("static regex"));

/// A blank document opened outside the explorer, filled in later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankTab {
    path: PathBuf,
}

impl BlankTab {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the tab's document with `html`, titled `title`.
    pub fn write_document(&self, html: &str, title: &str) -> Result<(), ExplorerError> {
        std::fs::write(&self.path, with_title(html, title))?;
        Ok(())
    }

    /// Delete the tab's file when it will never be filled.
    pub fn discard(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Discarded blank tab {}", self.path.display()),
            Err(e) => warn!("Could not remove blank tab {}: {}", self.path.display(), e),
        }
    }
}

fn with_title(html: &str, title: &str) -> String {
    let tag = format!("<title>{}</title>", escape_text(title));
    if TITLE_RE.is_match(html) {
        TITLE_RE.replace(html, regex::NoExpand(&tag)).into_owned()
    } else {
        format!("{}{}", tag, html)
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Host services the explorer needs from its surroundings.
pub trait Platform {
    /// Open an absolute URL in a new, independent browser tab.
    fn open_external(&mut self, url: &str) -> Result<(), ExplorerError>;

    /// Create an empty tab. `None` means the host refused.
    fn open_blank_tab(&mut self) -> Option<BlankTab>;

    /// Show a blank tab once its document has been written.
    fn reveal_tab(&mut self, tab: &BlankTab) -> Result<(), ExplorerError>;

    /// Ask for fullscreen on the live content frame. `false` when unsupported.
    fn request_fullscreen(&mut self) -> bool;

    fn set_title(&mut self, title: &str);

    fn set_icon(&mut self, href: &str);
}

/// Platform backed by the terminal and the system browser.
#[derive(Debug, Default)]
pub struct TerminalPlatform {
    icon: Option<String>,
}

impl TerminalPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    fn launch(target: &str) -> Result<(), ExplorerError> {
        let mut cmd = if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg(target);
            c
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", target]);
            c
        } else {
            let mut c = Command::new("xdg-open");
            c.arg(target);
            c
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

impl Platform for TerminalPlatform {
    fn open_external(&mut self, url: &str) -> Result<(), ExplorerError> {
        info!("Opening external zone {}", url);
        Self::launch(url)
    }

    fn open_blank_tab(&mut self) -> Option<BlankTab> {
        let file = tempfile::Builder::new()
            .prefix("zone-")
            .suffix(".html")
            .tempfile();
        match file.map(|f| f.into_temp_path().keep()) {
            Ok(Ok(path)) => {
                debug!("Blank tab at {}", path.display());
                Some(BlankTab::new(path))
            }
            Ok(Err(e)) => {
                warn!("Could not keep blank tab file: {}", e);
                None
            }
            Err(e) => {
                warn!("Could not create blank tab file: {}", e);
                None
            }
        }
    }

    fn reveal_tab(&mut self, tab: &BlankTab) -> Result<(), ExplorerError> {
        Self::launch(&tab.path().to_string_lossy())
    }

    fn request_fullscreen(&mut self) -> bool {
        // The viewer pane can always take over the whole screen.
        true
    }

    fn set_title(&mut self, title: &str) {
        let mut out = std::io::stdout();
        if let Err(e) = crossterm::execute!(out, crossterm::terminal::SetTitle(title)) {
            warn!("Failed to set terminal title: {}", e);
        }
    }

    fn set_icon(&mut self, href: &str) {
        // Terminals have no favicon; keep it so the state survives a toggle.
        debug!("Icon set to {}", href);
        self.icon = Some(href.to_string());
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Platform double that records every request.
    #[derive(Debug)]
    pub struct RecordingPlatform {
        pub dir: tempfile::TempDir,
        pub external: Vec<String>,
        pub revealed: Vec<PathBuf>,
        pub titles: Vec<String>,
        pub icons: Vec<String>,
        pub block_popups: bool,
        pub fullscreen_available: bool,
        pub fullscreen_requests: usize,
    }

    impl Default for RecordingPlatform {
        fn default() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                external: Vec::new(),
                revealed: Vec::new(),
                titles: Vec::new(),
                icons: Vec::new(),
                block_popups: false,
                fullscreen_available: true,
                fullscreen_requests: 0,
            }
        }
    }

    impl Platform for RecordingPlatform {
        fn open_external(&mut self, url: &str) -> Result<(), ExplorerError> {
            self.external.push(url.to_string());
            Ok(())
        }

        fn open_blank_tab(&mut self) -> Option<BlankTab> {
            if self.block_popups {
                return None;
            }
            let path = self.dir.path().join(format!("tab-{}.html", self.revealed.len()));
            std::fs::write(&path, "").ok()?;
            Some(BlankTab::new(path))
        }

        fn reveal_tab(&mut self, tab: &BlankTab) -> Result<(), ExplorerError> {
            self.revealed.push(tab.path().to_path_buf());
            Ok(())
        }

        fn request_fullscreen(&mut self) -> bool {
            self.fullscreen_requests += 1;
            self.fullscreen_available
        }

        fn set_title(&mut self, title: &str) {
            self.titles.push(title.to_string());
        }

        fn set_icon(&mut self, href: &str) {
            self.icons.push(href.to_string());
        }
    }
}
