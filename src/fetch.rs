use crate::config::ExplorerConfig;
use crate::error::ExplorerError;
use reqwest::Client;
use std::future::Future;
use tracing::debug;

const USER_AGENT: &str = concat!("zone-explorer/", env!("CARGO_PKG_VERSION"));

/// Body and status of a GET, whatever the status was.
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub status: u16,
    pub body: String,
}

impl FetchedText {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can GET a URL as text.
///
/// Transport failures are errors; HTTP error statuses are not, callers decide
/// what a non-success status means for them.
pub trait ZoneSource {
    fn get_text(&self, url: &str) -> impl Future<Output = Result<FetchedText, ExplorerError>> + Send;
}

/// reqwest-backed source shared by every fetch the explorer makes.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &ExplorerConfig) -> Result<Self, ExplorerError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl ZoneSource for HttpSource {
    async fn get_text(&self, url: &str) -> Result<FetchedText, ExplorerError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(FetchedText { status, body })
    }
}

/// Replace `{COVER_URL}` and `{HTML_URL}` with the configured bases.
pub fn substitute_placeholders(template: &str, config: &ExplorerConfig) -> String {
    template
        .replace("{COVER_URL}", &config.cover_url)
        .replace("{HTML_URL}", &config.html_url)
}

/// Replace only `{HTML_URL}`; downloads resolve nothing else.
pub fn substitute_html_only(template: &str, config: &ExplorerConfig) -> String {
    template.replace("{HTML_URL}", &config.html_url)
}

/// Append a volatile `t=` query parameter so intermediate caches are bypassed.
pub fn cache_bust(url: &str, stamp: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}t={stamp}")
}

/// Milliseconds since the epoch, used as the cache-bust value.
pub fn now_stamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Absolute web addresses are opened in the browser instead of embedded.
pub fn is_external(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}


#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExplorerConfig {
        ExplorerConfig {
            cover_url: "https://covers.test".to_string(),
            html_url: "https://html.test".to_string(),
            ..ExplorerConfig::default()
        }
    }

    #[test]
    fn test_substitute_both_placeholders() {
        let out = substitute_placeholders("{COVER_URL}/5.png|{HTML_URL}/5.html", &config());
        assert_eq!(out, "https://covers.test/5.png|https://html.test/5.html");
    }

    #[test]
    fn test_substitute_html_only_leaves_cover_token() {
        let out = substitute_html_only("{COVER_URL}/{HTML_URL}", &config());
        assert_eq!(out, "{COVER_URL}/https://html.test");
    }

    #[test]
    fn test_cache_bust_separator() {
        assert_eq!(cache_bust("https://a.test/x.json", 7), "https://a.test/x.json?t=7");
        assert_eq!(
            cache_bust("https://a.test/files?period=year", 7),
            "https://a.test/files?period=year&t=7"
        );
    }

    #[test]
    fn test_is_external() {
        assert!(is_external("https://example.com/game"));
        assert!(is_external("HTTP://example.com"));
        assert!(!is_external("{HTML_URL}/12.html"));
        assert!(!is_external("games/12.html"));
    }

    #[test]
    fn test_success_range() {
        let ok = FetchedText { status: 204, body: String::new() };
        let missing = FetchedText { status: 404, body: String::new() };
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }
}
