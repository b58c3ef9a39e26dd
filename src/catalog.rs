use crate::config::ExplorerConfig;
use crate::error::ExplorerError;
use crate::fetch::{ZoneSource, cache_bust, now_stamp};
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Id carried by entries that always sort to the top.
pub const PINNED_ID: i64 = -1;

/// One entry of the remote catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub cover: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub author: Option<String>,
    #[serde(default, rename = "authorLink", deserialize_with = "deserialize_optional_text")]
    pub author_link: Option<String>,
}

impl ZoneRecord {
    pub fn is_pinned(&self) -> bool {
        self.id == PINNED_ID
    }

    /// Whether `query` (already lowercased) appears in the name or any tag.
    fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(query))
    }
}

/// Ids arrive as numbers or numeric strings; both mean the same zone.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| D::Error::custom(format!("invalid zone id {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("invalid zone id {:?}", s))),
        other => Err(D::Error::custom(format!("invalid zone id {}", other))),
    }
}

/// Scalars as display text; null, arrays and objects carry no text.
fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Display fields never fail the catalog: an off-type value reads as missing.
fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_text(serde_json::Value::deserialize(deserializer)?).unwrap_or_default())
}

fn deserialize_optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(value_text(serde_json::Value::deserialize(deserializer)?))
}

fn deserialize_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items.into_iter().filter_map(value_text).collect(),
        _ => Vec::new(),
    })
}

/// Zone id → total hits. Missing ids count as zero.
pub type PopularityMap = HashMap<i64, u64>;

static STATS_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)\.html$").expect("static regex"));

/// Build the popularity map from a statistics response.
///
/// Entries without a `/<digits>.html` name or without a numeric hit total are
/// skipped. A body that is not a JSON array yields an empty map.
pub fn parse_popularity(body: &str) -> PopularityMap {
    let mut map = PopularityMap::new();
    let entries: Vec<serde_json::Value> = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            debug!("Ignoring unreadable popularity data: {}", e);
            return map;
        }
    };

    for entry in &entries {
        let Some(name) = entry.get("name").and_then(|n| n.as_str()) else {
            continue;
        };
        let Some(caps) = STATS_FILE_RE.captures(name) else {
            continue;
        };
        let Ok(id) = caps[1].parse::<i64>() else {
            continue;
        };
        if let Some(total) = entry
            .get("hits")
            .and_then(|h| h.get("total"))
            .and_then(|t| t.as_u64())
        {
            map.insert(id, total);
        }
    }
    map
}

/// Primary ordering applied before pinned entries are promoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Id,
    Popular,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Id,
            Self::Id => Self::Popular,
            Self::Popular => Self::Name,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Id => "ID",
            Self::Popular => "Popular",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Id => "id",
            Self::Popular => "popular",
        };
        f.write_str(s)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "id" => Ok(Self::Id),
            "popular" => Ok(Self::Popular),
            other => Err(format!("unknown sort key '{}' (expected name, id or popular)", other)),
        }
    }
}

/// Base letters only: decomposed, combining marks dropped, lowercased.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Letter order first, then unaccented before accented, then lowercase
/// before uppercase.
fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Stage one: stable sort by the chosen key alone.
pub fn sort_primary(zones: &mut [ZoneRecord], by: SortKey, popularity: &PopularityMap) {
    match by {
        SortKey::Name => zones.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::Id => zones.sort_by_key(|z| z.id),
        SortKey::Popular => {
            let score = |z: &ZoneRecord| popularity.get(&z.id).copied().unwrap_or(0);
            zones.sort_by(|a, b| score(b).cmp(&score(a)));
        }
    }
}

/// Stage two: stable move of every pinned entry to the front.
///
/// Pinned entries keep the order stage one left them in, and so do the rest.
pub fn promote_pinned(zones: &mut [ZoneRecord]) {
    zones.sort_by_key(|z| !z.is_pinned());
}

/// In-memory catalog: the zone list plus its popularity scores.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    zones: Vec<ZoneRecord>,
    popularity: PopularityMap,
    /// Cache-bust stamp fixed at load time, reused for cover images.
    loaded_at: i64,
}

impl Catalog {
    #[cfg(test)]
    pub fn new(zones: Vec<ZoneRecord>, popularity: PopularityMap) -> Self {
        Self {
            zones,
            popularity,
            loaded_at: now_stamp(),
        }
    }

    /// Fetch the catalog, then its popularity data.
    ///
    /// Any catalog failure is a `CatalogLoad` error. Popularity failures are
    /// swallowed and leave the scores empty.
    pub async fn load<S: ZoneSource>(
        source: &S,
        config: &ExplorerConfig,
    ) -> Result<Self, ExplorerError> {
        let stamp = now_stamp();
        let url = cache_bust(&config.catalog_url, stamp);
        info!("Loading catalog from {}", config.catalog_url);

        let response = source
            .get_text(&url)
            .await
            .map_err(|e| ExplorerError::CatalogLoad(e.to_string()))?;
        if !response.is_success() {
            return Err(ExplorerError::CatalogLoad(format!(
                "HTTP {} from catalog endpoint",
                response.status
            )));
        }
        let zones: Vec<ZoneRecord> = serde_json::from_str(&response.body)
            .map_err(|e| ExplorerError::CatalogLoad(e.to_string()))?;

        let popularity = Self::fetch_popularity(source, config).await;
        info!(
            "Catalog loaded: {} zones, {} with popularity data",
            zones.len(),
            popularity.len()
        );

        Ok(Self {
            zones,
            popularity,
            loaded_at: stamp,
        })
    }

    async fn fetch_popularity<S: ZoneSource>(source: &S, config: &ExplorerConfig) -> PopularityMap {
        let url = cache_bust(&config.popularity_url, now_stamp());
        match source.get_text(&url).await {
            Ok(resp) if resp.is_success() => parse_popularity(&resp.body),
            Ok(resp) => {
                warn!("Popularity endpoint returned HTTP {}", resp.status);
                PopularityMap::new()
            }
            Err(e) => {
                warn!("Popularity fetch failed: {}", e);
                PopularityMap::new()
            }
        }
    }

    #[cfg(test)]
    pub fn zones(&self) -> &[ZoneRecord] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn popularity(&self, id: i64) -> u64 {
        self.popularity.get(&id).copied().unwrap_or(0)
    }

    pub fn loaded_at(&self) -> i64 {
        self.loaded_at
    }

    /// Reorder the stored list: primary key first, then pinned promotion.
    pub fn sort(&mut self, by: SortKey) {
        sort_primary(&mut self.zones, by, &self.popularity);
        promote_pinned(&mut self.zones);
        debug!("Sorted {} zones by {}", self.zones.len(), by);
    }

    /// Records whose name or tags contain `query`, in stored order.
    pub fn filter(&self, query: &str) -> Vec<&ZoneRecord> {
        let query = query.to_lowercase();
        if query.is_empty() {
            return self.zones.iter().collect();
        }
        self.zones.iter().filter(|z| z.matches(&query)).collect()
    }

    /// Look up a zone named by a textual id such as a command-line argument.
    pub fn find_by_requested_id(&self, requested: &str) -> Option<&ZoneRecord> {
        let requested = requested.trim();
        self.zones.iter().find(|z| z.id.to_string() == requested)
    }
}
