use crate::catalog::ZoneRecord;
use crate::config::ExplorerConfig;
use crate::fetch::{cache_bust, substitute_placeholders};

/// One clickable cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub zone_id: i64,
    /// Cover URL with placeholders substituted and the cache-bust applied.
    pub image_url: String,
    pub label: String,
}

/// Which part of a tile received a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileTarget {
    Cover,
    Label,
}

/// Output of a render: the tiles in display order plus the count indicator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridView {
    pub tiles: Vec<Tile>,
    pub count_label: String,
}

impl GridView {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Zone to open when `index` is clicked on `target`.
    ///
    /// A label click is consumed by the label and never reaches the tile, so
    /// either target yields exactly one open.
    pub fn activate(&self, index: usize, target: TileTarget) -> Option<i64> {
        let tile = self.tiles.get(index)?;
        match target {
            TileTarget::Label | TileTarget::Cover => Some(tile.zone_id),
        }
    }
}

/// Build a fresh grid for `zones`, replacing whatever was shown before.
///
/// `stamp` is the cache-bust value for cover images; passing the catalog's
/// load stamp keeps repeated renders of the same list identical.
pub fn render(zones: &[&ZoneRecord], config: &ExplorerConfig, stamp: i64) -> GridView {
    let tiles = zones
        .iter()
        .map(|zone| Tile {
            zone_id: zone.id,
            image_url: cache_bust(&substitute_placeholders(&zone.cover, config), stamp),
            label: zone.name.clone(),
        })
        .collect::<Vec<_>>();

    let count_label = count_label(tiles.len());
    GridView { tiles, count_label }
}

pub fn count_label(n: usize) -> String {
    if n == 0 {
        "No zones found".to_string()
    } else {
        format!("Zones Loaded: {}", n)
    }
}
