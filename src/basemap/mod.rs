//! Basemap tile layer: slippy-map tile addressing, URL templating, a tile
//! cache and tracing raster tiles into braille dots.

mod cache;
mod raster;

pub use cache::{fetch_tile, TileCache};
pub use raster::trace_tiles;

use crate::config::TileConfig;
use crate::map::Viewport;

/// Edge length of a raster tile in its own pixels
pub const TILE_SIZE: f64 = 256.0;

/// Slippy-map tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }
}

/// Tile layer settings plus the addressing maths
#[derive(Debug, Clone)]
pub struct TileLayer {
    config: TileConfig,
    subdomains: Vec<char>,
}

impl TileLayer {
    pub fn new(config: TileConfig) -> Self {
        let subdomains = config.subdomains.chars().collect();
        Self { config, subdomains }
    }

    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn attribution(&self) -> &str {
        &self.config.attribution
    }

    /// Subdomain for a tile, rotating by `x + y`
    pub fn subdomain(&self, coord: TileCoord) -> Option<char> {
        if self.subdomains.is_empty() {
            return None;
        }
        let idx = (coord.x as usize + coord.y as usize) % self.subdomains.len();
        Some(self.subdomains[idx])
    }

    /// Fill the URL template for a tile
    pub fn tile_url(&self, coord: TileCoord) -> String {
        let subdomain = self.subdomain(coord).map(String::from).unwrap_or_default();
        let retina = if self.config.retina { "@2x" } else { "" };

        self.config
            .url_template
            .replace("{s}", &subdomain)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
            .replace("{r}", retina)
    }

    /// Largest viewport zoom that still has tiles at `max_zoom` detail
    pub fn zoom_limit(&self, width: usize) -> f64 {
        if width == 0 {
            return f64::INFINITY;
        }
        TILE_SIZE * 2f64.powi(self.config.max_zoom as i32) / width as f64
    }

    /// Smallest tile level whose pixels are at least as dense as the canvas
    pub fn level_for(&self, viewport: &Viewport) -> u8 {
        let ratio = viewport.scale() / TILE_SIZE;
        if !(ratio > 1.0) {
            return 0;
        }
        let level = ratio.log2().ceil();
        level.min(self.config.max_zoom as f64) as u8
    }

    /// Tiles covering the viewport at its tile level. X wraps around the
    /// antimeridian; rows beyond the poles are dropped.
    pub fn visible_tiles(&self, viewport: &Viewport) -> Vec<TileCoord> {
        if viewport.width == 0 || viewport.height == 0 {
            return Vec::new();
        }
        let z = self.level_for(viewport);
        let n = 1i64 << z;

        let (x0, y0) = viewport.to_world(0.0, 0.0);
        let (x1, y1) = viewport.to_world(viewport.width as f64, viewport.height as f64);

        let tx0 = (x0 * n as f64).floor() as i64;
        let tx1 = ((x1 * n as f64).ceil() as i64 - 1).min(tx0 + n - 1);
        let ty0 = ((y0 * n as f64).floor() as i64).max(0);
        let ty1 = ((y1 * n as f64).ceil() as i64 - 1).min(n - 1);

        let mut tiles = Vec::new();
        for ty in ty0..=ty1 {
            for tx in tx0..=tx1 {
                tiles.push(TileCoord::new(tx.rem_euclid(n) as u32, ty as u32, z));
            }
        }
        tiles
    }
}
