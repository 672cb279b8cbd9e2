use super::TileCoord;
use crate::error::TileError;
use image::GrayImage;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Decoded tiles plus bookkeeping for in-flight and failed requests
pub struct TileCache {
    tiles: HashMap<TileCoord, GrayImage>,
    pending: HashSet<TileCoord>,
    failed: HashSet<TileCoord>,
    capacity: usize,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            tiles: HashMap::new(),
            pending: HashSet::new(),
            failed: HashSet::new(),
            capacity,
        }
    }

    /// True if the tile is neither cached, in flight, nor known bad
    pub fn needs(&self, coord: &TileCoord) -> bool {
        !self.tiles.contains_key(coord) && !self.pending.contains(coord) && !self.failed.contains(coord)
    }

    pub fn mark_pending(&mut self, coord: TileCoord) {
        self.pending.insert(coord);
    }

    /// Record the outcome of a fetch. Failed tiles are not retried.
    pub fn insert(&mut self, coord: TileCoord, result: Result<GrayImage, TileError>) {
        self.pending.remove(&coord);
        match result {
            Ok(tile) => {
                self.tiles.insert(coord, tile);
            }
            Err(e) => {
                warn!(z = coord.z, x = coord.x, y = coord.y, error = %e, "tile unavailable");
                self.failed.insert(coord);
            }
        }
    }

    pub fn get(&self, coord: &TileCoord) -> Option<&GrayImage> {
        self.tiles.get(coord)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop tiles that aren't visible once the cache outgrows its capacity
    pub fn evict(&mut self, visible: &[TileCoord]) {
        if self.tiles.len() <= self.capacity {
            return;
        }
        let keep: HashSet<&TileCoord> = visible.iter().collect();
        let before = self.tiles.len();
        self.tiles.retain(|coord, _| keep.contains(coord));
        debug!(evicted = before - self.tiles.len(), "tile cache trimmed");
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.pending.clear();
        self.failed.clear();
    }
}

/// Download one tile and decode it to greyscale
pub async fn fetch_tile(client: &reqwest::Client, url: &str) -> Result<GrayImage, TileError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TileError::Status(status));
    }

    let bytes = response.bytes().await?;
    Ok(image::load_from_memory(&bytes)?.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma};
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_bytes() -> Vec<u8> {
        let tile = GrayImage::from_pixel(4, 4, Luma([200]));
        let mut out = Cursor::new(Vec::new());
        tile.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_bookkeeping() {
        let mut cache = TileCache::new(8);
        let a = TileCoord::new(0, 0, 1);
        let b = TileCoord::new(1, 0, 1);

        assert!(cache.needs(&a));
        cache.mark_pending(a);
        assert!(!cache.needs(&a));
        assert_eq!(cache.pending_count(), 1);

        cache.insert(a, Ok(GrayImage::new(1, 1)));
        assert!(cache.get(&a).is_some());
        assert_eq!(cache.pending_count(), 0);

        cache.mark_pending(b);
        cache.insert(b, Err(TileError::Status(reqwest::StatusCode::NOT_FOUND)));
        assert!(cache.get(&b).is_none());
        assert!(!cache.needs(&b));
    }

    #[test]
    fn test_evict_keeps_visible() {
        let mut cache = TileCache::new(2);
        let coords: Vec<_> = (0..4).map(|x| TileCoord::new(x, 0, 2)).collect();
        for &c in &coords {
            cache.insert(c, Ok(GrayImage::new(1, 1)));
        }
        cache.evict(&coords[2..]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&coords[0]).is_none());
        assert!(cache.get(&coords[3]).is_some());
    }

    #[test]
    fn test_evict_below_capacity_is_noop() {
        let mut cache = TileCache::new(10);
        cache.insert(TileCoord::new(0, 0, 0), Ok(GrayImage::new(1, 1)));
        cache.evict(&[]);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_tile_decodes_png() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1/0/0.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let tile = fetch_tile(&client, &format!("{}/1/0/0.png", server.uri())).await.unwrap();
        assert_eq!(tile.dimensions(), (4, 4));
        assert_eq!(tile.get_pixel(2, 2).0, [200]);
    }

    #[tokio::test]
    async fn test_fetch_tile_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbage.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a png".to_vec()))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let missing = fetch_tile(&client, &format!("{}/missing.png", server.uri())).await;
        assert!(matches!(missing, Err(TileError::Status(_))));
        let garbage = fetch_tile(&client, &format!("{}/garbage.png", server.uri())).await;
        assert!(matches!(garbage, Err(TileError::Decode(_))));
    }
}
