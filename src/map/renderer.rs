use crate::basemap::{trace_tiles, TileCache, TileCoord, TileLayer};
use crate::braille::BrailleCanvas;
use crate::config::TileConfig;
use crate::map::geometry::{draw_ring, ring_might_be_visible};
use crate::map::projection::Viewport;
use crate::markers::{MarkerGroup, MarkerKind, DEFAULT_PIN_COLOR};
use ratatui::style::Color;

/// A pin drawn as a single character cell
#[derive(Debug, Clone, PartialEq)]
pub struct PinCell {
    pub x: u16,
    pub y: u16,
    pub symbol: char,
    pub fg: Color,
    pub bg: Color,
    pub selected: bool,
}

/// Rendered layers, back to front
pub struct MapLayers {
    pub basemap: BrailleCanvas,
    pub circles: BrailleCanvas,
    pub pins: Vec<PinCell>,
}

/// Map canvas contents: basemap tiles and the marker group
pub struct MapRenderer {
    pub tiles: TileLayer,
    pub tile_cache: TileCache,
    pub markers: MarkerGroup,
}

impl MapRenderer {
    pub fn new(tile_config: TileConfig) -> Self {
        let capacity = tile_config.max_cached_tiles;
        Self {
            tiles: TileLayer::new(tile_config),
            tile_cache: TileCache::new(capacity),
            markers: MarkerGroup::new(),
        }
    }

    /// Tiles the viewport needs that haven't been requested yet, with their
    /// URLs. They are marked pending, so each is returned only once.
    pub fn request_tiles(&mut self, viewport: &Viewport) -> Vec<(TileCoord, String)> {
        if !self.tiles.is_enabled() {
            return Vec::new();
        }
        let visible = self.tiles.visible_tiles(viewport);
        self.tile_cache.evict(&visible);

        let mut requests = Vec::new();
        for coord in visible {
            if self.tile_cache.needs(&coord) {
                self.tile_cache.mark_pending(coord);
                requests.push((coord, self.tiles.tile_url(coord)));
            }
        }
        requests
    }

    /// Render all map features for a canvas of `width` x `height` characters
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport, selected: Option<usize>) -> MapLayers {
        let mut basemap = BrailleCanvas::new(width, height);
        if self.tiles.is_enabled() {
            let level = self.tiles.level_for(viewport);
            trace_tiles(
                &mut basemap,
                viewport,
                level,
                &self.tile_cache,
                self.tiles.config().edge_threshold,
            );
        }

        let mut circles = BrailleCanvas::new(width, height);
        let mut pins = Vec::new();

        for (idx, marker) in self.markers.iter().enumerate() {
            let Some(pos) = marker.position else {
                continue;
            };
            let (px, py) = viewport.project(pos.lon, pos.lat);

            match marker.kind {
                MarkerKind::Pin => {
                    if !viewport.is_visible(px, py) {
                        continue;
                    }
                    let (symbol, fg, bg) = match marker.icon {
                        Some(icon) => (icon.symbol(), icon.icon_color, icon.marker_color.color()),
                        None => ('▼', DEFAULT_PIN_COLOR, Color::Reset),
                    };
                    pins.push(PinCell {
                        x: (px / 2) as u16,
                        y: (py / 4) as u16,
                        symbol,
                        fg,
                        bg,
                        selected: selected == Some(idx),
                    });
                }
                MarkerKind::CircleMarker { .. } | MarkerKind::Circle { .. } => {
                    let radius = marker.screen_radius(viewport).unwrap_or(0.0).round() as i32;
                    if ring_might_be_visible(px, py, radius, viewport.width, viewport.height) {
                        draw_ring(&mut circles, px, py, radius);
                    }
                }
            }
        }

        MapLayers { basemap, circles, pins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerConfig;
    use crate::data::DataRow;
    use crate::markers::build_markers;

    fn renderer_with(style: &str) -> MapRenderer {
        let mut renderer = MapRenderer::new(TileConfig {
            enabled: false,
            ..TileConfig::default()
        });
        let rows = vec![
            DataRow {
                institution: "A".into(),
                latitude: "59.3".into(),
                longitude: "18.0".into(),
                color: "red".into(),
                ..Default::default()
            },
            DataRow::default(),
        ];
        let config = MarkerConfig {
            style: style.into(),
            radius: 4.0,
        };
        renderer.markers.extend(build_markers(&rows, &config, "panel"));
        renderer
    }

    #[test]
    fn test_pins_for_placed_markers_only() {
        let renderer = renderer_with("marker");
        let vp = Viewport::new(18.0, 59.3, 20.0, 80, 40);
        let layers = renderer.render(40, 10, &vp, Some(0));
        assert_eq!(layers.pins.len(), 1);
        let pin = &layers.pins[0];
        assert_eq!((pin.x, pin.y), (20, 5));
        assert_eq!(pin.symbol, 'i');
        assert!(pin.selected);
    }

    #[test]
    fn test_circle_marker_draws_ring() {
        let renderer = renderer_with("circleMarker");
        let vp = Viewport::new(18.0, 59.3, 20.0, 80, 40);
        let layers = renderer.render(40, 10, &vp, None);
        assert!(layers.pins.is_empty());
        assert!(layers.circles.is_set(44, 20));
        assert!(!layers.circles.is_set(40, 20));
    }

    #[test]
    fn test_polar_and_oversized_circles_render() {
        let mut renderer = MapRenderer::new(TileConfig {
            enabled: false,
            ..TileConfig::default()
        });
        let pole = DataRow {
            institution: "Pole".into(),
            latitude: "90".into(),
            longitude: "0".into(),
            ..Default::default()
        };
        let circle = MarkerConfig {
            style: "circle".into(),
            radius: 1000.0,
        };
        let huge = MarkerConfig {
            style: "circleMarker".into(),
            radius: 1e7,
        };
        renderer.markers.extend(build_markers(std::slice::from_ref(&pole), &circle, "panel"));
        renderer.markers.extend(build_markers(std::slice::from_ref(&pole), &huge, "panel"));

        let vp = Viewport::new(0.0, 80.0, 6.0, 80, 40);
        let layers = renderer.render(40, 10, &vp, None);
        assert!(layers.pins.is_empty());
    }

    #[test]
    fn test_disabled_tiles_request_nothing() {
        let mut renderer = renderer_with("marker");
        let vp = Viewport::new(0.0, 0.0, 1.0, 80, 40);
        assert!(renderer.request_tiles(&vp).is_empty());
    }

    #[test]
    fn test_tiles_requested_once() {
        let mut renderer = MapRenderer::new(TileConfig::default());
        let vp = Viewport::new(0.0, 0.0, 1.0, 256, 256);
        let first = renderer.request_tiles(&vp);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].0, TileCoord::new(0, 0, 0));
        assert!(renderer.request_tiles(&vp).is_empty());
        assert_eq!(renderer.tile_cache.len(), 0);
        assert_eq!(renderer.tile_cache.pending_count(), 1);
    }
}
