use crate::config::MapConfig;
use crate::basemap::TileCoord;
use crate::data::DataRow;
use crate::error::DatasetError;
use crate::events::{dispatch_click, ClickEvent, MapClickHandler};
use crate::layout::ScreenLayout;
use crate::loader::LoadEvent;
use crate::map::{MapRenderer, Viewport};
use crate::markers::build_markers;
use crate::sidebar::{Sidebar, SidebarPanel};
use ratatui::layout::{Position, Rect};
use tracing::{debug, info, warn};

/// Where the point dataset stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataState {
    Loading,
    Ready { markers: usize, unplaced: usize },
    /// Fetch or parse failed; the map stays empty until a retry succeeds
    Unavailable(String),
}

/// Application state
pub struct App {
    pub config: MapConfig,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub sidebar: Sidebar,
    pub layout: ScreenLayout,
    pub data_state: DataState,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Marker last activated, for highlighting and keyboard cycling
    pub selected: Option<usize>,
    map_click: MapClickHandler,
    /// Whether the current press has turned into a drag
    dragged: bool,
}

impl App {
    /// Mount the map: viewport, tile layer, zoom control, sidebar with its
    /// panel and the map click handler. No markers until the dataset arrives.
    pub fn new(config: MapConfig, width: u16, height: u16) -> Self {
        let mut sidebar = Sidebar::new(&config.sidebar);
        sidebar.add_panel(SidebarPanel::new(
            config.sidebar.panel_id.clone(),
            config.sidebar.initial_title.clone(),
        ));
        let map_click = MapClickHandler::new(config.sidebar.panel_id.clone());

        let layout = ScreenLayout::compute(
            Rect::new(0, 0, width, height),
            sidebar.position,
            sidebar.width,
            config.zoom_control,
        );

        let map_renderer = MapRenderer::new(config.tiles.clone());

        // Braille gives 2x4 resolution per character
        let mut viewport = Viewport::new(
            config.center[1],
            config.center[0],
            config.zoom,
            layout.map_inner.width as usize * 2,
            layout.map_inner.height as usize * 4,
        );
        viewport.set_max_zoom(map_renderer.tiles.zoom_limit(viewport.width));

        Self {
            config,
            viewport,
            map_renderer,
            sidebar,
            layout,
            data_state: DataState::Loading,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            selected: None,
            map_click,
            dragged: false,
        }
    }

    /// Release markers, tiles and sidebar state before exit
    pub fn teardown(&mut self) {
        self.map_renderer.markers.clear();
        self.map_renderer.tile_cache.clear();
        self.sidebar.close_active();
        self.selected = None;
    }

    /// Update layout and viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.layout = ScreenLayout::compute(
            Rect::new(0, 0, width, height),
            self.sidebar.position,
            self.sidebar.width,
            self.config.zoom_control,
        );
        self.viewport.width = self.layout.map_inner.width as usize * 2;
        self.viewport.height = self.layout.map_inner.height as usize * 4;
        let limit = self.map_renderer.tiles.zoom_limit(self.viewport.width);
        self.viewport.set_max_zoom(limit);
    }

    /// Return to the configured center and zoom
    pub fn reset_view(&mut self) {
        self.viewport.center_on(self.config.center[1], self.config.center[0]);
        self.viewport.zoom = self.config.zoom;
        let limit = self.viewport.max_zoom;
        self.viewport.set_max_zoom(limit);
    }

    /// Apply a finished background request
    pub fn on_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Dataset(result) => self.on_dataset(result),
            LoadEvent::Tile(coord, result) => self.map_renderer.tile_cache.insert(coord, result),
        }
    }

    /// Build markers from the dataset, or record why there are none
    pub fn on_dataset(&mut self, result: Result<Vec<DataRow>, DatasetError>) {
        match result {
            Ok(rows) => {
                let markers = build_markers(&rows, &self.config.markers, &self.config.sidebar.panel_id);
                self.map_renderer.markers.extend(markers);

                let total = self.map_renderer.markers.len();
                let unplaced = self.map_renderer.markers.unplaced_count();
                if unplaced > 0 {
                    warn!(unplaced, "rows without usable coordinates");
                }
                info!(markers = total, style = %self.config.markers.style, "markers added");
                self.data_state = DataState::Ready {
                    markers: total,
                    unplaced,
                };
            }
            Err(e) => {
                warn!(error = %e, url = %self.config.points_url, "dataset unavailable");
                self.data_state = DataState::Unavailable(e.to_string());
            }
        }
    }

    /// Switch back to loading if a retry is allowed. Only a failed load may
    /// be retried, so at most one dataset request is ever in flight.
    pub fn begin_retry(&mut self) -> bool {
        if matches!(self.data_state, DataState::Unavailable(_)) {
            self.data_state = DataState::Loading;
            true
        } else {
            false
        }
    }

    /// Tiles to fetch for the current view
    pub fn request_tiles(&mut self) -> Vec<(TileCoord, String)> {
        self.map_renderer.request_tiles(&self.viewport)
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    /// Zoom in
    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    /// Zoom out
    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Convert a terminal cell to the braille dot at its center
    fn cell_to_pixel(&self, col: u16, row: u16) -> (i32, i32) {
        let inner = self.layout.map_inner;
        let px = (col as i32 - inner.x as i32) * 2 + 1;
        let py = (row as i32 - inner.y as i32) * 4 + 2;
        (px, py)
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = self.cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = self.cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current tile level
    pub fn tile_level(&self) -> u8 {
        self.map_renderer.tiles.level_for(&self.viewport)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Mouse button pressed: may become a click or a drag
    pub fn press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
            }
            // One cell is 2x4 dots; the map follows the cursor
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    /// Mouse button released: a press without drag is a click
    pub fn release(&mut self, col: u16, row: u16) {
        let was_press = self.last_mouse.is_some();
        let dragged = self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if was_press && !dragged {
            self.click(col, row);
        }
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Route a click: sidebar, tab, zoom buttons, then markers and the map
    pub fn click(&mut self, col: u16, row: u16) {
        let pos = Position::new(col, row);

        if self.sidebar.is_open() {
            if self.sidebar.close_button && self.layout.close_button.contains(pos) {
                self.sidebar.close_active();
                return;
            }
            if self.layout.sidebar.contains(pos) {
                return;
            }
        } else if self.layout.sidebar_tab.contains(pos) {
            self.sidebar.open_first();
            return;
        }

        if self.layout.zoom_in.contains(pos) {
            self.zoom_in();
            return;
        }
        if self.layout.zoom_out.contains(pos) {
            self.zoom_out();
            return;
        }
        if !self.layout.map_inner.contains(pos) {
            return;
        }

        let (px, py) = self.cell_to_pixel(col, row);
        let target = self.map_renderer.markers.hit(&self.viewport, px, py);
        self.dispatch(px, py, target);
    }

    /// Deliver a click to an optional marker, then to the map
    fn dispatch(&mut self, px: i32, py: i32, target: Option<usize>) {
        let mut event = ClickEvent::new(px, py);
        let handler = target.and_then(|idx| self.map_renderer.markers.get(idx)).map(|m| m.handler());
        dispatch_click(&mut event, handler, &self.map_click, &mut self.sidebar);
        if target.is_some() {
            self.selected = target;
        }
    }

    /// Select the next (or previous) placed marker, center on it and click it
    pub fn cycle_marker(&mut self, forward: bool) {
        let placed: Vec<usize> = self.map_renderer.markers.placed().collect();
        if placed.is_empty() {
            return;
        }

        let current = self.selected.and_then(|sel| placed.iter().position(|&idx| idx == sel));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => placed.len() - 1,
            (Some(i), true) => (i + 1) % placed.len(),
            (Some(i), false) => (i + placed.len() - 1) % placed.len(),
        };
        let idx = placed[next];

        let Some(marker) = self.map_renderer.markers.get(idx) else {
            return;
        };
        let Some(pos) = marker.position else {
            return;
        };
        debug!(idx, institution = %marker.metadata().institution, "marker selected");
        self.viewport.center_on(pos.lon, pos.lat);
        let (px, py) = self.viewport.project(pos.lon, pos.lat);
        self.dispatch(px, py, Some(idx));
    }

    /// Link target of the sidebar line under the mouse
    pub fn hovered_link(&self) -> Option<String> {
        let (col, row) = self.mouse_pos?;
        let panel = self.sidebar.active_panel()?;
        let area = self.layout.sidebar;
        // Content starts inside the border, one line per detail
        if col <= area.x || col + 1 >= area.right() || row <= area.y {
            return None;
        }
        panel.link_at((row - area.y - 1) as usize, area.width.saturating_sub(2) as usize)
    }

    /// Get mouse position in braille pixel coordinates (for rendering marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos
            .filter(|&(col, row)| self.layout.map_inner.contains(Position::new(col, row)))
            .map(|(col, row)| self.cell_to_pixel(col, row))
    }
}
