use crate::config::{Corner, Side};
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Width of the zoom buttons, e.g. "[+]"
const BUTTON_WIDTH: u16 = 3;

/// Screen regions shared by rendering and click hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenLayout {
    /// Map block including its border
    pub map: Rect,
    /// Braille canvas area inside the border
    pub map_inner: Rect,
    pub status: Rect,
    /// Sidebar panel area when open
    pub sidebar: Rect,
    /// Collapsed sidebar tab
    pub sidebar_tab: Rect,
    /// Close button on the sidebar border
    pub close_button: Rect,
    pub zoom_in: Rect,
    pub zoom_out: Rect,
}

impl ScreenLayout {
    pub fn compute(area: Rect, side: Side, sidebar_width: u16, zoom_corner: Corner) -> Self {
        // Split into map area and status bar
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Map
                Constraint::Length(1), // Status bar
            ])
            .split(area);
        let map = chunks[0];
        let status = chunks[1];

        let map_inner = Rect::new(
            map.x.saturating_add(1),
            map.y.saturating_add(1),
            map.width.saturating_sub(2),
            map.height.saturating_sub(2),
        );

        let panel_width = sidebar_width.min(map.width);
        let sidebar = match side {
            Side::Right => Rect::new(map.right().saturating_sub(panel_width), map.y, panel_width, map.height),
            Side::Left => Rect::new(map.x, map.y, panel_width, map.height),
        };

        let sidebar_tab = match side {
            Side::Right => Rect::new(map_inner.right().saturating_sub(BUTTON_WIDTH), map_inner.y, BUTTON_WIDTH, 1),
            Side::Left => Rect::new(map_inner.x, map_inner.y, BUTTON_WIDTH, 1),
        }
        .intersection(map_inner);

        // Sits on the top border, one cell in from the corner
        let close_button = Rect::new(
            sidebar.right().saturating_sub(BUTTON_WIDTH + 1),
            sidebar.y,
            BUTTON_WIDTH,
            1,
        )
        .intersection(sidebar);

        let left = map_inner.x;
        let right = map_inner.right().saturating_sub(BUTTON_WIDTH);
        let top = map_inner.y;
        let bottom = map_inner.bottom().saturating_sub(2);
        let (x, y) = match zoom_corner {
            Corner::TopLeft => (left, top),
            Corner::TopRight => (right, top),
            Corner::BottomLeft => (left, bottom),
            Corner::BottomRight => (right, bottom),
        };
        let zoom_in = Rect::new(x, y, BUTTON_WIDTH, 1).intersection(map_inner);
        let zoom_out = Rect::new(x, y.saturating_add(1), BUTTON_WIDTH, 1).intersection(map_inner);

        Self {
            map,
            map_inner,
            status,
            sidebar,
            sidebar_tab,
            close_button,
            zoom_in,
            zoom_out,
        }
    }
}
