//! Point markers built from dataset rows.
//!
//! Every row becomes exactly one [`Marker`], in input order. Rows whose
//! coordinates don't parse still get a marker; it just has no position and is
//! never drawn or hit.

use crate::config::MarkerConfig;
use crate::data::DataRow;
use crate::events::MarkerClickHandler;
use crate::map::Viewport;
use ratatui::style::Color;
use std::sync::Arc;

/// Leaflet's default vector path colour
pub const PATH_COLOR: Color = Color::Rgb(0x33, 0x88, 0xff);

/// Leaflet's default pin colour, used when no styled icon is attached
pub const DEFAULT_PIN_COLOR: Color = Color::Rgb(0x26, 0x81, 0xca);

/// Largest circle radius in canvas dots; keeps ring drawing bounded
pub const MAX_SCREEN_RADIUS: f64 = 100_000.0;

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

/// Detail fields copied from a row when its marker is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerMetadata {
    pub institution: String,
    pub documentation: String,
    pub url: String,
    pub contact: String,
    pub email: String,
    pub phone: String,
}

impl From<&DataRow> for MarkerMetadata {
    fn from(row: &DataRow) -> Self {
        Self {
            institution: row.institution.clone(),
            documentation: row.documentation.clone(),
            url: row.url.clone(),
            contact: row.contact.clone(),
            email: row.email.clone(),
            phone: row.phone.clone(),
        }
    }
}

/// Geometry used to draw a marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerKind {
    /// Pin in a single terminal cell
    Pin,
    /// Circle with a radius in canvas dots
    CircleMarker { radius: f64 },
    /// Circle with a radius in metres on the ground
    Circle { radius: f64 },
}

impl MarkerKind {
    /// Select by style name. Case-sensitive; anything unknown is a pin.
    pub fn from_style(style: &str, radius: f64) -> Self {
        match style {
            "circleMarker" => Self::CircleMarker { radius },
            "circle" => Self::Circle { radius },
            _ => Self::Pin,
        }
    }
}

/// Pin colours offered by the spreadsheet's `color` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinColor {
    Red,
    DarkRed,
    LightRed,
    Orange,
    Beige,
    Green,
    DarkGreen,
    LightGreen,
    #[default]
    Blue,
    DarkBlue,
    LightBlue,
    Purple,
    DarkPurple,
    Pink,
    CadetBlue,
    White,
    Gray,
    LightGray,
    Black,
}

impl PinColor {
    /// Parse a colour name; unknown or empty names fall back to blue
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "red" => Self::Red,
            "darkred" => Self::DarkRed,
            "lightred" => Self::LightRed,
            "orange" => Self::Orange,
            "beige" => Self::Beige,
            "green" => Self::Green,
            "darkgreen" => Self::DarkGreen,
            "lightgreen" => Self::LightGreen,
            "blue" => Self::Blue,
            "darkblue" => Self::DarkBlue,
            "lightblue" => Self::LightBlue,
            "purple" => Self::Purple,
            "darkpurple" => Self::DarkPurple,
            "pink" => Self::Pink,
            "cadetblue" => Self::CadetBlue,
            "white" => Self::White,
            "gray" => Self::Gray,
            "lightgray" => Self::LightGray,
            "black" => Self::Black,
            _ => Self::Blue,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Red => Color::Rgb(0xd6, 0x3e, 0x2a),
            Self::DarkRed => Color::Rgb(0xa2, 0x33, 0x36),
            Self::LightRed => Color::Rgb(0xff, 0x8e, 0x7f),
            Self::Orange => Color::Rgb(0xf6, 0x97, 0x30),
            Self::Beige => Color::Rgb(0xff, 0xcb, 0x92),
            Self::Green => Color::Rgb(0x72, 0xb0, 0x26),
            Self::DarkGreen => Color::Rgb(0x72, 0x82, 0x24),
            Self::LightGreen => Color::Rgb(0xbb, 0xf9, 0x70),
            Self::Blue => Color::Rgb(0x38, 0xaa, 0xdd),
            Self::DarkBlue => Color::Rgb(0x00, 0x67, 0xa3),
            Self::LightBlue => Color::Rgb(0x8a, 0xda, 0xff),
            Self::Purple => Color::Rgb(0xd2, 0x52, 0xb9),
            Self::DarkPurple => Color::Rgb(0x5b, 0x39, 0x6b),
            Self::Pink => Color::Rgb(0xff, 0x91, 0xea),
            Self::CadetBlue => Color::Rgb(0x43, 0x69, 0x78),
            Self::White => Color::Rgb(0xfb, 0xfb, 0xfb),
            Self::Gray => Color::Rgb(0x57, 0x57, 0x57),
            Self::LightGray => Color::Rgb(0xa3, 0xa3, 0xa3),
            Self::Black => Color::Rgb(0x30, 0x30, 0x30),
        }
    }
}

/// Styled pin: a fixed glyph on a per-row colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinIcon {
    pub glyph: &'static str,
    pub icon_color: Color,
    pub marker_color: PinColor,
}

impl PinIcon {
    pub fn new(marker_color: PinColor) -> Self {
        Self {
            glyph: "info-circle",
            icon_color: Color::White,
            marker_color,
        }
    }

    /// Terminal character standing in for the glyph
    pub fn symbol(&self) -> char {
        match self.glyph {
            "info-circle" => 'i',
            _ => '●',
        }
    }
}

/// A point on the map with its metadata and click handler
#[derive(Debug, Clone)]
pub struct Marker {
    pub position: Option<LatLng>,
    pub kind: MarkerKind,
    /// Only set when the style name doesn't mention "circle"
    pub icon: Option<PinIcon>,
    handler: MarkerClickHandler,
}

impl Marker {
    pub fn metadata(&self) -> &MarkerMetadata {
        self.handler.metadata()
    }

    pub fn handler(&self) -> &MarkerClickHandler {
        &self.handler
    }

    pub fn is_placed(&self) -> bool {
        self.position.is_some()
    }

    /// Radius in canvas dots for circle kinds, at most [`MAX_SCREEN_RADIUS`]
    pub fn screen_radius(&self, viewport: &Viewport) -> Option<f64> {
        let radius = match (self.kind, self.position) {
            (MarkerKind::CircleMarker { radius }, _) => radius,
            (MarkerKind::Circle { radius }, Some(pos)) => viewport.meters_to_pixels(radius, pos.lat),
            _ => return None,
        };
        Some(radius.min(MAX_SCREEN_RADIUS))
    }

    /// Whether a canvas dot lands on this marker
    fn hit(&self, viewport: &Viewport, px: i32, py: i32) -> bool {
        let Some(pos) = self.position else {
            return false;
        };
        let (mx, my) = viewport.project(pos.lon, pos.lat);

        // The marker's own cell always counts
        if (mx.div_euclid(2), my.div_euclid(4)) == (px.div_euclid(2), py.div_euclid(4)) {
            return true;
        }

        match self.screen_radius(viewport) {
            Some(radius) => {
                let dx = (px as i64 - mx as i64) as f64;
                let dy = (py as i64 - my as i64) as f64;
                dx * dx + dy * dy <= radius * radius
            }
            None => false,
        }
    }
}

/// Build one marker per row, in order
pub fn build_markers(rows: &[DataRow], config: &MarkerConfig, panel_id: &str) -> Vec<Marker> {
    let kind = MarkerKind::from_style(&config.style, config.radius);
    let styled_pin = !config.style.contains("circle");
    let panel_id: Arc<str> = Arc::from(panel_id);

    rows.iter()
        .map(|row| Marker {
            position: row.coordinates().map(|(lat, lon)| LatLng { lat, lon }),
            kind,
            icon: styled_pin.then(|| PinIcon::new(PinColor::from_name(&row.color))),
            handler: MarkerClickHandler::new(Arc::new(MarkerMetadata::from(row)), Arc::clone(&panel_id)),
        })
        .collect()
}

/// Layer holding every marker on the map
#[derive(Debug, Default)]
pub struct MarkerGroup {
    markers: Vec<Marker>,
}

impl MarkerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, markers: impl IntoIterator<Item = Marker>) {
        self.markers.extend(markers);
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Marker> {
        self.markers.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    /// Indices of markers with a position
    pub fn placed(&self) -> impl Iterator<Item = usize> + '_ {
        self.markers
            .iter()
            .enumerate()
            .filter_map(|(idx, m)| m.is_placed().then_some(idx))
    }

    pub fn unplaced_count(&self) -> usize {
        self.markers.iter().filter(|m| !m.is_placed()).count()
    }

    /// Topmost marker under a canvas dot. Later markers draw on top, so
    /// they win.
    pub fn hit(&self, viewport: &Viewport, px: i32, py: i32) -> Option<usize> {
        self.markers
            .iter()
            .enumerate()
            .rev()
            .find(|(_, marker)| marker.hit(viewport, px, py))
            .map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(institution: &str, lat: &str, lon: &str, color: &str) -> DataRow {
        DataRow {
            institution: institution.into(),
            latitude: lat.into(),
            longitude: lon.into(),
            color: color.into(),
            ..Default::default()
        }
    }

    fn config(style: &str) -> MarkerConfig {
        MarkerConfig {
            style: style.into(),
            radius: 100.0,
        }
    }

    #[test]
    fn test_one_marker_per_row_in_order() {
        let rows = vec![
            row("A", "59.3", "18.0", "red"),
            row("B", "", "", ""),
            row("C", "not a number", "15", "green"),
            row("A", "59.3", "18.0", "red"),
        ];
        let markers = build_markers(&rows, &config("marker"), "panel");
        let names: Vec<_> = markers.iter().map(|m| m.metadata().institution.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "A"]);
        assert_eq!(markers[0].position, Some(LatLng { lat: 59.3, lon: 18.0 }));
        assert!(markers[1].position.is_none());
        assert!(markers[2].position.is_none());
    }

    #[test]
    fn test_style_selection() {
        assert_eq!(MarkerKind::from_style("marker", 5.0), MarkerKind::Pin);
        assert_eq!(MarkerKind::from_style("circleMarker", 5.0), MarkerKind::CircleMarker { radius: 5.0 });
        assert_eq!(MarkerKind::from_style("circle", 5.0), MarkerKind::Circle { radius: 5.0 });
        assert_eq!(MarkerKind::from_style("Circle", 5.0), MarkerKind::Pin);
        assert_eq!(MarkerKind::from_style("", 5.0), MarkerKind::Pin);
    }

    #[test]
    fn test_icon_only_without_circle_in_name() {
        let rows = vec![row("A", "1", "2", "darkgreen")];

        let pins = build_markers(&rows, &config("marker"), "panel");
        let icon = pins[0].icon.expect("styled pin");
        assert_eq!(icon.marker_color, PinColor::DarkGreen);
        assert_eq!(icon.glyph, "info-circle");
        assert_eq!(icon.icon_color, Color::White);

        for style in ["circle", "circleMarker", "circlePin"] {
            let markers = build_markers(&rows, &config(style), "panel");
            assert!(markers[0].icon.is_none(), "{style}");
        }
    }

    #[test]
    fn test_circle_styles_keep_metadata() {
        let mut source = row("Acme", "59.3", "18.0", "");
        source.phone = "08-1".into();
        for style in ["circle", "circleMarker"] {
            let markers = build_markers(&[source.clone()], &config(style), "panel");
            assert_eq!(markers[0].metadata().institution, "Acme");
            assert_eq!(markers[0].metadata().phone, "08-1");
        }
    }

    #[test]
    fn test_pin_color_fallback() {
        assert_eq!(PinColor::from_name("cadetblue"), PinColor::CadetBlue);
        assert_eq!(PinColor::from_name(""), PinColor::Blue);
        assert_eq!(PinColor::from_name("chartreuse"), PinColor::Blue);
        assert_eq!(PinColor::from_name("Red"), PinColor::Blue);
    }

    #[test]
    fn test_hit_pin_cell() {
        let vp = Viewport::new(18.0, 59.3, 50.0, 200, 100);
        let mut group = MarkerGroup::new();
        group.extend(build_markers(&[row("A", "59.3", "18.0", "")], &config("marker"), "panel"));

        let (mx, my) = vp.project(18.0, 59.3);
        assert_eq!(group.hit(&vp, mx, my), Some(0));
        assert_eq!(group.hit(&vp, mx + 20, my), None);
    }

    #[test]
    fn test_hit_circle_marker_radius() {
        let vp = Viewport::new(18.0, 59.3, 50.0, 200, 100);
        let mut group = MarkerGroup::new();
        let cfg = MarkerConfig {
            style: "circleMarker".into(),
            radius: 10.0,
        };
        group.extend(build_markers(&[row("A", "59.3", "18.0", "")], &cfg, "panel"));

        let (mx, my) = vp.project(18.0, 59.3);
        assert_eq!(group.hit(&vp, mx + 8, my), Some(0));
        assert_eq!(group.hit(&vp, mx + 12, my), None);
    }

    #[test]
    fn test_polar_circle_stays_small() {
        let vp = Viewport::new(18.0, 59.3, 6.0, 316, 188);
        let mut group = MarkerGroup::new();
        group.extend(build_markers(&[row("Pole", "90", "0", "")], &config("circle"), "panel"));

        let radius = group.get(0).unwrap().screen_radius(&vp).unwrap();
        assert!(radius.is_finite());
        assert!(radius < 1.0);
        assert_eq!(group.hit(&vp, 150, 90), None);
    }

    #[test]
    fn test_screen_radius_is_capped() {
        let vp = Viewport::new(18.0, 59.3, 6.0, 316, 188);
        let cfg = MarkerConfig {
            style: "circleMarker".into(),
            radius: f64::INFINITY,
        };
        let markers = build_markers(&[row("A", "59.3", "18.0", "")], &cfg, "panel");
        assert_eq!(markers[0].screen_radius(&vp), Some(MAX_SCREEN_RADIUS));
    }

    #[test]
    fn test_hit_prefers_later_marker() {
        let vp = Viewport::new(18.0, 59.3, 50.0, 200, 100);
        let mut group = MarkerGroup::new();
        group.extend(build_markers(
            &[row("first", "59.3", "18.0", ""), row("second", "59.3", "18.0", "")],
            &config("marker"),
            "panel",
        ));
        let (mx, my) = vp.project(18.0, 59.3);
        assert_eq!(group.hit(&vp, mx, my), Some(1));
    }

    #[test]
    fn test_unplaced_markers_are_never_hit() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 200, 100);
        let mut group = MarkerGroup::new();
        group.extend(build_markers(&[row("A", "", "", "")], &config("marker"), "panel"));
        assert_eq!(group.len(), 1);
        assert_eq!(group.unplaced_count(), 1);
        assert_eq!(group.placed().count(), 0);
        for px in 0..200 {
            assert_eq!(group.hit(&vp, px, 50), None);
        }
    }
}
