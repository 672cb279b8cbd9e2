use std::f64::consts::PI;

/// Equatorial circumference in metres (WGS84)
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Smallest zoom factor; the whole world fits in half the canvas width
pub const MIN_ZOOM: f64 = 0.5;

/// Viewport representing the visible map area and zoom level.
///
/// Zoom is a factor relative to the whole world spanning the canvas width
/// once, so one world width equals `zoom * width` dots.
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Upper bound for `zoom`, set from the tile layer's max zoom
    pub max_zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Longitude to normalized Web Mercator x in [0, 1)
#[inline]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Latitude where Web Mercator turns the world into a square
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Latitude to normalized Web Mercator y (0 at the north edge, 1 at the south)
#[inline]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Normalized Web Mercator (x, y) back to (lon, lat)
fn from_world(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    // Inverse Mercator for latitude
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lon, lat)
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat: center_lat.clamp(-85.0, 85.0),
            zoom,
            max_zoom: f64::INFINITY,
            width,
            height,
        }
    }

    /// Dots per world width at the current zoom
    #[inline]
    pub fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    /// Limit zoom to `max_zoom`, pulling the current zoom back if needed
    pub fn set_max_zoom(&mut self, max_zoom: f64) {
        self.max_zoom = max_zoom.max(MIN_ZOOM);
        self.zoom = self.zoom.clamp(MIN_ZOOM, self.max_zoom);
    }

    /// Move the center without changing zoom. Longitude wraps around the
    /// antimeridian.
    pub fn center_on(&mut self, lon: f64, lat: f64) {
        self.center_lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let (x, y) = self.to_world(
            self.width as f64 / 2.0 + dx as f64,
            self.height as f64 / 2.0 + dy as f64,
        );
        let (lon, lat) = from_world(x, y);
        self.center_on(lon, lat);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(self.max_zoom);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor towards a specific pixel location
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        // Get the geographic coordinates under the mouse
        let (lon, lat) = self.unproject(px, py);

        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, self.max_zoom);

        // Calculate where that point would now project to
        let (new_px, new_py) = self.project(lon, lat);

        // Pan to bring it back under the mouse
        self.pan(new_px - px, new_py - py);
    }

    /// Pixel coordinates to normalized Web Mercator (x, y).
    /// x is not wrapped; y may fall outside [0, 1] beyond the poles.
    pub fn to_world(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.scale();
        let x = (px - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);
        (x, y)
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let (x, y) = self.to_world(px as f64, py as f64);
        from_world(x, y)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let px = ((mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0) as i32;
        let py = ((mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Convert a ground distance at a latitude into canvas dots
    /// Uses the same latitude clamp as the projection, so the scale stays
    /// finite at the poles.
    pub fn meters_to_pixels(&self, meters: f64, lat: f64) -> f64 {
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let meters_per_world = EARTH_CIRCUMFERENCE_M * lat.to_radians().cos();
        if meters_per_world <= 0.0 {
            return 0.0;
        }
        meters / meters_per_world * self.scale()
    }

    /// Check if a projected point lands on the canvas
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!((vp.center_lon - 36.0).abs() < 1e-9);
        vp.pan(0, 10);
        assert!(vp.center_lat < 0.0);
    }

    #[test]
    fn test_pan_wraps_antimeridian() {
        let mut vp = Viewport::new(170.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!((vp.center_lon + 154.0).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_y_is_clamped_at_poles() {
        assert!(mercator_y(90.0).abs() < 1e-6);
        assert!((mercator_y(-120.0) - 1.0).abs() < 1e-6);
        assert!((mercator_y(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_meters_to_pixels_finite_at_poles() {
        let vp = Viewport::new(0.0, 0.0, 6.0, 316, 188);
        let pole = vp.meters_to_pixels(100.0, 90.0);
        let edge = vp.meters_to_pixels(100.0, MAX_LATITUDE);
        assert!(pole.is_finite());
        assert_eq!(pole, edge);
        assert!(pole < 1.0);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(16.5, 62.5, 6.0, 400, 200);
        let (px, py) = vp.project(18.0, 59.3);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 18.0).abs() < 0.5);
        assert!((lat - 59.3).abs() < 0.5);
    }

    #[test]
    fn test_zoom_respects_max() {
        let mut vp = Viewport::new(0.0, 0.0, 4.0, 100, 100);
        vp.set_max_zoom(5.0);
        vp.zoom_in();
        vp.zoom_in();
        assert_eq!(vp.zoom, 5.0);
        vp.set_max_zoom(2.0);
        assert_eq!(vp.zoom, 2.0);
    }

    #[test]
    fn test_meters_to_pixels_grows_towards_poles() {
        let vp = Viewport::new(0.0, 0.0, 100.0, 400, 200);
        let equator = vp.meters_to_pixels(100_000.0, 0.0);
        let north = vp.meters_to_pixels(100_000.0, 60.0);
        assert!(north > equator);
        assert!((north / equator - 2.0).abs() < 0.01);
    }
}
