use glam::DVec2;
use std::f64::consts::PI;

/// Smallest zoom factor (world narrower than the canvas)
pub const MIN_ZOOM: f64 = 0.5;
/// Largest zoom factor, roughly street level
pub const MAX_ZOOM: f64 = 262_144.0;
/// Share of the canvas a fitted bounds may occupy
const FIT_PADDING: f64 = 0.9;
/// Web Mercator cut-off latitude
const MAX_LAT: f64 = 85.051_128_78;

/// Geographic bounding box, `x` = longitude and `y` = latitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn from_point(p: DVec2) -> Self {
        Self { min: p, max: p }
    }

    /// Bounds of a set of points, `None` if there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = Self::from_point(*iter.next()?);
        Some(iter.fold(first, |b, p| b.extend(*p)))
    }

    pub fn extend(self, p: DVec2) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

/// Lon/lat to normalized Web Mercator (`0..1` on both axes, y grows south)
#[inline(always)]
pub fn mercator(lon: f64, lat: f64) -> DVec2 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    DVec2::new(
        (lon + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

/// Normalized Web Mercator back to (lon, lat)
#[inline(always)]
pub fn inverse_mercator(m: DVec2) -> (f64, f64) {
    let lon = m.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * m.y)).sinh().atan().to_degrees();
    (lon, lat)
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom factor; 1.0 fits the whole world into the canvas width
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Zoom factor for a slippy-map zoom level (level 1 shows the world)
    pub fn zoom_for_level(level: u8) -> f64 {
        2f64.powi(level as i32 - 1).clamp(MIN_ZOOM, MAX_ZOOM)
    }

    /// Nearest slippy-map zoom level for the current zoom factor
    pub fn level(&self) -> u8 {
        (self.zoom.log2() + 1.0).round().clamp(0.0, 20.0) as u8
    }

    /// Center on `[lat, lon]` at a zoom level
    pub fn set_view(&mut self, center: [f64; 2], level: u8) {
        self.center_lat = center[0].clamp(-85.0, 85.0);
        self.center_lon = center[1];
        self.zoom = Self::zoom_for_level(level);
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    fn center_mercator(&self) -> DVec2 {
        mercator(self.center_lon, self.center_lat)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        if self.width == 0 {
            return;
        }
        let m = self.center_mercator() + DVec2::new(dx as f64, dy as f64) / self.scale();
        let (mut lon, lat) = inverse_mercator(m);

        // Wrap longitude
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }

        self.center_lon = lon;
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
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

    /// Zoom by factor keeping the geographic point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);

        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Fit the view around `bounds`, never zooming past `max_zoom`
    pub fn fit_bounds(&mut self, bounds: &Bounds, max_zoom: f64) {
        let a = mercator(bounds.min.x, bounds.min.y);
        let b = mercator(bounds.max.x, bounds.max.y);
        let span = (a - b).abs();
        let w = self.width.max(1) as f64;
        let h = self.height.max(1) as f64;

        let fit_x = if span.x > 0.0 { FIT_PADDING / span.x } else { f64::INFINITY };
        let fit_y = if span.y > 0.0 {
            FIT_PADDING * h / (span.y * w)
        } else {
            f64::INFINITY
        };

        self.zoom = fit_x.min(fit_y).min(max_zoom).clamp(MIN_ZOOM, MAX_ZOOM);
        let (lon, lat) = inverse_mercator((a + b) * 0.5);
        self.center_lon = lon;
        self.center_lat = lat;
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let offset = DVec2::new(
            px as f64 - self.width as f64 / 2.0,
            py as f64 - self.height as f64 / 2.0,
        );
        inverse_mercator(offset / scale + self.center_mercator())
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = (mercator(lon, lat) - self.center_mercator()) * self.scale();
        let px = (p.x + self.width as f64 / 2.0) as i32;
        let py = (p.y + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Project a lon/lat point stored as a vector
    #[inline(always)]
    pub fn project_point(&self, p: DVec2) -> (i32, i32) {
        self.project(p.x, p.y)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
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
        assert!(vp.center_lon > 0.0);
        vp.pan(0, 10);
        assert!(vp.center_lat < 0.0);
    }

    #[test]
    fn unproject_inverts_project() {
        let vp = Viewport::new(5.0, 52.0, 512.0, 200, 120);
        let (px, py) = vp.project(5.1, 52.05);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 5.1).abs() < 0.01);
        assert!((lat - 52.05).abs() < 0.01);
    }

    #[test]
    fn zoom_levels_map_to_factors() {
        assert_eq!(Viewport::zoom_for_level(1), 1.0);
        assert_eq!(Viewport::zoom_for_level(13), 4096.0);
        let mut vp = Viewport::world(100, 100);
        vp.set_view([52.5, -0.09], 13);
        assert_eq!(vp.level(), 13);
        assert_eq!(vp.center_lon, -0.09);
    }

    #[test]
    fn fit_bounds_keeps_corners_on_canvas() {
        let mut vp = Viewport::world(160, 96);
        let bounds = Bounds {
            min: DVec2::new(4.5, 51.8),
            max: DVec2::new(6.9, 53.2),
        };
        vp.fit_bounds(&bounds, MAX_ZOOM);

        for corner in [bounds.min, bounds.max] {
            let (px, py) = vp.project_point(corner);
            assert!((0..160).contains(&px), "x {px} off canvas");
            assert!((0..96).contains(&py), "y {py} off canvas");
        }
        assert!(vp.zoom > 16.0);
    }

    #[test]
    fn fit_bounds_respects_max_zoom() {
        let mut vp = Viewport::world(160, 96);
        let point = Bounds::from_point(DVec2::new(5.0, 52.0));
        vp.fit_bounds(&point, Viewport::zoom_for_level(14));
        assert_eq!(vp.zoom, Viewport::zoom_for_level(14));
        assert!((vp.center_lon - 5.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_contains_and_union() {
        let a = Bounds::from_points(&[DVec2::new(0.0, 0.0), DVec2::new(2.0, 1.0)]).unwrap();
        let b = Bounds::from_point(DVec2::new(-1.0, 3.0));
        let u = a.union(b);
        assert!(u.contains(DVec2::new(-0.5, 2.0)));
        assert!(!a.contains(DVec2::new(-0.5, 2.0)));
        assert!(Bounds::from_points(&[]).is_none());
    }
}
