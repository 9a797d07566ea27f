use glam::DVec3;

use crate::braille::{PIXELS_PER_COL, PIXELS_PER_ROW};
use crate::geo::{angular_distance, GeoPoint, RotationState, CLIP_ANGLE};

/// Globe radius relative to the smaller surface side: `min(w, h) / 2.5`.
const BASE_RADIUS_DIVISOR: f64 = 2.5;

/// Drawable map area in terminal cells. Pixel space is the braille
/// sub-pixel grid (2x4 per cell).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub cols: usize,
    pub rows: usize,
}

impl Surface {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows }
    }

    pub fn width(&self) -> f64 {
        (self.cols * PIXELS_PER_COL) as f64
    }

    pub fn height(&self) -> f64 {
        (self.rows * PIXELS_PER_ROW) as f64
    }

    /// Pixel center of the surface; the globe is always drawn around it.
    pub fn midpoint(&self) -> (f64, f64) {
        (self.width() / 2.0, self.height() / 2.0)
    }

    /// Unzoomed globe radius in pixels (never below one pixel).
    pub fn base_radius(&self) -> f64 {
        (self.width().min(self.height()) / BASE_RADIUS_DIVISOR).max(1.0)
    }

    /// Stroke and marker multiplier: how far the view is zoomed relative to the base radius.
    pub fn zoom_ratio(&self, scale: f64) -> f64 {
        scale / self.base_radius()
    }
}

/// Orthographic projection of the unit sphere onto the surface.
///
/// Built from a rotation, a scale (globe radius in pixels) and a surface, and
/// holds no other state: the render pass and the hit-tester construct the same
/// projection from the same inputs and get identical results.
#[derive(Clone, Debug)]
pub struct Projection {
    /// Eastward tangent at the view center (screen +x)
    east: DVec3,
    /// Northward tangent at the view center (screen -y)
    north: DVec3,
    rotation: RotationState,
    scale: f64,
    origin: (f64, f64),
}

impl Projection {
    pub fn new(rotation: RotationState, scale: f64, surface: &Surface) -> Self {
        let center = rotation.center();
        let lon = center.lon.to_radians();
        let lat = center.lat.to_radians();
        let (sin_lon, cos_lon) = lon.sin_cos();
        let (sin_lat, cos_lat) = lat.sin_cos();

        let east = DVec3::new(-sin_lon, cos_lon, 0.0);
        let north = DVec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);

        Self {
            east,
            north,
            rotation,
            scale,
            origin: surface.midpoint(),
        }
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Pixel position of the globe center
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    /// Front-hemisphere test shared by every draw and hit path.
    #[inline]
    pub fn is_visible(&self, point: GeoPoint) -> bool {
        angular_distance(point, self.rotation.center()) < CLIP_ANGLE
    }

    /// Project a geographic point to surface pixels.
    /// Returns `None` for points on the far hemisphere.
    #[inline]
    pub fn project(&self, point: GeoPoint) -> Option<(f64, f64)> {
        if !self.is_visible(point) {
            return None;
        }
        let p = lonlat_to_vec3(point.lon, point.lat);
        let sx = p.dot(self.east);
        let sy = p.dot(self.north);
        Some((self.origin.0 + sx * self.scale, self.origin.1 - sy * self.scale))
    }

    /// Like [`Projection::project`], rounded to the pixel grid.
    #[inline]
    pub fn project_px(&self, point: GeoPoint) -> Option<(i32, i32)> {
        self.project(point)
            .map(|(x, y)| (x.round() as i32, y.round() as i32))
    }
}

/// Free-function form: `project(point, rotation, scale)` on a given surface.
pub fn project(point: GeoPoint, rotation: RotationState, scale: f64, surface: &Surface) -> Option<(f64, f64)> {
    Projection::new(rotation, scale, surface).project(point)
}

/// Convert lon/lat (degrees) to a unit sphere vector.
#[inline(always)]
fn lonlat_to_vec3(lon: f64, lat: f64) -> DVec3 {
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn surface() -> Surface {
        // 200 x 200 pixels
        Surface::new(100, 50)
    }

    #[test]
    fn test_surface_geometry() {
        let s = surface();
        assert_eq!(s.width(), 200.0);
        assert_eq!(s.height(), 200.0);
        assert_eq!(s.midpoint(), (100.0, 100.0));
        assert_eq!(s.base_radius(), 80.0);
        assert_eq!(s.zoom_ratio(160.0), 2.0);
        assert_eq!(Surface::new(0, 0).base_radius(), 1.0);
    }

    #[test]
    fn test_center_maps_to_midpoint() {
        let rot = RotationState::new(-30.0, -10.0);
        let proj = Projection::new(rot, 80.0, &surface());
        let (x, y) = proj.project(GeoPoint::new(30.0, 10.0)).unwrap();
        assert!((x - 100.0).abs() < 1e-9);
        assert!((y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_east_is_right_and_north_is_up() {
        let proj = Projection::new(RotationState::default(), 80.0, &surface());

        let (x, y) = proj.project(GeoPoint::new(45.0, 0.0)).unwrap();
        assert!((x - (100.0 + FRAC_1_SQRT_2 * 80.0)).abs() < 1e-9);
        assert!((y - 100.0).abs() < 1e-9);

        let (x, y) = proj.project(GeoPoint::new(0.0, 45.0)).unwrap();
        assert!((x - 100.0).abs() < 1e-9);
        assert!((y - (100.0 - FRAC_1_SQRT_2 * 80.0)).abs() < 1e-9);
    }

    #[test]
    fn test_far_side_is_clipped() {
        let proj = Projection::new(RotationState::default(), 80.0, &surface());
        assert!(proj.project(GeoPoint::new(180.0, 0.0)).is_none());
        assert!(proj.project(GeoPoint::new(120.0, 30.0)).is_none());
        assert!(proj.project(GeoPoint::new(90.5, 0.0)).is_none());
        assert!(proj.project(GeoPoint::new(89.0, 0.0)).is_some());
    }

    #[test]
    fn test_clipping_matches_angular_distance() {
        let s = surface();
        for &(rlon, rlat) in &[(0.0, 0.0), (73.0, -20.0), (-160.0, 55.0), (12.0, 90.0)] {
            let rot = RotationState::new(rlon, rlat);
            for lon in (-180..180).step_by(15) {
                for lat in (-90..=90).step_by(15) {
                    let p = GeoPoint::new(lon as f64, lat as f64);
                    let hidden = angular_distance(p, rot.center()) >= CLIP_ANGLE;
                    assert_eq!(project(p, rot, 80.0, &s).is_none(), hidden, "{p:?} at {rot:?}");
                }
            }
        }
    }

    #[test]
    fn test_visible_points_stay_inside_disc() {
        let rot = RotationState::new(40.0, 25.0);
        let proj = Projection::new(rot, 80.0, &surface());
        for lon in (-180..180).step_by(10) {
            for lat in (-80..=80).step_by(10) {
                if let Some((x, y)) = proj.project(GeoPoint::new(lon as f64, lat as f64)) {
                    let r = ((x - 100.0).powi(2) + (y - 100.0).powi(2)).sqrt();
                    assert!(r <= 80.0 + 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_pure_for_same_inputs() {
        let s = surface();
        let rot = RotationState::new(12.5, -33.0);
        let p = GeoPoint::new(-20.0, -10.0);
        let a = Projection::new(rot, 123.0, &s).project(p);
        let b = Projection::new(rot, 123.0, &s).project(p);
        assert_eq!(a, b);
        assert_eq!(a, project(p, rot, 123.0, &s));
    }
}
