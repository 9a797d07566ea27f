use std::f64::consts::FRAC_PI_2;

/// Angle (radians) from the view center beyond which a point is on the far side.
pub const CLIP_ANGLE: f64 = FRAC_PI_2;

/// A geographic coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Globe orientation in degrees. The point facing the viewer is `(-lon, -lat)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationState {
    pub lon: f64,
    /// Always within [-90, 90]
    pub lat: f64,
}

impl RotationState {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat: lat.clamp(-90.0, 90.0),
        }
    }

    /// Geographic point at the middle of the visible hemisphere.
    #[inline(always)]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(-self.lon, -self.lat)
    }
}

/// Wrap longitude into [-180, 180)
#[inline(always)]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Great-circle distance in radians (haversine).
#[inline]
pub fn angular_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * h.sqrt().clamp(0.0, 1.0).asin()
}

/// Whether `point` lies on the hemisphere facing the viewer for this rotation.
#[inline]
pub fn is_visible(point: GeoPoint, rotation: &RotationState) -> bool {
    angular_distance(point, rotation.center()) < CLIP_ANGLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_distance_to_self_is_zero() {
        for &(lon, lat) in &[(0.0, 0.0), (-74.0, 40.0), (179.9, -89.0), (12.5, 55.1)] {
            let p = GeoPoint::new(lon, lat);
            assert!(angular_distance(p, p).abs() < 1e-12);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(-74.0, 40.7);
        let b = GeoPoint::new(139.7, 35.7);
        assert!((angular_distance(a, b) - angular_distance(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_known_distances() {
        let origin = GeoPoint::new(0.0, 0.0);
        let quarter = angular_distance(origin, GeoPoint::new(90.0, 0.0));
        assert!((quarter - FRAC_PI_2).abs() < 1e-9);

        let pole = angular_distance(origin, GeoPoint::new(0.0, 90.0));
        assert!((pole - FRAC_PI_2).abs() < 1e-9);

        let antipode = angular_distance(origin, GeoPoint::new(180.0, 0.0));
        assert!((antipode - PI).abs() < 1e-9);
    }

    #[test]
    fn test_center_is_negated_rotation() {
        let rot = RotationState::new(30.0, -20.0);
        assert_eq!(rot.center(), GeoPoint::new(-30.0, 20.0));
        assert!(is_visible(GeoPoint::new(-30.0, 20.0), &rot));
        assert!(!is_visible(GeoPoint::new(150.0, -20.0), &rot));
    }

    #[test]
    fn test_rotation_clamps_latitude() {
        assert_eq!(RotationState::new(0.0, 120.0).lat, 90.0);
        assert_eq!(RotationState::new(0.0, -95.0).lat, -90.0);
    }

    #[test]
    fn test_wrap_lon() {
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(-190.0), 170.0);
        assert_eq!(wrap_lon(180.0), -180.0);
        assert_eq!(wrap_lon(45.0), 45.0);
    }
}
