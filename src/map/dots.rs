use rayon::prelude::*;

use crate::geo::GeoPoint;

/// Density knob for the land stipple; grid step is `spacing * 0.08` degrees.
pub const DEFAULT_DOT_SPACING: f64 = 24.0;
const SPACING_TO_DEGREES: f64 = 0.08;
/// Smallest accepted spacing (0.08 degree grid)
pub const MIN_DOT_SPACING: f64 = 1.0;

/// Tolerance for the inclusive upper bound of the sampling grid
const GRID_EPSILON: f64 = 1e-9;
/// Cross-product tolerance for the on-edge test
const EDGE_EPSILON: f64 = 1e-12;

/// A closed ring of coordinates. The closing vertex may or may not be repeated.
pub type Ring = Vec<GeoPoint>;

/// One sampled stipple position
pub type LandDot = GeoPoint;

/// Outer ring with zero or more holes
#[derive(Clone, Debug, Default)]
pub struct Polygon {
    pub outer: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(outer: Ring, holes: Vec<Ring>) -> Self {
        Self { outer, holes }
    }

    /// Inside the outer ring and inside none of the holes.
    pub fn contains(&self, p: GeoPoint) -> bool {
        ring_contains(&self.outer, p) && !self.holes.iter().any(|hole| ring_contains(hole, p))
    }
}

/// A landmass made of one or more disjoint polygons (a GeoJSON feature).
#[derive(Clone, Debug, Default)]
pub struct LandShape {
    pub polygons: Vec<Polygon>,
}

/// Axis-aligned lon/lat bounds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    fn has_area(&self) -> bool {
        self.max_lon > self.min_lon && self.max_lat > self.min_lat
    }
}

impl LandShape {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// Bounds over every outer ring, or `None` when the shape has no vertices.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.polygons.iter().flat_map(|poly| poly.outer.iter());
        let first = points.next()?;
        let init = Bounds {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        Some(points.fold(init, |b, p| Bounds {
            min_lon: b.min_lon.min(p.lon),
            min_lat: b.min_lat.min(p.lat),
            max_lon: b.max_lon.max(p.lon),
            max_lat: b.max_lat.max(p.lat),
        }))
    }

    /// Union over parts: land if some polygon contains the point outside its own holes.
    pub fn contains(&self, p: GeoPoint) -> bool {
        self.polygons.iter().any(|poly| poly.contains(p))
    }
}

/// Even-odd ray casting with a boundary pre-check.
///
/// A point lying on any segment of the ring counts as contained by it, for
/// outer rings and holes alike, so edge points are classified the same way
/// every run. Rings with fewer than three vertices contain nothing.
pub fn ring_contains(ring: &[GeoPoint], p: GeoPoint) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if on_segment(a, b, p) {
            return true;
        }
        if (a.lat > p.lat) != (b.lat > p.lat)
            && p.lon < (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[inline]
fn on_segment(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> bool {
    let cross = (b.lon - a.lon) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lon - a.lon);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

/// Static set of land sample points, built once per dataset load.
#[derive(Clone, Debug, Default)]
pub struct DotField {
    dots: Vec<LandDot>,
}

impl DotField {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn dots(&self) -> &[LandDot] {
        &self.dots
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }
}

/// Samples land shapes on a regular lon/lat grid.
#[derive(Clone, Copy, Debug)]
pub struct DotFieldBuilder {
    spacing: f64,
}

impl Default for DotFieldBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_DOT_SPACING)
    }
}

impl DotFieldBuilder {
    pub fn new(spacing: f64) -> Self {
        let spacing = if spacing.is_finite() {
            spacing.max(MIN_DOT_SPACING)
        } else {
            DEFAULT_DOT_SPACING
        };
        Self { spacing }
    }

    /// Grid step in degrees
    pub fn step(&self) -> f64 {
        self.spacing * SPACING_TO_DEGREES
    }

    /// Sample every shape. Shapes are processed in parallel and concatenated
    /// in input order, so the same input always yields the same field.
    pub fn build(&self, shapes: &[LandShape]) -> DotField {
        let per_shape: Vec<Vec<LandDot>> = shapes
            .par_iter()
            .map(|shape| self.sample_shape(shape))
            .collect();

        let total = per_shape.iter().map(Vec::len).sum();
        let mut dots = Vec::with_capacity(total);
        for chunk in per_shape {
            dots.extend(chunk);
        }
        DotField { dots }
    }

    /// Grid points of one shape's bounding box that fall on land.
    pub fn sample_shape(&self, shape: &LandShape) -> Vec<LandDot> {
        let Some(bounds) = shape.bounds() else {
            return Vec::new();
        };
        if !bounds.has_area() {
            return Vec::new();
        }

        let step = self.step();
        let lon_steps = ((bounds.max_lon - bounds.min_lon) / step + GRID_EPSILON).floor() as usize;
        let lat_steps = ((bounds.max_lat - bounds.min_lat) / step + GRID_EPSILON).floor() as usize;

        let mut dots = Vec::new();
        for i in 0..=lon_steps {
            let lon = bounds.min_lon + i as f64 * step;
            for j in 0..=lat_steps {
                let p = GeoPoint::new(lon, bounds.min_lat + j as f64 * step);
                if shape.contains(p) {
                    dots.push(p);
                }
            }
        }
        dots
    }
}
