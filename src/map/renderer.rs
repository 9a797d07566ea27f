use crate::braille::BrailleCanvas;
use crate::data::feed::ActiveLocation;
use crate::geo::GeoPoint;
use crate::map::dots::DotField;
use crate::map::geometry::{draw_wide_line, fill_circle, segment_might_be_visible, stroke_circle, CirclePath};
use crate::map::projection::{Projection, Surface};

/// A graticule line as a sampled sequence of lon/lat points
pub type GraticuleLine = Vec<GeoPoint>;

/// Sizes in pixels at zoom ratio 1; all of them scale with the zoom ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStyle {
    pub land_dot_radius: f64,
    pub halo_radius: f64,
    pub marker_radius: f64,
    pub graticule_width: f64,
    pub outline_width: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            land_dot_radius: 0.6,
            halo_radius: 6.0,
            marker_radius: 2.5,
            graticule_width: 1.0,
            outline_width: 2.0,
        }
    }
}

/// One rendered frame, split into layers so the view can color each one.
pub struct GlobeLayers {
    pub graticule: BrailleCanvas,
    pub land: BrailleCanvas,
    pub halos: BrailleCanvas,
    pub markers: BrailleCanvas,
    pub outline: BrailleCanvas,
    pub visible_dots: usize,
    pub visible_markers: usize,
}

impl GlobeLayers {
    fn blank(surface: &Surface) -> Self {
        let canvas = || BrailleCanvas::new(surface.cols, surface.rows);
        Self {
            graticule: canvas(),
            land: canvas(),
            halos: canvas(),
            markers: canvas(),
            outline: canvas(),
            visible_dots: 0,
            visible_markers: 0,
        }
    }
}

/// Globe renderer: graticule, land stipple, location markers and the
/// sphere silhouette, drawn through one [`Projection`] per frame.
pub struct GlobeRenderer {
    graticule: Vec<GraticuleLine>,
    pub style: RenderStyle,
}

impl GlobeRenderer {
    pub fn new() -> Self {
        Self {
            graticule: graticule_lines(),
            style: RenderStyle::default(),
        }
    }

    /// Produce one frame. Layers start blank, so every call is a full clear.
    pub fn render(
        &self,
        surface: &Surface,
        projection: &Projection,
        dots: &DotField,
        locations: &[ActiveLocation],
    ) -> GlobeLayers {
        let mut layers = GlobeLayers::blank(surface);
        let zoom = surface.zoom_ratio(projection.scale());

        let line_width = (self.style.graticule_width * zoom).round().max(1.0) as u32;
        for line in &self.graticule {
            draw_graticule_line(&mut layers.graticule, line, projection, line_width);
        }

        let dot_radius = self.style.land_dot_radius * zoom;
        let mut path = CirclePath::with_capacity(dots.len() / 2);
        for &dot in dots.dots() {
            if let Some((x, y)) = projection.project(dot) {
                path.arc(x, y, dot_radius);
            }
        }
        path.fill(&mut layers.land);
        layers.visible_dots = path.len();

        let halo = self.style.halo_radius * zoom;
        let marker = self.style.marker_radius * zoom;
        for location in locations {
            if let Some((x, y)) = projection.project(location.point) {
                fill_circle(&mut layers.halos, x, y, halo);
                fill_circle(&mut layers.markers, x, y, marker);
                layers.visible_markers += 1;
            }
        }

        let (cx, cy) = projection.origin();
        let outline_width = (self.style.outline_width * zoom).round().max(1.0) as u32;
        stroke_circle(
            &mut layers.outline,
            cx.round() as i32,
            cy.round() as i32,
            projection.scale().round() as i32,
            outline_width,
        );

        layers
    }
}

impl Default for GlobeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw the visible runs of a line. A segment is only drawn when both ends
/// are on the front hemisphere.
fn draw_graticule_line(canvas: &mut BrailleCanvas, line: &[GeoPoint], projection: &Projection, width: u32) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &point in line {
        let current = projection.project_px(point);
        if let (Some(p1), Some(p2)) = (prev, current) {
            if segment_might_be_visible(canvas, p1, p2) {
                draw_wide_line(canvas, p1.0, p1.1, p2.0, p2.1, width);
            }
        }
        prev = current;
    }
}

/// Degrees between graticule lines
const GRATICULE_STEP: f64 = 10.0;
/// Sampling interval along each graticule line
const GRATICULE_PRECISION: f64 = 2.5;
/// Minor meridians stop short of the poles
const MINOR_MERIDIAN_EXTENT: f64 = 80.0;

/// Meridians every 10 degrees (full pole-to-pole on multiples of 90, else
/// to +/-80) and parallels every 10 degrees between -80 and 80.
fn graticule_lines() -> Vec<GraticuleLine> {
    let mut lines = Vec::new();

    for i in 0..36 {
        let lon = -180.0 + i as f64 * GRATICULE_STEP;
        let extent = if lon % 90.0 == 0.0 { 90.0 } else { MINOR_MERIDIAN_EXTENT };
        lines.push(sample(-extent, extent, |lat| GeoPoint::new(lon, lat)));
    }

    for i in 1..18 {
        let lat = -90.0 + i as f64 * GRATICULE_STEP;
        lines.push(sample(-180.0, 180.0, |lon| GeoPoint::new(lon, lat)));
    }

    lines
}

fn sample(from: f64, to: f64, point: impl Fn(f64) -> GeoPoint) -> GraticuleLine {
    let steps = ((to - from) / GRATICULE_PRECISION).round() as usize;
    (0..=steps)
        .map(|i| point(from + i as f64 * GRATICULE_PRECISION))
        .collect()
}
