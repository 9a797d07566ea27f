use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Stroke a line `width` pixels wide by offsetting parallel Bresenham
/// lines along the minor axis.
pub fn draw_wide_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, width: u32) {
    if width <= 1 {
        draw_line(canvas, x0, y0, x1, y1);
        return;
    }
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    let w = width as i32;
    for offset in -(w - 1) / 2..=w / 2 {
        if steep {
            draw_line(canvas, x0 + offset, y0, x1 + offset, y1);
        } else {
            draw_line(canvas, x0, y0 + offset, x1, y1 + offset);
        }
    }
}

/// Rough bounding box test so far off-screen segments are never rasterized.
#[inline]
pub fn segment_might_be_visible(canvas: &BrailleCanvas, p1: (i32, i32), p2: (i32, i32)) -> bool {
    let min_x = p1.0.min(p2.0);
    let max_x = p1.0.max(p2.0);
    let min_y = p1.1.min(p2.1);
    let max_y = p1.1.max(p2.1);

    max_x >= 0
        && min_x < canvas.width() as i32
        && max_y >= 0
        && min_y < canvas.height() as i32
}

/// Fill a disc of fractional radius. Radii below one pixel light a single pixel.
pub fn fill_circle(canvas: &mut BrailleCanvas, cx: f64, cy: f64, radius: f64) {
    let px = cx.round() as i32;
    let py = cy.round() as i32;
    if radius < 1.0 {
        canvas.set_pixel_signed(px, py);
        return;
    }

    let r = radius.ceil() as i32;
    let r2 = radius * radius;
    // Clip the scan to the canvas so huge markers at deep zoom stay cheap
    let y_lo = (py - r).max(0);
    let y_hi = (py + r).min(canvas.height() as i32 - 1);
    let x_lo = (px - r).max(0);
    let x_hi = (px + r).min(canvas.width() as i32 - 1);

    for y in y_lo..=y_hi {
        let dy = (y - py) as f64;
        for x in x_lo..=x_hi {
            let dx = (x - px) as f64;
            if dx * dx + dy * dy <= r2 {
                canvas.set_pixel_signed(x, y);
            }
        }
    }
}

/// Stroke a circle outline `width` pixels wide (midpoint circle algorithm,
/// one pass per concentric radius).
pub fn stroke_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32, width: u32) {
    for inset in 0..width.max(1) as i32 {
        let r = radius - inset;
        if r < 0 {
            break;
        }
        midpoint_circle(canvas, cx, cy, r);
    }
}

fn midpoint_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, r: i32) {
    let mut x = r;
    let mut y = 0;
    let mut err = 1 - r;

    while x >= y {
        for (ox, oy) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
            canvas.set_pixel_signed(cx + ox, cy + oy);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// A batch of circles accumulated during a frame and filled in one pass.
#[derive(Default)]
pub struct CirclePath {
    arcs: Vec<(f64, f64, f64)>,
}

impl CirclePath {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arcs: Vec::with_capacity(capacity),
        }
    }

    /// Append a full circle to the path
    #[inline]
    pub fn arc(&mut self, x: f64, y: f64, radius: f64) {
        self.arcs.push((x, y, radius));
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Rasterize every accumulated circle onto the canvas
    pub fn fill(&self, canvas: &mut BrailleCanvas) {
        for &(x, y, r) in &self.arcs {
            fill_circle(canvas, x, y, r);
        }
    }
}
