/// Braille Unicode raster for terminal graphics.
/// Each character cell holds a 2x4 block of sub-pixels (8 dots),
/// so the effective resolution is `cols*2 x rows*4`.
/// Unicode Braille patterns: U+2800 to U+28FF
#[derive(Clone)]
pub struct BrailleCanvas {
    cols: usize,
    rows: usize,
    cells: Vec<u8>, // Bit pattern per char, row-major
}

/// Sub-pixels per character cell horizontally
pub const PIXELS_PER_COL: usize = 2;
/// Sub-pixels per character cell vertically
pub const PIXELS_PER_ROW: usize = 4;

/// Blank braille glyph
pub const BLANK: char = '\u{2800}';

/// Dot bit for each sub-pixel, indexed `[x][y]` within a cell.
/// Left column is dots 1-2-3-7, right column dots 4-5-6-8.
const DOT_BITS: [[u8; PIXELS_PER_ROW]; PIXELS_PER_COL] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

impl BrailleCanvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0u8; cols * rows],
        }
    }

    /// Pixel width of the canvas
    pub fn width(&self) -> usize {
        self.cols * PIXELS_PER_COL
    }

    /// Pixel height of the canvas
    pub fn height(&self) -> usize {
        self.rows * PIXELS_PER_ROW
    }

    #[inline(always)]
    fn bit(x: usize, y: usize) -> u8 {
        DOT_BITS[x % PIXELS_PER_COL][y % PIXELS_PER_ROW]
    }

    /// Set a pixel. Out-of-range writes are dropped.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / PIXELS_PER_COL;
        let cy = y / PIXELS_PER_ROW;
        if cx >= self.cols || cy >= self.rows {
            return;
        }
        self.cells[cy * self.cols + cx] |= Self::bit(x, y);
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    #[inline]
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let cx = x / PIXELS_PER_COL;
        let cy = y / PIXELS_PER_ROW;
        if cx >= self.cols || cy >= self.rows {
            return false;
        }
        self.cells[cy * self.cols + cx] & Self::bit(x, y) != 0
    }

    /// Number of lit sub-pixels
    pub fn count_set(&self) -> usize {
        self.cells.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Glyph for one character cell
    #[inline]
    pub fn glyph(&self, col: usize, row: usize) -> char {
        if col >= self.cols || row >= self.rows {
            return BLANK;
        }
        char::from_u32(0x2800 + self.cells[row * self.cols + col] as u32).unwrap_or(BLANK)
    }

    /// Get a specific row as a string (for line-by-line rendering)
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.rows {
            return String::new();
        }
        (0..self.cols).map(|col| self.glyph(col, row)).collect()
    }

    /// Get all rows as an iterator of strings
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.rows).map(|i| self.row_to_string(i))
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.rows().collect::<Vec<_>>().join("\n")
    }
}
