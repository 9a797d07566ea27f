mod canvas;

pub use canvas::{BrailleCanvas, BLANK, PIXELS_PER_COL, PIXELS_PER_ROW};
