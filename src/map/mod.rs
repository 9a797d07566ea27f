mod dots;
pub mod geometry;
mod hit;
mod projection;
mod renderer;

pub use dots::{
    Bounds, DotField, DotFieldBuilder, LandDot, LandShape, Polygon, Ring, DEFAULT_DOT_SPACING, MIN_DOT_SPACING,
};
pub use hit::{hit_test, CursorHint, TooltipTarget, DEFAULT_HIT_RADIUS};
pub use projection::{project, Projection, Surface};
pub use renderer::{GlobeLayers, GlobeRenderer, GraticuleLine, RenderStyle};
