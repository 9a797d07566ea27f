use crate::data::feed::ActiveLocation;
use crate::map::projection::Projection;

/// Pointer distance (pixels) within which a marker counts as hovered
pub const DEFAULT_HIT_RADIUS: f64 = 15.0;

/// Pointer affordance shown to the user
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Grab,
    Pointer,
}

/// Hovered location plus where the pointer was, in terminal cells.
/// The tooltip follows the pointer, not the marker.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipTarget {
    pub location: ActiveLocation,
    pub screen_x: u16,
    pub screen_y: u16,
}

/// First visible location (in feed order) whose projected marker lies
/// strictly within `radius` pixels of `pointer`.
pub fn hit_test<'a>(
    locations: &'a [ActiveLocation],
    projection: &Projection,
    pointer: (f64, f64),
    radius: f64,
) -> Option<&'a ActiveLocation> {
    locations.iter().find(|location| {
        projection.project(location.point).is_some_and(|(x, y)| {
            let dx = x - pointer.0;
            let dy = y - pointer.1;
            (dx * dx + dy * dy).sqrt() < radius
        })
    })
}
