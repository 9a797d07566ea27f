use std::time::Instant;

use tracing::{debug, info, warn};

use crate::data::feed::LocationBoard;
use crate::data::DataEvent;
use crate::interaction::{GlobeState, InteractionConfig, InteractionMode};
use crate::map::{
    hit_test, CursorHint, DotField, GlobeLayers, GlobeRenderer, Projection, Surface, TooltipTarget,
    DEFAULT_HIT_RADIUS,
};

/// Knobs the view takes from configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewOptions {
    pub interaction: InteractionConfig,
    pub hit_radius: f64,
    /// Wheel delta for one scroll notch or zoom key press
    pub wheel_step: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            interaction: InteractionConfig::default(),
            hit_radius: DEFAULT_HIT_RADIUS,
            wheel_step: 40.0,
        }
    }
}

/// Progress of the one-off land dataset load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandStatus {
    Loading,
    Ready(usize),
    Failed,
}

/// Application state
pub struct App {
    pub globe: GlobeState,
    pub surface: Surface,
    pub dots: DotField,
    pub board: LocationBoard,
    pub renderer: GlobeRenderer,
    pub tooltip: Option<TooltipTarget>,
    pub cursor: CursorHint,
    pub land: LandStatus,
    pub should_quit: bool,
    hit_radius: f64,
    wheel_step: f64,
    /// Zoom ratio the user asked for. Only zoom input and reset change it;
    /// the scale is derived from it whenever the surface changes.
    zoom: f64,
    /// Cleared on teardown; late background results are dropped after that
    attached: bool,
}

impl App {
    pub fn new(width: usize, height: usize, options: ViewOptions) -> Self {
        let surface = map_surface(width, height);
        Self {
            globe: GlobeState::new(options.interaction, surface.base_radius()),
            surface,
            dots: DotField::empty(),
            board: LocationBoard::new(),
            renderer: GlobeRenderer::new(),
            tooltip: None,
            cursor: CursorHint::default(),
            land: LandStatus::Loading,
            should_quit: false,
            hit_radius: options.hit_radius,
            wheel_step: options.wheel_step,
            zoom: 1.0,
            attached: true,
        }
    }

    /// Follow a terminal resize, keeping the requested zoom ratio. The
    /// clamped scale of an intermediate size never feeds back into it.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.surface = map_surface(width, height);
        self.globe.set_scale(self.zoom * self.surface.base_radius());
        self.tooltip = None;
    }

    /// Projection for the current rotation, scale and surface. Rendering and
    /// hit-testing both go through this.
    pub fn projection(&self) -> Projection {
        Projection::new(self.globe.rotation(), self.globe.scale(), &self.surface)
    }

    pub fn zoom_ratio(&self) -> f64 {
        self.surface.zoom_ratio(self.globe.scale())
    }

    pub fn tick(&mut self, now: Instant) {
        self.globe.tick(now);
    }

    pub fn render(&self) -> GlobeLayers {
        self.renderer
            .render(&self.surface, &self.projection(), &self.dots, self.board.locations())
    }

    pub fn pointer_down(&mut self, col: u16, row: u16) {
        let (x, y) = cell_to_pixel(col, row);
        self.globe.pointer_down(x, y);
    }

    /// Drag the globe when a drag is open, otherwise hover.
    pub fn pointer_move(&mut self, col: u16, row: u16) {
        let (x, y) = cell_to_pixel(col, row);
        if !self.globe.pointer_move(x, y) {
            self.hover(col, row);
        }
    }

    pub fn pointer_up(&mut self, now: Instant) {
        self.globe.pointer_up(now);
    }

    /// Hit-test the pointer against visible markers. The tooltip is left as
    /// it is while a drag is open.
    pub fn hover(&mut self, col: u16, row: u16) {
        if self.globe.is_dragging() {
            return;
        }
        let pointer = cell_to_pixel(col, row);
        let projection = self.projection();
        match hit_test(self.board.locations(), &projection, pointer, self.hit_radius) {
            Some(location) => {
                self.tooltip = Some(TooltipTarget {
                    location: location.clone(),
                    screen_x: col,
                    screen_y: row,
                });
                self.cursor = CursorHint::Pointer;
            }
            None => {
                self.tooltip = None;
                self.cursor = CursorHint::Grab;
            }
        }
    }

    pub fn zoom_in(&mut self) {
        self.wheel(-self.wheel_step);
    }

    pub fn zoom_out(&mut self) {
        self.wheel(self.wheel_step);
    }

    /// Wheel zoom. The requested ratio only moves when the scale actually
    /// did, so pressing against a bound leaves it alone.
    fn wheel(&mut self, delta_y: f64) {
        let before = self.globe.scale();
        self.globe.wheel(delta_y);
        if self.globe.scale() != before {
            self.zoom = self.zoom_ratio();
        }
    }

    /// Apply a result from a background worker.
    pub fn receive(&mut self, event: DataEvent) {
        if !self.attached {
            debug!("view detached; dropping late result");
            return;
        }
        match event {
            DataEvent::Locations(outcome) => {
                self.board.apply(outcome);
            }
            DataEvent::Land(Ok(field)) => {
                info!(dots = field.len(), "land dot field installed");
                self.land = LandStatus::Ready(field.len());
                self.dots = field;
            }
            DataEvent::Land(Err(e)) => {
                warn!(error = %e, "land dataset failed to load; globe stays bare");
                self.land = LandStatus::Failed;
            }
        }
    }

    /// Tear the view down. Nothing received after this changes state.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.globe.reset(self.surface.base_radius());
        self.tooltip = None;
        self.cursor = CursorHint::Grab;
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.zoom_ratio())
    }

    /// Geographic point facing the viewer
    pub fn center_coords(&self) -> String {
        let center = self.globe.rotation().center();
        format!(
            "{:.1}°{}, {:.1}°{}",
            center.lat.abs(),
            if center.lat >= 0.0 { "N" } else { "S" },
            center.lon.abs(),
            if center.lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn mode_label(&self) -> &'static str {
        match self.globe.mode() {
            InteractionMode::AutoRotating => "spinning",
            InteractionMode::Dragging(_) => "dragging",
            InteractionMode::Paused { .. } => "paused",
        }
    }

    pub fn land_label(&self) -> String {
        match self.land {
            LandStatus::Loading => "land: loading".to_string(),
            LandStatus::Ready(n) => format!("land: {n} dots"),
            LandStatus::Failed => "land: unavailable".to_string(),
        }
    }
}

/// Map area inside the border and above the status bar
fn map_surface(width: usize, height: usize) -> Surface {
    Surface::new(width.saturating_sub(2), height.saturating_sub(3))
}

/// Terminal cell to the braille pixel at the middle of that cell
/// (1 cell offset for the border).
pub fn cell_to_pixel(col: u16, row: u16) -> (f64, f64) {
    let x = col.saturating_sub(1) as f64 * 2.0 + 1.0;
    let y = row.saturating_sub(1) as f64 * 4.0 + 2.0;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feed::{ActiveLocation, FeedError};
    use crate::geo::{GeoPoint, RotationState};
    use crate::map::{DotFieldBuilder, LandShape, Polygon};
    use std::time::Duration;

    fn app() -> App {
        // 100 x 50 inner cells, 200 x 200 pixels, base radius 80
        App::new(102, 53, ViewOptions::default())
    }

    fn nyc() -> ActiveLocation {
        ActiveLocation::new("NYC", -74.0, 40.0, 3)
    }

    fn small_field() -> DotField {
        let ring = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(10.0, 0.0),
            GeoPoint::new(10.0, 10.0),
            GeoPoint::new(0.0, 10.0),
        ];
        DotFieldBuilder::new(12.5).build(&[LandShape::new(vec![Polygon::new(ring, vec![])])])
    }

    #[test]
    fn test_initial_view() {
        let app = app();
        assert_eq!(app.globe.scale(), 80.0);
        assert_eq!(app.zoom_level(), "1.0x");
        assert_eq!(app.land, LandStatus::Loading);
        assert_eq!(app.board.locations().len(), 1);
    }

    #[test]
    fn test_cell_to_pixel() {
        assert_eq!(cell_to_pixel(1, 1), (1.0, 2.0));
        assert_eq!(cell_to_pixel(51, 26), (101.0, 102.0));
        assert_eq!(cell_to_pixel(0, 0), (1.0, 2.0));
    }

    #[test]
    fn test_feed_replaces_placeholder() {
        let mut app = app();
        app.receive(DataEvent::Locations(Ok(vec![nyc()])));
        assert_eq!(app.board.locations(), &[nyc()]);

        app.receive(DataEvent::Locations(Err(FeedError::Status(500))));
        assert_eq!(app.board.locations(), &[nyc()]);
    }

    #[test]
    fn test_land_installed_once_loaded() {
        let mut app = app();
        app.receive(DataEvent::Land(Ok(small_field())));
        assert_eq!(app.land, LandStatus::Ready(121));
        assert_eq!(app.dots.len(), 121);
        assert!(app.render().visible_dots > 0);
    }

    #[test]
    fn test_land_failure_keeps_running() {
        let mut app = app();
        app.receive(DataEvent::Land(Err(anyhow::anyhow!("offline"))));
        assert_eq!(app.land, LandStatus::Failed);
        assert!(app.dots.is_empty());
        app.tick(Instant::now());
        let layers = app.render();
        assert_eq!(layers.visible_dots, 0);
        assert!(layers.outline.count_set() > 0);
    }

    #[test]
    fn test_detached_view_drops_results() {
        let mut app = app();
        app.detach();
        assert!(!app.is_attached());
        app.receive(DataEvent::Locations(Ok(vec![nyc()])));
        app.receive(DataEvent::Land(Ok(small_field())));
        assert_eq!(app.board.locations().len(), 1);
        assert_eq!(app.board.locations()[0].display_name, "Waiting for Nodes...");
        assert_eq!(app.land, LandStatus::Loading);
    }

    #[test]
    fn test_drag_through_cells() {
        let mut app = app();
        app.pointer_down(10, 10);
        // 50 cells right = 100 pixels
        app.pointer_move(60, 10);
        assert_eq!(app.globe.rotation(), RotationState::new(25.0, 0.0));
        assert_eq!(app.mode_label(), "dragging");

        let now = Instant::now();
        app.pointer_up(now);
        assert_eq!(app.mode_label(), "paused");
        app.tick(now + Duration::from_millis(600));
        assert_eq!(app.mode_label(), "spinning");
    }

    #[test]
    fn test_hover_sets_tooltip_and_cursor() {
        let mut app = app();
        app.hover(51, 26);
        let tooltip = app.tooltip.clone().unwrap();
        assert_eq!(tooltip.location, ActiveLocation::placeholder());
        assert_eq!((tooltip.screen_x, tooltip.screen_y), (51, 26));
        assert_eq!(app.cursor, CursorHint::Pointer);

        app.hover(5, 5);
        assert!(app.tooltip.is_none());
        assert_eq!(app.cursor, CursorHint::Grab);
    }

    #[test]
    fn test_move_without_drag_hovers() {
        let mut app = app();
        app.pointer_move(51, 26);
        assert!(app.tooltip.is_some());
        assert_eq!(app.globe.rotation(), RotationState::default());
    }

    #[test]
    fn test_tooltip_untouched_while_dragging() {
        let mut app = app();
        app.hover(51, 26);
        app.pointer_down(51, 26);
        app.hover(5, 5);
        assert!(app.tooltip.is_some());
    }

    #[test]
    fn test_zoom_keys_use_wheel_step() {
        let mut app = app();
        app.zoom_in();
        assert_eq!(app.globe.scale(), 100.0);
        app.zoom_out();
        app.zoom_out();
        assert_eq!(app.globe.scale(), 60.0);
        for _ in 0..10 {
            app.zoom_out();
        }
        assert_eq!(app.globe.scale(), 50.0);
    }

    #[test]
    fn test_resize_keeps_zoom_ratio() {
        let mut app = app();
        app.zoom_in(); // 100 / 80
        app.resize(202, 103); // 200 x 100 cells, 400 x 400 pixels, base 160
        assert_eq!(app.surface, Surface::new(200, 100));
        assert!((app.globe.scale() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_resize_does_not_inflate_zoom() {
        let mut app = App::new(200, 60, ViewOptions::default());
        let scale = app.globe.scale();
        assert!((app.zoom_ratio() - 1.0).abs() < 1e-9);

        // 8 x 2 cells: base radius 3.2, scale pinned at the 50 floor
        app.resize(10, 5);
        assert_eq!(app.globe.scale(), 50.0);

        app.resize(200, 60);
        assert!((app.globe.scale() - scale).abs() < 1e-9);
        assert!((app.zoom_ratio() - 1.0).abs() < 1e-9);
        assert_eq!(app.zoom_level(), "1.0x");
    }

    #[test]
    fn test_zoom_survives_tiny_resize() {
        let mut app = App::new(200, 60, ViewOptions::default());
        app.zoom_in();
        let scale = app.globe.scale();
        let ratio = app.zoom_ratio();

        app.resize(10, 5);
        // Pressing against the floor while tiny does not change the request
        app.zoom_out();
        app.resize(200, 60);
        assert!((app.globe.scale() - scale).abs() < 1e-9);
        assert!((app.zoom_ratio() - ratio).abs() < 1e-9);
    }

    #[test]
    fn test_reset_view() {
        let mut app = app();
        app.pointer_down(10, 10);
        app.pointer_move(30, 20);
        app.zoom_in();
        app.reset_view();
        assert_eq!(app.globe.rotation(), RotationState::default());
        assert_eq!(app.globe.scale(), 80.0);
        assert_eq!(app.mode_label(), "spinning");
    }

    #[test]
    fn test_status_labels() {
        let mut app = app();
        assert_eq!(app.center_coords(), "0.0°N, 0.0°E");
        assert_eq!(app.land_label(), "land: loading");
        app.receive(DataEvent::Land(Ok(small_field())));
        assert_eq!(app.land_label(), "land: 121 dots");
    }
}
