//! Rotation / zoom state shared by the render pass and the pointer handlers.
//!
//! Rotation has exactly one writer at a time: the auto-rotate step in
//! [`GlobeState::tick`] only runs in [`InteractionMode::AutoRotating`], and drag
//! updates only apply in [`InteractionMode::Dragging`].

use std::time::{Duration, Instant};

use tracing::debug;

use crate::geo::{wrap_lon, RotationState};

/// Tunables for the interaction state machine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionConfig {
    /// Degrees of longitude added per frame while auto-rotating
    pub rotation_speed: f64,
    /// Degrees of rotation per pixel of drag
    pub drag_sensitivity: f64,
    /// Idle time after a drag ends before auto-rotate resumes
    pub resume_delay: Duration,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change per unit of wheel delta
    pub wheel_factor: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 0.2,
            drag_sensitivity: 0.25,
            resume_delay: Duration::from_millis(600),
            min_scale: 50.0,
            max_scale: 4000.0,
            wheel_factor: 0.5,
        }
    }
}

/// Open between pointer-down and pointer-up
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub start_x: f64,
    pub start_y: f64,
    pub start_rotation: RotationState,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionMode {
    AutoRotating,
    Dragging(DragSession),
    /// Drag just ended; auto-rotate comes back once `resume_delay` has passed
    Paused { released_at: Instant },
}

pub struct GlobeState {
    rotation: RotationState,
    scale: f64,
    mode: InteractionMode,
    config: InteractionConfig,
}

impl GlobeState {
    pub fn new(config: InteractionConfig, scale: f64) -> Self {
        Self {
            rotation: RotationState::default(),
            scale: scale.clamp(config.min_scale, config.max_scale),
            mode: InteractionMode::AutoRotating,
            config,
        }
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    /// Globe radius in pixels
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, InteractionMode::Dragging(_))
    }

    pub fn is_auto_rotating(&self) -> bool {
        matches!(self.mode, InteractionMode::AutoRotating)
    }

    /// Open a drag session; auto-rotate stops immediately.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.mode = InteractionMode::Dragging(DragSession {
            start_x: x,
            start_y: y,
            start_rotation: self.rotation,
        });
    }

    /// Apply a drag move. Returns `false` (and changes nothing) when no drag is open.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let InteractionMode::Dragging(session) = self.mode else {
            return false;
        };
        let sensitivity = self.config.drag_sensitivity;
        let dx = x - session.start_x;
        let dy = y - session.start_y;
        self.rotation = RotationState::new(
            session.start_rotation.lon + dx * sensitivity,
            session.start_rotation.lat - dy * sensitivity,
        );
        true
    }

    /// Close the drag session and start the resume countdown.
    pub fn pointer_up(&mut self, now: Instant) {
        if self.is_dragging() {
            self.mode = InteractionMode::Paused { released_at: now };
        }
    }

    /// Wheel zoom; never touches rotation or mode.
    pub fn wheel(&mut self, delta_y: f64) {
        self.set_scale(self.scale - delta_y * self.config.wheel_factor);
    }

    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.scale = scale.clamp(self.config.min_scale, self.config.max_scale);
        }
    }

    /// Per-frame step: finish a pending resume, then advance auto-rotation.
    pub fn tick(&mut self, now: Instant) {
        if let InteractionMode::Paused { released_at } = self.mode {
            if now.saturating_duration_since(released_at) >= self.config.resume_delay {
                debug!("auto-rotate resumed");
                self.mode = InteractionMode::AutoRotating;
            }
        }
        if self.is_auto_rotating() {
            self.rotation.lon = wrap_lon(self.rotation.lon + self.config.rotation_speed);
        }
    }

    /// Back to the initial orientation at the given scale, auto-rotating.
    pub fn reset(&mut self, scale: f64) {
        self.rotation = RotationState::default();
        self.mode = InteractionMode::AutoRotating;
        self.set_scale(scale);
    }
}
