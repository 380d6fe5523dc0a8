//! Viewport sizing.
//!
//! A size notification updates four things together: the stored viewport,
//! the camera projection, the render target and the clamped pixel ratio on
//! both the renderer and the firefly material. Nothing in between is ever
//! drawn.

use crate::materials::{
    clamp_pixel_ratio, MaterialDescriptor, MaterialError, UniformValue, U_PIXEL_RATIO,
};
use crate::render::{PerspectiveCamera, RenderService};

/// Host window size in logical pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub width: u32,
    /// Host height plus one pixel, which hides a seam along the bottom edge.
    pub height: u32,
    pub pixel_ratio: f32,
}

impl ViewportState {
    pub fn from_metrics(metrics: ViewportMetrics) -> Self {
        Self {
            width: metrics.width,
            height: metrics.height.saturating_add(1),
            pixel_ratio: clamp_pixel_ratio(metrics.device_pixel_ratio),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportPhase {
    Stable,
    Resizing,
}

#[derive(Debug)]
pub struct ViewportController {
    state: ViewportState,
    phase: ViewportPhase,
}

impl ViewportController {
    pub fn new(metrics: ViewportMetrics) -> Self {
        Self {
            state: ViewportState::from_metrics(metrics),
            phase: ViewportPhase::Stable,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn phase(&self) -> ViewportPhase {
        self.phase
    }

    /// Push the current state to every dependent. Used once at startup.
    pub fn apply<R: RenderService + ?Sized>(
        &mut self,
        camera: &mut PerspectiveCamera,
        renderer: &mut R,
        fireflies: &mut MaterialDescriptor,
    ) -> Result<(), MaterialError> {
        self.phase = ViewportPhase::Resizing;
        let result = push_state(self.state, camera, renderer, fireflies);
        self.phase = ViewportPhase::Stable;
        result
    }

    /// React to a host size notification. Returns false when nothing changed.
    pub fn resize<R: RenderService + ?Sized>(
        &mut self,
        metrics: ViewportMetrics,
        camera: &mut PerspectiveCamera,
        renderer: &mut R,
        fireflies: &mut MaterialDescriptor,
    ) -> Result<bool, MaterialError> {
        let next = ViewportState::from_metrics(metrics);
        if next == self.state {
            return Ok(false);
        }
        log::debug!(
            "Viewport resized to {}x{} (pixel ratio {})",
            next.width,
            next.height,
            next.pixel_ratio
        );
        self.state = next;
        self.apply(camera, renderer, fireflies)?;
        Ok(true)
    }
}

fn push_state<R: RenderService + ?Sized>(
    state: ViewportState,
    camera: &mut PerspectiveCamera,
    renderer: &mut R,
    fireflies: &mut MaterialDescriptor,
) -> Result<(), MaterialError> {
    camera.aspect = state.aspect();
    camera.update_projection_matrix();
    renderer.set_size(state.width, state.height);
    renderer.set_pixel_ratio(state.pixel_ratio);
    fireflies.set_uniform(U_PIXEL_RATIO, UniformValue::Float(state.pixel_ratio))
}
