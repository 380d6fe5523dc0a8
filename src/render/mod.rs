mod camera;
mod controls;

pub use camera::{CameraConfig, PerspectiveCamera};
pub use controls::{CameraControls, OrbitControls, OrbitSettings};

use crate::color::Color;
use crate::materials::{MaterialSet, U_TIME};
use crate::scene::SceneGraph;
use glam::{Mat4, Vec3};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Everything a backend needs to draw one frame.
pub struct FrameView<'a> {
    pub scene: &'a SceneGraph,
    pub materials: &'a MaterialSet,
    pub camera: &'a PerspectiveCamera,
}

/// The rendering backend: owns the render target and draws frames.
pub trait RenderService {
    /// Resize the render target, in CSS-style logical pixels.
    fn set_size(&mut self, width: u32, height: u32);
    fn set_pixel_ratio(&mut self, ratio: f32);
    fn set_clear_color(&mut self, color: Color);
    fn set_tone_mapping_exposure(&mut self, exposure: f32);
    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError>;

    /// Tessellated debug-panel output for this frame.
    fn submit_overlay(
        &mut self,
        _primitives: &[egui::ClippedPrimitive],
        _textures: &egui::TexturesDelta,
        _pixels_per_point: f32,
    ) {
    }
}

/// Snapshot of the last frame a [`HeadlessRenderer`] was asked to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub node_count: usize,
    /// World transform of every node, in walk order.
    pub world_transforms: Vec<Mat4>,
    pub camera_position: Vec3,
    pub view: Mat4,
    pub aspect: f32,
    /// `uTime` of every material that has one, by material name.
    pub time_uniforms: Vec<(String, f32)>,
}

/// Backend that keeps the renderer state in memory and records frames
/// instead of drawing them.
#[derive(Debug)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    pixel_ratio: f32,
    clear_color: Color,
    exposure: f32,
    frames_rendered: u64,
    last_frame: Option<FrameRecord>,
    overlay_primitives: usize,
    fail_next: Option<String>,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
            clear_color: Color::BLACK,
            exposure: 1.0,
            frames_rendered: 0,
            last_frame: None,
            overlay_primitives: 0,
            fail_next: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Physical size of the render target.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).floor() as u32,
            (self.height as f32 * self.pixel_ratio).floor() as u32,
        )
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn tone_mapping_exposure(&self) -> f32 {
        self.exposure
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.last_frame.as_ref()
    }

    pub fn overlay_primitives(&self) -> usize {
        self.overlay_primitives
    }

    /// Make the next `render` call fail with `message`.
    pub fn fail_next_frame(&mut self, message: &str) {
        self.fail_next = Some(message.to_string());
    }
}

impl RenderService for HeadlessRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn set_tone_mapping_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError> {
        if let Some(message) = self.fail_next.take() {
            return Err(RenderError::Backend(message));
        }
        let time_uniforms = frame
            .materials
            .iter()
            .filter_map(|(_, material)| {
                material
                    .uniform_f32(U_TIME)
                    .map(|time| (material.name.clone(), time))
            })
            .collect();
        let walk = frame.scene.walk();
        self.last_frame = Some(FrameRecord {
            node_count: walk.len(),
            world_transforms: walk
                .iter()
                .map(|id| frame.scene.world_transform(*id))
                .collect(),
            camera_position: frame.camera.position,
            view: frame.camera.view_matrix(),
            aspect: frame.camera.aspect,
            time_uniforms,
        });
        self.frames_rendered += 1;
        Ok(())
    }

    fn submit_overlay(
        &mut self,
        primitives: &[egui::ClippedPrimitive],
        _textures: &egui::TexturesDelta,
        _pixels_per_point: f32,
    ) {
        self.overlay_primitives = primitives.len();
    }
}
