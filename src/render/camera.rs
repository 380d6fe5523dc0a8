use glam::{Mat4, Vec3};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            position: [4.0, 2.0, 4.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub up: Vec3,
    target: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            fov: config.fov,
            aspect,
            near: config.near,
            far: config.far,
            position: Vec3::from(config.position),
            up: Vec3::Y,
            target: Vec3::from(config.target),
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute the projection after `fov`, `aspect`, `near` or `far` change.
    pub fn update_projection_matrix(&mut self) {
        let aspect = if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        };
        self.projection =
            Mat4::perspective_rh_gl(self.fov.to_radians(), aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraConfig, PerspectiveCamera};
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn default_camera_looks_at_origin_from_the_corner() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 16.0 / 9.0);
        assert_eq!(camera.position, Vec3::new(4.0, 2.0, 4.0));
        assert_eq!(camera.target(), Vec3::ZERO);
        let view = camera.view_matrix();
        assert!(view.is_finite());
        let origin = view.transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.z, -camera.position.length(), epsilon = 1e-5);
    }

    #[test]
    fn projection_tracks_aspect() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        let square = camera.projection_matrix();
        camera.aspect = 2.0;
        camera.update_projection_matrix();
        let wide = camera.projection_matrix();
        // x scale is focal / aspect
        assert_relative_eq!(wide.x_axis.x * 2.0, square.x_axis.x, epsilon = 1e-6);
        assert_eq!(wide.y_axis.y, square.y_axis.y);
    }

    #[test]
    fn degenerate_aspect_keeps_projection_finite() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        camera.aspect = f32::NAN;
        camera.update_projection_matrix();
        assert!(camera.projection_matrix().is_finite());
    }
}
