use super::PerspectiveCamera;
use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

const EPS: f32 = 1e-6;

/// Per-frame camera input integration.
pub trait CameraControls {
    /// Apply accumulated input to `camera`. Returns true if the camera moved.
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    /// Radians from the up axis.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitSettings {
    /// Polar limits as `(min, max)`, swapped if authored the wrong way round.
    pub fn polar_bounds(&self) -> (f32, f32) {
        ordered(self.min_polar_angle, self.max_polar_angle, (0.0, PI))
    }

    /// Distance limits as `(min, max)`, swapped if authored the wrong way round.
    pub fn distance_bounds(&self) -> (f32, f32) {
        ordered(self.min_distance, self.max_distance, (0.0, f32::INFINITY))
    }

    /// Settings with every bound pair in ascending order. Returns the fixed
    /// settings and whether anything changed.
    pub fn normalized(&self) -> (Self, bool) {
        let (min_polar_angle, max_polar_angle) = self.polar_bounds();
        let (min_distance, max_distance) = self.distance_bounds();
        let fixed = Self {
            min_polar_angle,
            max_polar_angle,
            min_distance,
            max_distance,
            ..self.clone()
        };
        let changed = fixed != *self;
        (fixed, changed)
    }
}

/// NaN bounds fall back to `fallback`.
fn ordered(a: f32, b: f32, fallback: (f32, f32)) -> (f32, f32) {
    if a.is_nan() || b.is_nan() {
        fallback
    } else if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_polar_angle: 0.0,
            // keep the camera above the ground plane
            max_polar_angle: FRAC_PI_2 - 0.25,
            min_distance: 0.0,
            max_distance: 100.0,
        }
    }
}

/// Orbit camera around a target point, with optional inertia.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub settings: OrbitSettings,
    target: Vec3,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings, target: Vec3) -> Self {
        let (settings, changed) = settings.normalized();
        if changed {
            log::warn!("Orbit limits were inverted; using them swapped");
        }
        Self {
            settings,
            target,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Pointer drag in pixels over a viewport `viewport_height` pixels tall.
    pub fn drag(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.rotate_left(TAU * dx / height * self.settings.rotate_speed);
        self.rotate_up(TAU * dy / height * self.settings.rotate_speed);
    }

    /// Wheel notches; negative moves closer.
    pub fn wheel(&mut self, delta: f32) {
        let zoom = 0.95f32.powf(self.settings.zoom_speed);
        if delta < 0.0 {
            self.scale *= zoom;
        } else if delta > 0.0 {
            self.scale /= zoom;
        }
    }

    /// True while damped motion is still settling.
    pub fn is_moving(&self) -> bool {
        self.delta_theta.abs() > EPS || self.delta_phi.abs() > EPS || (self.scale - 1.0).abs() > EPS
    }
}

impl CameraControls for OrbitControls {
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > EPS {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, 0.0)
        };

        let step = if self.settings.enable_damping {
            self.settings.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * step;
        phi += self.delta_phi * step;

        if theta.is_finite() {
            theta = (theta + PI).rem_euclid(TAU) - PI;
        }
        let (min_polar, max_polar) = self.settings.polar_bounds();
        let (min_distance, max_distance) = self.settings.distance_bounds();
        phi = phi.clamp(min_polar, max_polar).clamp(EPS, PI - EPS);
        radius = (radius * self.scale).clamp(min_distance, max_distance);

        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        let new_position = self.target
            + Vec3::new(
                radius * sin_phi * sin_theta,
                radius * cos_phi,
                radius * sin_phi * cos_theta,
            );

        let moved = new_position.distance_squared(camera.position) > EPS;
        camera.position = new_position;
        camera.look_at(self.target);

        if self.settings.enable_damping {
            self.delta_theta *= 1.0 - self.settings.damping_factor;
            self.delta_phi *= 1.0 - self.settings.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        moved
    }
}
