use super::{MaterialDescriptor, MaterialError, MaterialFlags, ShaderProgram, Side, UniformValue};
use crate::render::RenderService;
use glam::Vec3;

pub const U_TURBIDITY: &str = "turbidity";
pub const U_RAYLEIGH: &str = "rayleigh";
pub const U_MIE_COEFFICIENT: &str = "mieCoefficient";
pub const U_MIE_DIRECTIONAL_G: &str = "mieDirectionalG";
pub const U_SUN_POSITION: &str = "sunPosition";
pub const U_UP: &str = "up";

/// Scale applied to the sky dome so it encloses the whole scene.
pub const SKY_DOME_SCALE: f32 = 450_000.0;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkyParameters {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Degrees above the horizon.
    pub elevation: f32,
    /// Degrees around the vertical axis.
    pub azimuth: f32,
    pub exposure: f32,
}

impl Default for SkyParameters {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 3.0,
            mie_coefficient: 0.1,
            mie_directional_g: 0.95,
            elevation: -2.15,
            azimuth: -167.2,
            exposure: 0.5,
        }
    }
}

impl SkyParameters {
    /// Unit vector pointing at the sun, from elevation/azimuth in degrees.
    pub fn sun_direction(&self) -> Vec3 {
        let phi = (90.0 - self.elevation).to_radians();
        let theta = self.azimuth.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }
}

pub fn sky_material(params: &SkyParameters) -> MaterialDescriptor {
    MaterialDescriptor {
        program: ShaderProgram::Sky,
        flags: MaterialFlags {
            side: Side::Back,
            depth_write: false,
            ..MaterialFlags::default()
        },
        ..MaterialDescriptor::flat("sky")
    }
    .with_uniform(U_TURBIDITY, UniformValue::Float(params.turbidity))
    .with_uniform(U_RAYLEIGH, UniformValue::Float(params.rayleigh))
    .with_uniform(U_MIE_COEFFICIENT, UniformValue::Float(params.mie_coefficient))
    .with_uniform(U_MIE_DIRECTIONAL_G, UniformValue::Float(params.mie_directional_g))
    .with_uniform(U_SUN_POSITION, UniformValue::Vec3(params.sun_direction()))
    .with_uniform(U_UP, UniformValue::Vec3(Vec3::Y))
}

/// Push every sky parameter into the material and the renderer's exposure.
///
/// Used at startup and after any sky parameter changes, so the sun position
/// can never lag behind elevation/azimuth.
pub fn update_sky<R: RenderService + ?Sized>(
    params: &SkyParameters,
    material: &mut MaterialDescriptor,
    renderer: &mut R,
) -> Result<(), MaterialError> {
    material.set_uniform(U_TURBIDITY, UniformValue::Float(params.turbidity))?;
    material.set_uniform(U_RAYLEIGH, UniformValue::Float(params.rayleigh))?;
    material.set_uniform(U_MIE_COEFFICIENT, UniformValue::Float(params.mie_coefficient))?;
    material.set_uniform(U_MIE_DIRECTIONAL_G, UniformValue::Float(params.mie_directional_g))?;
    material.set_uniform(U_SUN_POSITION, UniformValue::Vec3(params.sun_direction()))?;
    renderer.set_tone_mapping_exposure(params.exposure);
    Ok(())
}
