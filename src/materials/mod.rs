//! Material descriptors and the fixed set of materials the portal scene uses.
//!
//! A descriptor is built once. After construction only its uniform values
//! change; flags, shader sources and the texture slot stay fixed, except that
//! the texture slot receives its pixels when the async load resolves.

pub mod sky;

use crate::assets::{TextureImage, TextureOptions};
use crate::color::Color;
use glam::Vec3;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use sky::{update_sky, SkyParameters};

pub const U_TIME: &str = "uTime";
pub const U_COLOR_START: &str = "uColorStart";
pub const U_COLOR_END: &str = "uColorEnd";
pub const U_SIZE: &str = "uSize";
pub const U_PIXEL_RATIO: &str = "uPixelRatio";

pub const PORTAL_VERTEX_SHADER: &str = include_str!("../shaders/portal/vertex.glsl");
pub const PORTAL_FRAGMENT_SHADER: &str = include_str!("../shaders/portal/fragment.glsl");
pub const FIREFLIES_VERTEX_SHADER: &str = include_str!("../shaders/fireflies/vertex.glsl");
pub const FIREFLIES_FRAGMENT_SHADER: &str = include_str!("../shaders/fireflies/fragment.glsl");

/// Upper bound for the device pixel ratio fed to the renderer and shaders.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

pub fn clamp_pixel_ratio(device_ratio: f64) -> f32 {
    if !device_ratio.is_finite() || device_ratio <= 0.0 {
        return 1.0;
    }
    (device_ratio as f32).min(MAX_PIXEL_RATIO)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(usize);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderProgram {
    /// Unlit: base color and/or texture map, no lighting.
    Flat,
    Custom {
        vertex: &'static str,
        fragment: &'static str,
    },
    /// Physically modelled atmosphere, implemented by the rendering backend.
    Sky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blending {
    Normal,
    Additive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialFlags {
    pub transparent: bool,
    pub blending: Blending,
    pub side: Side,
    pub depth_write: bool,
}

impl Default for MaterialFlags {
    fn default() -> Self {
        Self {
            transparent: false,
            blending: Blending::Normal,
            side: Side::Front,
            depth_write: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Color(Color),
    Vec3(Vec3),
}

impl UniformValue {
    fn kind(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Color(_) => "color",
            UniformValue::Vec3(_) => "vec3",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MaterialError {
    #[error("material {material} has no uniform {uniform}")]
    UnknownUniform { material: String, uniform: String },
    #[error("uniform {uniform} of {material} is a {expected}, got a {actual}")]
    UniformType {
        material: String,
        uniform: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Texture reference of a flat material. Pixels arrive asynchronously.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    pub path: PathBuf,
    pub options: TextureOptions,
    pub image: Option<TextureImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescriptor {
    pub name: String,
    pub program: ShaderProgram,
    pub flags: MaterialFlags,
    pub color: Option<Color>,
    pub map: Option<TextureSlot>,
    uniforms: BTreeMap<String, UniformValue>,
}

impl MaterialDescriptor {
    pub fn flat(name: &str) -> Self {
        Self {
            name: name.to_string(),
            program: ShaderProgram::Flat,
            flags: MaterialFlags::default(),
            color: None,
            map: None,
            uniforms: BTreeMap::new(),
        }
    }

    pub fn shader(name: &str, vertex: &'static str, fragment: &'static str) -> Self {
        Self {
            program: ShaderProgram::Custom { vertex, fragment },
            ..Self::flat(name)
        }
    }

    pub fn with_uniform(mut self, name: &str, value: UniformValue) -> Self {
        self.uniforms.insert(name.to_string(), value);
        self
    }

    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    pub fn uniform_f32(&self, name: &str) -> Option<f32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.uniforms.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    /// Replace the value of a declared uniform. The type must not change.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), MaterialError> {
        let slot = self
            .uniforms
            .get_mut(name)
            .ok_or_else(|| MaterialError::UnknownUniform {
                material: self.name.clone(),
                uniform: name.to_string(),
            })?;
        if std::mem::discriminant(slot) != std::mem::discriminant(&value) {
            return Err(MaterialError::UniformType {
                material: self.name.clone(),
                uniform: name.to_string(),
                expected: slot.kind(),
                actual: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }
}

/// Owns every material of the session. Ids stay valid for its lifetime.
#[derive(Debug, Default)]
pub struct MaterialSet {
    materials: Vec<MaterialDescriptor>,
}

impl MaterialSet {
    pub fn new() -> Self {
        Self {
            materials: Vec::new(),
        }
    }

    pub fn add(&mut self, material: MaterialDescriptor) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn get(&self, id: MaterialId) -> &MaterialDescriptor {
        &self.materials[id.0]
    }

    pub fn get_mut(&mut self, id: MaterialId) -> &mut MaterialDescriptor {
        &mut self.materials[id.0]
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &MaterialDescriptor)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(index, material)| (MaterialId(index), material))
    }
}

/// Values the factory needs to build the scene's materials.
#[derive(Debug, Clone)]
pub struct MaterialInputs {
    pub pole_light_color: Color,
    pub portal_color_start: Color,
    pub portal_color_end: Color,
    pub baked_texture: PathBuf,
    pub fireflies_size: f32,
    pub device_pixel_ratio: f64,
    pub sky: Option<SkyParameters>,
}

/// Ids of the materials created by [`build_materials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalMaterials {
    pub pole_light: MaterialId,
    pub portal: MaterialId,
    pub baked: MaterialId,
    pub fireflies: MaterialId,
    pub sky: Option<MaterialId>,
}

impl PortalMaterials {
    /// Materials carrying a `uTime` uniform.
    pub fn time_driven(&self) -> [MaterialId; 2] {
        [self.portal, self.fireflies]
    }
}

pub fn pole_light_material(color: Color) -> MaterialDescriptor {
    MaterialDescriptor {
        color: Some(color),
        ..MaterialDescriptor::flat("poleLight")
    }
}

pub fn portal_material(start: Color, end: Color) -> MaterialDescriptor {
    MaterialDescriptor::shader("portalLight", PORTAL_VERTEX_SHADER, PORTAL_FRAGMENT_SHADER)
        .with_flags(MaterialFlags {
            transparent: true,
            side: Side::Double,
            ..MaterialFlags::default()
        })
        .with_uniform(U_TIME, UniformValue::Float(0.0))
        .with_uniform(U_COLOR_START, UniformValue::Color(start))
        .with_uniform(U_COLOR_END, UniformValue::Color(end))
}

pub fn baked_material(texture: PathBuf) -> MaterialDescriptor {
    MaterialDescriptor {
        map: Some(TextureSlot {
            path: texture,
            options: TextureOptions::baked(),
            image: None,
        }),
        ..MaterialDescriptor::flat("baked")
    }
}

pub fn fireflies_material(size: f32, device_pixel_ratio: f64) -> MaterialDescriptor {
    MaterialDescriptor::shader("fireflies", FIREFLIES_VERTEX_SHADER, FIREFLIES_FRAGMENT_SHADER)
        .with_flags(MaterialFlags {
            transparent: true,
            blending: Blending::Additive,
            depth_write: false,
            ..MaterialFlags::default()
        })
        .with_uniform(U_PIXEL_RATIO, UniformValue::Float(clamp_pixel_ratio(device_pixel_ratio)))
        .with_uniform(U_SIZE, UniformValue::Float(size))
        .with_uniform(U_TIME, UniformValue::Float(0.0))
}

pub fn build_materials(set: &mut MaterialSet, inputs: &MaterialInputs) -> PortalMaterials {
    let pole_light = set.add(pole_light_material(inputs.pole_light_color));
    let portal = set.add(portal_material(
        inputs.portal_color_start,
        inputs.portal_color_end,
    ));
    let baked = set.add(baked_material(inputs.baked_texture.clone()));
    let fireflies = set.add(fireflies_material(
        inputs.fireflies_size,
        inputs.device_pixel_ratio,
    ));
    let sky = inputs
        .sky
        .as_ref()
        .map(|params| set.add(sky::sky_material(params)));

    log::debug!("Built {} materials", set.len());
    PortalMaterials {
        pole_light,
        portal,
        baked,
        fireflies,
        sky,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(device_pixel_ratio: f64) -> MaterialInputs {
        MaterialInputs {
            pole_light_color: Color::from_hex(0xffffe5),
            portal_color_start: Color::from_hex(0xb91cff),
            portal_color_end: Color::BLACK,
            baked_texture: PathBuf::from("baked-black.jpg"),
            fireflies_size: 100.0,
            device_pixel_ratio,
            sky: None,
        }
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let mut set = MaterialSet::new();
        let ids = build_materials(&mut set, &inputs(3.0));
        assert_eq!(set.get(ids.fireflies).uniform_f32(U_PIXEL_RATIO), Some(2.0));

        let mut set = MaterialSet::new();
        let ids = build_materials(&mut set, &inputs(1.5));
        assert_eq!(set.get(ids.fireflies).uniform_f32(U_PIXEL_RATIO), Some(1.5));
    }

    #[test]
    fn degenerate_pixel_ratio_falls_back_to_one() {
        assert_eq!(clamp_pixel_ratio(0.0), 1.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN), 1.0);
    }

    #[test]
    fn fireflies_blend_additively_without_depth_write() {
        let material = fireflies_material(100.0, 1.0);
        assert!(material.flags.transparent);
        assert_eq!(material.flags.blending, Blending::Additive);
        assert!(!material.flags.depth_write);
        assert_eq!(material.uniform_f32(U_SIZE), Some(100.0));
        assert_eq!(material.uniform_f32(U_TIME), Some(0.0));
    }

    #[test]
    fn portal_is_double_sided_and_transparent() {
        let material = portal_material(Color::from_hex(0xb91cff), Color::BLACK);
        assert!(material.flags.transparent);
        assert_eq!(material.flags.side, Side::Double);
        assert!(matches!(material.program, ShaderProgram::Custom { .. }));
        assert_eq!(
            material.uniform(U_COLOR_END),
            Some(&UniformValue::Color(Color::BLACK))
        );
    }

    #[test]
    fn baked_material_samples_an_unflipped_srgb_texture() {
        let material = baked_material(PathBuf::from("baked.jpg"));
        let map = material.map.as_ref().unwrap();
        assert!(!map.options.flip_y);
        assert_eq!(map.options, TextureOptions::baked());
        assert!(map.image.is_none());
        assert!(!material.flags.transparent);
        assert_eq!(material.uniforms().count(), 0);
    }

    #[test]
    fn set_uniform_rejects_unknown_names_and_type_changes() {
        let mut material = portal_material(Color::BLACK, Color::BLACK);
        assert!(matches!(
            material.set_uniform("uNope", UniformValue::Float(1.0)),
            Err(MaterialError::UnknownUniform { .. })
        ));
        assert!(matches!(
            material.set_uniform(U_TIME, UniformValue::Color(Color::BLACK)),
            Err(MaterialError::UniformType { .. })
        ));
        material.set_uniform(U_TIME, UniformValue::Float(2.5)).unwrap();
        assert_eq!(material.uniform_f32(U_TIME), Some(2.5));
    }

    #[test]
    fn pole_lights_share_one_material() {
        let mut set = MaterialSet::new();
        let ids = build_materials(&mut set, &inputs(1.0));
        assert_eq!(set.len(), 4);
        assert!(ids.sky.is_none());
        assert_eq!(set.get(ids.pole_light).color, Some(Color::from_hex(0xffffe5)));
        assert_eq!(ids.time_driven(), [ids.portal, ids.fireflies]);
    }
}
