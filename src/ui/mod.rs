//! Debug panel wiring.
//!
//! The panel itself only reports edits. [`ControlPanelBinder`] maps each edit
//! to its target: a material uniform, the renderer clear color, or a full sky
//! update.

mod egui_panel;

pub use egui_panel::EguiPanel;

use crate::color::Color;
use crate::materials::{
    update_sky, MaterialError, MaterialSet, PortalMaterials, UniformValue, U_COLOR_END,
    U_COLOR_START, U_SIZE,
};
use crate::render::RenderService;
use crate::tunables::{ControlSpec, NumericRange, TunableError, TunableKey, TunableValue, Tunables};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub key: TunableKey,
    pub value: TunableValue,
}

/// Live-editing widget surface.
pub trait ControlPanel {
    fn add_color(&mut self, key: TunableKey, value: Color);
    fn add_number(&mut self, key: TunableKey, value: f32, range: NumericRange);
    /// Edits made since the previous call, oldest first.
    fn take_changes(&mut self) -> Vec<ParameterChange>;
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BindingError {
    #[error(transparent)]
    Tunable(#[from] TunableError),
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error("{0} is not bound to the panel")]
    Unbound(&'static str),
    #[error("{0} needs the sky, which is disabled")]
    SkyDisabled(&'static str),
}

/// Everything a change handler may touch.
pub struct BindingTargets<'a, R: RenderService + ?Sized> {
    pub tunables: &'a mut Tunables,
    pub materials: &'a mut MaterialSet,
    pub ids: &'a PortalMaterials,
    pub renderer: &'a mut R,
}

pub struct ControlPanelBinder<P: ControlPanel> {
    panel: P,
    bound: Vec<TunableKey>,
}

impl<P: ControlPanel> ControlPanelBinder<P> {
    /// Register one control per tunable. Sky controls only when `include_sky`.
    pub fn bind(mut panel: P, tunables: &Tunables, include_sky: bool) -> Self {
        let mut bound = Vec::new();
        for control in tunables.controls(include_sky) {
            match control {
                ControlSpec::Color { key, value } => panel.add_color(key, value),
                ControlSpec::Number { key, value, range } => panel.add_number(key, value, range),
            }
            bound.push(control.key());
        }
        log::info!("Debug panel bound {} controls", bound.len());
        Self { panel, bound }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    pub fn bound_keys(&self) -> &[TunableKey] {
        &self.bound
    }

    /// Apply every pending edit. A failing edit is logged and skipped; the
    /// rest still apply. Returns how many edits were applied.
    pub fn apply_pending<R: RenderService + ?Sized>(
        &mut self,
        targets: BindingTargets<'_, R>,
    ) -> usize {
        let BindingTargets {
            tunables,
            materials,
            ids,
            renderer,
        } = targets;
        let mut applied = 0;
        for change in self.panel.take_changes() {
            if !self.bound.contains(&change.key) {
                log::warn!("{}", BindingError::Unbound(change.key.name()));
                continue;
            }
            let result = apply_change(
                change,
                BindingTargets {
                    tunables: &mut *tunables,
                    materials: &mut *materials,
                    ids,
                    renderer: &mut *renderer,
                },
            );
            match result {
                Ok(()) => applied += 1,
                Err(err) => log::warn!("Ignoring {} change: {}", change.key.name(), err),
            }
        }
        applied
    }
}

/// Push `change` to its target, then store it.
pub fn apply_change<R: RenderService + ?Sized>(
    change: ParameterChange,
    targets: BindingTargets<'_, R>,
) -> Result<(), BindingError> {
    let BindingTargets {
        tunables,
        materials,
        ids,
        renderer,
    } = targets;
    let sky = match (change.key.is_sky(), ids.sky) {
        (true, None) => return Err(BindingError::SkyDisabled(change.key.name())),
        (_, sky) => sky,
    };

    // commit only once the target accepted the value
    let mut staged = *tunables;
    let stored = staged.set(change.key, change.value)?;
    log::debug!("{} -> {:?}", change.key.name(), stored);

    match (change.key, stored) {
        (TunableKey::ClearColor, TunableValue::Color(color)) => renderer.set_clear_color(color),
        (TunableKey::PortalColorStart, TunableValue::Color(color)) => materials
            .get_mut(ids.portal)
            .set_uniform(U_COLOR_START, UniformValue::Color(color))?,
        (TunableKey::PortalColorEnd, TunableValue::Color(color)) => materials
            .get_mut(ids.portal)
            .set_uniform(U_COLOR_END, UniformValue::Color(color))?,
        (TunableKey::FirefliesSize, TunableValue::Number(size)) => materials
            .get_mut(ids.fireflies)
            .set_uniform(U_SIZE, UniformValue::Float(size))?,
        (key, _) => {
            if let Some(sky) = sky.filter(|_| key.is_sky()) {
                update_sky(&staged.sky, materials.get_mut(sky), renderer)?;
            }
        }
    }
    *tunables = staged;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::sky::U_SUN_POSITION;
    use crate::materials::{build_materials, MaterialDescriptor, MaterialInputs, SkyParameters};
    use crate::render::HeadlessRenderer;
    use std::path::PathBuf;

    /// Panel double that records registrations and replays scripted edits.
    #[derive(Default)]
    struct ScriptedPanel {
        registered: Vec<TunableKey>,
        queued: Vec<ParameterChange>,
    }

    impl ControlPanel for ScriptedPanel {
        fn add_color(&mut self, key: TunableKey, _value: Color) {
            self.registered.push(key);
        }

        fn add_number(&mut self, key: TunableKey, _value: f32, _range: NumericRange) {
            self.registered.push(key);
        }

        fn take_changes(&mut self) -> Vec<ParameterChange> {
            std::mem::take(&mut self.queued)
        }
    }

    struct Fixture {
        tunables: Tunables,
        materials: MaterialSet,
        ids: PortalMaterials,
        renderer: HeadlessRenderer,
    }

    fn fixture(with_sky: bool) -> Fixture {
        let tunables = Tunables::default();
        let mut materials = MaterialSet::new();
        let ids = build_materials(
            &mut materials,
            &MaterialInputs {
                pole_light_color: Color::from_hex(0xffffe5),
                portal_color_start: tunables.portal_color_start,
                portal_color_end: tunables.portal_color_end,
                baked_texture: PathBuf::from("baked.jpg"),
                fireflies_size: tunables.fireflies_size,
                device_pixel_ratio: 1.0,
                sky: with_sky.then(SkyParameters::default),
            },
        );
        Fixture {
            tunables,
            materials,
            ids,
            renderer: HeadlessRenderer::new(),
        }
    }

    impl Fixture {
        fn targets(&mut self) -> BindingTargets<'_, HeadlessRenderer> {
            BindingTargets {
                tunables: &mut self.tunables,
                materials: &mut self.materials,
                ids: &self.ids,
                renderer: &mut self.renderer,
            }
        }
    }

    fn number(key: TunableKey, value: f32) -> ParameterChange {
        ParameterChange {
            key,
            value: TunableValue::Number(value),
        }
    }

    #[test]
    fn binder_registers_base_controls_without_sky() {
        let f = fixture(false);
        let binder = ControlPanelBinder::bind(ScriptedPanel::default(), &f.tunables, false);
        assert_eq!(binder.panel().registered.len(), 4);
        assert_eq!(binder.bound_keys(), binder.panel().registered.as_slice());
    }

    #[test]
    fn clear_color_goes_to_the_renderer() {
        let mut f = fixture(false);
        let red = Color::from_hex(0xff0000);
        apply_change(
            ParameterChange {
                key: TunableKey::ClearColor,
                value: TunableValue::Color(red),
            },
            f.targets(),
        )
        .unwrap();
        assert_eq!(f.renderer.clear_color(), red);
        assert_eq!(f.tunables.clear_color, red);
    }

    #[test]
    fn portal_colors_update_uniforms() {
        let mut f = fixture(false);
        let white = Color::from_hex(0xffffff);
        apply_change(
            ParameterChange {
                key: TunableKey::PortalColorEnd,
                value: TunableValue::Color(white),
            },
            f.targets(),
        )
        .unwrap();
        assert_eq!(
            f.materials.get(f.ids.portal).uniform(U_COLOR_END),
            Some(&UniformValue::Color(white))
        );
    }

    #[test]
    fn out_of_range_size_is_clamped_before_it_reaches_the_shader() {
        let mut f = fixture(false);
        apply_change(number(TunableKey::FirefliesSize, 10_000.0), f.targets()).unwrap();
        assert_eq!(f.materials.get(f.ids.fireflies).uniform_f32(U_SIZE), Some(500.0));
    }

    #[test]
    fn sky_edits_recompute_the_sun() {
        let mut f = fixture(true);
        apply_change(number(TunableKey::Elevation, 45.0), f.targets()).unwrap();
        let expected = SkyParameters {
            elevation: 45.0,
            ..SkyParameters::default()
        }
        .sun_direction();
        let sky = f.ids.sky.unwrap();
        assert_eq!(
            f.materials.get(sky).uniform(U_SUN_POSITION),
            Some(&UniformValue::Vec3(expected))
        );

        apply_change(number(TunableKey::Exposure, 0.2), f.targets()).unwrap();
        assert_eq!(f.renderer.tone_mapping_exposure(), 0.2);
    }

    #[test]
    fn sky_edits_without_a_sky_are_rejected_untouched() {
        let mut f = fixture(false);
        let before = f.tunables;
        let err = apply_change(number(TunableKey::Turbidity, 2.0), f.targets()).unwrap_err();
        assert_eq!(err, BindingError::SkyDisabled("turbidity"));
        assert_eq!(f.tunables, before);
    }

    #[test]
    fn a_failing_edit_does_not_block_the_others() {
        let mut f = fixture(false);
        let mut binder = ControlPanelBinder::bind(ScriptedPanel::default(), &f.tunables, false);
        binder.panel_mut().queued = vec![
            // wrong value type
            number(TunableKey::ClearColor, 1.0),
            // not bound without sky
            number(TunableKey::Azimuth, 10.0),
            number(TunableKey::FirefliesSize, 42.0),
        ];
        let applied = binder.apply_pending(f.targets());
        assert_eq!(applied, 1);
        assert_eq!(f.materials.get(f.ids.fireflies).uniform_f32(U_SIZE), Some(42.0));
    }

    #[test]
    fn rejected_push_leaves_the_stored_value_alone() {
        let mut f = fixture(false);
        // point fireflies at a material with no uSize uniform
        f.ids.fireflies = f.materials.add(MaterialDescriptor::flat("plain"));
        let before = f.tunables;
        let err = apply_change(number(TunableKey::FirefliesSize, 250.0), f.targets()).unwrap_err();
        assert!(matches!(
            err,
            BindingError::Material(MaterialError::UnknownUniform { .. })
        ));
        assert_eq!(f.tunables, before);
    }
}
