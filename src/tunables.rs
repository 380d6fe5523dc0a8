//! Live-tunable parameters and their declared ranges.

use crate::color::Color;
use crate::materials::SkyParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunableKey {
    ClearColor,
    PortalColorStart,
    PortalColorEnd,
    FirefliesSize,
    Turbidity,
    Rayleigh,
    MieCoefficient,
    MieDirectionalG,
    Elevation,
    Azimuth,
    Exposure,
}

impl TunableKey {
    pub const ALL: [TunableKey; 11] = [
        TunableKey::ClearColor,
        TunableKey::PortalColorStart,
        TunableKey::PortalColorEnd,
        TunableKey::FirefliesSize,
        TunableKey::Turbidity,
        TunableKey::Rayleigh,
        TunableKey::MieCoefficient,
        TunableKey::MieDirectionalG,
        TunableKey::Elevation,
        TunableKey::Azimuth,
        TunableKey::Exposure,
    ];

    /// Label shown in the debug panel.
    pub fn name(self) -> &'static str {
        match self {
            TunableKey::ClearColor => "clearColor",
            TunableKey::PortalColorStart => "portalColorStart",
            TunableKey::PortalColorEnd => "portalColorEnd",
            TunableKey::FirefliesSize => "firefliesSize",
            TunableKey::Turbidity => "turbidity",
            TunableKey::Rayleigh => "rayleigh",
            TunableKey::MieCoefficient => "mieCoefficient",
            TunableKey::MieDirectionalG => "mieDirectionalG",
            TunableKey::Elevation => "elevation",
            TunableKey::Azimuth => "azimuth",
            TunableKey::Exposure => "exposure",
        }
    }

    pub fn is_sky(self) -> bool {
        matches!(
            self,
            TunableKey::Turbidity
                | TunableKey::Rayleigh
                | TunableKey::MieCoefficient
                | TunableKey::MieDirectionalG
                | TunableKey::Elevation
                | TunableKey::Azimuth
                | TunableKey::Exposure
        )
    }

    pub fn range(self) -> Option<NumericRange> {
        let (min, max, step) = match self {
            TunableKey::ClearColor | TunableKey::PortalColorStart | TunableKey::PortalColorEnd => {
                return None
            }
            TunableKey::FirefliesSize => (0.0, 500.0, 1.0),
            TunableKey::Turbidity => (0.0, 20.0, 0.1),
            TunableKey::Rayleigh => (0.0, 4.0, 0.001),
            TunableKey::MieCoefficient => (0.0, 0.1, 0.001),
            TunableKey::MieDirectionalG => (0.0, 1.0, 0.001),
            TunableKey::Elevation => (-5.0, 90.0, 0.1),
            TunableKey::Azimuth => (-180.0, 180.0, 0.1),
            TunableKey::Exposure => (0.0, 1.0, 0.0001),
        };
        Some(NumericRange { min, max, step })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl NumericRange {
    /// Values outside the range are pulled back to its nearest bound; NaN
    /// maps to `min`.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TunableValue {
    Color(Color),
    Number(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlSpec {
    Color {
        key: TunableKey,
        value: Color,
    },
    Number {
        key: TunableKey,
        value: f32,
        range: NumericRange,
    },
}

impl ControlSpec {
    pub fn key(&self) -> TunableKey {
        match self {
            ControlSpec::Color { key, .. } | ControlSpec::Number { key, .. } => *key,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TunableError {
    #[error("{key} expects a {expected} value")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
}

/// Current values of everything the debug panel can edit.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tunables {
    pub clear_color: Color,
    pub portal_color_start: Color,
    pub portal_color_end: Color,
    pub fireflies_size: f32,
    pub sky: SkyParameters,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            clear_color: Color::from_hex(0x201919),
            portal_color_start: Color::from_hex(0xb91cff),
            portal_color_end: Color::BLACK,
            fireflies_size: 100.0,
            sky: SkyParameters::default(),
        }
    }
}

impl Tunables {
    pub fn get(&self, key: TunableKey) -> TunableValue {
        match key {
            TunableKey::ClearColor => TunableValue::Color(self.clear_color),
            TunableKey::PortalColorStart => TunableValue::Color(self.portal_color_start),
            TunableKey::PortalColorEnd => TunableValue::Color(self.portal_color_end),
            TunableKey::FirefliesSize => TunableValue::Number(self.fireflies_size),
            TunableKey::Turbidity => TunableValue::Number(self.sky.turbidity),
            TunableKey::Rayleigh => TunableValue::Number(self.sky.rayleigh),
            TunableKey::MieCoefficient => TunableValue::Number(self.sky.mie_coefficient),
            TunableKey::MieDirectionalG => TunableValue::Number(self.sky.mie_directional_g),
            TunableKey::Elevation => TunableValue::Number(self.sky.elevation),
            TunableKey::Azimuth => TunableValue::Number(self.sky.azimuth),
            TunableKey::Exposure => TunableValue::Number(self.sky.exposure),
        }
    }

    /// Store a new value, clamping numbers into the key's declared range.
    /// Returns the value actually stored.
    pub fn set(
        &mut self,
        key: TunableKey,
        value: TunableValue,
    ) -> Result<TunableValue, TunableError> {
        match (key.range(), value) {
            (None, TunableValue::Color(color)) => {
                *self.color_mut(key) = color;
                Ok(TunableValue::Color(color))
            }
            (Some(range), TunableValue::Number(number)) => {
                let clamped = range.clamp(number);
                *self.number_mut(key) = clamped;
                Ok(TunableValue::Number(clamped))
            }
            (None, TunableValue::Number(_)) => Err(TunableError::WrongType {
                key: key.name(),
                expected: "color",
            }),
            (Some(_), TunableValue::Color(_)) => Err(TunableError::WrongType {
                key: key.name(),
                expected: "number",
            }),
        }
    }

    /// Copy with every number pulled into its key's declared range.
    pub fn clamped(&self) -> Self {
        let mut clamped = *self;
        for key in TunableKey::ALL {
            if let (Some(range), TunableValue::Number(value)) = (key.range(), self.get(key)) {
                *clamped.number_mut(key) = range.clamp(value);
            }
        }
        clamped
    }

    /// Controls to expose, in panel order.
    pub fn controls(&self, include_sky: bool) -> Vec<ControlSpec> {
        TunableKey::ALL
            .iter()
            .copied()
            .filter(|key| include_sky || !key.is_sky())
            .map(|key| match self.get(key) {
                TunableValue::Color(value) => ControlSpec::Color { key, value },
                TunableValue::Number(value) => ControlSpec::Number {
                    key,
                    value,
                    range: key.range().unwrap_or(NumericRange {
                        min: value,
                        max: value,
                        step: 0.0,
                    }),
                },
            })
            .collect()
    }

    fn color_mut(&mut self, key: TunableKey) -> &mut Color {
        match key {
            TunableKey::PortalColorStart => &mut self.portal_color_start,
            TunableKey::PortalColorEnd => &mut self.portal_color_end,
            _ => &mut self.clear_color,
        }
    }

    fn number_mut(&mut self, key: TunableKey) -> &mut f32 {
        match key {
            TunableKey::Turbidity => &mut self.sky.turbidity,
            TunableKey::Rayleigh => &mut self.sky.rayleigh,
            TunableKey::MieCoefficient => &mut self.sky.mie_coefficient,
            TunableKey::MieDirectionalG => &mut self.sky.mie_directional_g,
            TunableKey::Elevation => &mut self.sky.elevation,
            TunableKey::Azimuth => &mut self.sky.azimuth,
            TunableKey::Exposure => &mut self.sky.exposure,
            _ => &mut self.fireflies_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_clamped_to_their_range() {
        let mut tunables = Tunables::default();
        let stored = tunables
            .set(TunableKey::FirefliesSize, TunableValue::Number(900.0))
            .unwrap();
        assert_eq!(stored, TunableValue::Number(500.0));
        assert_eq!(tunables.fireflies_size, 500.0);

        tunables
            .set(TunableKey::Azimuth, TunableValue::Number(-720.0))
            .unwrap();
        assert_eq!(tunables.sky.azimuth, -180.0);

        tunables
            .set(TunableKey::Exposure, TunableValue::Number(f32::NAN))
            .unwrap();
        assert_eq!(tunables.sky.exposure, 0.0);
    }

    #[test]
    fn wrong_value_type_is_rejected_without_change() {
        let mut tunables = Tunables::default();
        let before = tunables;
        assert!(tunables
            .set(TunableKey::ClearColor, TunableValue::Number(1.0))
            .is_err());
        assert!(tunables
            .set(TunableKey::FirefliesSize, TunableValue::Color(Color::BLACK))
            .is_err());
        assert_eq!(tunables, before);
    }

    #[test]
    fn sky_controls_are_optional() {
        let tunables = Tunables::default();
        let base: Vec<_> = tunables.controls(false).iter().map(|c| c.key()).collect();
        assert_eq!(
            base,
            vec![
                TunableKey::ClearColor,
                TunableKey::PortalColorStart,
                TunableKey::PortalColorEnd,
                TunableKey::FirefliesSize,
            ]
        );
        assert_eq!(tunables.controls(true).len(), TunableKey::ALL.len());
    }

    #[test]
    fn defaults_fit_inside_their_ranges() {
        let tunables = Tunables::default();
        for key in TunableKey::ALL {
            if let (TunableValue::Number(value), Some(range)) = (tunables.get(key), key.range()) {
                assert_eq!(range.clamp(value), value, "{} default out of range", key.name());
            }
        }
    }

    #[test]
    fn defaults_match_the_authored_scene() {
        let tunables = Tunables::default();
        assert_eq!(tunables.clear_color.to_hex_string(), "#201919");
        assert_eq!(tunables.portal_color_start.to_hex_string(), "#b91cff");
        assert_eq!(tunables.portal_color_end.to_hex_string(), "#000000");
        assert_eq!(tunables.fireflies_size, 100.0);
    }

    #[test]
    fn clamped_pulls_authored_values_into_range() {
        let mut tunables = Tunables::default();
        tunables.fireflies_size = 10_000.0;
        tunables.sky.elevation = -40.0;
        tunables.sky.exposure = f32::NAN;
        let clamped = tunables.clamped();
        assert_eq!(clamped.fireflies_size, 500.0);
        assert_eq!(clamped.sky.elevation, -5.0);
        assert_eq!(clamped.sky.exposure, 0.0);
        assert_eq!(clamped.sky.turbidity, tunables.sky.turbidity);
        assert_eq!(clamped.clear_color, tunables.clear_color);
        assert_eq!(Tunables::default().clamped(), Tunables::default());
    }
}
