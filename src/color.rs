use std::fmt;

/// RGB color held in linear working space.
///
/// Values enter and leave as display-referred (sRGB) hex strings, the way
/// colors are authored in the config and edited in the debug panel. Shader
/// uniforms receive the linear components.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have 3 or 6 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color: {0:?}")]
    BadDigit(String),
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn from_srgb_bytes(rgb: [u8; 3]) -> Self {
        Self {
            r: srgb_to_linear(rgb[0] as f32 / 255.0),
            g: srgb_to_linear(rgb[1] as f32 / 255.0),
            b: srgb_to_linear(rgb[2] as f32 / 255.0),
        }
    }

    /// `0xffffe5` style literal, interpreted as sRGB.
    pub fn from_hex(hex: u32) -> Self {
        Self::from_srgb_bytes([
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
        ])
    }

    /// Parses `#rgb` or `#rrggbb`.
    pub fn parse(value: &str) -> Result<Self, ColorParseError> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(value.to_string()))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(value.to_string()));
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ColorParseError::BadLength(value.to_string())),
        };
        let hex = u32::from_str_radix(&expanded, 16)
            .map_err(|_| ColorParseError::BadDigit(value.to_string()))?;
        Ok(Self::from_hex(hex))
    }

    pub fn to_srgb_bytes(self) -> [u8; 3] {
        [
            to_byte(linear_to_srgb(self.r)),
            to_byte(linear_to_srgb(self.g)),
            to_byte(linear_to_srgb(self.b)),
        ]
    }

    pub fn to_hex_string(self) -> String {
        let [r, g, b] = self.to_srgb_bytes();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex_string()
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c < 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(0.41666) - 0.055
    }
}

fn to_byte(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::{Color, ColorParseError};

    #[test]
    fn short_hex_expands() {
        let black = Color::parse("#000").unwrap();
        assert_eq!(black, Color::BLACK);
        let white = Color::parse("#fff").unwrap();
        assert_eq!(white.to_srgb_bytes(), [255, 255, 255]);
    }

    #[test]
    fn hex_string_survives_linear_conversion() {
        for hex in ["#b91cff", "#201919", "#ffffe5"] {
            let color = Color::parse(hex).unwrap();
            assert_eq!(color.to_hex_string(), hex);
        }
    }

    #[test]
    fn uppercase_digits_are_accepted() {
        let color = Color::parse("#B91CFF").unwrap();
        assert_eq!(color.to_srgb_bytes(), [0xb9, 0x1c, 0xff]);
        // linear components are darker than their display values
        assert!(color.r < 0xb9 as f32 / 255.0);
    }

    #[test]
    fn malformed_colors_are_rejected() {
        assert!(matches!(
            Color::parse("b91cff"),
            Err(ColorParseError::MissingHash(_))
        ));
        assert!(matches!(
            Color::parse("#b91c"),
            Err(ColorParseError::BadLength(_))
        ));
        assert!(matches!(
            Color::parse("#zzzzzz"),
            Err(ColorParseError::BadDigit(_))
        ));
        // integer parsing would take a sign
        assert!(matches!(
            Color::parse("#+fffff"),
            Err(ColorParseError::BadDigit(_))
        ));
        assert!(matches!(Color::parse("#+ff"), Err(ColorParseError::BadDigit(_))));
    }

    #[test]
    fn serde_uses_hex_strings() {
        let color = Color::from_hex(0x201919);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#201919\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_hex_string(), "#201919");
    }
}
