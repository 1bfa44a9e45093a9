use palette::{LinSrgb, Mix, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGB color, written as `"#RRGGBB"` in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const MAGENTA: Self = Self::new(255, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse from hex string like "#FF0000" or "FF0000"
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Blend toward `other` in linear light; `t` is clamped to [0, 1].
    pub fn mix(self, other: Self, t: f32) -> Self {
        let a: LinSrgb = Srgb::new(self.r, self.g, self.b).into_format::<f32>().into_linear();
        let b: LinSrgb = Srgb::new(other.r, other.g, other.b).into_format::<f32>().into_linear();
        let mixed: Srgb<f32> = Srgb::from_linear(a.mix(b, t.clamp(0.0, 1.0)));
        let out: Srgb<u8> = mixed.into_format();
        Self::new(out.red, out.green, out.blue)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for RgbColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| format!("Invalid color '{}': expected #RRGGBB", s))
    }
}

impl Serialize for RgbColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RgbColor::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Solid or two-stop gradient fill across the bar row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarPalette {
    pub color: RgbColor,
    pub color2: RgbColor,
    pub use_gradient: bool,
}

impl BarPalette {
    /// Color at `position` in [0, 1] along the bars.
    pub fn at(&self, position: f32) -> RgbColor {
        if self.use_gradient {
            self.color.mix(self.color2, position)
        } else {
            self.color
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(RgbColor::from_hex("#FF8000"), Some(RgbColor::new(255, 128, 0)));
        assert_eq!(RgbColor::from_hex("00ff7f"), Some(RgbColor::new(0, 255, 127)));
        assert_eq!(RgbColor::from_hex("#FFF"), None);
        assert_eq!(RgbColor::from_hex("#GG0000"), None);
        assert_eq!(RgbColor::new(1, 2, 171).to_string(), "#0102AB");
    }

    #[test]
    fn test_mix_endpoints() {
        let a = RgbColor::new(255, 0, 0);
        let b = RgbColor::new(0, 0, 255);
        assert_eq!(a.mix(b, 0.0), a);
        assert_eq!(a.mix(b, 1.0), b);
        assert_eq!(a.mix(b, 5.0), b);

        let mid = a.mix(b, 0.5);
        assert!(mid.r > 128 && mid.b > 128 && mid.g == 0);
    }

    #[test]
    fn test_palette_solid_ignores_position() {
        let palette = BarPalette {
            color: RgbColor::WHITE,
            color2: RgbColor::MAGENTA,
            use_gradient: false,
        };
        assert_eq!(palette.at(0.9), RgbColor::WHITE);

        let gradient = BarPalette {
            use_gradient: true,
            ..palette
        };
        assert_eq!(gradient.at(1.0), RgbColor::MAGENTA);
    }
}
