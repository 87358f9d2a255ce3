use crate::error::{MapError, Result};
use ratatui::style::Color;
use std::str::FromStr;

/// An sRGB colour with straight alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

/// Fill and outline of features added without an explicit style
pub const DEFAULT_FILL: Rgba = Rgba::rgb(0x3D, 0xAE, 0x2B);
/// Outline used when a feature carries its own `color` property
pub const EXPLICIT_OUTLINE: Rgba = Rgba::rgb(0xBA, 0xBA, 0xBA);
/// Fill of the selected feature
pub const HIGHLIGHT_FILL: Rgba = Rgba::rgb(0x00, 0x00, 0xFF);
/// Colour of the bare click-point marker
pub const CLICK_POINT: Rgba = Rgba::rgb(255, 219, 162);
pub const CLICK_POINT_RADIUS: u16 = 10;

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)` or a
    /// basic CSS colour name.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim().to_ascii_lowercase();
        let invalid = || MapError::InvalidColor(input.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        if let Some(args) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() != 3 && parts.len() != 4 {
                return Err(invalid());
            }
            let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
            let a = match parts.get(3) {
                Some(p) => p.parse::<f32>().map_err(|_| invalid())?.clamp(0.0, 1.0),
                None => 1.0,
            };
            return Ok(Self {
                r: channel(parts[0])?,
                g: channel(parts[1])?,
                b: channel(parts[2])?,
                a,
            });
        }

        named(&s).ok_or_else(invalid)
    }

    pub fn to_color(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}

impl FromStr for Rgba {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let nibble = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => {
            let r = nibble(bytes[0])?;
            let g = nibble(bytes[1])?;
            let b = nibble(bytes[2])?;
            Some(Rgba::rgb(r * 17, g * 17, b * 17))
        }
        6 => {
            let byte = |i: usize| Some(nibble(bytes[i])? << 4 | nibble(bytes[i + 1])?);
            Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?))
        }
        _ => None,
    }
}

fn named(name: &str) -> Option<Rgba> {
    let rgb = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "blue" => (0, 0, 255),
        "navy" => (0, 0, 128),
        "yellow" => (255, 255, 0),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "silver" => (192, 192, 192),
        "gray" | "grey" => (128, 128, 128),
        _ => return None,
    };
    Some(Rgba::rgb(rgb.0, rgb.1, rgb.2))
}

/// Style of a vector path (polygon, line or circle marker).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStyle {
    pub fill_color: Rgba,
    pub color: Rgba,
    pub weight: f32,
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            fill_color: DEFAULT_FILL,
            color: DEFAULT_FILL,
            weight: 1.0,
            opacity: 1.0,
            fill_opacity: 0.5,
        }
    }
}

impl PathStyle {
    pub fn click_point() -> Self {
        Self {
            fill_color: CLICK_POINT,
            color: CLICK_POINT,
            weight: 1.0,
            opacity: 1.0,
            fill_opacity: 1.0,
        }
    }
}

/// Image marker configuration. The terminal draws a glyph chosen from the
/// icon's file name instead of the image itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Icon {
    pub url: String,
    pub size: [u16; 2],
    pub anchor: [i16; 2],
}

impl Default for Icon {
    fn default() -> Self {
        Self {
            url: "/images/flag.svg".to_string(),
            size: [20, 21],
            anchor: [5, 21],
        }
    }
}

impl Icon {
    pub fn glyph(&self) -> char {
        let stem = self
            .url
            .rsplit('/')
            .next()
            .and_then(|file| file.split('.').next())
            .unwrap_or_default();
        match stem {
            "flag" => '⚑',
            "star" => '★',
            "pin" | "marker" => '●',
            "square" => '■',
            _ => '◆',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgba::parse("#3DAE2B").unwrap(), DEFAULT_FILL);
        assert_eq!(Rgba::parse("#00f").unwrap(), HIGHLIGHT_FILL);
        assert!(Rgba::parse("#12345").is_err());
        assert!(Rgba::parse("#zzzzzz").is_err());
    }

    #[test]
    fn parses_functional_forms() {
        let c = Rgba::parse("rgba(255, 219, 162, 1)").unwrap();
        assert_eq!(c, CLICK_POINT);
        let half = Rgba::parse("rgba(10,20,30,0.5)").unwrap();
        assert_eq!(half.a, 0.5);
        assert_eq!(Rgba::parse("rgb(1, 2, 3)").unwrap(), Rgba::rgb(1, 2, 3));
        assert!(Rgba::parse("rgb(1, 2)").is_err());
        assert!(Rgba::parse("rgb(300, 2, 3)").is_err());
    }

    #[test]
    fn parses_named_colours() {
        assert_eq!("Blue".parse::<Rgba>().unwrap(), HIGHLIGHT_FILL);
        assert!(Rgba::parse("blurple").is_err());
    }

    #[test]
    fn icon_glyph_from_file_name() {
        assert_eq!(Icon::default().glyph(), '⚑');
        let icon = Icon {
            url: "/img/star.png".to_string(),
            ..Icon::default()
        };
        assert_eq!(icon.glyph(), '★');
    }
}
