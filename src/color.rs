use std::fmt;
use std::str::FromStr;

use eframe::egui::Color32;

use crate::error::EditorError;

/// 8-bit RGBA cell color, stored unpremultiplied.
///
/// Text form is `#rrggbb` when opaque and `#rrggbbaa` otherwise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same RGB with alpha taken from an opacity in `0.0..=1.0`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self { a: opacity_to_alpha(opacity), ..self }
    }

    pub fn opacity(self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn rgb_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_color32(self) -> Color32 {
        Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa`; the leading `#` is optional.
    pub fn from_hex(s: &str) -> Result<Self, EditorError> {
        let bad = || EditorError::InvalidColor(s.to_owned());
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        match hex.len() {
            3 => {
                let nib = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17).map_err(|_| bad());
                Ok(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(bad()),
        }
    }

    /// Source-over composite of `self` onto `dst`, with the source alpha scaled by `opacity`.
    pub fn over(self, dst: Color, opacity: f32) -> Color {
        let sa = self.a as f32 / 255.0 * opacity.clamp(0.0, 1.0);
        let da = dst.a as f32 / 255.0;
        let oa = sa + da * (1.0 - sa);
        if oa <= 0.0 {
            return Color::rgba(0, 0, 0, 0);
        }
        let ch = |s: u8, d: u8| {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / oa;
            v.round().clamp(0.0, 255.0) as u8
        };
        Color::rgba(ch(self.r, dst.r), ch(self.g, dst.g), ch(self.b, dst.b), (oa * 255.0).round() as u8)
    }
}

pub fn opacity_to_alpha(opacity: f32) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Squared RGB distance; alpha is ignored
#[inline]
fn dist_rgb2(a: Color, b: Color) -> u32 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Index of the palette entry closest to `color`, or `None` for an empty palette.
pub fn nearest_index(color: Color, palette: &[Color]) -> Option<usize> {
    let mut best = None;
    let mut best_d = u32::MAX;
    for (i, &c) in palette.iter().enumerate() {
        let d = dist_rgb2(color, c);
        if d < best_d {
            best_d = d;
            best = Some(i);
            if d == 0 {
                break;
            }
        }
    }
    best
}
