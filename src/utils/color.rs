use crate::error::ColorError;
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Straight-alpha 8-bit RGBA color, serialized as a `#rrggbb` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Hue, saturation and value, all in 0..1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

/// Hue, saturation and lightness, all in 0..1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Palette layouts derived from a base color by rotating its hue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Harmony {
    Complementary,
    Analogous,
    #[default]
    Triadic,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb`, `rrggbb` or the `#rgb` shorthand. The result is opaque.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidHex(hex.to_string());
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).map_err(|_| invalid());
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        match digits.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            3 => Ok(Self::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
            _ => Err(invalid()),
        }
    }

    /// Lowercase `#rrggbb`; alpha is dropped.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn to_hsv(&self) -> Hsv {
        let (r, g, b) = self.unit_rgb();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let h = hue_of(r, g, b, max, delta);
        let s = if max == 0.0 { 0.0 } else { delta / max };
        Hsv { h, s, v: max }
    }

    /// Opaque color from HSV. The hue wraps so callers can pass any float.
    pub fn from_hsv(hsv: Hsv) -> Self {
        let h = wrap_unit(hsv.h);
        let s = hsv.s.clamp(0.0, 1.0);
        let v = hsv.v.clamp(0.0, 1.0);

        let sector = (h * 6.0).floor();
        let f = h * 6.0 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - f * s);
        let t = v * (1.0 - (1.0 - f) * s);

        let (r, g, b) = match sector as i32 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::rgb(channel(r), channel(g), channel(b))
    }

    pub fn to_hsl(&self) -> Hsl {
        let (r, g, b) = self.unit_rgb();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let l = (max + min) / 2.0;
        if delta == 0.0 {
            return Hsl { h: 0.0, s: 0.0, l };
        }
        let s = if l > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };
        Hsl {
            h: hue_of(r, g, b, max, delta),
            s,
            l,
        }
    }

    pub fn from_hsl(hsl: Hsl) -> Self {
        let Hsl { h, s, l } = hsl;
        let (s, l) = (s.clamp(0.0, 1.0), l.clamp(0.0, 1.0));
        if s == 0.0 {
            let grey = channel(l);
            return Self::rgb(grey, grey, grey);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::rgb(
            channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            channel(hue_to_rgb(p, q, h)),
            channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        )
    }

    /// Base color plus its harmony companions, in display order.
    pub fn harmony(&self, harmony: Harmony) -> Vec<Color> {
        let hsl = self.to_hsl();
        let rotated = |deg: f32| {
            Color::from_hsl(Hsl {
                h: rotate_hue(hsl.h, deg),
                ..hsl
            })
        };
        let base = self.with_alpha(255);
        match harmony {
            Harmony::Complementary => vec![base, rotated(180.0)],
            Harmony::Analogous => vec![rotated(-30.0), base, rotated(30.0)],
            Harmony::Triadic => vec![base, rotated(120.0), rotated(-120.0)],
        }
    }

    /// Color for tiny-skia paints, with alpha scaled by `opacity`.
    pub fn to_skia(&self, opacity: f32) -> tiny_skia::Color {
        let alpha = (self.a as f32 / 255.0) * opacity.clamp(0.0, 1.0);
        tiny_skia::Color::from_rgba(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha,
        )
        .unwrap_or(tiny_skia::Color::TRANSPARENT)
    }

    /// Convert to egui's 8-bit color format.
    pub fn to_color32(&self) -> Color32 {
        Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }

    fn unit_rgb(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl Harmony {
    pub const ALL: [Harmony; 3] = [Harmony::Complementary, Harmony::Analogous, Harmony::Triadic];

    pub fn label(&self) -> &'static str {
        match self {
            Harmony::Complementary => "Complementary",
            Harmony::Analogous => "Analogous",
            Harmony::Triadic => "Triadic",
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0xff, 0x95, 0x00)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

pub fn hex_to_hsv(hex: &str) -> Result<Hsv, ColorError> {
    Ok(Color::from_hex(hex)?.to_hsv())
}

pub fn hsv_to_hex(h: f32, s: f32, v: f32) -> String {
    Color::from_hsv(Hsv { h, s, v }).to_hex()
}

pub fn hex_to_hsl(hex: &str) -> Result<Hsl, ColorError> {
    Ok(Color::from_hex(hex)?.to_hsl())
}

pub fn hsl_to_hex(h: f32, s: f32, l: f32) -> String {
    Color::from_hsl(Hsl { h, s, l }).to_hex()
}

/// Rotate a 0..1 hue by `deg` degrees, wrapping into 0..1.
pub fn rotate_hue(h: f32, deg: f32) -> f32 {
    wrap_unit(h + deg / 360.0)
}

fn wrap_unit(x: f32) -> f32 {
    let wrapped = x.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negatives
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

fn hue_of(r: f32, g: f32, b: f32, max: f32, delta: f32) -> f32 {
    if delta == 0.0 {
        return 0.0;
    }
    let sextant = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    sextant / 6.0
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn channel(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}
