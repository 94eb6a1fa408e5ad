//! Hex RGB colours and HSL conversion.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Hue, saturation and lightness, each in [0, 1]. Hue is in turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_hsl(self) -> Hsl {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let chroma = max - min;

        if chroma == 0.0 {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let s = if l <= 0.5 {
            chroma / (max + min)
        } else {
            chroma / (2.0 - max - min)
        };
        let h = if max == r {
            ((g - b) / chroma).rem_euclid(6.0)
        } else if max == g {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };

        Hsl { h: h / 6.0, s, l }
    }
}

impl Hsl {
    pub fn to_rgb(self) -> Rgb {
        if self.s == 0.0 {
            let v = channel(self.l);
            return Rgb::new(v, v, v);
        }
        let q = if self.l <= 0.5 {
            self.l * (1.0 + self.s)
        } else {
            self.l + self.s - self.l * self.s
        };
        let p = 2.0 * self.l - q;
        Rgb::new(
            channel(hue_to_rgb(p, q, self.h + 1.0 / 3.0)),
            channel(hue_to_rgb(p, q, self.h)),
            channel(hue_to_rgb(p, q, self.h - 1.0 / 3.0)),
        )
    }
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
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

fn channel(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `#rrggbb`, with or without the leading `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("'{}' is not a #rrggbb colour", s));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("'{}' is not a #rrggbb colour", s))
        };
        Ok(Rgb::new(byte(0)?, byte(2)?, byte(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!("#1a237e".parse::<Rgb>().unwrap(), Rgb::new(0x1a, 0x23, 0x7e));
        assert_eq!("FFEB3B".parse::<Rgb>().unwrap(), Rgb::new(0xff, 0xeb, 0x3b));
        assert!("#fff".parse::<Rgb>().is_err());
        assert!("red".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_hsl_roundtrip_is_exact() {
        for hex in ["#1a472a", "#15803d", "#ffffff", "#000000", "#333333", "#ff5722", "#1a237e"] {
            let rgb: Rgb = hex.parse().unwrap();
            assert_eq!(rgb.to_hsl().to_rgb(), rgb, "{}", hex);
        }
    }

    #[test]
    fn test_primary_hues() {
        assert!((Rgb::new(255, 0, 0).to_hsl().h - 0.0).abs() < 1e-9);
        assert!((Rgb::new(0, 255, 0).to_hsl().h - 1.0 / 3.0).abs() < 1e-9);
        assert!((Rgb::new(0, 0, 255).to_hsl().h - 2.0 / 3.0).abs() < 1e-9);
    }
}
