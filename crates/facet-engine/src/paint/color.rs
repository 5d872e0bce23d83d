use bytemuck::{Pod, Zeroable};

/// Straight-alpha sRGB color with 8-bit channels.
///
/// The layout is exactly what the instance color buffers hold, so a slice of
/// `Rgba8` can be uploaded without repacking.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Error returned by [`Rgba8::from_hex`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color {input:?}: expected #rgb, #rrggbb or #rrggbbaa")]
pub struct ColorParseError {
    pub input: String,
}

impl Rgba8 {
    pub const BLACK: Rgba8 = Rgba8::rgb(0, 0, 0);
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError { input: input.to_string() };
        let hex = input.strip_prefix('#').unwrap_or(input);
        if !hex.is_ascii() {
            return Err(err());
        }

        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| err());

        match hex.len() {
            3 => {
                let mut ch = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(err)? as u8;
                    ch[i] = v * 17;
                }
                Ok(Self::rgb(ch[0], ch[1], ch[2]))
            }
            6 => Ok(Self::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
            8 => Ok(Self::new(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                byte(&hex[6..8])?,
            )),
            _ => Err(err()),
        }
    }

    /// `#rrggbb` when opaque, `#rrggbbaa` otherwise.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Channels scaled to `[0, 1]`, still sRGB-encoded and straight alpha.
    #[inline]
    pub fn normalized(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Linear, premultiplied clear color for an sRGB render target.
    pub fn to_wgpu_clear(self) -> wgpu::Color {
        let [r, g, b, a] = self.normalized();
        let a = a as f64;
        wgpu::Color {
            r: srgb_to_linear(r) as f64 * a,
            g: srgb_to_linear(g) as f64 * a,
            b: srgb_to_linear(b) as f64 * a,
            a,
        }
    }
}

/// sRGB transfer function inverse. Mirrors `srgb_to_linear` in the WGSL shaders.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn parses_six_digit_hex() {
        assert_eq!(Rgba8::from_hex("#3ca4cb").unwrap(), Rgba8::rgb(0x3c, 0xa4, 0xcb));
    }

    #[test]
    fn parses_without_hash_and_with_alpha() {
        assert_eq!(Rgba8::from_hex("ff000080").unwrap(), Rgba8::new(255, 0, 0, 128));
    }

    #[test]
    fn parses_short_form() {
        assert_eq!(Rgba8::from_hex("#fa0").unwrap(), Rgba8::rgb(255, 170, 0));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Rgba8::from_hex("#12345").is_err());
        assert!(Rgba8::from_hex("#gggggg").is_err());
        assert!(Rgba8::from_hex("").is_err());
        assert!(Rgba8::from_hex("#ééé").is_err());
    }

    #[test]
    fn hex_round_trip() {
        for s in ["#484848", "#dbdbdb", "#e03e41", "#cc669c80"] {
            assert_eq!(Rgba8::from_hex(s).unwrap().to_hex(), s);
        }
    }

    // ── conversion ────────────────────────────────────────────────────────

    #[test]
    fn normalized_range() {
        assert_eq!(Rgba8::rgb(255, 0, 0).normalized(), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(Rgba8::TRANSPARENT.normalized(), [0.0; 4]);
    }

    #[test]
    fn clear_color_is_premultiplied() {
        let c = Rgba8::new(255, 255, 255, 0).to_wgpu_clear();
        assert_eq!((c.r, c.g, c.b, c.a), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn packed_layout_is_four_bytes() {
        let colors = [Rgba8::new(1, 2, 3, 4), Rgba8::new(5, 6, 7, 8)];
        let bytes: &[u8] = bytemuck::cast_slice(&colors);
        assert_eq!(bytes, &[1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
