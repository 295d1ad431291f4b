use crate::foundation::error::{InkError, InkResult};

pub use kurbo::{Affine, BezPath, Point, Vec2};

/// Drawing surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create validated, non-degenerate canvas dimensions.
    pub fn new(width: u32, height: u32) -> InkResult<Self> {
        if width == 0 || height == 0 {
            return Err(InkError::validation("canvas dimensions must be non-zero"));
        }
        Ok(Self { width, height })
    }

    /// Longest edge in pixels.
    pub fn max_edge(self) -> u32 {
        self.width.max(self.height)
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    /// Fully opaque color from RGB channels.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(s: &str) -> InkResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let parse = |range: std::ops::Range<usize>| -> InkResult<u8> {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| InkError::validation(format!("invalid hex color '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self {
                r: parse(0..2)?,
                g: parse(2..4)?,
                b: parse(4..6)?,
                a: 255,
            }),
            8 => Ok(Self {
                r: parse(0..2)?,
                g: parse(2..4)?,
                b: parse(4..6)?,
                a: parse(6..8)?,
            }),
            _ => Err(InkError::validation(format!(
                "hex color '{s}' must have 6 or 8 digits"
            ))),
        }
    }

    /// Convert to premultiplied RGBA8 bytes.
    pub fn premul(self) -> [u8; 4] {
        fn mul(c: u8, a: u8) -> u8 {
            (((u16::from(c) * u16::from(a)) + 127) / 255) as u8
        }
        [
            mul(self.r, self.a),
            mul(self.g, self.a),
            mul(self.b, self.a),
            self.a,
        ]
    }
}
