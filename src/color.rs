// src/color.rs

//! Defines the `Rgba` color value used by surfaces and operations, plus the
//! handful of named colors the command language refers to.

use serde::{Deserialize, Serialize};

/// RGBA color in 32-bit format (8 bits per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Default background after start-up and after `reset`.
pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
/// Background set by the `white` command.
pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
/// Background set by the `green` command.
pub const GREEN: Rgba = Rgba::opaque(0, 255, 0);
/// Default figure marker color.
pub const RED: Rgba = Rgba::opaque(255, 0, 0);

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to RGBA byte array
    pub fn to_bytes(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

impl Default for Rgba {
    fn default() -> Self {
        BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_keep_channel_order() {
        let c = Rgba::new(1, 2, 3, 4);
        assert_eq!(c.to_bytes(), [1, 2, 3, 4]);
        assert_eq!(Rgba::from_bytes(c.to_bytes()), c);
    }

    #[test]
    fn default_is_opaque_black() {
        assert_eq!(Rgba::default(), Rgba::opaque(0, 0, 0));
        assert_eq!(Rgba::default().a, 255);
    }
}
