//! The normalized per-pixel representation produced from the raw RGBA
//! image before connected-component extraction (`spec.md` §3, `Pixel`).

use rgb::RGBA8;

use crate::ink::{self, Ink};

/// `(ink, meta)` as described in `spec.md` §3: `ink` is stored in its off
/// form (preprocessing decides on/off), `meta` preserves the cosmetic
/// color variant (e.g. a trace's color, or a bundle wire's channel index)
/// that does not itself affect simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub ink: Ink,
    pub meta: u16,
}

impl Pixel {
    pub fn none() -> Pixel {
        Pixel {
            ink: Ink::None,
            meta: 0,
        }
    }

    /// Normalizes a raw RGBA color into a [`Pixel`]. `meta` is derived
    /// from the low byte of the source color, which is where per-ink
    /// color variants (trace colors, bundle channel index) live.
    pub fn from_color(color: RGBA8) -> Pixel {
        Pixel {
            ink: ink::classify(color),
            meta: color.b as u16,
        }
    }
}

/// A width×height buffer of already-decoded pixels, the logical input to
/// [`crate::preprocess::preprocess`] (`spec.md` §6: the core never decodes
/// a blueprint itself, only consumes the pixel buffer another layer
/// produced).
#[derive(Debug, Clone)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Pixel>,
}

impl Image {
    pub fn from_rgba(width: usize, height: usize, colors: &[RGBA8]) -> Image {
        assert_eq!(colors.len(), width * height);
        Image {
            width,
            height,
            pixels: colors.iter().copied().map(Pixel::from_color).collect(),
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width + x]
    }

    pub fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}
