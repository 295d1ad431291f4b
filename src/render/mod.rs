//! CPU raster pipeline: stroke rasterization, time-driven effects, and
//! per-tick layer compositing.

pub(crate) mod blur;
pub(crate) mod composite;
mod compositor;
pub(crate) mod pattern;
pub(crate) mod pool;
mod stroke;

pub use compositor::{BackgroundRaster, Compositor};

/// One fully composited frame, premultiplied RGBA8, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgba {
    /// Copy out straight-alpha RGBA bytes for encoders that expect
    /// unpremultiplied input.
    ///
    /// Frames composited over an opaque background are fully opaque and
    /// come back unchanged; partial alpha from a translucent background
    /// raster is divided back out.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in 0..3 {
                px[c] = ((u16::from(px[c]) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    /// Premultiplied RGBA bytes of the pixel at `(x, y)`.
    ///
    /// Panics when out of bounds; intended for tests and probes.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_rgba_divides_alpha_back_out() {
        let frame = FrameRgba {
            width: 3,
            height: 1,
            // Opaque red, half-alpha magenta (premul), fully transparent.
            data: vec![255, 0, 0, 255, 128, 0, 128, 128, 0, 0, 0, 0],
        };
        let straight = frame.to_straight_rgba();
        assert_eq!(&straight[0..4], &[255, 0, 0, 255]);
        assert_eq!(&straight[4..8], &[255, 0, 255, 128]);
        assert_eq!(&straight[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn straight_rgba_is_identity_for_opaque_frames() {
        let frame = FrameRgba {
            width: 2,
            height: 1,
            data: vec![10, 20, 30, 255, 255, 255, 255, 255],
        };
        assert_eq!(frame.to_straight_rgba(), frame.data);
    }
}
