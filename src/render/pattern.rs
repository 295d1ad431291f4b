//! Repeating tone tiles for fill strokes.
//!
//! Tiles are built once per stroke in user space and sampled with wrap
//! addressing, so the texture repeats across the fill region and scales
//! together with the drawing on export.

use crate::foundation::core::Rgba8;
use crate::model::stroke::TonePattern;

/// Square premultiplied RGBA8 tile.
pub(crate) struct PatternTile {
    size: u32,
    data: Vec<u8>,
}

impl PatternTile {
    /// Build the tile for a stroke's color, width, and pattern kind.
    ///
    /// The tile edge grows with the stroke width but never drops below
    /// 10 pixels, keeping thin brushes from degenerating into noise.
    pub(crate) fn build(color: Rgba8, width: f64, kind: TonePattern) -> Self {
        let size = (width * 2.0).floor().max(10.0) as u32;
        let px = color.premul();
        let n = (size as usize) * (size as usize);
        let mut data = vec![0u8; n * 4];

        match kind {
            TonePattern::Solid => {
                for chunk in data.chunks_exact_mut(4) {
                    chunk.copy_from_slice(&px);
                }
            }
            TonePattern::Dot => {
                let center = f64::from(size) / 2.0;
                let radius = (width / 3.0).max(2.0);
                for y in 0..size {
                    for x in 0..size {
                        let dx = (f64::from(x) + 0.5) - center;
                        let dy = (f64::from(y) + 0.5) - center;
                        if dx * dx + dy * dy <= radius * radius {
                            let idx = ((y * size + x) as usize) * 4;
                            data[idx..idx + 4].copy_from_slice(&px);
                        }
                    }
                }
            }
            TonePattern::Stripe => {
                // Vertical bands at both tile edges; wrapping merges the
                // right band with the next tile's left band.
                let band = (width / 2.0).max(2.0);
                for y in 0..size {
                    for x in 0..size {
                        let cx = f64::from(x) + 0.5;
                        if cx < band || cx > f64::from(size) - band {
                            let idx = ((y * size + x) as usize) * 4;
                            data[idx..idx + 4].copy_from_slice(&px);
                        }
                    }
                }
            }
        }

        Self { size, data }
    }

    #[cfg(test)]
    pub(crate) fn size(&self) -> u32 {
        self.size
    }

    /// Wrap-sample the tile at an arbitrary (possibly negative) position.
    pub(crate) fn sample(&self, x: i64, y: i64) -> [u8; 4] {
        let s = i64::from(self.size);
        let tx = x.rem_euclid(s) as usize;
        let ty = y.rem_euclid(s) as usize;
        let idx = (ty * self.size as usize + tx) * 4;
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
    fn tile_size_tracks_width_with_floor_of_ten() {
        assert_eq!(
            PatternTile::build(Rgba8::BLACK, 2.0, TonePattern::Solid).size(),
            10
        );
        assert_eq!(
            PatternTile::build(Rgba8::BLACK, 12.0, TonePattern::Solid).size(),
            24
        );
    }

    #[test]
    fn solid_tile_is_fully_covered() {
        let tile = PatternTile::build(Rgba8::opaque(10, 20, 30), 5.0, TonePattern::Solid);
        for y in 0..tile.size() as i64 {
            for x in 0..tile.size() as i64 {
                assert_eq!(tile.sample(x, y), [10, 20, 30, 255]);
            }
        }
    }

    #[test]
    fn dot_tile_covers_center_not_corners() {
        let tile = PatternTile::build(Rgba8::BLACK, 5.0, TonePattern::Dot);
        let mid = i64::from(tile.size() / 2);
        assert_eq!(tile.sample(mid, mid)[3], 255);
        assert_eq!(tile.sample(0, 0)[3], 0);
    }

    #[test]
    fn stripe_tile_covers_edges_not_middle() {
        let tile = PatternTile::build(Rgba8::BLACK, 5.0, TonePattern::Stripe);
        let mid = i64::from(tile.size() / 2);
        assert_eq!(tile.sample(0, mid)[3], 255);
        assert_eq!(tile.sample(i64::from(tile.size()) - 1, mid)[3], 255);
        assert_eq!(tile.sample(mid, mid)[3], 0);
    }

    #[test]
    fn sampling_wraps_for_negative_and_large_coordinates() {
        let tile = PatternTile::build(Rgba8::BLACK, 5.0, TonePattern::Dot);
        let s = i64::from(tile.size());
        for (x, y) in [(3i64, 4i64), (0, 0), (s - 1, 2)] {
            assert_eq!(tile.sample(x, y), tile.sample(x + 7 * s, y - 3 * s));
        }
    }
}
