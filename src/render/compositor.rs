//! Per-tick frame assembly: background, then each visible layer rendered
//! in isolation and composited bottom to top.

use crate::foundation::core::Canvas;
use crate::foundation::error::{InkError, InkResult};
use crate::model::store::LayerStore;
use crate::render::FrameRgba;
use crate::render::composite::over_in_place;
use crate::render::pool::BufferPool;
use crate::render::stroke::StrokeRenderer;

/// Decoded background image, premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct BackgroundRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BackgroundRaster {
    /// Decode from any format the `image` crate recognizes.
    pub fn from_image(image: &image::DynamicImage) -> InkResult<Self> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Build from straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, mut data: Vec<u8>) -> InkResult<Self> {
        if width == 0 || height == 0 {
            return Err(InkError::validation("background dimensions must be non-zero"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| InkError::validation("background size overflow"))?;
        if data.len() != expected {
            return Err(InkError::validation(format!(
                "background byte length {} does not match {width}x{height}",
                data.len()
            )));
        }
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                continue;
            }
            for c in 0..3 {
                px[c] = ((u16::from(px[c]) * a + 127) / 255) as u8;
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Nearest-neighbor resample into a full-frame buffer.
    fn fill_resampled(&self, dst: &mut [u8], out_w: u32, out_h: u32) {
        let bw = u64::from(self.width);
        let bh = u64::from(self.height);
        for y in 0..out_h as u64 {
            let sy = ((y * bh) / u64::from(out_h)).min(bh - 1) as usize;
            for x in 0..out_w as u64 {
                let sx = ((x * bw) / u64::from(out_w)).min(bw - 1) as usize;
                let si = (sy * self.width as usize + sx) * 4;
                let di = ((y as usize) * (out_w as usize) + x as usize) * 4;
                dst[di..di + 4].copy_from_slice(&self.data[si..si + 4]);
            }
        }
    }
}

/// Renders the full layer stack into frames.
///
/// Each visible layer gets its own pooled intermediate, so erasers punch
/// holes only in their own layer and never in the layers below.
pub struct Compositor {
    renderer: StrokeRenderer,
    pool: BufferPool,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            renderer: StrokeRenderer::new(),
            pool: BufferPool::new(),
        }
    }

    /// Composite the store at canvas resolution for time `t`.
    pub fn render_frame(
        &mut self,
        store: &LayerStore,
        background: Option<&BackgroundRaster>,
        canvas: Canvas,
        t: f64,
    ) -> InkResult<FrameRgba> {
        self.render_scaled(store, background, canvas.width, canvas.height, 1.0, t)
    }

    /// Composite at an explicit output resolution with user coordinates
    /// multiplied by `scale`. Export downsizing goes through here.
    pub fn render_scaled(
        &mut self,
        store: &LayerStore,
        background: Option<&BackgroundRaster>,
        out_width: u32,
        out_height: u32,
        scale: f64,
        t: f64,
    ) -> InkResult<FrameRgba> {
        if out_width == 0 || out_height == 0 {
            return Err(InkError::render("frame dimensions must be non-zero"));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(InkError::render("frame scale must be finite and > 0"));
        }
        let expected = (out_width as usize)
            .checked_mul(out_height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| InkError::render("frame buffer size overflow"))?;

        let mut target = vec![0u8; expected];
        match background {
            Some(bg) => bg.fill_resampled(&mut target, out_width, out_height),
            None => target.fill(255),
        }

        for layer in store.layers() {
            if !layer.is_visible() || layer.is_empty() {
                continue;
            }
            let mut intermediate = self.pool.borrow(expected);
            for stroke in layer.strokes() {
                self.renderer
                    .render(&mut intermediate, stroke, t, out_width, out_height, scale)?;
            }
            over_in_place(&mut target, &intermediate)?;
            self.pool.release(intermediate);
        }

        Ok(FrameRgba {
            width: out_width,
            height: out_height,
            data: target,
        })
    }
}
