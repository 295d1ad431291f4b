//! Rasterizes one stroke at one instant: wobble displacement, outline
//! expansion, tone fills, and the shadow/glow plates, composited onto a
//! caller-owned premul RGBA8 layer buffer.

use std::collections::HashMap;

use crate::foundation::core::{BezPath, Point, Vec2};
use crate::foundation::error::{InkError, InkResult};
use crate::model::stroke::{Stroke, ToolKind};
use crate::render::blur::{blur_premul, gaussian_kernel_q16};
use crate::render::composite::{
    erase_in_place, mul_div255, over_in_place, over_offset_in_place, tint_from_coverage,
};
use crate::render::pattern::PatternTile;

/// Glow spread in device pixels.
const NEON_BLUR_RADIUS: u32 = 10;
/// Shadow softness in device pixels.
const SHADOW_BLUR_RADIUS: u32 = 5;
/// Shadow displacement in device pixels, unaffected by export scaling.
const SHADOW_OFFSET: (i32, i32) = (5, 5);
/// Premul 30% black.
const SHADOW_COLOR: [u8; 4] = [0, 0, 0, 77];
/// Extra diameter of the white halo under outlined freehand strokes.
const OUTLINE_EXTRA_WIDTH: f64 = 4.0;
/// Border width of outlined tone fills, in user pixels.
const TONE_BORDER_WIDTH: f64 = 2.0;
/// Flattening tolerance for stroke expansion.
const PATH_TOLERANCE: f64 = 0.25;

/// Sinusoidal displacement of point `index` at time `t`.
///
/// Consecutive points are half a radian apart in phase, so a stroke
/// undulates along its length instead of translating rigidly. The motion
/// is periodic in `t` with period `2 * PI / speed`.
fn wobble_offset(t: f64, speed: f64, amplitude: f64, index: usize) -> Vec2 {
    let phase = t * speed + index as f64 * 0.5;
    Vec2::new(phase.sin() * amplitude, phase.cos() * amplitude)
}

/// Polyline through the stroke's points, wobble-displaced when enabled.
fn build_path(stroke: &Stroke, t: f64, close: bool) -> BezPath {
    let speed = stroke.wobble_speed_or_default();
    let amplitude = stroke.wobble_amplitude_or_default();

    let mut path = BezPath::new();
    for (i, &p) in stroke.points.iter().enumerate() {
        let p = if stroke.effects.wobbly {
            p + wobble_offset(t, speed, amplitude, i)
        } else {
            p
        };
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    if close {
        path.close_path();
    }
    path
}

fn brush_style(stroke: &Stroke, width: f64) -> kurbo::Stroke {
    let style = kurbo::Stroke::new(width)
        .with_caps(kurbo::Cap::Round)
        .with_join(kurbo::Join::Round);
    if stroke.tool == ToolKind::Dashed {
        // On/off runs of twice the brush width, phase locked to the path
        // start so the dashes ride along with the wobble.
        let dash = stroke.width * 2.0;
        style.with_dashes(0.0, [dash, dash])
    } else {
        style
    }
}

/// Expand a center-line path to its filled outline.
fn expand_stroke(path: &BezPath, style: &kurbo::Stroke) -> BezPath {
    kurbo::stroke(
        path.elements().iter().copied(),
        style,
        &kurbo::StrokeOpts::default(),
        PATH_TOLERANCE,
    )
}

/// Stateful single-stroke rasterizer.
///
/// Holds the vector render context, the target pixmap, effect scratch
/// buffers, and a blur kernel cache so steady-state rendering is
/// allocation free once buffer sizes settle.
pub(crate) struct StrokeRenderer {
    ctx: Option<vello_cpu::RenderContext>,
    raster: Option<vello_cpu::Pixmap>,
    /// Premul coverage of the current stroke's shape.
    shape: Vec<u8>,
    /// Secondary raster for tone borders.
    border: Vec<u8>,
    fx_tint: Vec<u8>,
    fx_blur: Vec<u8>,
    fx_scratch: Vec<u8>,
    kernels: HashMap<u32, Vec<u32>>,
}

impl StrokeRenderer {
    pub(crate) fn new() -> Self {
        Self {
            ctx: None,
            raster: None,
            shape: Vec::new(),
            border: Vec::new(),
            fx_tint: Vec::new(),
            fx_blur: Vec::new(),
            fx_scratch: Vec::new(),
            kernels: HashMap::new(),
        }
    }

    /// Composite one stroke onto `dst` (premul RGBA8, `width * height * 4`)
    /// as it appears at time `t`, with user coordinates scaled by `scale`.
    pub(crate) fn render(
        &mut self,
        dst: &mut [u8],
        stroke: &Stroke,
        t: f64,
        width: u32,
        height: u32,
        scale: f64,
    ) -> InkResult<()> {
        match stroke.tool {
            ToolKind::ToneFill => self.render_tone(dst, stroke, t, width, height, scale),
            ToolKind::Solid | ToolKind::Dashed | ToolKind::Eraser => {
                self.render_freehand(dst, stroke, t, width, height, scale)
            }
        }
    }

    fn render_freehand(
        &mut self,
        dst: &mut [u8],
        stroke: &Stroke,
        t: f64,
        width: u32,
        height: u32,
        scale: f64,
    ) -> InkResult<()> {
        // A tap without movement has no extent.
        if stroke.points.len() < 2 {
            return Ok(());
        }

        let path = build_path(stroke, t, false);
        let main = expand_stroke(&path, &brush_style(stroke, stroke.width));

        if stroke.tool == ToolKind::Eraser {
            // Coverage only; color and effects are ignored.
            let mut shape = std::mem::take(&mut self.shape);
            self.rasterize_into(&mut shape, width, height, scale, |ctx| {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
                ctx.fill_path(&bezpath_to_cpu(&main));
            })?;
            let result = erase_in_place(dst, &shape);
            self.shape = shape;
            return result;
        }

        let halo = stroke.effects.outlined.then(|| {
            expand_stroke(
                &path,
                &brush_style(stroke, stroke.width + OUTLINE_EXTRA_WIDTH),
            )
        });

        let color = stroke.color;
        let mut shape = std::mem::take(&mut self.shape);
        self.rasterize_into(&mut shape, width, height, scale, |ctx| {
            if let Some(halo) = &halo {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
                ctx.fill_path(&bezpath_to_cpu(halo));
            }
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            ctx.fill_path(&bezpath_to_cpu(&main));
        })?;
        self.shape = shape;

        self.composite_with_effects(dst, stroke, width, height)
    }

    fn render_tone(
        &mut self,
        dst: &mut [u8],
        stroke: &Stroke,
        t: f64,
        width: u32,
        height: u32,
        scale: f64,
    ) -> InkResult<()> {
        // A polygon needs at least three vertices.
        if stroke.points.len() < 3 {
            return Ok(());
        }

        let path = build_path(stroke, t, true);

        // Region mask, then pattern applied through its coverage.
        let mut shape = std::mem::take(&mut self.shape);
        self.rasterize_into(&mut shape, width, height, scale, |ctx| {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
            ctx.fill_path(&bezpath_to_cpu(&path));
        })?;

        let tile = PatternTile::build(stroke.color, stroke.width, stroke.pattern);
        let w = width as usize;
        for y in 0..height as usize {
            for x in 0..w {
                let idx = (y * w + x) * 4;
                let cov = shape[idx + 3];
                if cov == 0 {
                    shape[idx..idx + 4].copy_from_slice(&[0, 0, 0, 0]);
                    continue;
                }
                // Tile lookup in user space so the pattern scales with the
                // drawing on export.
                let ux = (x as f64 / scale).floor() as i64;
                let uy = (y as f64 / scale).floor() as i64;
                let px = tile.sample(ux, uy);
                for c in 0..4 {
                    shape[idx + c] = mul_div255(u16::from(px[c]), u16::from(cov));
                }
            }
        }
        self.shape = shape;

        if stroke.effects.outlined {
            let border_path = expand_stroke(
                &path,
                &kurbo::Stroke::new(TONE_BORDER_WIDTH)
                    .with_caps(kurbo::Cap::Round)
                    .with_join(kurbo::Join::Round),
            );
            let color = stroke.color;
            let mut border = std::mem::take(&mut self.border);
            self.rasterize_into(&mut border, width, height, scale, |ctx| {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color.r, color.g, color.b, color.a,
                ));
                ctx.fill_path(&bezpath_to_cpu(&border_path));
            })?;
            over_in_place(&mut self.shape, &border)?;
            self.border = border;
        }

        self.composite_with_effects(dst, stroke, width, height)
    }

    /// Shadow or glow plate under the shape, then the shape itself.
    fn composite_with_effects(
        &mut self,
        dst: &mut [u8],
        stroke: &Stroke,
        width: u32,
        height: u32,
    ) -> InkResult<()> {
        if stroke.effects.neon {
            let glow = stroke.color.premul();
            self.plate_onto(dst, glow, NEON_BLUR_RADIUS, (0, 0), width, height)?;
        } else if stroke.effects.shadowed {
            self.plate_onto(
                dst,
                SHADOW_COLOR,
                SHADOW_BLUR_RADIUS,
                SHADOW_OFFSET,
                width,
                height,
            )?;
        }
        over_in_place(dst, &self.shape)
    }

    /// Tint the shape's coverage, blur it, and composite at an offset.
    fn plate_onto(
        &mut self,
        dst: &mut [u8],
        color_premul: [u8; 4],
        radius: u32,
        offset: (i32, i32),
        width: u32,
        height: u32,
    ) -> InkResult<()> {
        let len = self.shape.len();
        self.fx_tint.resize(len, 0);
        self.fx_blur.resize(len, 0);
        self.fx_scratch.resize(len, 0);

        tint_from_coverage(&self.shape, color_premul, &mut self.fx_tint)?;

        if !self.kernels.contains_key(&radius) {
            let kernel = gaussian_kernel_q16(radius)?;
            self.kernels.insert(radius, kernel);
        }
        let kernel = &self.kernels[&radius];
        blur_premul(
            &self.fx_tint,
            &mut self.fx_blur,
            &mut self.fx_scratch,
            width,
            height,
            kernel,
        );

        if offset == (0, 0) {
            over_in_place(dst, &self.fx_blur)
        } else {
            over_offset_in_place(dst, &self.fx_blur, width, height, offset.0, offset.1)
        }
    }

    fn rasterize_into(
        &mut self,
        out: &mut Vec<u8>,
        width: u32,
        height: u32,
        scale: f64,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) -> InkResult<()> {
        let w: u16 = width
            .try_into()
            .map_err(|_| InkError::render("raster width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| InkError::render("raster height exceeds u16"))?;

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::scale(scale));
        draw(&mut ctx);
        ctx.flush();

        let mut pixmap = match self.raster.take() {
            Some(p) if p.width() == w && p.height() == h => p,
            _ => vello_cpu::Pixmap::new(w, h),
        };
        pixmap.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut pixmap);

        let expected = (width as usize) * (height as usize) * 4;
        out.resize(expected, 0);
        out.copy_from_slice(pixmap.data_as_u8_slice());

        self.raster = Some(pixmap);
        self.ctx = Some(ctx);
        Ok(())
    }
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let cvt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(cvt(p)),
            PathEl::LineTo(p) => out.line_to(cvt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(cvt(p1), cvt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(cvt(p1), cvt(p2), cvt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stroke::BrushConfig;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn wobble_phase_advances_half_radian_per_point() {
        let a = wobble_offset(0.25, 5.0, 2.0, 0);
        let b = wobble_offset(0.25, 5.0, 2.0, 1);
        assert!(approx(a.x, (0.25f64 * 5.0).sin() * 2.0));
        assert!(approx(a.y, (0.25f64 * 5.0).cos() * 2.0));
        assert!(approx(b.x, (0.25f64 * 5.0 + 0.5).sin() * 2.0));
    }

    #[test]
    fn wobble_at_time_zero_displaces_straight_up_scaled_by_amplitude() {
        let v = wobble_offset(0.0, 5.0, 3.0, 0);
        assert!(approx(v.x, 0.0));
        assert!(approx(v.y, 3.0));
    }

    #[test]
    fn path_without_wobble_passes_points_through() {
        let mut stroke = Stroke::begin(&BrushConfig::default(), Point::new(1.0, 2.0));
        stroke.points.push(Point::new(3.0, 4.0));

        let path = build_path(&stroke, 123.0, false);
        let els = path.elements();
        assert_eq!(els.len(), 2);
        assert_eq!(els[0], kurbo::PathEl::MoveTo(Point::new(1.0, 2.0)));
        assert_eq!(els[1], kurbo::PathEl::LineTo(Point::new(3.0, 4.0)));
    }

    #[test]
    fn closed_path_appends_close_element() {
        let mut stroke = Stroke::begin(&BrushConfig::default(), Point::new(0.0, 0.0));
        stroke.points.push(Point::new(10.0, 0.0));
        stroke.points.push(Point::new(5.0, 8.0));

        let path = build_path(&stroke, 0.0, true);
        assert_eq!(path.elements().last(), Some(&kurbo::PathEl::ClosePath));
    }

    #[test]
    fn degenerate_strokes_render_nothing() {
        let mut renderer = StrokeRenderer::new();
        let mut dst = vec![0u8; 8 * 8 * 4];

        let single = Stroke::begin(&BrushConfig::default(), Point::new(4.0, 4.0));
        renderer.render(&mut dst, &single, 0.0, 8, 8, 1.0).unwrap();
        assert!(dst.iter().all(|&b| b == 0));

        let mut two_point_tone = Stroke::begin(
            &BrushConfig {
                tool: ToolKind::ToneFill,
                ..BrushConfig::default()
            },
            Point::new(1.0, 1.0),
        );
        two_point_tone.points.push(Point::new(6.0, 6.0));
        renderer
            .render(&mut dst, &two_point_tone, 0.0, 8, 8, 1.0)
            .unwrap();
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn dashed_style_carries_double_width_dashes() {
        let stroke = Stroke::begin(
            &BrushConfig {
                tool: ToolKind::Dashed,
                width: 6.0,
                ..BrushConfig::default()
            },
            Point::ZERO,
        );
        let style = brush_style(&stroke, stroke.width);
        assert_eq!(style.dash_pattern.as_slice(), &[12.0, 12.0]);
    }
}
