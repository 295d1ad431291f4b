//! Premultiplied RGBA8 pixel combinators shared by the stroke renderer and
//! the layer compositor.

use crate::foundation::error::{InkError, InkResult};

pub(crate) fn mul_div255(x: u16, y: u16) -> u8 {
    ((x * y + 127) / 255) as u8
}

pub(crate) fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

fn check_lens(dst: &[u8], src: &[u8], what: &str) -> InkResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(InkError::render(format!(
            "{what} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

/// Source-over composite of one premul pixel pair.
pub(crate) fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(src[i], mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// `dst = src over dst` for whole buffers.
pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8]) -> InkResult<()> {
    check_lens(dst, src, "over_in_place")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Destination-out: remove `src` coverage from `dst`.
///
/// All four channels scale by the inverse source alpha, so premultiplication
/// is preserved.
pub(crate) fn erase_in_place(dst: &mut [u8], src: &[u8]) -> InkResult<()> {
    check_lens(dst, src, "erase_in_place")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let inv = 255u16 - u16::from(s[3]);
        if inv == 255 {
            continue;
        }
        for c in 0..4 {
            d[c] = mul_div255(u16::from(d[c]), inv);
        }
    }
    Ok(())
}

/// Source-over with `src` translated by `(dx, dy)` device pixels.
///
/// Out-of-bounds source samples contribute nothing.
pub(crate) fn over_offset_in_place(
    dst: &mut [u8],
    src: &[u8],
    width: u32,
    height: u32,
    dx: i32,
    dy: i32,
) -> InkResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| InkError::render("offset composite buffer size overflow"))?;
    if dst.len() != expected || src.len() != expected {
        return Err(InkError::render(
            "over_offset_in_place expects buffers matching width*height*4",
        ));
    }

    let w = width as i64;
    let h = height as i64;
    for y in 0..h {
        let sy = y - i64::from(dy);
        if sy < 0 || sy >= h {
            continue;
        }
        for x in 0..w {
            let sx = x - i64::from(dx);
            if sx < 0 || sx >= w {
                continue;
            }
            let si = ((sy * w + sx) as usize) * 4;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            if s[3] == 0 {
                continue;
            }
            let di = ((y * w + x) as usize) * 4;
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(d, s));
        }
    }
    Ok(())
}

/// Replace every covered pixel's color with `color_premul`, keeping the
/// coverage. Used to build shadow and glow plates from a shape raster.
pub(crate) fn tint_from_coverage(
    src: &[u8],
    color_premul: [u8; 4],
    out: &mut [u8],
) -> InkResult<()> {
    check_lens(out, src, "tint_from_coverage")?;
    for (o, s) in out.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let cov = u16::from(s[3]);
        for c in 0..4 {
            o[c] = mul_div255(u16::from(color_premul[c]), cov);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opaque_src_replaces_dst() {
        assert_eq!(over([0, 255, 0, 255], [255, 0, 0, 255]), [255, 0, 0, 255]);
    }

    #[test]
    fn over_transparent_src_keeps_dst() {
        assert_eq!(over([10, 20, 30, 255], [0, 0, 0, 0]), [10, 20, 30, 255]);
    }

    #[test]
    fn over_in_place_rejects_mismatched_lengths() {
        let mut dst = vec![0u8; 8];
        assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
    }

    #[test]
    fn erase_removes_coverage_proportionally() {
        // Full-alpha eraser pixel clears the destination pixel.
        let mut dst = vec![255, 0, 0, 255, 255, 0, 0, 255];
        let src = vec![0, 0, 0, 255, 0, 0, 0, 0];
        erase_in_place(&mut dst, &src).unwrap();
        assert_eq!(&dst[0..4], &[0, 0, 0, 0]);
        assert_eq!(&dst[4..8], &[255, 0, 0, 255]);

        // Half-alpha eraser halves all channels.
        let mut dst = vec![200, 100, 0, 200];
        erase_in_place(&mut dst, &[0, 0, 0, 128]).unwrap();
        assert_eq!(dst, vec![100, 50, 0, 100]);
    }

    #[test]
    fn offset_composite_translates_and_clips() {
        // 2x2 with one opaque red pixel at (0,0), shifted by (1,1).
        let mut dst = vec![0u8; 16];
        let mut src = vec![0u8; 16];
        src[0..4].copy_from_slice(&[255, 0, 0, 255]);
        over_offset_in_place(&mut dst, &src, 2, 2, 1, 1).unwrap();

        assert_eq!(&dst[0..4], &[0, 0, 0, 0]);
        assert_eq!(&dst[12..16], &[255, 0, 0, 255]);

        // Shift entirely out of bounds leaves dst untouched.
        let mut dst2 = vec![0u8; 16];
        over_offset_in_place(&mut dst2, &src, 2, 2, 2, 2).unwrap();
        assert!(dst2.iter().all(|&b| b == 0));
    }

    #[test]
    fn tint_keeps_coverage_and_replaces_color() {
        let src = vec![255, 255, 255, 255, 128, 128, 128, 128, 0, 0, 0, 0];
        let mut out = vec![0u8; 12];
        // Premul 30% black.
        tint_from_coverage(&src, [0, 0, 0, 77], &mut out).unwrap();
        assert_eq!(&out[0..4], &[0, 0, 0, 77]);
        assert_eq!(out[7], mul_div255(77, 128));
        assert_eq!(&out[8..12], &[0, 0, 0, 0]);
    }
}
