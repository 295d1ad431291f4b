//! Separable Gaussian blur over premultiplied RGBA8 in Q16 fixed point.
//!
//! Edge handling is clamp-to-edge. Weights are normalized to sum to
//! exactly 65536 so a constant image is a fixed point of the filter.

use crate::foundation::error::{InkError, InkResult};

/// Q16 Gaussian weights for a blur of the given pixel radius.
///
/// Sigma is half the radius, matching a soft falloff that reaches near
/// zero at the kernel edge. Radius 0 yields an identity kernel.
pub(crate) fn gaussian_kernel_q16(radius: u32) -> InkResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    let sigma = f64::from(radius) / 2.0;

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(InkError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Rounding residue lands on the center tap.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

/// Two-pass separable blur: `src` horizontally into `scratch`, then
/// vertically into `dst`. All three buffers must be `width * height * 4`.
pub(crate) fn blur_premul(
    src: &[u8],
    dst: &mut [u8],
    scratch: &mut [u8],
    width: u32,
    height: u32,
    kernel: &[u32],
) {
    debug_assert_eq!(src.len(), dst.len());
    debug_assert_eq!(src.len(), scratch.len());

    if kernel.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    horizontal_pass(src, scratch, width, height, kernel);
    vertical_pass(scratch, dst, width, height, kernel);
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        for radius in [1u32, 2, 5, 10] {
            let k = gaussian_kernel_q16(radius).unwrap();
            assert_eq!(k.len(), (2 * radius + 1) as usize);
            assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
            for i in 0..radius as usize {
                assert_eq!(k[i], k[k.len() - 1 - i]);
            }
        }
    }

    #[test]
    fn radius_zero_is_identity() {
        let k = gaussian_kernel_q16(0).unwrap();
        assert_eq!(k, vec![1 << 16]);

        let src: Vec<u8> = (0..16).map(|i| (i * 13) as u8).collect();
        let mut dst = vec![0u8; 16];
        let mut scratch = vec![0u8; 16];
        blur_premul(&src, &mut dst, &mut scratch, 2, 2, &k);
        assert_eq!(dst, src);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let src = vec![120u8; 4 * 6 * 4];
        let mut dst = vec![0u8; src.len()];
        let mut scratch = vec![0u8; src.len()];
        let k = gaussian_kernel_q16(3).unwrap();
        blur_premul(&src, &mut dst, &mut scratch, 4, 6, &k);
        assert_eq!(dst, src);
    }

    #[test]
    fn single_pixel_spreads_symmetrically() {
        // 5x5, opaque white dot in the middle.
        let mut src = vec![0u8; 5 * 5 * 4];
        let mid = (2 * 5 + 2) * 4;
        src[mid..mid + 4].copy_from_slice(&[255, 255, 255, 255]);

        let mut dst = vec![0u8; src.len()];
        let mut scratch = vec![0u8; src.len()];
        let k = gaussian_kernel_q16(2).unwrap();
        blur_premul(&src, &mut dst, &mut scratch, 5, 5, &k);

        let alpha = |x: usize, y: usize| dst[(y * 5 + x) * 4 + 3];
        assert!(alpha(2, 2) > alpha(1, 2));
        assert_eq!(alpha(1, 2), alpha(3, 2));
        assert_eq!(alpha(2, 1), alpha(2, 3));
        assert!(alpha(0, 0) < alpha(1, 1));
    }
}
