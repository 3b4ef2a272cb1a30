// ============================================================================
// FILTER OPERATIONS — pure per-pixel transforms over a PixelBuffer
// ============================================================================
//
// Every filter reads an input buffer and returns a new one; the input is never
// touched, so re-running the pipeline from a retained original is always
// reproducible. Each pass stores rounded, clamped 8-bit samples before the next
// pass reads them. Rows are processed in parallel via rayon.
// ============================================================================

use rayon::prelude::*;

use crate::layers::{FilterSpec, FilterStack, StyleFilter};
use crate::pixel_buffer::{PixelBuffer, clamp_channel};

/// Largest normalized contrast accepted before computing the factor.
/// `c = 1` would divide by zero.
pub const MAX_CONTRAST: f32 = 0.999;

/// Vintage boost applied on top of the sepia matrix.
const VINTAGE_BOOST: f32 = 1.15;

// ============================================================================
// HELPER: row-parallel per-pixel transform
// ============================================================================

/// Apply `transform` to every pixel of `src`, producing a new buffer.
/// `transform` receives (r, g, b, a) as f32 and returns (r, g, b, a) as f32.
fn apply_pixel_transform<F>(src: &PixelBuffer, transform: F) -> PixelBuffer
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let mut out = src.clone();
    let stride = src.width() as usize * 4;

    out.as_raw_mut().par_chunks_mut(stride).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let (nr, ng, nb, na) =
                transform(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32);
            px[0] = clamp_channel(nr);
            px[1] = clamp_channel(ng);
            px[2] = clamp_channel(nb);
            px[3] = clamp_channel(na);
        }
    });

    out
}

fn sepia_pixel(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    (
        0.393 * r + 0.769 * g + 0.189 * b,
        0.349 * r + 0.686 * g + 0.168 * b,
        0.272 * r + 0.534 * g + 0.131 * b,
    )
}

// ============================================================================
// STYLE FILTERS (mutually exclusive)
// ============================================================================

/// Unweighted channel average. Alpha untouched.
pub fn grayscale(src: &PixelBuffer) -> PixelBuffer {
    apply_pixel_transform(src, |r, g, b, a| {
        let avg = (r + g + b) / 3.0;
        (avg, avg, avg, a)
    })
}

pub fn sepia(src: &PixelBuffer) -> PixelBuffer {
    apply_pixel_transform(src, |r, g, b, a| {
        let (sr, sg, sb) = sepia_pixel(r, g, b);
        (sr, sg, sb, a)
    })
}

/// Invert all color channels (R, G, B). Alpha is preserved.
pub fn invert(src: &PixelBuffer) -> PixelBuffer {
    apply_pixel_transform(src, |r, g, b, a| (255.0 - r, 255.0 - g, 255.0 - b, a))
}

/// Sepia, stored as 8-bit, then every channel boosted by 1.15.
pub fn vintage(src: &PixelBuffer) -> PixelBuffer {
    apply_pixel_transform(src, |r, g, b, a| {
        let (sr, sg, sb) = sepia_pixel(r, g, b);
        (
            clamp_channel(sr) as f32 * VINTAGE_BOOST,
            clamp_channel(sg) as f32 * VINTAGE_BOOST,
            clamp_channel(sb) as f32 * VINTAGE_BOOST,
            a,
        )
    })
}

pub fn apply_style(src: &PixelBuffer, style: StyleFilter) -> PixelBuffer {
    match style {
        StyleFilter::Grayscale => grayscale(src),
        StyleFilter::Sepia => sepia(src),
        StyleFilter::Invert => invert(src),
        StyleFilter::Vintage => vintage(src),
    }
}

// ============================================================================
// TONAL ADJUSTMENTS
// ============================================================================

/// Map a slider value in [0, 200] to a normalized amount in [-1, 1].
pub fn normalize_slider(value: u8) -> f32 {
    (value as f32 - 100.0) / 100.0
}

/// Additive brightness. `amount` is normalized to [-1, 1]; out-of-range
/// amounts are clamped.
pub fn brightness(src: &PixelBuffer, amount: f32) -> PixelBuffer {
    let offset = 255.0 * amount.clamp(-1.0, 1.0);
    apply_pixel_transform(src, move |r, g, b, a| (r + offset, g + offset, b + offset, a))
}

/// Contrast multiplier around the midpoint for a normalized amount.
/// The neutral amount is exactly 1.0; `c` is capped at [`MAX_CONTRAST`].
pub fn contrast_factor(amount: f32) -> f32 {
    if amount == 0.0 {
        return 1.0;
    }
    let c = amount.clamp(-1.0, MAX_CONTRAST);
    (259.0 * (c + 1.0)) / (255.0 * (1.0 - c))
}

pub fn contrast(src: &PixelBuffer, amount: f32) -> PixelBuffer {
    let factor = contrast_factor(amount);
    apply_pixel_transform(src, move |r, g, b, a| {
        (
            factor * (r - 128.0) + 128.0,
            factor * (g - 128.0) + 128.0,
            factor * (b - 128.0) + 128.0,
            a,
        )
    })
}

// ============================================================================
// PIPELINES
// ============================================================================

/// Apply a single spec.
pub fn apply_spec(src: &PixelBuffer, spec: &FilterSpec) -> PixelBuffer {
    match *spec {
        FilterSpec::Grayscale => grayscale(src),
        FilterSpec::Sepia => sepia(src),
        FilterSpec::Invert => invert(src),
        FilterSpec::Vintage => vintage(src),
        FilterSpec::Brightness { amount } => brightness(src, amount),
        FilterSpec::Contrast { amount } => contrast(src, amount),
    }
}

/// Explicit chaining: apply `specs` left-to-right exactly as given.
pub fn apply_specs(src: &PixelBuffer, specs: &[FilterSpec]) -> PixelBuffer {
    specs
        .iter()
        .fold(src.clone(), |buf, spec| apply_spec(&buf, spec))
}

/// The fixed editor pipeline: style filter, then brightness, then contrast.
/// An empty stack returns an exact copy of `original`.
pub fn apply_pipeline(original: &PixelBuffer, stack: &FilterStack) -> PixelBuffer {
    apply_specs(original, &stack.specs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    fn single(r: u8, g: u8, b: u8, a: u8) -> PixelBuffer {
        PixelBuffer::new_filled(1, 1, Rgba([r, g, b, a])).unwrap()
    }

    fn px(buf: &PixelBuffer) -> [u8; 4] {
        buf.get_pixel(0, 0).unwrap().0
    }

    fn arb_buffer() -> impl Strategy<Value = PixelBuffer> {
        (1u32..6, 1u32..6).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<u8>(), (w * h * 4) as usize)
                .prop_map(move |raw| PixelBuffer::from_raw(w, h, raw).unwrap())
        })
    }

    #[test]
    fn test_grayscale_average() {
        assert_eq!(px(&grayscale(&single(10, 20, 60, 77))), [30, 30, 30, 77]);
        // 100/3 = 33.33 rounds down
        assert_eq!(px(&grayscale(&single(100, 0, 0, 255))), [33, 33, 33, 255]);
    }

    #[test]
    fn test_sepia_matrix_and_clamp() {
        assert_eq!(px(&sepia(&single(100, 100, 100, 255))), [135, 120, 94, 255]);
        assert_eq!(px(&sepia(&single(255, 255, 255, 9))), [255, 255, 239, 9]);
    }

    #[test]
    fn test_vintage_boosts_stored_sepia() {
        // sepia(100,100,100) = (135, 120, 94) -> *1.15 = (155.25, 138, 108.1)
        assert_eq!(px(&vintage(&single(100, 100, 100, 255))), [155, 138, 108, 255]);
        assert_eq!(px(&vintage(&single(255, 255, 255, 255))), [255, 255, 255, 255]);
    }

    #[test]
    fn test_invert_preserves_alpha() {
        assert_eq!(px(&invert(&single(0, 128, 255, 42))), [255, 127, 0, 42]);
    }

    #[test]
    fn test_brightness_clamps_instead_of_wrapping() {
        assert_eq!(px(&brightness(&single(200, 10, 128, 255), 0.5)), [255, 138, 255, 255]);
        assert_eq!(px(&brightness(&single(200, 10, 128, 255), -0.2)), [149, 0, 77, 255]);
    }

    #[test]
    fn test_contrast_factor_guarded_at_extreme() {
        let f = contrast_factor(1.0);
        assert!(f.is_finite());
        assert_eq!(f, contrast_factor(MAX_CONTRAST));
        assert_eq!(contrast_factor(0.0), 1.0);
        assert_eq!(contrast_factor(-1.0), 0.0);
    }

    #[test]
    fn test_contrast_at_maximum_saturates() {
        assert_eq!(px(&contrast(&single(100, 128, 200, 255), 1.0)), [0, 128, 255, 255]);
        assert_eq!(px(&contrast(&single(0, 90, 255, 255), -1.0)), [128, 128, 128, 255]);
    }

    #[test]
    fn test_normalize_slider() {
        assert_eq!(normalize_slider(100), 0.0);
        assert_eq!(normalize_slider(0), -1.0);
        assert_eq!(normalize_slider(200), 1.0);
        assert_eq!(normalize_slider(120), 0.2);
    }

    #[test]
    fn test_pipeline_order_is_style_brightness_contrast() {
        let src = single(90, 140, 30, 255);
        let mut stack = FilterStack::default();
        stack.set(FilterSpec::Contrast { amount: 0.3 });
        stack.set(FilterSpec::Brightness { amount: 0.1 });
        stack.set(FilterSpec::Sepia);

        let expected = contrast(&brightness(&sepia(&src), 0.1), 0.3);
        assert_eq!(apply_pipeline(&src, &stack), expected);

        let reversed = sepia(&brightness(&contrast(&src, 0.3), 0.1));
        assert_ne!(apply_pipeline(&src, &stack), reversed);
    }

    #[test]
    fn test_apply_specs_is_left_to_right() {
        let src = single(10, 200, 90, 255);
        let chained = apply_specs(&src, &[FilterSpec::Invert, FilterSpec::Grayscale]);
        assert_eq!(chained, grayscale(&invert(&src)));
    }

    proptest! {
        #[test]
        fn prop_invert_is_self_inverse(buf in arb_buffer()) {
            prop_assert_eq!(invert(&invert(&buf)), buf);
        }

        #[test]
        fn prop_grayscale_is_idempotent(buf in arb_buffer()) {
            let once = grayscale(&buf);
            prop_assert_eq!(grayscale(&once), once);
        }

        #[test]
        fn prop_neutral_adjustments_are_identity(buf in arb_buffer()) {
            let out = contrast(&brightness(&buf, normalize_slider(100)), normalize_slider(100));
            prop_assert_eq!(out, buf);
        }

        #[test]
        fn prop_filters_never_touch_alpha(buf in arb_buffer(), amount in -1.0f32..1.0) {
            for out in [sepia(&buf), vintage(&buf), brightness(&buf, amount), contrast(&buf, amount)] {
                let alphas_in: Vec<u8> = buf.as_raw().chunks(4).map(|p| p[3]).collect();
                let alphas_out: Vec<u8> = out.as_raw().chunks(4).map(|p| p[3]).collect();
                prop_assert_eq!(alphas_in, alphas_out);
            }
        }
    }
}
