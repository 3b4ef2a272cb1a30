// ============================================================================
// PIXEL BUFFER — owned RGBA raster, the unit every filter operates on
// ============================================================================
//
// Backed by `image::RgbaImage`, which already guarantees
// `raw.len() == width * height * 4`. All writes go through clamping helpers
// so out-of-range channel values saturate instead of wrapping.
// ============================================================================

use image::imageops::FilterType;
use image::{ImageBuffer, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::error::{EditorError, EditorResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: RgbaImage,
}

impl PixelBuffer {
    /// Create a buffer filled with a single color.
    pub fn new_filled(width: u32, height: u32, color: Rgba<u8>) -> EditorResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            pixels: ImageBuffer::from_pixel(width, height, color),
        })
    }

    /// Create a fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> EditorResult<Self> {
        Self::new_filled(width, height, Rgba([0, 0, 0, 0]))
    }

    /// Wrap a flat RGBA byte sequence. Fails unless `raw.len() == width * height * 4`.
    pub fn from_raw(width: u32, height: u32, raw: Vec<u8>) -> EditorResult<Self> {
        check_dimensions(width, height)?;
        RgbaImage::from_raw(width, height, raw)
            .map(|pixels| Self { pixels })
            .ok_or(EditorError::InvalidDimensions { width, height })
    }

    pub fn from_rgba_image(pixels: RgbaImage) -> EditorResult<Self> {
        check_dimensions(pixels.width(), pixels.height())?;
        Ok(Self { pixels })
    }

    /// Decode any raster format the `image` crate recognises into RGBA8.
    pub fn decode(bytes: &[u8]) -> EditorResult<Self> {
        if bytes.is_empty() {
            return Err(EditorError::decode("empty payload"));
        }
        let img = image::load_from_memory(bytes).map_err(|e| EditorError::decode(e.to_string()))?;
        Self::from_rgba_image(img.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels.into_raw()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width() && y < self.height() {
            Some(*self.pixels.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x < self.width() && y < self.height() {
            self.pixels.put_pixel(x, y, color);
        }
    }

    /// Write float channels, rounding and clamping each to [0, 255].
    pub fn put_pixel_f32(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        self.put_pixel(
            x,
            y,
            Rgba([
                clamp_channel(rgba[0]),
                clamp_channel(rgba[1]),
                clamp_channel(rgba[2]),
                clamp_channel(rgba[3]),
            ]),
        );
    }

    /// Resample to a new size. Returns a clone when the size is unchanged so
    /// identity placements stay bit-exact.
    pub fn resized(&self, width: u32, height: u32) -> EditorResult<Self> {
        check_dimensions(width, height)?;
        if (width, height) == self.dimensions() {
            return Ok(self.clone());
        }
        Ok(Self {
            pixels: image::imageops::resize(&self.pixels, width, height, FilterType::Triangle),
        })
    }

    /// Bilinear upscale to `target` size that materializes only the
    /// `width`x`height` window whose top-left corner is (`x`, `y`) in target
    /// pixels. Sampling matches `resized` for upscales, so a window of a
    /// placement agrees with the same region of the full resize.
    pub fn upscaled_window(&self, target: (u64, u64), x: u64, y: u64, width: u32, height: u32) -> EditorResult<Self> {
        check_dimensions(width, height)?;
        if target.0 == 0 || target.1 == 0 {
            return Err(EditorError::InvalidDimensions {
                width: target.0.min(u32::MAX as u64) as u32,
                height: target.1.min(u32::MAX as u64) as u32,
            });
        }
        let (sw, sh) = self.dimensions();
        let fx = sw as f64 / target.0 as f64;
        let fy = sh as f64 / target.1 as f64;
        let src = self.as_raw();
        let stride = sw as usize * 4;

        let mut raw = vec![0u8; width as usize * height as usize * 4];
        raw.par_chunks_mut(width as usize * 4)
            .enumerate()
            .for_each(|(row, out)| {
                let (y0, y1, ty) = sample_axis(((y + row as u64) as f64 + 0.5) * fy - 0.5, sh);
                for (col, px) in out.chunks_exact_mut(4).enumerate() {
                    let (x0, x1, tx) = sample_axis(((x + col as u64) as f64 + 0.5) * fx - 0.5, sw);
                    for c in 0..4 {
                        let at = |sx: usize, sy: usize| src[sy * stride + sx * 4 + c] as f64;
                        let top = at(x0, y0) * (1.0 - tx) + at(x1, y0) * tx;
                        let bottom = at(x0, y1) * (1.0 - tx) + at(x1, y1) * tx;
                        px[c] = clamp_channel((top * (1.0 - ty) + bottom * ty) as f32);
                    }
                }
            });

        Self::from_raw(width, height, raw)
    }
}

/// Neighbouring source indices and blend weight for a sample position,
/// clamped to the edge.
fn sample_axis(pos: f64, len: u32) -> (usize, usize, f64) {
    let last = (len - 1) as f64;
    let pos = pos.clamp(0.0, last);
    let i0 = pos.floor();
    let i1 = (i0 + 1.0).min(last);
    (i0 as usize, i1 as usize, pos - i0)
}

/// Round and saturate a float channel value into a byte. NaN maps to 0.
pub fn clamp_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

fn check_dimensions(width: u32, height: u32) -> EditorResult<()> {
    if width == 0 || height == 0 {
        return Err(EditorError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_length_invariant() {
        let buf = PixelBuffer::new_filled(7, 3, Rgba([1, 2, 3, 4])).unwrap();
        assert_eq!(buf.as_raw().len(), 7 * 3 * 4);
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_err());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            PixelBuffer::transparent(0, 10),
            Err(EditorError::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_clamp_channel_saturates() {
        assert_eq!(clamp_channel(-12.0), 0);
        assert_eq!(clamp_channel(300.0), 255);
        assert_eq!(clamp_channel(127.5), 128);
        assert_eq!(clamp_channel(f32::NAN), 0);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut buf = PixelBuffer::transparent(2, 2).unwrap();
        buf.put_pixel(5, 5, Rgba([255, 0, 0, 255]));
        assert_eq!(buf.get_pixel(5, 5), None);
        assert_eq!(buf.get_pixel(1, 1), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(PixelBuffer::decode(b"not an image"), Err(EditorError::Decode { .. })));
        assert!(matches!(PixelBuffer::decode(&[]), Err(EditorError::Decode { .. })));
    }

    #[test]
    fn test_resize_same_size_is_exact() {
        let buf = PixelBuffer::new_filled(4, 4, Rgba([9, 8, 7, 255])).unwrap();
        assert_eq!(buf.resized(4, 4).unwrap(), buf);
        assert_eq!(buf.resized(2, 8).unwrap().dimensions(), (2, 8));
    }

    #[test]
    fn test_upscaled_window_agrees_with_full_resize() {
        let mut raw = Vec::new();
        for i in 0..16u32 {
            raw.extend_from_slice(&[(i * 17) as u8, (255 - i * 13) as u8, (i * i) as u8, 255]);
        }
        let buf = PixelBuffer::from_raw(4, 4, raw).unwrap();
        let full = buf.resized(40, 40).unwrap();
        let window = buf.upscaled_window((40, 40), 10, 5, 25, 30).unwrap();
        assert_eq!(window.dimensions(), (25, 30));

        for y in 0..30 {
            for x in 0..25 {
                let a = window.get_pixel(x, y).unwrap();
                let b = full.get_pixel(x + 10, y + 5).unwrap();
                for c in 0..4 {
                    assert!((a[c] as i32 - b[c] as i32).abs() <= 2, "({x}, {y}) {a:?} vs {b:?}");
                }
            }
        }
        assert!(buf.upscaled_window((0, 40), 0, 0, 1, 1).is_err());
    }
}
