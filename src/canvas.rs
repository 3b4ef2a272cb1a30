// ============================================================================
// COMPOSITOR — flattens a Scene into a single PixelBuffer
// ============================================================================
//
// Layers are drawn in z-order over the background: the image layer fitted and
// centered at its position, then every text layer rasterized at its position.
// A `View` maps canvas coordinates into output pixels so the same code renders
// the on-screen canvas, high-DPI exports, the image's native pixel space, and
// letterboxed fixed-size outputs.
// ============================================================================

use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

use crate::error::{EditorError, EditorResult};
use crate::layers::{Layer, LayerContent, LayerId, Scene};
use crate::ops::text::{Clip, FontBook, RasterizedText, rasterize_text, text_extent};
use crate::pixel_buffer::{PixelBuffer, clamp_channel};

/// Fraction of the canvas the image may occupy when fitted.
pub const DEFAULT_FIT_MARGIN: f32 = 0.9;

pub const PINTEREST_SIZE: (u32, u32) = (1000, 1500);

/// Largest width or height a canvas, pinterest, or custom export may have.
pub const MAX_EXPORT_SIDE: u32 = 16384;

// ============================================================================
// GEOMETRY
// ============================================================================

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Output geometry requested for an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportSize {
    /// The canvas size multiplied by the pixel ratio.
    #[default]
    Canvas,
    /// The image's own pixel dimensions; only the region covered by the
    /// image is exported.
    Original,
    /// 1000×1500 portrait.
    Pinterest,
    Custom { width: u32, height: u32 },
}

impl FromStr for ExportSize {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "canvas" => return Ok(ExportSize::Canvas),
            "original" => return Ok(ExportSize::Original),
            "pinterest" => return Ok(ExportSize::Pinterest),
            _ => {}
        }
        let unknown = || EditorError::UnknownExportSize(s.to_string());
        let (w, h) = lower.split_once('x').ok_or_else(unknown)?;
        let width: u32 = w.trim().parse().map_err(|_| unknown())?;
        let height: u32 = h.trim().parse().map_err(|_| unknown())?;
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        Ok(ExportSize::Custom { width, height })
    }
}

impl fmt::Display for ExportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportSize::Canvas => f.write_str("canvas"),
            ExportSize::Original => f.write_str("original"),
            ExportSize::Pinterest => f.write_str("pinterest"),
            ExportSize::Custom { width, height } => write!(f, "{}x{}", width, height),
        }
    }
}

/// Canvas-to-output mapping: `output = (canvas - offset) * zoom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub width: u32,
    pub height: u32,
    zoom: f32,
    offset_x: f32,
    offset_y: f32,
    fill_background: bool,
}

impl View {
    /// 1:1 view of the whole canvas.
    pub fn canvas(scene: &Scene) -> Self {
        Self {
            width: scene.width(),
            height: scene.height(),
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            fill_background: true,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    fn to_output(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.offset_x) * self.zoom, (y - self.offset_y) * self.zoom)
    }
}

// ============================================================================
// COMPOSITOR
// ============================================================================

pub struct Compositor<'a> {
    fonts: &'a FontBook,
    margin: f32,
}

impl<'a> Compositor<'a> {
    pub fn new(fonts: &'a FontBook, margin: f32) -> Self {
        Self { fonts, margin }
    }

    /// Where the image layer sits on the canvas: scaled uniformly to fit
    /// within `margin` of the canvas, times the layer's own scale, centered
    /// on the layer position.
    pub fn image_rect(&self, scene: &Scene, layer: &Layer) -> Option<Rect> {
        let img = layer.as_image()?;
        let (iw, ih) = img.dimensions();
        let fit = (scene.width() as f32 / iw as f32).min(scene.height() as f32 / ih as f32);
        let s = fit * self.margin * layer.scale;
        let width = iw as f32 * s;
        let height = ih as f32 * s;
        Some(Rect {
            x: layer.x - width * 0.5,
            y: layer.y - height * 0.5,
            width,
            height,
        })
    }

    /// Build the output mapping for an export.
    pub fn export_view(&self, scene: &Scene, size: ExportSize, pixel_ratio: f32) -> EditorResult<View> {
        match size {
            ExportSize::Canvas => {
                if !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
                    return Err(EditorError::out_of_range("pixel ratio", pixel_ratio, 0.0, f64::INFINITY));
                }
                let width = (scene.width() as f32 * pixel_ratio).round() as u32;
                let height = (scene.height() as f32 * pixel_ratio).round() as u32;
                check_export_size(width, height)?;
                Ok(View {
                    width,
                    height,
                    zoom: pixel_ratio,
                    offset_x: 0.0,
                    offset_y: 0.0,
                    fill_background: true,
                })
            }
            ExportSize::Original => {
                let layer = scene.image_layer().ok_or(EditorError::NoImage)?;
                let rect = self.image_rect(scene, layer).ok_or(EditorError::NoImage)?;
                let (iw, ih) = layer.as_image().map(|i| i.dimensions()).ok_or(EditorError::NoImage)?;
                Ok(View {
                    width: iw,
                    height: ih,
                    zoom: iw as f32 / rect.width,
                    offset_x: rect.x,
                    offset_y: rect.y,
                    fill_background: false,
                })
            }
            ExportSize::Pinterest => Ok(letterbox(scene, PINTEREST_SIZE.0, PINTEREST_SIZE.1)),
            ExportSize::Custom { width, height } => {
                check_export_size(width, height)?;
                Ok(letterbox(scene, width, height))
            }
        }
    }

    /// Flatten the scene at canvas resolution.
    pub fn render(&self, scene: &Scene) -> EditorResult<PixelBuffer> {
        self.render_view(scene, &View::canvas(scene))
    }

    pub fn render_view(&self, scene: &Scene, view: &View) -> EditorResult<PixelBuffer> {
        let mut out = if view.fill_background {
            PixelBuffer::new_filled(view.width, view.height, scene.background().to_rgba())?
        } else {
            PixelBuffer::transparent(view.width, view.height)?
        };

        for layer in scene.layers() {
            match &layer.content {
                LayerContent::Image(img) => {
                    let Some(rect) = self.image_rect(scene, layer) else {
                        continue;
                    };
                    draw_image(&mut out, img.filtered(), rect, view)?;
                }
                LayerContent::Text(_) => {
                    let raster = self.rasterize_layer(layer, view);
                    if !raster.is_empty() {
                        blit(&mut out, &raster.buf, raster.buf_w, raster.buf_h, raster.off_x, raster.off_y);
                    }
                }
            }
        }

        Ok(out)
    }

    fn rasterize_layer(&self, layer: &Layer, view: &View) -> RasterizedText {
        let Some(text) = layer.as_text() else {
            return RasterizedText::empty();
        };
        rasterize_text(
            self.fonts,
            text.text(),
            text.font(),
            text.size() as f32 * layer.scale * view.zoom,
            text.color().to_rgba().0,
            view.to_output(layer.x, layer.y),
            Clip {
                width: view.width,
                height: view.height,
            },
        )
    }

    /// Bounding box of a layer in canvas coordinates.
    pub fn layer_bounds(&self, scene: &Scene, layer: &Layer) -> Option<Rect> {
        match &layer.content {
            LayerContent::Image(_) => self.image_rect(scene, layer),
            LayerContent::Text(text) => {
                let extent = text_extent(
                    self.fonts,
                    text.text(),
                    text.font(),
                    text.size() as f32 * layer.scale,
                    (layer.x, layer.y),
                )?;
                Some(Rect {
                    x: extent.x as f32,
                    y: extent.y as f32,
                    width: extent.width as f32,
                    height: extent.height as f32,
                })
            }
        }
    }

    /// Topmost selectable layer under a canvas point.
    pub fn layer_at(&self, scene: &Scene, x: f32, y: f32) -> Option<LayerId> {
        scene
            .layers()
            .iter()
            .rev()
            .filter(|l| l.selectable)
            .find(|l| self.layer_bounds(scene, l).is_some_and(|r| r.contains(x, y)))
            .map(|l| l.id)
    }
}

fn check_export_size(width: u32, height: u32) -> EditorResult<()> {
    if width == 0 || height == 0 || width > MAX_EXPORT_SIDE || height > MAX_EXPORT_SIDE {
        return Err(EditorError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Resample `img` into `rect` (canvas space) and blend it onto `out`.
///
/// Only the part of the placement that lands on the output is ever
/// allocated when the placement is larger than both the source and the
/// output; smaller placements go through the full resize.
fn draw_image(out: &mut PixelBuffer, img: &PixelBuffer, rect: Rect, view: &View) -> EditorResult<()> {
    let (ox, oy) = view.to_output(rect.x, rect.y);
    let tw = (rect.width as f64 * view.zoom as f64).round().max(1.0);
    let th = (rect.height as f64 * view.zoom as f64).round().max(1.0);
    let dst_x = (ox as f64).round();
    let dst_y = (oy as f64).round();
    if !(tw.is_finite() && th.is_finite() && dst_x.is_finite() && dst_y.is_finite()) {
        return Ok(());
    }

    let vx0 = dst_x.max(0.0);
    let vy0 = dst_y.max(0.0);
    let vx1 = (dst_x + tw).min(out.width() as f64);
    let vy1 = (dst_y + th).min(out.height() as f64);
    if vx0 >= vx1 || vy0 >= vy1 {
        return Ok(());
    }

    let (iw, ih) = img.dimensions();
    let budget = (iw as f64 * ih as f64).max(out.width() as f64 * out.height() as f64);
    let fits_u32 = tw <= u32::MAX as f64 && th <= u32::MAX as f64;
    if fits_u32 && tw * th <= budget {
        let (tw, th) = (tw as u32, th as u32);
        let placed = img.resized(tw, th)?;
        blit(out, placed.as_raw(), tw, th, dst_x as i64, dst_y as i64);
        return Ok(());
    }

    let win_w = (vx1 - vx0) as u32;
    let win_h = (vy1 - vy0) as u32;
    let window = img.upscaled_window(
        (tw as u64, th as u64),
        (vx0 - dst_x) as u64,
        (vy0 - dst_y) as u64,
        win_w,
        win_h,
    )?;
    blit(out, window.as_raw(), win_w, win_h, vx0 as i64, vy0 as i64);
    Ok(())
}

/// Fit the whole canvas uniformly inside `width`×`height`, centered.
fn letterbox(scene: &Scene, width: u32, height: u32) -> View {
    let sw = scene.width() as f32;
    let sh = scene.height() as f32;
    let zoom = (width as f32 / sw).min(height as f32 / sh);
    let pad_x = (width as f32 - sw * zoom) * 0.5;
    let pad_y = (height as f32 - sh * zoom) * 0.5;
    View {
        width,
        height,
        zoom,
        offset_x: -pad_x / zoom,
        offset_y: -pad_y / zoom,
        fill_background: true,
    }
}

// ============================================================================
// BLENDING
// ============================================================================

/// Source-over blend of straight-alpha pixels.
pub fn blend_over(base: [u8; 4], top: [u8; 4]) -> [u8; 4] {
    // Fast path: fully transparent top pixel — nothing to blend
    if top[3] == 0 {
        return base;
    }
    // Fast path: opaque top, or nothing underneath — just overwrite
    if top[3] == 255 || base[3] == 0 {
        return top;
    }

    let base_a = base[3] as f32 / 255.0;
    let top_a = top[3] as f32 / 255.0;
    let out_a = top_a + base_a * (1.0 - top_a);

    let channel = |i: usize| {
        let b = base[i] as f32 / 255.0;
        let t = top[i] as f32 / 255.0;
        (t * top_a + b * base_a * (1.0 - top_a)) / out_a * 255.0
    };

    [
        clamp_channel(channel(0)),
        clamp_channel(channel(1)),
        clamp_channel(channel(2)),
        clamp_channel(out_a * 255.0),
    ]
}

/// Blend a raw RGBA block onto `out` with its top-left at (`dst_x`, `dst_y`),
/// clipping to the output bounds.
fn blit(out: &mut PixelBuffer, src: &[u8], src_w: u32, src_h: u32, dst_x: i64, dst_y: i64) {
    let out_w = out.width() as i64;
    let stride = out.width() as usize * 4;
    let x_start = dst_x.max(0);
    let x_end = dst_x.saturating_add(src_w as i64).min(out_w);
    if x_start >= x_end {
        return;
    }

    out.as_raw_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(oy, row)| {
            let sy = oy as i64 - dst_y;
            if sy < 0 || sy >= src_h as i64 {
                return;
            }
            for ox in x_start..x_end {
                let sx = (ox - dst_x) as usize;
                let si = (sy as usize * src_w as usize + sx) * 4;
                let di = ox as usize * 4;
                let top = [src[si], src[si + 1], src[si + 2], src[si + 3]];
                let base = [row[di], row[di + 1], row[di + 2], row[di + 3]];
                row[di..di + 4].copy_from_slice(&blend_over(base, top));
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{ImageLayer, MAX_LAYER_SCALE, TextLayer};
    use crate::state::{FontFamily, HexColor, MAX_FONT_SIZE};
    use image::Rgba;

    const BG: HexColor = HexColor::rgb(248, 249, 250);

    fn scene_with_image(w: u32, h: u32, color: [u8; 4]) -> Scene {
        let mut scene = Scene::new(800, 600, BG).unwrap();
        let img = PixelBuffer::new_filled(w, h, Rgba(color)).unwrap();
        scene.set_image(ImageLayer::new(img), 400.0, 300.0);
        scene
    }

    #[test]
    fn test_empty_scene_renders_background() {
        let fonts = FontBook::builtin();
        let scene = Scene::new(40, 30, BG).unwrap();
        let out = Compositor::new(&fonts, DEFAULT_FIT_MARGIN).render(&scene).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(40, 30, BG.to_rgba()).unwrap());
    }

    #[test]
    fn test_image_is_fitted_and_centered() {
        let fonts = FontBook::builtin();
        let scene = scene_with_image(200, 100, [10, 20, 30, 255]);
        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);

        // min(800/200, 600/100) * 0.9 = 3.6 -> 720x360 centered
        let rect = comp.image_rect(&scene, scene.image_layer().unwrap()).unwrap();
        assert!((rect.x - 40.0).abs() < 1e-3);
        assert!((rect.y - 120.0).abs() < 1e-3);
        assert!((rect.width - 720.0).abs() < 1e-3);

        let out = comp.render(&scene).unwrap();
        assert_eq!(out.get_pixel(0, 0), Some(BG.to_rgba()));
        assert_eq!(out.get_pixel(39, 300), Some(BG.to_rgba()));
        assert_eq!(out.get_pixel(40, 120), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(out.get_pixel(400, 300), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(out.get_pixel(400, 480), Some(BG.to_rgba()));
    }

    #[test]
    fn test_text_draws_above_image() {
        let fonts = FontBook::builtin();
        let mut scene = scene_with_image(200, 100, [0, 0, 255, 255]);
        let text = TextLayer::new("#", FontFamily::Arial, 32, HexColor::rgb(255, 0, 0)).unwrap();
        scene.add_text(text, 400.0, 300.0);

        let out = Compositor::new(&fonts, DEFAULT_FIT_MARGIN).render(&scene).unwrap();
        let red = out
            .as_raw()
            .chunks(4)
            .filter(|p| *p == [255, 0, 0, 255])
            .count();
        assert!(red > 0);
    }

    #[test]
    fn test_original_view_maps_image_pixels_one_to_one() {
        let fonts = FontBook::builtin();
        let mut scene = Scene::new(800, 600, BG).unwrap();
        let mut raw = Vec::new();
        for i in 0..(30 * 20) {
            raw.extend_from_slice(&[(i % 256) as u8, (i / 3 % 256) as u8, 7, 255]);
        }
        let img = PixelBuffer::from_raw(30, 20, raw).unwrap();
        scene.set_image(ImageLayer::new(img.clone()), 400.0, 300.0);

        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);
        let view = comp.export_view(&scene, ExportSize::Original, 1.0).unwrap();
        assert_eq!((view.width, view.height), (30, 20));
        assert_eq!(comp.render_view(&scene, &view).unwrap(), img);
    }

    #[test]
    fn test_original_view_requires_image() {
        let fonts = FontBook::builtin();
        let scene = Scene::new(800, 600, BG).unwrap();
        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);
        assert!(matches!(
            comp.export_view(&scene, ExportSize::Original, 1.0),
            Err(EditorError::NoImage)
        ));
    }

    #[test]
    fn test_pixel_ratio_scales_canvas_export() {
        let fonts = FontBook::builtin();
        let scene = Scene::new(800, 600, BG).unwrap();
        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);
        let view = comp.export_view(&scene, ExportSize::Canvas, 2.0).unwrap();
        assert_eq!((view.width, view.height), (1600, 1200));
        assert!(comp.export_view(&scene, ExportSize::Canvas, 0.0).is_err());
    }

    #[test]
    fn test_custom_size_is_letterboxed() {
        let fonts = FontBook::builtin();
        let scene = scene_with_image(800, 600, [50, 60, 70, 255]);
        let comp = Compositor::new(&fonts, 1.0);
        let view = comp
            .export_view(&scene, ExportSize::Custom { width: 400, height: 600 }, 1.0)
            .unwrap();
        let out = comp.render_view(&scene, &view).unwrap();
        assert_eq!(out.dimensions(), (400, 600));
        // canvas occupies rows 150..450
        assert_eq!(out.get_pixel(200, 100), Some(BG.to_rgba()));
        assert_eq!(out.get_pixel(200, 300), Some(Rgba([50, 60, 70, 255])));
        assert_eq!(out.get_pixel(200, 500), Some(BG.to_rgba()));
    }

    #[test]
    fn test_layer_at_prefers_topmost_selectable() {
        let fonts = FontBook::builtin();
        let mut scene = scene_with_image(200, 100, [0, 0, 0, 255]);
        let image_id = scene.image_layer().unwrap().id;
        let text = TextLayer::new("Hello", FontFamily::Arial, 16, HexColor::WHITE).unwrap();
        let text_id = scene.add_text(text, 400.0, 300.0);
        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);

        assert_eq!(comp.layer_at(&scene, 400.0, 300.0), Some(text_id));
        assert_eq!(comp.layer_at(&scene, 100.0, 200.0), Some(image_id));
        assert_eq!(comp.layer_at(&scene, 5.0, 5.0), None);

        scene.set_selectable(text_id, false).unwrap();
        assert_eq!(comp.layer_at(&scene, 400.0, 300.0), Some(image_id));
    }

    #[test]
    fn test_scaled_image_shrinks_around_its_center() {
        let fonts = FontBook::builtin();
        let mut scene = scene_with_image(200, 100, [10, 20, 30, 255]);
        let id = scene.image_layer().unwrap().id;
        scene.set_layer_scale(id, 0.5).unwrap();

        // 720x360 halved -> 360x180 at (220, 210)
        let out = Compositor::new(&fonts, DEFAULT_FIT_MARGIN).render(&scene).unwrap();
        let img = Some(Rgba([10, 20, 30, 255]));
        assert_eq!(out.get_pixel(220, 210), img);
        assert_eq!(out.get_pixel(579, 389), img);
        assert_eq!(out.get_pixel(219, 300), Some(BG.to_rgba()));
        assert_eq!(out.get_pixel(580, 300), Some(BG.to_rgba()));
        assert_eq!(out.get_pixel(400, 390), Some(BG.to_rgba()));
    }

    #[test]
    fn test_image_dragged_off_canvas_is_clipped() {
        let fonts = FontBook::builtin();
        let mut scene = scene_with_image(200, 100, [10, 20, 30, 255]);
        let id = scene.image_layer().unwrap().id;
        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);

        // 720 wide centered on x = -300 leaves columns 0..60 visible
        scene.move_layer(id, -300.0, 300.0).unwrap();
        let out = comp.render(&scene).unwrap();
        assert_eq!(out.dimensions(), (800, 600));
        assert_eq!(out.get_pixel(0, 300), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(out.get_pixel(59, 300), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(out.get_pixel(60, 300), Some(BG.to_rgba()));

        scene.move_layer(id, 5000.0, -5000.0).unwrap();
        let out = comp.render(&scene).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(800, 600, BG.to_rgba()).unwrap());
    }

    #[test]
    fn test_oversized_placement_renders_only_visible_window() {
        let fonts = FontBook::builtin();
        let mut scene = scene_with_image(200, 100, [10, 20, 30, 255]);
        let id = scene.image_layer().unwrap().id;
        scene.set_layer_scale(id, MAX_LAYER_SCALE).unwrap();
        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);

        // 7200x3600 covers the whole canvas
        let out = comp.render(&scene).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(800, 600, Rgba([10, 20, 30, 255])).unwrap());

        let view = comp.export_view(&scene, ExportSize::Canvas, 4.0).unwrap();
        let dense = comp.render_view(&scene, &view).unwrap();
        assert_eq!(dense.dimensions(), (3200, 2400));
        assert_eq!(dense.get_pixel(3199, 2399), Some(Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn test_scaled_text_is_clipped_to_canvas() {
        let fonts = FontBook::builtin();
        let mut scene = Scene::new(800, 600, BG).unwrap();
        let text = TextLayer::new("Hi", FontFamily::Arial, MAX_FONT_SIZE, HexColor::rgb(255, 0, 0)).unwrap();
        let id = scene.add_text(text, 400.0, 300.0);
        scene.set_layer_scale(id, MAX_LAYER_SCALE).unwrap();
        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);

        // 720px glyphs: the block is wider than the canvas
        let bounds = comp.layer_bounds(&scene, scene.layer(id).unwrap()).unwrap();
        assert!(bounds.width > 800.0);
        let out = comp.render(&scene).unwrap();
        assert!(out.as_raw().chunks(4).any(|p| p == [255, 0, 0, 255]));

        let before = out;
        scene.move_layer(id, -10_000.0, 300.0).unwrap();
        let gone = comp.render(&scene).unwrap();
        assert_eq!(gone, PixelBuffer::new_filled(800, 600, BG.to_rgba()).unwrap());
        assert_ne!(gone, before);
        assert_eq!(comp.layer_at(&scene, 400.0, 300.0), None);
    }

    #[test]
    fn test_export_side_is_capped() {
        let fonts = FontBook::builtin();
        let scene = Scene::new(800, 600, BG).unwrap();
        let comp = Compositor::new(&fonts, DEFAULT_FIT_MARGIN);
        let huge = ExportSize::Custom { width: MAX_EXPORT_SIDE + 1, height: 10 };
        assert!(matches!(
            comp.export_view(&scene, huge, 1.0),
            Err(EditorError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_export_size_parse() {
        assert_eq!("Pinterest".parse::<ExportSize>().unwrap(), ExportSize::Pinterest);
        assert_eq!(
            "1080x1080".parse::<ExportSize>().unwrap(),
            ExportSize::Custom { width: 1080, height: 1080 }
        );
        assert!(matches!("0x10".parse::<ExportSize>(), Err(EditorError::InvalidDimensions { .. })));
        assert!(matches!("huge".parse::<ExportSize>(), Err(EditorError::UnknownExportSize(_))));
    }

    #[test]
    fn test_blend_over() {
        assert_eq!(blend_over([1, 2, 3, 255], [9, 9, 9, 0]), [1, 2, 3, 255]);
        assert_eq!(blend_over([1, 2, 3, 255], [9, 8, 7, 255]), [9, 8, 7, 255]);
        assert_eq!(blend_over([0, 0, 0, 0], [9, 8, 7, 40]), [9, 8, 7, 40]);
        assert_eq!(blend_over([0, 0, 0, 255], [255, 255, 255, 128]), [128, 128, 128, 255]);
    }
}
