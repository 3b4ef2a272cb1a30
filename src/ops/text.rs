use ab_glyph::{point, Font, FontArc, OutlinedGlyph, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::state::FontFamily;

/// Cell size of the built-in bitmap font.
const BITMAP_GLYPH_SIZE: u32 = 8;

/// Font files bound to the supported families. Families without a file are
/// drawn with the built-in 8×8 bitmap font scaled to the requested size.
#[derive(Clone, Default)]
pub struct FontBook {
    fonts: HashMap<FontFamily, FontArc>,
}

impl FontBook {
    /// A book with no outline fonts: every family uses the bitmap font.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load the configured font files. A file that is missing or unreadable is
    /// logged and skipped; that family falls back to the bitmap font.
    pub fn load(files: &HashMap<String, PathBuf>) -> Self {
        let mut book = Self::builtin();
        for (name, path) in files {
            let family = match name.parse::<FontFamily>() {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!("Ignoring font entry: {}", e);
                    continue;
                }
            };
            let font = std::fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| FontArc::try_from_vec(bytes).map_err(|e| e.to_string()));
            match font {
                Ok(font) => {
                    tracing::debug!("Loaded {} from {}", family, path.display());
                    book.fonts.insert(family, font);
                }
                Err(e) => {
                    tracing::warn!("Failed to load font {} from {}: {}", family, path.display(), e);
                }
            }
        }
        book
    }

    pub fn insert(&mut self, family: FontFamily, font: FontArc) {
        self.fonts.insert(family, font);
    }

    pub fn get(&self, family: FontFamily) -> Option<&FontArc> {
        self.fonts.get(&family)
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.fonts.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Straight-alpha RGBA text bitmap positioned in output pixel space. Only the
/// part inside the requested [`Clip`] is materialized.
pub struct RasterizedText {
    pub buf: Vec<u8>,
    pub buf_w: u32,
    pub buf_h: u32,
    pub off_x: i64,
    pub off_y: i64,
}

impl RasterizedText {
    pub fn empty() -> Self {
        Self { buf: Vec::new(), buf_w: 0, buf_h: 0, off_x: 0, off_y: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.buf_w == 0 || self.buf_h == 0
    }

    /// Does the output pixel (x, y) fall inside the rasterized block?
    pub fn contains(&self, x: i64, y: i64) -> bool {
        !self.is_empty()
            && x >= self.off_x
            && y >= self.off_y
            && x < self.off_x + self.buf_w as i64
            && y < self.off_y + self.buf_h as i64
    }
}

/// Output window to rasterize into: pixels `[0, width) x [0, height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clip {
    pub width: u32,
    pub height: u32,
}

/// Unclipped bounding box of laid-out text, in output pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextExtent {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Outline glyphs are rasterized at no more than this many pixels; larger
/// requests are drawn at this size.
pub const MAX_OUTLINE_PX: f32 = 2048.0;

/// Rasterize `text` so its bounding box is centered on `center`, keeping only
/// the pixels that land inside `clip`.
///
/// Supports multiline text via '\n'; each line is centered horizontally.
pub fn rasterize_text(
    book: &FontBook,
    text: &str,
    family: FontFamily,
    font_px: f32,
    color: [u8; 4],
    center: (f32, f32),
    clip: Clip,
) -> RasterizedText {
    if !is_drawable(text, font_px, center) {
        return RasterizedText::empty();
    }
    match book.get(family) {
        Some(font) => rasterize_outline(font, text, font_px, color, center, clip),
        None => bitmap_layout(text, font_px, center)
            .map(|layout| rasterize_bitmap(&layout, color, clip))
            .unwrap_or_else(RasterizedText::empty),
    }
}

/// Where `text` would be drawn, without rasterizing it.
pub fn text_extent(
    book: &FontBook,
    text: &str,
    family: FontFamily,
    font_px: f32,
    center: (f32, f32),
) -> Option<TextExtent> {
    if !is_drawable(text, font_px, center) {
        return None;
    }
    match book.get(family) {
        Some(font) => {
            let (x0, y0, x1, y1) = glyph_bounds(&outline_glyphs(font, text, font_px, center))?;
            Some(TextExtent {
                x: x0 as f64,
                y: y0 as f64,
                width: (x1 - x0) as f64,
                height: (y1 - y0) as f64,
            })
        }
        None => bitmap_layout(text, font_px, center).map(|l| TextExtent {
            x: l.x as f64,
            y: l.y as f64,
            width: l.width as f64,
            height: l.height as f64,
        }),
    }
}

fn is_drawable(text: &str, font_px: f32, center: (f32, f32)) -> bool {
    !text.is_empty() && font_px.is_finite() && font_px > 0.0 && center.0.is_finite() && center.1.is_finite()
}

/// Intersection of `[x0, x1) x [y0, y1)` with the clip window.
fn clip_box(x0: i64, y0: i64, x1: i64, y1: i64, clip: Clip) -> Option<(i64, i64, i64, i64)> {
    let cx0 = x0.max(0);
    let cy0 = y0.max(0);
    let cx1 = x1.min(clip.width as i64);
    let cy1 = y1.min(clip.height as i64);
    (cx0 < cx1 && cy0 < cy1).then_some((cx0, cy0, cx1, cy1))
}

// ============================================================================
// OUTLINE FONTS (ab_glyph)
// ============================================================================

/// Lay out a single line of text at x=0, returning glyph ids with x offsets
/// and the total advance width.
fn layout_line(font: &FontArc, line: &str, font_px: f32) -> (Vec<(ab_glyph::GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(font_px);
    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph = None;

    for ch in line.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }

    (glyphs, cursor_x)
}

fn outline_glyphs(font: &FontArc, text: &str, font_px: f32, center: (f32, f32)) -> Vec<OutlinedGlyph> {
    let font_px = font_px.min(MAX_OUTLINE_PX);
    let scaled = font.as_scaled(font_px);
    let ascent = scaled.ascent();
    let line_height = scaled.height() + scaled.line_gap();

    let lines: Vec<&str> = text.split('\n').collect();
    let block_h = scaled.height() + line_height * (lines.len() as f32 - 1.0);
    let origin_y = center.1 - block_h * 0.5;

    let mut outlined = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let (glyphs, width) = layout_line(font, line, font_px);
        let line_x = center.0 - width * 0.5;
        let baseline = origin_y + ascent + line_idx as f32 * line_height;
        for (id, gx) in glyphs {
            let glyph = id.with_scale_and_position(font_px, point(line_x + gx, baseline));
            if let Some(o) = font.outline_glyph(glyph) {
                outlined.push(o);
            }
        }
    }
    outlined
}

/// Bounding box of all glyph pixels as `(x0, y0, x1, y1)`.
fn glyph_bounds(outlined: &[OutlinedGlyph]) -> Option<(i64, i64, i64, i64)> {
    let mut bounds: Option<(i64, i64, i64, i64)> = None;
    for o in outlined {
        let b = o.px_bounds();
        let g = (
            b.min.x.floor() as i64,
            b.min.y.floor() as i64,
            b.max.x.ceil() as i64,
            b.max.y.ceil() as i64,
        );
        bounds = Some(match bounds {
            None => g,
            Some(a) => (a.0.min(g.0), a.1.min(g.1), a.2.max(g.2), a.3.max(g.3)),
        });
    }
    bounds.filter(|&(x0, y0, x1, y1)| x0 < x1 && y0 < y1)
}

fn rasterize_outline(
    font: &FontArc,
    text: &str,
    font_px: f32,
    color: [u8; 4],
    center: (f32, f32),
    clip: Clip,
) -> RasterizedText {
    let outlined = outline_glyphs(font, text, font_px, center);
    let Some((x0, y0, x1, y1)) = glyph_bounds(&outlined) else {
        return RasterizedText::empty();
    };
    let Some((cx0, cy0, cx1, cy1)) = clip_box(x0, y0, x1, y1, clip) else {
        return RasterizedText::empty();
    };
    let buf_w = (cx1 - cx0) as u32;
    let buf_h = (cy1 - cy0) as u32;

    let mut coverage = vec![0.0f32; buf_w as usize * buf_h as usize];
    for o in &outlined {
        let b = o.px_bounds();
        let gx = b.min.x as i64;
        let gy = b.min.y as i64;
        // Skip glyphs entirely outside the window
        if clip_box(gx, gy, b.max.x.ceil() as i64, b.max.y.ceil() as i64, clip).is_none() {
            continue;
        }
        o.draw(|px, py, cov| {
            let ix = gx + px as i64 - cx0;
            let iy = gy + py as i64 - cy0;
            if ix >= 0 && iy >= 0 && ix < buf_w as i64 && iy < buf_h as i64 {
                let idx = iy as usize * buf_w as usize + ix as usize;
                coverage[idx] = coverage[idx].max(cov);
            }
        });
    }

    RasterizedText {
        buf: coverage_to_rgba(&coverage, color),
        buf_w,
        buf_h,
        off_x: cx0,
        off_y: cy0,
    }
}

fn coverage_to_rgba(coverage: &[f32], color: [u8; 4]) -> Vec<u8> {
    let mut buf = vec![0u8; coverage.len() * 4];
    for (i, &cov) in coverage.iter().enumerate() {
        if cov > 0.001 {
            let idx = i * 4;
            buf[idx] = color[0];
            buf[idx + 1] = color[1];
            buf[idx + 2] = color[2];
            buf[idx + 3] = (color[3] as f32 * cov.min(1.0)).round() as u8;
        }
    }
    buf
}

// ============================================================================
// BUILT-IN BITMAP FONT (font8x8)
// ============================================================================

/// Integer upscale factor of the 8x8 cell for a requested pixel size.
pub fn bitmap_scale(font_px: f32) -> u32 {
    ((font_px / BITMAP_GLYPH_SIZE as f32).round() as u32).max(1)
}

fn bitmap_glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Block geometry of bitmap text. All sizes are in output pixels.
struct BitmapLayout {
    lines: Vec<Vec<[u8; 8]>>,
    scale: u64,
    cell: u64,
    line_height: u64,
    width: u64,
    height: u64,
    x: i64,
    y: i64,
}

fn bitmap_layout(text: &str, font_px: f32, center: (f32, f32)) -> Option<BitmapLayout> {
    let lines: Vec<Vec<[u8; 8]>> = text
        .split('\n')
        .map(|l| l.chars().map(bitmap_glyph).collect())
        .collect();
    let max_chars = lines.iter().map(Vec::len).max().unwrap_or(0) as u64;
    if max_chars == 0 {
        return None;
    }

    let scale = bitmap_scale(font_px) as u64;
    let cell = (BITMAP_GLYPH_SIZE as u64).checked_mul(scale)?;
    let line_height = cell.checked_add(scale)?;
    let width = max_chars.checked_mul(cell)?;
    let height = line_height.checked_mul(lines.len() as u64)? - scale;
    // Keep every edge representable as an i64 pixel coordinate
    let half_range = (i64::MAX / 4) as u64;
    if width > half_range || height > half_range {
        return None;
    }
    let x = (center.0 as f64 - width as f64 * 0.5).round();
    let y = (center.1 as f64 - height as f64 * 0.5).round();
    if x.abs() > half_range as f64 || y.abs() > half_range as f64 {
        return None;
    }

    Some(BitmapLayout {
        lines,
        scale,
        cell,
        line_height,
        width,
        height,
        x: x as i64,
        y: y as i64,
    })
}

fn rasterize_bitmap(layout: &BitmapLayout, color: [u8; 4], clip: Clip) -> RasterizedText {
    let Some((x0, y0, x1, y1)) = clip_box(
        layout.x,
        layout.y,
        layout.x + layout.width as i64,
        layout.y + layout.height as i64,
        clip,
    ) else {
        return RasterizedText::empty();
    };
    let buf_w = (x1 - x0) as u32;
    let buf_h = (y1 - y0) as u32;
    let mut buf = vec![0u8; buf_w as usize * buf_h as usize * 4];

    // Walk only the visible window, mapping each pixel back to a glyph bit
    for (row_idx, row) in buf.chunks_exact_mut(buf_w as usize * 4).enumerate() {
        let ly = (y0 - layout.y) as u64 + row_idx as u64;
        let in_line = ly % layout.line_height;
        if in_line >= layout.cell {
            continue;
        }
        let line = &layout.lines[(ly / layout.line_height) as usize];
        let glyph_row = (in_line / layout.scale) as usize;
        let line_w = line.len() as u64 * layout.cell;
        let line_x = (layout.width - line_w) / 2;

        for (col_idx, px) in row.chunks_exact_mut(4).enumerate() {
            let lx = (x0 - layout.x) as u64 + col_idx as u64;
            if lx < line_x || lx >= line_x + line_w {
                continue;
            }
            let rel = lx - line_x;
            let bits = line[(rel / layout.cell) as usize][glyph_row];
            let col = (rel % layout.cell) / layout.scale;
            if (bits >> col) & 1 == 1 {
                px.copy_from_slice(&color);
            }
        }
    }

    RasterizedText {
        buf,
        buf_w,
        buf_h,
        off_x: x0,
        off_y: y0,
    }
}
