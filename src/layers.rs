// ============================================================================
// LAYER MODEL — filter specs, image/text layers, and the scene that orders them
// ============================================================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EditorError, EditorResult};
use crate::ops::filters::apply_pipeline;
use crate::pixel_buffer::PixelBuffer;
use crate::state::{FontFamily, HexColor, MAX_FONT_SIZE, MIN_FONT_SIZE};

pub type LayerId = Uuid;

/// Per-layer scale bounds. The lower bound also caps how far an `Original`
/// export zooms in, since that view maps the image back to its own pixels.
pub const MIN_LAYER_SCALE: f32 = 0.1;
pub const MAX_LAYER_SCALE: f32 = 10.0;

// ============================================================================
// FILTER SPECS
// ============================================================================

/// Declarative description of one transform.
///
/// Serialized as a tagged object, e.g. `{"kind":"brightness","amount":-0.2}`.
/// Amounts are normalized to [-1, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterSpec {
    Grayscale,
    Sepia,
    Invert,
    Vintage,
    Brightness { amount: f32 },
    Contrast { amount: f32 },
}

impl FilterSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            FilterSpec::Grayscale => "grayscale",
            FilterSpec::Sepia => "sepia",
            FilterSpec::Invert => "invert",
            FilterSpec::Vintage => "vintage",
            FilterSpec::Brightness { .. } => "brightness",
            FilterSpec::Contrast { .. } => "contrast",
        }
    }

    pub fn style(&self) -> Option<StyleFilter> {
        match self {
            FilterSpec::Grayscale => Some(StyleFilter::Grayscale),
            FilterSpec::Sepia => Some(StyleFilter::Sepia),
            FilterSpec::Invert => Some(StyleFilter::Invert),
            FilterSpec::Vintage => Some(StyleFilter::Vintage),
            _ => None,
        }
    }
}

/// Discrete style filters. At most one is active per image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleFilter {
    Grayscale,
    Sepia,
    Invert,
    Vintage,
}

impl StyleFilter {
    pub fn all() -> &'static [StyleFilter] {
        &[
            StyleFilter::Grayscale,
            StyleFilter::Sepia,
            StyleFilter::Invert,
            StyleFilter::Vintage,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            StyleFilter::Grayscale => "Grayscale",
            StyleFilter::Sepia => "Sepia",
            StyleFilter::Invert => "Invert",
            StyleFilter::Vintage => "Vintage",
        }
    }

    /// Parse a filter name from the catalogue. `"None"` yields `Ok(None)`.
    pub fn parse(name: &str) -> EditorResult<Option<StyleFilter>> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        StyleFilter::all()
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .copied()
            .map(Some)
            .ok_or_else(|| EditorError::UnknownFilter(name.to_string()))
    }

    pub fn spec(&self) -> FilterSpec {
        match self {
            StyleFilter::Grayscale => FilterSpec::Grayscale,
            StyleFilter::Sepia => FilterSpec::Sepia,
            StyleFilter::Invert => FilterSpec::Invert,
            StyleFilter::Vintage => FilterSpec::Vintage,
        }
    }
}

/// The active filters of one image, keyed by kind.
///
/// Brightness and contrast each hold at most one amount (re-setting replaces),
/// a neutral amount of 0 removes the entry, and style filters replace each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterStack {
    style: Option<StyleFilter>,
    brightness: Option<f32>,
    contrast: Option<f32>,
}

impl FilterStack {
    /// Build a stack by applying `specs` left-to-right with replace semantics.
    pub fn from_specs(specs: &[FilterSpec]) -> Self {
        let mut stack = Self::default();
        for spec in specs {
            stack.set(*spec);
        }
        stack
    }

    pub fn set(&mut self, spec: FilterSpec) {
        match spec {
            FilterSpec::Brightness { amount } => {
                self.brightness = (amount != 0.0).then_some(amount.clamp(-1.0, 1.0));
            }
            FilterSpec::Contrast { amount } => {
                self.contrast = (amount != 0.0).then_some(amount.clamp(-1.0, 1.0));
            }
            style => self.style = style.style(),
        }
    }

    pub fn set_style(&mut self, style: Option<StyleFilter>) {
        self.style = style;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn style(&self) -> Option<StyleFilter> {
        self.style
    }

    pub fn brightness(&self) -> Option<f32> {
        self.brightness
    }

    pub fn contrast(&self) -> Option<f32> {
        self.contrast
    }

    pub fn is_empty(&self) -> bool {
        self.style.is_none() && self.brightness.is_none() && self.contrast.is_none()
    }

    /// Active specs in pipeline order: style, brightness, contrast.
    pub fn specs(&self) -> Vec<FilterSpec> {
        let mut specs = Vec::with_capacity(3);
        if let Some(style) = self.style {
            specs.push(style.spec());
        }
        if let Some(amount) = self.brightness {
            specs.push(FilterSpec::Brightness { amount });
        }
        if let Some(amount) = self.contrast {
            specs.push(FilterSpec::Contrast { amount });
        }
        specs
    }
}

// ============================================================================
// LAYER CONTENT
// ============================================================================

/// A decoded image plus its active filters.
///
/// The unfiltered original is kept separately from the displayed buffer so the
/// pipeline is always re-run from the source, never from its own output.
#[derive(Clone, Debug)]
pub struct ImageLayer {
    original: PixelBuffer,
    filters: FilterStack,
    filtered: PixelBuffer,
}

impl ImageLayer {
    pub fn new(original: PixelBuffer) -> Self {
        Self {
            filtered: original.clone(),
            original,
            filters: FilterStack::default(),
        }
    }

    pub fn with_filters(original: PixelBuffer, filters: FilterStack) -> Self {
        let mut layer = Self::new(original);
        layer.set_filters(filters);
        layer
    }

    /// Replace the filter stack and re-derive the displayed buffer.
    pub fn set_filters(&mut self, filters: FilterStack) {
        if filters == self.filters {
            return;
        }
        self.filtered = apply_pipeline(&self.original, &filters);
        self.filters = filters;
    }

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn filtered(&self) -> &PixelBuffer {
        &self.filtered
    }

    pub fn filters(&self) -> &FilterStack {
        &self.filters
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.original.dimensions()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TextRecord")]
pub struct TextLayer {
    text: String,
    font: FontFamily,
    size: u32,
    color: HexColor,
}

#[derive(Deserialize)]
struct TextRecord {
    text: String,
    font: FontFamily,
    size: u32,
    color: HexColor,
}

impl TryFrom<TextRecord> for TextLayer {
    type Error = EditorError;

    fn try_from(r: TextRecord) -> Result<Self, Self::Error> {
        TextLayer::new(r.text, r.font, r.size, r.color)
    }
}

impl TextLayer {
    /// Rejects empty content and out-of-range sizes.
    pub fn new(text: impl Into<String>, font: FontFamily, size: u32, color: HexColor) -> EditorResult<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(EditorError::EmptyText);
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
            return Err(EditorError::out_of_range(
                "font size",
                size,
                MIN_FONT_SIZE as f64,
                MAX_FONT_SIZE as f64,
            ));
        }
        Ok(Self { text, font, size, color })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> FontFamily {
        self.font
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn color(&self) -> HexColor {
        self.color
    }
}

#[derive(Clone, Debug)]
pub enum LayerContent {
    Image(ImageLayer),
    Text(TextLayer),
}

/// A positioned drawable. `x`/`y` are canvas-space coordinates of the
/// layer's center.
#[derive(Clone, Debug)]
pub struct Layer {
    pub id: LayerId,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub selectable: bool,
    pub content: LayerContent,
}

impl Layer {
    fn new(content: LayerContent, x: f32, y: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            scale: 1.0,
            selectable: true,
            content,
        }
    }

    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.content {
            LayerContent::Image(img) => Some(img),
            LayerContent::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.content {
            LayerContent::Text(text) => Some(text),
            LayerContent::Image(_) => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.content, LayerContent::Image(_))
    }
}

// ============================================================================
// SCENE
// ============================================================================

/// Ordered layers plus the fixed canvas size. Index order is z-order:
/// later layers render on top.
#[derive(Clone, Debug)]
pub struct Scene {
    width: u32,
    height: u32,
    background: HexColor,
    layers: Vec<Layer>,
}

impl Scene {
    pub fn new(width: u32, height: u32, background: HexColor) -> EditorResult<Self> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            background,
            layers: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    pub fn background(&self) -> HexColor {
        self.background
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Install a new image. An existing image layer is replaced wholesale in
    /// its z-slot; otherwise the image is appended on top.
    pub fn set_image(&mut self, image: ImageLayer, x: f32, y: f32) -> LayerId {
        let layer = Layer::new(LayerContent::Image(image), x, y);
        let id = layer.id;
        match self.layers.iter().position(Layer::is_image) {
            Some(idx) => self.layers[idx] = layer,
            None => self.layers.push(layer),
        }
        id
    }

    pub fn add_text(&mut self, text: TextLayer, x: f32, y: f32) -> LayerId {
        let layer = Layer::new(LayerContent::Text(text), x, y);
        let id = layer.id;
        self.layers.push(layer);
        id
    }

    pub fn image_layer(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.is_image())
    }

    pub fn image(&self) -> Option<&ImageLayer> {
        self.image_layer().and_then(Layer::as_image)
    }

    pub fn image_mut(&mut self) -> Option<&mut ImageLayer> {
        self.layers.iter_mut().find_map(|l| match &mut l.content {
            LayerContent::Image(img) => Some(img),
            LayerContent::Text(_) => None,
        })
    }

    pub fn text_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| !l.is_image())
    }

    pub fn layer(&self, id: LayerId) -> EditorResult<&Layer> {
        self.layers
            .iter()
            .find(|l| l.id == id)
            .ok_or(EditorError::LayerNotFound(id))
    }

    fn layer_mut(&mut self, id: LayerId) -> EditorResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(EditorError::LayerNotFound(id))
    }

    /// Move a layer's center to an absolute canvas position.
    pub fn move_layer(&mut self, id: LayerId, x: f32, y: f32) -> EditorResult<()> {
        check_position(x, y)?;
        let layer = self.layer_mut(id)?;
        layer.x = x;
        layer.y = y;
        Ok(())
    }

    /// Drag a layer by a delta.
    pub fn translate_layer(&mut self, id: LayerId, dx: f32, dy: f32) -> EditorResult<()> {
        let layer = self.layer_mut(id)?;
        let (x, y) = (layer.x + dx, layer.y + dy);
        check_position(x, y)?;
        layer.x = x;
        layer.y = y;
        Ok(())
    }

    pub fn set_layer_scale(&mut self, id: LayerId, scale: f32) -> EditorResult<()> {
        if !(MIN_LAYER_SCALE..=MAX_LAYER_SCALE).contains(&scale) {
            return Err(EditorError::out_of_range(
                "layer scale",
                scale,
                MIN_LAYER_SCALE as f64,
                MAX_LAYER_SCALE as f64,
            ));
        }
        self.layer_mut(id)?.scale = scale;
        Ok(())
    }

    pub fn set_selectable(&mut self, id: LayerId, selectable: bool) -> EditorResult<()> {
        self.layer_mut(id)?.selectable = selectable;
        Ok(())
    }

    /// Remove a text layer. The image layer is only ever replaced, never removed.
    pub fn remove_text_layer(&mut self, id: LayerId) -> EditorResult<TextLayer> {
        let idx = self
            .layers
            .iter()
            .position(|l| l.id == id && !l.is_image())
            .ok_or(EditorError::LayerNotFound(id))?;
        match self.layers.remove(idx).content {
            LayerContent::Text(text) => Ok(text),
            LayerContent::Image(_) => Err(EditorError::LayerNotFound(id)),
        }
    }
}

fn check_position(x: f32, y: f32) -> EditorResult<()> {
    for v in [x, y] {
        if !v.is_finite() {
            return Err(EditorError::out_of_range("layer position", v, f32::MIN as f64, f32::MAX as f64));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn image(w: u32, h: u32) -> ImageLayer {
        ImageLayer::new(PixelBuffer::new_filled(w, h, Rgba([120, 60, 30, 255])).unwrap())
    }

    fn text(s: &str) -> TextLayer {
        TextLayer::new(s, FontFamily::Arial, 16, HexColor::BLACK).unwrap()
    }

    fn scene() -> Scene {
        Scene::new(800, 600, HexColor::WHITE).unwrap()
    }

    #[test]
    fn test_brightness_replaces_instead_of_stacking() {
        let mut stack = FilterStack::default();
        stack.set(FilterSpec::Brightness { amount: 0.5 });
        stack.set(FilterSpec::Brightness { amount: 0.2 });
        assert_eq!(stack.specs(), vec![FilterSpec::Brightness { amount: 0.2 }]);
    }

    #[test]
    fn test_style_filters_are_mutually_exclusive() {
        let stack = FilterStack::from_specs(&[
            FilterSpec::Contrast { amount: 0.15 },
            FilterSpec::Sepia,
            FilterSpec::Brightness { amount: -0.2 },
            FilterSpec::Vintage,
        ]);
        assert_eq!(
            stack.specs(),
            vec![
                FilterSpec::Vintage,
                FilterSpec::Brightness { amount: -0.2 },
                FilterSpec::Contrast { amount: 0.15 },
            ]
        );
    }

    #[test]
    fn test_neutral_amount_removes_entry() {
        let mut stack = FilterStack::from_specs(&[FilterSpec::Contrast { amount: 0.4 }]);
        stack.set(FilterSpec::Contrast { amount: 0.0 });
        assert!(stack.is_empty());
    }

    #[test]
    fn test_filter_spec_serialization() {
        let json = serde_json::to_string(&FilterSpec::Brightness { amount: -0.25 }).unwrap();
        assert_eq!(json, r#"{"kind":"brightness","amount":-0.25}"#);
        let parsed: Vec<FilterSpec> =
            serde_json::from_str(r#"[{"kind":"sepia"},{"kind":"contrast","amount":0.5}]"#).unwrap();
        assert_eq!(parsed, vec![FilterSpec::Sepia, FilterSpec::Contrast { amount: 0.5 }]);
    }

    #[test]
    fn test_style_filter_parse() {
        assert_eq!(StyleFilter::parse("sepia").unwrap(), Some(StyleFilter::Sepia));
        assert_eq!(StyleFilter::parse(" Vintage ").unwrap(), Some(StyleFilter::Vintage));
        assert_eq!(StyleFilter::parse("None").unwrap(), None);
        assert!(matches!(StyleFilter::parse("blur"), Err(EditorError::UnknownFilter(_))));
    }

    #[test]
    fn test_image_layer_reruns_from_original() {
        let mut layer = image(2, 2);
        layer.set_filters(FilterStack::from_specs(&[FilterSpec::Invert]));
        layer.set_filters(FilterStack::from_specs(&[FilterSpec::Grayscale]));
        assert_eq!(layer.filtered().get_pixel(0, 0), Some(Rgba([70, 70, 70, 255])));
        layer.set_filters(FilterStack::default());
        assert_eq!(layer.filtered(), layer.original());
    }

    #[test]
    fn test_text_layer_validation() {
        assert!(matches!(
            TextLayer::new("", FontFamily::Arial, 16, HexColor::BLACK),
            Err(EditorError::EmptyText)
        ));
        // Only "" counts as empty; blank text is still a layer
        assert!(TextLayer::new("   ", FontFamily::Arial, 16, HexColor::BLACK).is_ok());
        assert!(serde_json::from_str::<TextLayer>(
            r##"{"text":"","font":"Arial","size":16,"color":"#000000"}"##
        )
        .is_err());
        assert!(matches!(
            TextLayer::new("Hi", FontFamily::Arial, 80, HexColor::BLACK),
            Err(EditorError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_single_image_layer_most_recent_wins() {
        let mut scene = scene();
        let first = scene.set_image(image(10, 10), 400.0, 300.0);
        scene.add_text(text("caption"), 400.0, 300.0);
        let second = scene.set_image(image(20, 5), 400.0, 300.0);

        assert_ne!(first, second);
        assert_eq!(scene.layers().iter().filter(|l| l.is_image()).count(), 1);
        assert_eq!(scene.image().unwrap().dimensions(), (20, 5));
        // replaced in its original slot, text stays on top
        assert!(scene.layers()[0].is_image());
        assert_eq!(scene.text_layers().count(), 1);
    }

    #[test]
    fn test_text_layers_append_in_z_order() {
        let mut scene = scene();
        let a = scene.add_text(text("a"), 0.0, 0.0);
        let b = scene.add_text(text("b"), 0.0, 0.0);
        let ids: Vec<LayerId> = scene.layers().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_move_and_translate_layer() {
        let mut scene = scene();
        let id = scene.add_text(text("drag me"), 400.0, 300.0);
        scene.move_layer(id, 100.0, 50.0).unwrap();
        scene.translate_layer(id, 5.0, -10.0).unwrap();
        let layer = scene.layer(id).unwrap();
        assert_eq!((layer.x, layer.y), (105.0, 40.0));

        let missing = Uuid::new_v4();
        assert!(matches!(scene.move_layer(missing, 0.0, 0.0), Err(EditorError::LayerNotFound(_))));
        assert!(scene.set_layer_scale(id, 0.0).is_err());
        assert!(scene.move_layer(id, f32::NAN, 0.0).is_err());
        assert!(scene.translate_layer(id, f32::INFINITY, 0.0).is_err());
        assert_eq!(scene.layer(id).unwrap().x, 105.0);
    }

    #[test]
    fn test_layer_scale_is_bounded() {
        let mut scene = scene();
        let id = scene.add_text(text("Hi"), 400.0, 300.0);
        scene.set_layer_scale(id, MAX_LAYER_SCALE).unwrap();
        scene.set_layer_scale(id, MIN_LAYER_SCALE).unwrap();
        for bad in [3.0e8, 1.0e-7, 0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(
                matches!(scene.set_layer_scale(id, bad), Err(EditorError::OutOfRange { .. })),
                "{bad}"
            );
        }
        assert_eq!(scene.layer(id).unwrap().scale, MIN_LAYER_SCALE);
    }

    #[test]
    fn test_remove_text_layer_only() {
        let mut scene = scene();
        let img = scene.set_image(image(4, 4), 0.0, 0.0);
        let txt = scene.add_text(text("bye"), 0.0, 0.0);
        assert!(scene.remove_text_layer(img).is_err());
        assert_eq!(scene.remove_text_layer(txt).unwrap().text(), "bye");
        assert_eq!(scene.layers().len(), 1);
    }
}
