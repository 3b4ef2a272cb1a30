use uuid::Uuid;

use crate::canvas::{Compositor, Rect};
use crate::config::{EngineConfig, MAX_PIXEL_RATIO, MIN_PIXEL_RATIO};
use crate::error::{EditorError, EditorResult};
use crate::io::{self, ExportOptions, ExportedImage};
use crate::layers::{ImageLayer, LayerId, Scene, StyleFilter, TextLayer};
use crate::ops::text::FontBook;
use crate::pixel_buffer::PixelBuffer;
use crate::state::EditorState;

/// External persistence collaborator ("save to library"). Receives the
/// flattened composite; what it does with it is up to the implementor.
pub trait SaveHook {
    fn on_save_requested(&mut self, composite: &PixelBuffer) -> EditorResult<()>;
}

impl<F> SaveHook for F
where
    F: FnMut(&PixelBuffer) -> EditorResult<()>,
{
    fn on_save_requested(&mut self, composite: &PixelBuffer) -> EditorResult<()> {
        self(composite)
    }
}

/// Handle for one upload between MIME acceptance and decode completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
    mime: String,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The decode replaced the image layer.
    Applied(LayerId),
    /// A newer upload was applied first; this result was discarded.
    Superseded,
}

/// Single editing session: owns the scene and control state exclusively.
pub struct EditingSession {
    pub id: Uuid,
    config: EngineConfig,
    fonts: FontBook,
    scene: Scene,
    state: EditorState,
    issued_generation: u64,
    applied_generation: u64,
}

impl EditingSession {
    pub fn new(config: EngineConfig) -> EditorResult<Self> {
        let fonts = FontBook::load(&config.text.fonts);
        Self::with_font_book(config, fonts)
    }

    pub fn with_font_book(config: EngineConfig, fonts: FontBook) -> EditorResult<Self> {
        config.validate()?;
        let scene = Scene::new(config.canvas.width, config.canvas.height, config.canvas.background)?;
        let state = EditorState::with_text_defaults(config.text.params())?;
        let id = Uuid::new_v4();
        tracing::debug!("Session {} created ({}x{})", id, scene.width(), scene.height());

        Ok(Self {
            id,
            config,
            fonts,
            scene,
            state,
            issued_generation: 0,
            applied_generation: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Snapshot of the current controls.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn has_image(&self) -> bool {
        self.scene.image().is_some()
    }

    fn compositor(&self) -> Compositor<'_> {
        Compositor::new(&self.fonts, self.config.canvas.fit_margin)
    }

    // ========================================================================
    // UPLOAD
    // ========================================================================

    /// Accept an upload by MIME type. Rejection leaves the session untouched.
    pub fn begin_upload(&mut self, mime: &str) -> EditorResult<UploadTicket> {
        if let Err(e) = io::check_upload_mime(mime) {
            tracing::warn!("Rejected upload: {}", e);
            return Err(e);
        }
        self.issued_generation += 1;
        Ok(UploadTicket {
            generation: self.issued_generation,
            mime: mime.to_string(),
        })
    }

    /// Decode and apply an upload's bytes.
    pub fn complete_upload(&mut self, ticket: &UploadTicket, bytes: &[u8]) -> EditorResult<UploadOutcome> {
        if self.is_stale(ticket) {
            tracing::warn!("Discarding superseded upload #{}", ticket.generation);
            return Ok(UploadOutcome::Superseded);
        }
        let buffer = match io::decode_upload(&ticket.mime, bytes) {
            Ok(buffer) => buffer,
            Err(e) => {
                tracing::warn!("Upload #{} failed to decode: {}", ticket.generation, e);
                return Err(e);
            }
        };
        Ok(self.apply_decoded(ticket, buffer))
    }

    /// Install an already-decoded buffer, unless a newer upload got there first.
    pub fn apply_decoded(&mut self, ticket: &UploadTicket, buffer: PixelBuffer) -> UploadOutcome {
        if self.is_stale(ticket) {
            tracing::warn!("Discarding superseded upload #{}", ticket.generation);
            return UploadOutcome::Superseded;
        }
        let (w, h) = buffer.dimensions();
        let (cx, cy) = self.scene.center();
        let layer = ImageLayer::with_filters(buffer, self.state.filter_stack());
        let id = self.scene.set_image(layer, cx, cy);
        self.applied_generation = ticket.generation;
        tracing::info!("Loaded {}x{} image from upload #{}", w, h, ticket.generation);
        UploadOutcome::Applied(id)
    }

    /// One-shot upload: MIME check, decode, apply.
    pub fn upload(&mut self, mime: &str, bytes: &[u8]) -> EditorResult<LayerId> {
        let ticket = self.begin_upload(mime)?;
        match self.complete_upload(&ticket, bytes)? {
            UploadOutcome::Applied(id) => Ok(id),
            // A fresh ticket is always the newest one
            UploadOutcome::Superseded => Err(EditorError::NoImage),
        }
    }

    fn is_stale(&self, ticket: &UploadTicket) -> bool {
        ticket.generation <= self.applied_generation
    }

    // ========================================================================
    // FILTER CONTROLS
    // ========================================================================

    /// Swap in a new control state and re-derive the image's filters from it.
    fn commit_filters(&mut self, next: EditorState) -> EditorResult<()> {
        let image = self.scene.image_mut().ok_or(EditorError::NoImage)?;
        image.set_filters(next.filter_stack());
        tracing::debug!("Filters now {:?}", image.filters().specs());
        self.state = next;
        Ok(())
    }

    pub fn set_brightness(&mut self, value: i32) -> EditorResult<()> {
        let next = self.state.with_brightness(value)?;
        self.commit_filters(next)
    }

    pub fn set_contrast(&mut self, value: i32) -> EditorResult<()> {
        let next = self.state.with_contrast(value)?;
        self.commit_filters(next)
    }

    pub fn select_filter(&mut self, filter: Option<StyleFilter>) -> EditorResult<()> {
        let next = self.state.with_filter(filter);
        self.commit_filters(next)
    }

    /// Select by catalogue name; "None" clears the style filter.
    pub fn select_filter_by_name(&mut self, name: &str) -> EditorResult<()> {
        let filter = StyleFilter::parse(name)?;
        self.select_filter(filter)
    }

    /// Back to neutral sliders and no style filter. Pending text is kept.
    pub fn reset_adjustments(&mut self) {
        self.state = self.state.reset_adjustments();
        let stack = self.state.filter_stack();
        if let Some(image) = self.scene.image_mut() {
            image.set_filters(stack);
        }
    }

    // ========================================================================
    // TEXT
    // ========================================================================

    pub fn set_pending_text(&mut self, value: impl Into<String>) {
        self.state = self.state.with_text_value(value);
    }

    pub fn set_text_size(&mut self, size: u32) -> EditorResult<()> {
        self.state = self.state.with_font_size(size)?;
        Ok(())
    }

    pub fn set_text_color(&mut self, color: &str) -> EditorResult<()> {
        self.state = self.state.with_text_color(color)?;
        Ok(())
    }

    pub fn set_text_font(&mut self, font: &str) -> EditorResult<()> {
        self.state = self.state.with_font(font)?;
        Ok(())
    }

    /// Commit the pending text as a new layer at the canvas centre.
    pub fn add_text(&mut self) -> EditorResult<LayerId> {
        let (cx, cy) = self.scene.center();
        self.add_text_at(cx, cy)
    }

    pub fn add_text_at(&mut self, x: f32, y: f32) -> EditorResult<LayerId> {
        let params = self.state.text();
        let layer = match TextLayer::new(params.value.clone(), params.font, params.size, params.color) {
            Ok(layer) => layer,
            Err(e) => {
                tracing::warn!("Rejected text layer: {}", e);
                return Err(e);
            }
        };
        let id = self.scene.add_text(layer, x, y);
        self.state = self.state.with_text_value(String::new());
        tracing::debug!("Added text layer {} at ({}, {})", id, x, y);
        Ok(id)
    }

    pub fn remove_text_layer(&mut self, id: LayerId) -> EditorResult<TextLayer> {
        self.scene.remove_text_layer(id)
    }

    // ========================================================================
    // LAYER INTERACTION
    // ========================================================================

    pub fn move_layer(&mut self, id: LayerId, x: f32, y: f32) -> EditorResult<()> {
        self.scene.move_layer(id, x, y)
    }

    pub fn translate_layer(&mut self, id: LayerId, dx: f32, dy: f32) -> EditorResult<()> {
        self.scene.translate_layer(id, dx, dy)
    }

    pub fn scale_layer(&mut self, id: LayerId, scale: f32) -> EditorResult<()> {
        self.scene.set_layer_scale(id, scale)
    }

    pub fn layer_at(&self, x: f32, y: f32) -> Option<LayerId> {
        self.compositor().layer_at(&self.scene, x, y)
    }

    pub fn layer_bounds(&self, id: LayerId) -> EditorResult<Rect> {
        let layer = self.scene.layer(id)?;
        self.compositor()
            .layer_bounds(&self.scene, layer)
            .ok_or(EditorError::LayerNotFound(id))
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    /// Flatten the scene at canvas resolution.
    pub fn render(&self) -> EditorResult<PixelBuffer> {
        self.compositor().render(&self.scene)
    }

    pub fn export(&self, options: &ExportOptions) -> EditorResult<ExportedImage> {
        if !self.has_image() {
            tracing::warn!("Export refused: no image loaded");
            return Err(EditorError::NoImage);
        }
        let ratio = options.pixel_ratio;
        if !(MIN_PIXEL_RATIO..=MAX_PIXEL_RATIO).contains(&ratio) {
            return Err(EditorError::out_of_range(
                "pixel ratio",
                ratio,
                MIN_PIXEL_RATIO as f64,
                MAX_PIXEL_RATIO as f64,
            ));
        }

        let compositor = self.compositor();
        let view = compositor.export_view(&self.scene, options.size, ratio)?;
        let composite = compositor.render_view(&self.scene, &view)?;
        let bytes = io::encode(&composite, options.format, options.quality)?;
        let file_name = io::export_file_name(&self.config.export.file_prefix, options.format);

        tracing::info!(
            "Exported {} ({}x{}, {}, {} bytes)",
            file_name,
            view.width,
            view.height,
            options.size,
            bytes.len()
        );
        Ok(ExportedImage {
            bytes,
            file_name,
            format: options.format,
            width: view.width,
            height: view.height,
        })
    }

    /// Render the composite and hand it to `hook`.
    pub fn request_save(&self, hook: &mut dyn SaveHook) -> EditorResult<()> {
        if !self.has_image() {
            return Err(EditorError::NoImage);
        }
        let composite = self.render()?;
        hook.on_save_requested(&composite)
    }
}
