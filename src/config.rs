//! Engine configuration.
//!
//! Stored as pretty JSON at `$XDG_CONFIG_HOME/socialsync/config.json`
//! (falling back to `~/.config/socialsync/config.json`). Every field has a
//! default, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::canvas::DEFAULT_FIT_MARGIN;
use crate::error::{EditorError, EditorResult};
use crate::io::{ExportFormat, ExportOptions, Quality};
use crate::state::{FontFamily, HexColor, TextParams};

pub const MIN_PIXEL_RATIO: f32 = 1.0;
pub const MAX_PIXEL_RATIO: f32 = 4.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub canvas: CanvasConfig,
    pub text: TextConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub background: HexColor,
    /// Fraction of the canvas the image may fill when fitted, in (0, 1].
    pub fit_margin: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub value: String,
    pub size: u32,
    pub color: HexColor,
    pub font: FontFamily,
    /// Font family name -> TTF/OTF file. Unlisted families use the built-in
    /// bitmap font.
    pub fonts: HashMap<String, PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub quality: Quality,
    pub pixel_ratio: f32,
    pub file_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log to this file (truncated at each launch) instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: HexColor::rgb(0xf8, 0xf9, 0xfa),
            fit_margin: DEFAULT_FIT_MARGIN,
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        let params = TextParams::default();
        Self {
            value: params.value,
            size: params.size,
            color: params.color,
            font: params.font,
            fonts: HashMap::new(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: Quality::High,
            pixel_ratio: 1.0,
            file_prefix: "socialsync".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TextConfig {
    pub fn params(&self) -> TextParams {
        TextParams {
            value: self.value.clone(),
            size: self.size,
            color: self.color,
            font: self.font,
        }
    }
}

impl ExportConfig {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            format: self.format,
            quality: self.quality,
            pixel_ratio: self.pixel_ratio,
            ..ExportOptions::default()
        }
    }
}

impl EngineConfig {
    /// Load from the default location. Missing or unreadable files fall back
    /// to defaults.
    pub fn load() -> Self {
        let (config, ignored) = Self::load_or_default(&config_file_path());
        if let Some(e) = ignored {
            tracing::warn!("Ignoring config: {}", e);
        }
        config
    }

    /// Like [`EngineConfig::load`] but hands back the reason a present file
    /// was ignored instead of logging it, for callers that set up logging
    /// from the config itself.
    pub fn load_or_default(path: &Path) -> (Self, Option<EditorError>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load and validate a specific file.
    pub fn load_from(path: &Path) -> EditorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| EditorError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> EditorResult<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> EditorResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| EditorError::config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> EditorResult<()> {
        let canvas = &self.canvas;
        if canvas.width == 0 || canvas.height == 0 {
            return Err(EditorError::InvalidDimensions {
                width: canvas.width,
                height: canvas.height,
            });
        }
        if !(canvas.fit_margin > 0.0 && canvas.fit_margin <= 1.0) {
            return Err(EditorError::out_of_range("fit margin", canvas.fit_margin, 0.0, 1.0));
        }
        let ratio = self.export.pixel_ratio;
        if !(MIN_PIXEL_RATIO..=MAX_PIXEL_RATIO).contains(&ratio) {
            return Err(EditorError::out_of_range(
                "pixel ratio",
                ratio,
                MIN_PIXEL_RATIO as f64,
                MAX_PIXEL_RATIO as f64,
            ));
        }
        // Font size bounds live with the rest of the text controls
        crate::state::EditorState::with_text_defaults(self.text.params())?;
        Ok(())
    }
}

pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("socialsync").join("config.json")
}
