//! Error types for the editing engine.
//!
//! Nothing in the engine is fatal: every variant describes a locally
//! recoverable failure that leaves the session in its last-good state.

use uuid::Uuid;

/// Top-level error type for editor operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Unsupported file type '{mime}': please select an image file")]
    UnsupportedMimeType { mime: String },

    #[error("Text content must not be empty")]
    EmptyText,

    #[error("{control} must be between {min} and {max} (got {value})")]
    OutOfRange {
        control: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    #[error("Unknown font family '{0}'")]
    UnknownFont(String),

    #[error("Unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("Unknown export format '{0}': expected png or jpeg")]
    UnknownFormat(String),

    #[error("Unknown export size '{0}': expected canvas, original, pinterest or WIDTHxHEIGHT")]
    UnknownExportSize(String),

    #[error("Export quality must be in (0, 1] (got {0})")]
    InvalidQuality(f32),

    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("No image loaded")]
    NoImage,

    #[error("Layer {0} not found")]
    LayerNotFound(Uuid),

    #[error("Could not decode image: {message}")]
    Decode { message: String },

    #[error("Could not encode image: {message}")]
    Encode { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using EditorError.
pub type EditorResult<T> = Result<T, EditorError>;

impl EditorError {
    pub fn out_of_range(control: &'static str, value: impl Into<f64>, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            control,
            value: value.into(),
            min,
            max,
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Bad user input: wrong file type, empty text, control value out of range.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMimeType { .. }
                | Self::EmptyText
                | Self::OutOfRange { .. }
                | Self::InvalidColor(_)
                | Self::UnknownFont(_)
                | Self::UnknownFilter(_)
                | Self::UnknownFormat(_)
                | Self::UnknownExportSize(_)
                | Self::InvalidQuality(_)
                | Self::InvalidDimensions { .. }
        )
    }

    /// The operation needs something the session does not have yet.
    pub fn is_missing_prerequisite(&self) -> bool {
        matches!(self, Self::NoImage | Self::LayerNotFound(_))
    }
}
