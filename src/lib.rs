//! socialsync — image compositing and filter engine.
//!
//! A session owns one [`layers::Scene`]: a single image layer (the most recent
//! upload) plus any number of text layers. Style filters and brightness/contrast
//! are re-applied from the retained original on every control change, the
//! [`canvas::Compositor`] flattens the scene, and [`io::encode`] produces PNG or
//! JPEG bytes.

pub mod canvas;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod layers;
pub mod logger;
pub mod ops;
pub mod pixel_buffer;
pub mod session;
pub mod state;

pub use canvas::{Compositor, ExportSize};
pub use config::EngineConfig;
pub use error::{EditorError, EditorResult};
pub use io::{ExportFormat, ExportOptions, ExportedImage, Quality};
pub use layers::{FilterSpec, FilterStack, LayerId, Scene, StyleFilter};
pub use pixel_buffer::PixelBuffer;
pub use session::{EditingSession, SaveHook, UploadOutcome, UploadTicket};
pub use state::{EditorState, FontFamily, HexColor};
