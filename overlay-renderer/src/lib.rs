//! # Overlay Renderer
//!
//! Preview, raster and vector output for overlay scenes.
//!
//! ```text
//! ┌──────────────┐      ┌───────────────┐
//! │    Scene     │─────▶│  PreviewTree  │──── live view (+ selection)
//! └──────────────┘      └───────┬───────┘
//!                               │
//!                 ┌─────────────┴─────────────┐
//!                 ▼                           ▼
//!        ┌────────────────┐          ┌────────────────┐
//!        │ raster (skia)  │          │  vector (SVG)  │
//!        │  PNG / JPEG    │          │   document     │
//!        └────────────────┘          └────────────────┘
//! ```
//!
//! All outputs are produced from one flattened tree, so placement, stacking
//! order and background handling cannot drift between them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod decode;
pub mod error;
pub mod export;
pub mod fonts;
pub mod icon;
pub mod placement;
pub mod preview;
pub mod raster;
pub mod text;
pub mod vector;

pub use assets::{AssetSource, DataUriSource};
pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, SceneExporter};
pub use fonts::FontBook;
pub use placement::{Placement, FALLBACK_BACKGROUND};
pub use preview::{PreviewNode, PreviewTree};
pub use raster::RasterImage;
pub use vector::export_svg;
