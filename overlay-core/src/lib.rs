//! # Overlay Core
//!
//! Scene model for the overlay compositor: text and image layers placed
//! over a background, with free transform and a deterministic paint order.
//! No rendering happens here; `overlay-renderer` turns a [`Scene`] into a
//! preview, a bitmap or an SVG document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 overlay-core                │
//! ├─────────────────────────────────────────────┤
//! │  Scene           │  Input                   │
//! │  - Elements      │  - Pointer / touch       │
//! │  - Assets        │  - Viewport → scene      │
//! │  - Layer order   │  - Select / drag states  │
//! ├─────────────────────────────────────────────┤
//! │  Editor session  │  Project document        │
//! │  - Snapshots     │  - JSON load / save      │
//! │  - Subscribers   │  - Legacy field aliases  │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod color;
pub mod coords;
pub mod editor;
pub mod element;
pub mod error;
pub mod event;
pub mod interaction;
pub mod layers;
pub mod scene;
pub mod schema;

pub use asset::{Asset, AssetContent, AssetId, Background};
pub use color::Color;
pub use coords::{ScenePoint, StaticLayout, SurfaceLayout, SurfaceRect};
pub use editor::{Editor, SubscriptionId};
pub use element::{Element, ElementId, ElementKind, ElementPatch, IconPaint, ImageContent, TextContent};
pub use error::{SceneError, SceneResult};
pub use event::{InputEvent, PointerSample, TouchEvent, TouchPhase, TouchPoint};
pub use interaction::{InteractionController, InteractionState};
pub use layers::LayerMove;
pub use scene::Scene;
pub use schema::{LoadReport, ProjectDocument};

/// Overlay core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
