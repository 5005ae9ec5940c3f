//! Core domain types for deck generation: the structural presentation model,
//! its wire payload, the diagram specification, the brand palette, source
//! text preparation and on-disk artifact handling.

pub mod brand;
pub mod cleanup;
pub mod diagram;
pub mod error;
pub mod extracted;
pub mod model;
pub mod payload;
pub mod source;
pub mod store;
pub mod text;

pub use brand::{BrandPalette, ColorRole, FontRole, Rgb, BRAND, WHITE};
pub use cleanup::{cleanup_old_files, CleanupReport, CleanupStatus};
pub use diagram::{DiagramKind, DiagramSpec, NodeShape};
pub use error::{Error, Result};
pub use extracted::{ExtractedDeck, ExtractedSlide, SlideText};
pub use model::{Presentation, Slide, SlideBody, SlideKind};
pub use payload::{DeckPayload, SlidePayload};
pub use source::SourceFormat;
pub use store::ArtifactStore;
pub use text::TextNormalizer;
