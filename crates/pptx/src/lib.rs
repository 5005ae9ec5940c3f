//! PPTX (Office Open XML) support for generated decks.
//!
//! [`DeckRenderer`] turns a [`deck_core::Presentation`] into a native,
//! editable .pptx (every text element is a real text run, nothing is
//! rasterized). [`DiagramRenderer`] draws a diagram specification onto a
//! single slide with the same chrome. [`PptxReader`] reads the text and
//! background of each slide back out of any .pptx, which is how uploaded
//! decks become source text.

pub mod diagram;
pub mod extract;
pub mod package;
pub mod reader;
pub mod shape;
pub mod writer;

pub use diagram::DiagramRenderer;
pub use extract::source_text;
pub use reader::PptxReader;
pub use shape::{SLIDE_HEIGHT, SLIDE_WIDTH};
pub use writer::{DeckRenderer, SlideDrawing};
