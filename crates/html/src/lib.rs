//! The slide markup document: a lenient parser that recovers a
//! [`deck_core::Presentation`] from generated markup, and a builder that
//! renders a presentation into that markup.
//!
//! # Example
//!
//! ```
//! use deck_core::{Presentation, Slide};
//! use deck_html::{MarkupBuilder, MarkupParser};
//!
//! let mut deck = Presentation::new("Cloud");
//! deck.add_slide(Slide::content("Benefits", ["Fast", "Secure"]));
//!
//! let markup = MarkupBuilder::new().build(&deck).unwrap();
//! let parsed = MarkupParser::new().parse(&markup);
//! assert_eq!(parsed.slides[0].bullets(), vec!["Fast", "Secure"]);
//! ```

pub mod builder;
pub mod dom;
pub mod parser;

pub use builder::MarkupBuilder;
pub use dom::Document;
pub use parser::MarkupParser;
