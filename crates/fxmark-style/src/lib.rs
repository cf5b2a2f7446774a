#![forbid(unsafe_code)]

//! Color and style primitives for fxmark.
//!
//! - [`Argb`] - packed 32-bit color with hex/legacy-name parsing, HSV
//!   conversion, and integer-space interpolation
//! - [`Style`] / [`StyleFlags`] - static style toggles carried by spans
//!
//! # Example
//! ```
//! use fxmark_style::{Argb, Style, StyleFlags};
//!
//! let red = Argb::parse("#ff0000").unwrap();
//! assert_eq!(red, Argb::rgb(255, 0, 0));
//! assert_eq!(Argb::parse_or("nonsense", Argb::WHITE), Argb::WHITE);
//!
//! let style = Style::new().bold().color(red);
//! assert!(style.has(StyleFlags::BOLD));
//! ```

pub mod color;
pub mod style;

pub use color::Argb;
pub use style::{Style, StyleFlags};
