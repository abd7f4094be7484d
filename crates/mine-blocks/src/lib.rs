//! Managed section merging for mine.
//!
//! The shared instruction document is owned partly by the user and partly by
//! mine. Ownership is split by a single marker line:
//!
//! ```text
//! # My own rules            <- user prose, preserved byte-for-byte
//! Always answer in English.
//!
//! # mine managed marker     <- first occurrence of the marker
//! ...managed content...     <- owned by mine, replaced wholesale
//! ```
//!
//! Everything before the **first** occurrence of the marker belongs to the
//! user. Everything from the marker to end-of-file belongs to mine. Functions
//! here are pure and operate on raw bytes so a document that is not valid
//! UTF-8 is still preserved exactly.

pub mod section;

pub use section::{Section, StripOutcome, find_marker, merge, split, strip};
