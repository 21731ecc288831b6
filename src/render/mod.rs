//! Output rendering for assembled specs.

pub mod document;

pub use document::{OutputFormat, render_document};
