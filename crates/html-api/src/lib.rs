//! Streaming HTML scanning and in-place modification.
//!
//! [`tag_processor::TagProcessor`] walks the tokens of an HTML document and
//! can modify attributes and text as it goes. [`html_processor::HtmlProcessor`]
//! adds the HTML tree construction rules on top, so it knows where in the
//! document each token lives, and stops on markup it cannot yet handle.

#[macro_use]
mod macros;

pub mod attributes;
pub mod compat_mode;
pub mod config;
pub mod decoder;
pub mod doctype;
pub mod errors;
pub mod html_processor;
pub mod span;
pub mod str_fns;
pub mod tag_name;
pub mod tag_processor;
pub mod text_replacement;
pub mod token;
