//! Image codec services
//!
//! - `io`: decode uploads, encode results
//! - `format`: format capabilities and alpha flattening

pub mod format;
pub mod io;

pub use format::{OutputFormatHandler, FLATTEN_BACKGROUND};
pub use io::{EncodedImage, ImageIOService};
