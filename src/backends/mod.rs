//! Backend implementations for local inference
//!
//! - Tract backend (pure Rust, no external dependencies)

#[cfg(feature = "tract")]
pub mod tract;

// Test utilities for backend testing
#[cfg(test)]
pub mod test_utils;

#[cfg(feature = "tract")]
pub use self::tract::TractBackend;
