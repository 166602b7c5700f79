//! Shared helpers for the local inference pipeline

pub mod preprocessing;

pub use preprocessing::{ImagePreprocessor, Letterbox};
