//! Shared value types.

pub mod format;

pub use format::{ConversionDirection, DataFormat};
