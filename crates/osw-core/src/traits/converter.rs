//! Converter trait for the external OSW/OSM conversion tool.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::DataFormat;

/// Everything a converter needs for one run.
#[derive(Debug, Clone)]
pub struct ConverterRequest {
    /// Local input file.
    pub source_path: PathBuf,
    /// Scratch directory the converter may write into.
    pub work_dir: PathBuf,
    /// Format of the input file.
    pub source_format: DataFormat,
    /// Format the caller wants back.
    pub target_format: DataFormat,
    /// Prefix for output file names.
    pub prefix: String,
}

/// A synchronous-looking conversion of one input into zero or more files.
///
/// Returning an empty list means the tool ran but produced nothing.
#[async_trait]
pub trait Converter: Send + Sync + std::fmt::Debug + 'static {
    /// Human-readable converter name.
    fn name(&self) -> &str;

    /// Run one conversion and return the produced files.
    async fn convert(&self, request: &ConverterRequest) -> AppResult<Vec<PathBuf>>;
}
