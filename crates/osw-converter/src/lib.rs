//! # osw-converter
//!
//! Everything between a downloaded input and the one file that gets
//! uploaded: format dispatch and time-boxing around the external converter
//! ([`ConversionInvoker`]), normalization of its output into a single
//! deliverable ([`OutputPackager`]), and the subprocess implementation of the
//! converter capability ([`CommandConverter`]).

pub mod error;
pub mod executor;
pub mod filesystem;
pub mod invoker;
pub mod metrics;
pub mod models;
pub mod packager;

pub use error::ConversionError;
pub use executor::CommandConverter;
pub use filesystem::FsUtils;
pub use invoker::ConversionInvoker;
pub use metrics::{ConversionMetrics, MetricsSnapshot};
pub use models::{ConversionRequest, ConversionResult};
pub use packager::OutputPackager;
