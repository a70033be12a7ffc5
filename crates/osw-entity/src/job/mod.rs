//! Per-job value objects.

pub mod outcome;
pub mod stage;

pub use outcome::{JobOutcome, ValidationResult};
pub use stage::{JobStage, MessageKind, OutputKind};
