//! # osw-entity
//!
//! Domain value objects for the OSW formatter. The two message families
//! (pipeline status and on-demand request/response) are fixed record types
//! parsed out of a raw [`osw_core::QueueMessage`] by a single fallible
//! constructor each. The `job` module holds the per-job state the worker
//! threads through a conversion.

pub mod job;
pub mod message;

pub use job::{JobOutcome, JobStage, MessageKind, OutputKind, ValidationResult};
pub use message::{
    OnDemandRequest, OnDemandRequestData, OnDemandResponse, OnDemandResponseData, OnDemandStatus,
    PipelineData, PipelineMessage,
};
