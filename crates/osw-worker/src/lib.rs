//! Job orchestration for the OSW formatter.
//!
//! This crate provides:
//! - [`JobContext`], the identity and private workspace of one job
//! - [`ResultPublisher`], which reports outcomes without ever failing a job
//! - [`JobRunner`], the shared acquire → convert → package → upload sequence
//! - the pipeline and on-demand job flows built on top of it
//! - [`MessageRouter`], the subscription loop that runs one task per message

pub mod context;
pub mod executor;
pub mod jobs;
pub mod publisher;
pub mod router;
pub mod runner;

pub use context::JobContext;
pub use executor::{JobExecutor, JobHandler};
pub use publisher::ResultPublisher;
pub use router::MessageRouter;
pub use runner::JobRunner;
