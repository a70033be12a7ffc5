//! # osw-core
//!
//! Core crate for the OSW formatter service. Contains the capability traits
//! for the external collaborators (object storage, message bus, converter),
//! configuration schemas, data format tags, the raw bus envelope, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other formatter crates.

pub mod config;
pub mod error;
pub mod message;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, JobError};
pub use message::QueueMessage;
pub use result::AppResult;
