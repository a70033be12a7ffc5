//! # osw-storage
//!
//! Object storage for the OSW formatter: parsing of the locators carried by
//! inbound messages, the local filesystem provider, and the streaming
//! download used to acquire job inputs.

pub mod locator;
pub mod providers;
pub mod transfer;

pub use locator::BlobLocator;
pub use providers::LocalObjectStore;
pub use transfer::download_to_file;
