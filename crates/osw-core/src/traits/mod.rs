//! Core traits defined in `osw-core` and implemented by other crates.

pub mod bus;
pub mod converter;
pub mod storage;

pub use bus::{MessageBus, MessageStream};
pub use converter::{Converter, ConverterRequest};
pub use storage::{ByteStream, ObjectStore};
