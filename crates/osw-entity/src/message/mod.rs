//! Inbound and outbound message families.

pub mod on_demand;
pub mod pipeline;

pub use on_demand::{
    OnDemandRequest, OnDemandRequestData, OnDemandResponse, OnDemandResponseData, OnDemandStatus,
};
pub use pipeline::{PipelineData, PipelineMessage};
