//! The two job flows.

pub mod on_demand;
pub mod pipeline;

pub use on_demand::OnDemandJobHandler;
pub use pipeline::PipelineJobHandler;
