//! End-to-end tests of the job engine over a temp-dir object store, the
//! in-memory bus and a scripted converter.

mod helpers;
mod on_demand_test;
mod pipeline_test;
mod router_test;
