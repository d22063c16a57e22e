//! HTTP plumbing shared by the motorwatch services: the middleware stack
//! every router is wrapped in, and the graceful shutdown signal.

mod layers;
mod shutdown;

pub use layers::{build_cors_layer, with_service_layers, REQUEST_ID_HEADER};
pub use shutdown::shutdown_signal;
