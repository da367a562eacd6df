//! Embassy async tasks
//!
//! Each task runs independently and communicates via signals.

pub mod link;
pub mod outputs;
pub mod telemetry;

pub use link::link_task;
pub use outputs::outputs_task;
pub use telemetry::telemetry_task;
