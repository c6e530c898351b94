//! Progress events for provisioning runs
//!
//! The sequencer publishes onto an [`EventBus`]; front ends subscribe and
//! render progress as steps start and finish.

mod bus;
mod types;

pub use bus::{drain_run, EventBus};
pub use types::*;
