//! Step execution core: the [`Step`] abstraction, the per-run context and the
//! sequencer that drives them.

mod context;
mod report;
mod sequencer;
mod step;

pub use context::RunContext;
pub use report::RunReport;
pub use sequencer::Sequencer;
pub use step::{Step, StepSuccess};
