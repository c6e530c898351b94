//! Ordered step execution with skip flags and fail-fast handling.

use chrono::Utc;
use events::{Event, EventBus};
use provision_core::{RunOptions, RunState, StepName, StepResult, StepState};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::context::RunContext;
use super::report::RunReport;
use super::step::Step;
use crate::error::Result;
use crate::state_machine::{RunStateMachine, StepStateMachine};
use crate::steps::standard_steps;

/// Runs steps one at a time in declared order.
pub struct Sequencer {
    steps: Vec<Box<dyn Step>>,
    event_bus: Option<EventBus>,
}

/// Bookkeeping for a single run, kept apart from the steps so transitions are
/// checked in one place.
struct RunTracker {
    run_id: Uuid,
    state: RunState,
    step_states: BTreeMap<StepName, StepState>,
}

impl RunTracker {
    fn new(steps: &[Box<dyn Step>]) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::Pending,
            step_states: steps
                .iter()
                .map(|s| (s.name(), StepState::NotStarted))
                .collect(),
        }
    }

    fn move_run(&mut self, to: RunState) -> Result<()> {
        RunStateMachine::validate_transition(&self.state, &to)?;
        self.state = to;
        Ok(())
    }

    fn move_step(&mut self, name: StepName, to: StepState) -> Result<()> {
        let from = self.step_states.get(&name).copied().unwrap_or_default();
        StepStateMachine::validate_transition(&from, &to)?;
        self.step_states.insert(name, to);
        Ok(())
    }
}

impl Sequencer {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self {
            steps,
            event_bus: None,
        }
    }

    /// The nine provisioning steps in their declared order.
    pub fn standard() -> Self {
        Self::new(standard_steps())
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn step_names(&self) -> Vec<StepName> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event);
        }
    }

    /// Execute every step and return the report.
    ///
    /// Step failures are recorded in the report, not returned as `Err`. An
    /// `Err` means the sequencer itself hit an illegal state transition.
    pub async fn run(&self, ctx: &mut RunContext, options: &RunOptions) -> Result<RunReport> {
        let mut tracker = RunTracker::new(&self.steps);
        let run_id = tracker.run_id;
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(self.steps.len());
        let mut degraded = false;
        let mut aborted = false;

        tracker.move_run(RunState::Running)?;
        info!(run_id = %run_id, steps = self.steps.len(), "Starting provisioning run");
        self.emit(Event::RunStarted {
            run_id,
            total_steps: self.steps.len(),
        });

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();

            if options.is_skipped(name) {
                tracker.move_step(name, StepState::Skipped)?;
                info!(step = %name, "Step skipped");
                results.push(StepResult::skipped(name));
                self.emit(Event::StepSkipped {
                    run_id,
                    step: name.to_string(),
                });
                continue;
            }

            tracker.move_step(name, StepState::Running)?;
            debug!(step = %name, index, "Step started");
            self.emit(Event::StepStarted {
                run_id,
                step: name.to_string(),
                index,
            });

            let started = Instant::now();
            let outcome = step.run(ctx).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok(success) => {
                    tracker.move_step(name, StepState::Succeeded)?;
                    info!(step = %name, outcome = %success.outcome, duration_ms, "Step finished");
                    StepResult::completed(name, success.outcome, success.detail, duration_ms)
                }
                Err(e) => {
                    tracker.move_step(name, StepState::Failed)?;
                    if step.best_effort() {
                        warn!(step = %name, error = %e, "Best-effort step failed, continuing");
                        degraded = true;
                    } else {
                        error!(step = %name, error = %e, "Step failed, aborting run");
                        aborted = true;
                    }
                    StepResult::failed(name, e.to_string(), duration_ms)
                }
            };

            self.emit(Event::StepFinished {
                run_id,
                step: name.to_string(),
                outcome: result.outcome().to_string(),
                detail: result.detail().map(str::to_string),
                duration_ms,
            });
            results.push(result);

            if name == StepName::Validation {
                if let Some(report) = ctx.validation() {
                    self.emit(Event::ValidationCompleted {
                        run_id,
                        accessible: report.accessible_count(),
                        total: report.len(),
                    });
                }
            }

            if aborted {
                break;
            }
        }

        let final_state = if aborted {
            RunState::Aborted
        } else if degraded {
            RunState::Degraded
        } else {
            RunState::Done
        };
        tracker.move_run(final_state)?;

        info!(run_id = %run_id, state = %final_state, results = results.len(), "Provisioning run finished");
        self.emit(Event::RunFinished {
            run_id,
            state: final_state.to_string(),
        });

        Ok(RunReport {
            run_id,
            state: final_state,
            results,
            step_states: tracker.step_states,
            handles: ctx.handles().clone(),
            validation: ctx.take_validation(),
            started_at,
            finished_at: Utc::now(),
        })
    }
}
