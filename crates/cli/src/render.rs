use colored::Colorize;
use events::{Event, EventEnvelope};

/// Turns run events into progress lines on stdout.
#[derive(Debug, Default)]
pub struct ProgressRenderer {
    total: usize,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, envelope: &EventEnvelope) {
        if let Some(line) = self.line(&envelope.event) {
            println!("{}", line);
        }
    }

    fn line(&mut self, event: &Event) -> Option<String> {
        match event {
            Event::RunStarted { run_id, total_steps } => {
                self.total = *total_steps;
                Some(format!(
                    "{} run {} ({} steps)",
                    "Provisioning".bold(),
                    run_id,
                    total_steps
                ))
            }
            Event::StepStarted { step, index, .. } => Some(format!(
                "[{}/{}] {} ...",
                index + 1,
                self.total,
                step
            )),
            Event::StepSkipped { step, .. } => {
                Some(format!("      {} {}", step, "skipped".dimmed()))
            }
            Event::StepFinished {
                step,
                outcome,
                detail,
                duration_ms,
                ..
            } => {
                let status = match outcome.as_str() {
                    "failed" => outcome.red().bold(),
                    "created" => outcome.green().bold(),
                    _ => outcome.green(),
                };
                let detail = detail.as_deref().unwrap_or("");
                Some(format!(
                    "      {} {} ({}ms) {}",
                    step, status, duration_ms, detail
                ))
            }
            Event::ValidationCompleted {
                accessible, total, ..
            } => Some(format!("      {}/{} resources accessible", accessible, total)),
            Event::RunFinished { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_counter_uses_total() {
        let mut renderer = ProgressRenderer::new();
        let run_id = Default::default();

        renderer.line(&Event::RunStarted {
            run_id,
            total_steps: 9,
        });
        let line = renderer
            .line(&Event::StepStarted {
                run_id,
                step: "object-store".to_string(),
                index: 2,
            })
            .unwrap();
        assert_eq!(line, "[3/9] object-store ...");
    }

    #[test]
    fn test_run_finished_prints_nothing() {
        let mut renderer = ProgressRenderer::new();
        let line = renderer.line(&Event::RunFinished {
            run_id: Default::default(),
            state: "done".to_string(),
        });
        assert!(line.is_none());
    }

    #[test]
    fn test_finished_line_includes_detail() {
        let mut renderer = ProgressRenderer::new();
        let line = renderer
            .line(&Event::StepFinished {
                run_id: Default::default(),
                step: "object-store".to_string(),
                outcome: "created".to_string(),
                detail: Some("s3://bucket".to_string()),
                duration_ms: 12,
            })
            .unwrap();
        assert!(line.contains("object-store"));
        assert!(line.contains("(12ms) s3://bucket"));
    }
}
