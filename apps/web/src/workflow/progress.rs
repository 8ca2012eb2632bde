//! Cosmetic progress for the two in-flight phases.
//!
//! The step shown is derived from elapsed wall time only. The backend calls are
//! single opaque requests, so nothing here reflects real progress and nothing
//! here may feed back into control flow.

use std::time::Duration;

use serde::Serialize;

pub struct ProgressStep {
    pub id: &'static str,
    pub label: &'static str,
}

pub struct ProgressPlan {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub steps: &'static [ProgressStep],
    pub tick: Duration,
}

pub const ANALYSIS_PLAN: ProgressPlan = ProgressPlan {
    title: "Analyzing Your Application...",
    subtitle: "Our agents are parsing your CV and researching the company.",
    steps: &[
        ProgressStep {
            id: "extract",
            label: "CV Extraction",
        },
        ProgressStep {
            id: "analyze",
            label: "JD Intelligence",
        },
        ProgressStep {
            id: "research",
            label: "Deep Company Research",
        },
    ],
    tick: Duration::from_millis(4000),
};

pub const TAILORING_PLAN: ProgressPlan = ProgressPlan {
    title: "Tailoring Your Documents...",
    subtitle: "Generating your personalized resume, cover letter, and email.",
    steps: &[
        ProgressStep {
            id: "tailor",
            label: "Resume Optimization",
        },
        ProgressStep {
            id: "write",
            label: "Asset Generation",
        },
    ],
    tick: Duration::from_millis(3000),
};

/// Index of the step to highlight, clamped to the last step.
pub fn current_step(elapsed: Duration, tick: Duration, len: usize) -> usize {
    if len == 0 || tick.is_zero() {
        return 0;
    }
    let ticks = (elapsed.as_millis() / tick.as_millis()) as usize;
    ticks.min(len - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub id: &'static str,
    pub label: &'static str,
    pub state: StepState,
}

impl StepView {
    pub fn is_active(&self) -> bool {
        self.state == StepState::Active
    }

    pub fn is_completed(&self) -> bool {
        self.state == StepState::Completed
    }
}

impl ProgressPlan {
    pub fn snapshot(&self, elapsed: Duration) -> Vec<StepView> {
        let current = current_step(elapsed, self.tick, self.steps.len());
        self.steps
            .iter()
            .enumerate()
            .map(|(idx, step)| StepView {
                id: step.id,
                label: step.label,
                state: if idx < current {
                    StepState::Completed
                } else if idx == current {
                    StepState::Active
                } else {
                    StepState::Pending
                },
            })
            .collect()
    }
}
