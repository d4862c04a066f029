//! Phase stepper
//!
//! Tracks which phase is on screen and gates forward navigation on the
//! previous step being completed. Moving back is always allowed.

use serde::Serialize;

use crate::domain::timebox::{PhaseKind, Phases};
use crate::error::{Error, Result};

/// One step of the stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    pub phase: PhaseKind,
    pub completed: bool,
}

impl Step {
    pub fn label(&self) -> &'static str {
        self.phase.label()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stepper {
    steps: [Step; 5],
    active: usize,
}

impl Stepper {
    /// Build from the phase flags, opening the first incomplete phase
    pub fn from_phases(phases: &Phases) -> Self {
        let mut stepper = Self {
            steps: PhaseKind::ALL.map(|phase| Step {
                phase,
                completed: false,
            }),
            active: 0,
        };
        stepper.sync(phases);
        stepper.active = phases.current().index();
        stepper
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_phase(&self) -> PhaseKind {
        self.steps[self.active].phase
    }

    pub fn is_completed(&self, phase: PhaseKind) -> bool {
        self.steps[phase.index()].completed
    }

    /// Whether step `index` may be opened from the active one
    pub fn can_advance_to(&self, index: usize) -> bool {
        if index >= self.steps.len() {
            return false;
        }
        index <= self.active || self.steps[index - 1].completed
    }

    /// Open step `index`
    pub fn go_to(&mut self, index: usize) -> Result<PhaseKind> {
        if !self.can_advance_to(index) {
            let target = PhaseKind::from_index(index)
                .map(|p| p.label().to_string())
                .unwrap_or_else(|| format!("step {}", index));
            return Err(Error::BusinessRule(format!(
                "Cannot open {}: the previous phase is not completed",
                target
            )));
        }
        self.active = index;
        Ok(self.active_phase())
    }

    /// Open the next step
    pub fn next(&mut self) -> Result<PhaseKind> {
        self.go_to(self.active + 1)
    }

    /// Open the previous step; stays on the first one
    pub fn back(&mut self) -> PhaseKind {
        self.active = self.active.saturating_sub(1);
        self.active_phase()
    }

    /// Record a completed phase
    pub fn mark_completed(&mut self, phase: PhaseKind) {
        self.steps[phase.index()].completed = true;
    }

    /// Refresh the completion flags from confirmed phase data
    pub fn sync(&mut self, phases: &Phases) {
        for (step, completed) in self.steps.iter_mut().zip(phases.completed_flags()) {
            step.completed = completed;
        }
    }
}
