//! Gantt chart rows derived from timeboxes

pub mod strategy;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::timebox::{PhaseKind, Timebox, TimeboxStatus};

pub use strategy::{
    DateRange, DateStrategy, DeriveContext, Fallback, PhaseScan, PlanningDates, default_chain,
};

/// Default bar length when only a start date is known
pub const DEFAULT_SPAN_DAYS: i64 = 14;

/// Longest span accepted for undated bars (ten years)
pub const MAX_SPAN_DAYS: i64 = 3650;

/// One Gantt bar
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttTask {
    pub id: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Percent complete, 0..=100
    pub progress: u8,
    pub estado: TimeboxStatus,
    pub project_id: String,
    /// Name of the strategy that produced the dates
    pub source: &'static str,
}

/// Whether a phase carries any completion flag or date
fn phase_is_dated(timebox: &Timebox, kind: PhaseKind) -> bool {
    let fases = &timebox.fases;
    let completion = fases.completion(kind);
    if completion.completada || completion.fecha_fase.is_some() {
        return true;
    }
    match kind {
        PhaseKind::Planning => {
            fases.planning.fecha_inicio.is_some() || fases.planning.fecha_fin.is_some()
        }
        PhaseKind::KickOff => fases.kick_off.fecha_kick_off.is_some(),
        PhaseKind::Refinement => fases
            .refinement
            .revisiones
            .iter()
            .any(|r| r.fecha.is_some() || r.fecha_completado.is_some()),
        PhaseKind::Qa => {
            fases.qa.fecha_preparacion_qa.is_some() || fases.qa.fecha_entrega.is_some()
        }
        PhaseKind::Close => fases.close.fecha_completado.is_some(),
    }
}

/// Progress shown on the bar
pub fn progress(timebox: &Timebox) -> u8 {
    match timebox.estado {
        TimeboxStatus::Finished => 100,
        TimeboxStatus::Available => 10,
        TimeboxStatus::InExecution => {
            let dated = PhaseKind::ALL
                .into_iter()
                .filter(|kind| phase_is_dated(timebox, *kind))
                .count();
            (dated * 100 / PhaseKind::ALL.len()) as u8
        }
        TimeboxStatus::InDefinition => 0,
    }
}

/// Runs the strategy chain over timeboxes
pub struct GanttDeriver {
    strategies: Vec<Box<dyn DateStrategy>>,
    span: Duration,
}

impl Default for GanttDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_SPAN_DAYS)
    }
}

impl GanttDeriver {
    pub fn new(span_days: i64) -> Self {
        Self {
            strategies: default_chain(),
            span: Duration::days(span_days.clamp(1, MAX_SPAN_DAYS)),
        }
    }

    /// Replace the strategy chain
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn DateStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Derived range and the name of the strategy that matched
    pub fn derive(&self, timebox: &Timebox, now: DateTime<Utc>) -> (DateRange, &'static str) {
        let ctx = DeriveContext {
            now,
            span: self.span,
        };
        for strategy in &self.strategies {
            if let Some(range) = strategy.derive(timebox, &ctx) {
                debug!(timebox = timebox.name(), strategy = strategy.name(), "Derived gantt dates");
                return (range.normalized(), strategy.name());
            }
        }
        let end = now.checked_add_signed(self.span).unwrap_or(now);
        (DateRange::new(now, end).normalized(), Fallback.name())
    }

    pub fn task(&self, timebox: &Timebox, now: DateTime<Utc>) -> GanttTask {
        let (range, source) = self.derive(timebox, now);
        GanttTask {
            id: timebox.id.clone().unwrap_or_default(),
            name: timebox.name().to_string(),
            start: range.start,
            end: range.end,
            progress: progress(timebox),
            estado: timebox.estado,
            project_id: timebox.project_id.clone(),
            source,
        }
    }

    /// Bars for a list of timeboxes, ordered by start date
    pub fn tasks(&self, timeboxes: &[Timebox], now: DateTime<Utc>) -> Vec<GanttTask> {
        let mut tasks: Vec<GanttTask> = timeboxes.iter().map(|t| self.task(t, now)).collect();
        tasks.sort_by_key(|t| t.start);
        tasks
    }
}
