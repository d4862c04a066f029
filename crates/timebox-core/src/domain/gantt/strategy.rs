//! Date derivation strategies for Gantt bars
//!
//! Timeboxes carry dates in different phases depending on how far they got.
//! Each strategy looks at one set of fields; the first one that yields a
//! range wins.

use chrono::{DateTime, Duration, Utc};

use crate::domain::timebox::Timebox;

/// A start/end pair for one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Force a positive length: equal dates get one extra day, inverted
    /// ranges end one day after the start
    pub fn normalized(self) -> Self {
        if self.end > self.start {
            return self;
        }
        let next_day = self
            .start
            .checked_add_signed(Duration::days(1))
            .unwrap_or(self.start);
        Self::new(self.start, next_day)
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Inputs shared by every strategy
#[derive(Debug, Clone, Copy)]
pub struct DeriveContext {
    pub now: DateTime<Utc>,
    /// Length assumed when only a start date is known
    pub span: Duration,
}

pub trait DateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn derive(&self, timebox: &Timebox, ctx: &DeriveContext) -> Option<DateRange>;
}

/// Planning start, ended by Close or the planning completion date
pub struct PlanningDates;

impl DateStrategy for PlanningDates {
    fn name(&self) -> &'static str {
        "planning"
    }

    fn derive(&self, timebox: &Timebox, ctx: &DeriveContext) -> Option<DateRange> {
        let fases = &timebox.fases;
        let start = fases.planning.fecha_inicio?;
        let end = match fases
            .close
            .fecha_completado
            .or(fases.planning.completion.fecha_fase)
        {
            Some(end) => end,
            None => start.checked_add_signed(ctx.span)?,
        };
        Some(DateRange::new(start, end))
    }
}

/// Earliest and latest date found anywhere in the phases or the delivery
pub struct PhaseScan;

impl PhaseScan {
    fn collect(timebox: &Timebox) -> Vec<DateTime<Utc>> {
        let fases = &timebox.fases;
        let mut dates = vec![
            fases.planning.fecha_inicio,
            fases.planning.fecha_fin,
            fases.planning.completion.fecha_fase,
            fases.kick_off.fecha_kick_off,
            fases.kick_off.completion.fecha_fase,
            fases.refinement.completion.fecha_fase,
            fases.qa.fecha_preparacion_qa,
            fases.qa.fecha_entrega,
            fases.qa.completion.fecha_fase,
            fases.close.fecha_completado,
            fases.close.completion.fecha_fase,
        ];
        for revision in &fases.refinement.revisiones {
            dates.push(revision.fecha);
            dates.push(revision.fecha_completado);
        }
        if let Some(entrega) = &timebox.entrega {
            dates.push(entrega.fecha_entrega);
        }
        dates.into_iter().flatten().collect()
    }
}

impl DateStrategy for PhaseScan {
    fn name(&self) -> &'static str {
        "phase-scan"
    }

    fn derive(&self, timebox: &Timebox, ctx: &DeriveContext) -> Option<DateRange> {
        let dates = Self::collect(timebox);
        let start = *dates.iter().min()?;
        let end = *dates.iter().max()?;
        if dates.len() == 1 {
            return start
                .checked_add_signed(ctx.span)
                .map(|end| DateRange::new(start, end));
        }
        Some(DateRange::new(start, end))
    }
}

/// Today plus the default span
pub struct Fallback;

impl DateStrategy for Fallback {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn derive(&self, _timebox: &Timebox, ctx: &DeriveContext) -> Option<DateRange> {
        ctx.now
            .checked_add_signed(ctx.span)
            .map(|end| DateRange::new(ctx.now, end))
    }
}

/// The standard chain: planning, phase scan, fallback
pub fn default_chain() -> Vec<Box<dyn DateStrategy>> {
    vec![
        Box::new(PlanningDates),
        Box::new(PhaseScan),
        Box::new(Fallback),
    ]
}
