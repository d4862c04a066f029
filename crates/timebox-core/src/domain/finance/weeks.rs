//! Billable duration of a timebox

use chrono::{DateTime, Utc};

use crate::domain::timebox::Timebox;

/// Billing floor and default when no start date is known
pub const MIN_WEEKS: u32 = 2;

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Elapsed weeks, rounded up, never below [`MIN_WEEKS`]
pub fn elapsed_weeks(start: Option<DateTime<Utc>>, end: DateTime<Utc>) -> u32 {
    let Some(start) = start else {
        return MIN_WEEKS;
    };
    let elapsed_ms = (end - start).num_milliseconds();
    if elapsed_ms <= 0 {
        return MIN_WEEKS;
    }
    let weeks = (elapsed_ms + WEEK_MS - 1) / WEEK_MS;
    u32::try_from(weeks).unwrap_or(u32::MAX).max(MIN_WEEKS)
}

/// End of billable work: Close, then QA, then Refinement completion, then `now`
pub fn billing_end(timebox: &Timebox, now: DateTime<Utc>) -> DateTime<Utc> {
    let fases = &timebox.fases;
    fases
        .close
        .completion
        .completed_at()
        .or(fases.close.fecha_completado)
        .or_else(|| fases.qa.completion.completed_at())
        .or_else(|| fases.refinement.completion.completed_at())
        .unwrap_or(now)
}

/// Billable weeks for a timebox
pub fn billable_weeks(timebox: &Timebox, now: DateTime<Utc>) -> u32 {
    elapsed_weeks(
        timebox.fases.planning.fecha_inicio,
        billing_end(timebox, now),
    )
}
