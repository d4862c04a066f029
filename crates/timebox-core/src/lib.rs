//! Timebox Track Core Library
//!
//! This crate provides the core functionality for Timebox Track, including:
//! - Timebox phase lifecycle (Planning, Kick Off, Refinement, QA, Close)
//! - Phase form state machine and stepper gating
//! - Task inbox filtering and applications
//! - Payment-order generation and the finance workflow
//! - Gantt date derivation
//! - REST client with envelope unwrapping and field normalization
//! - Observable entity stores

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod store;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod error_tests;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::{
        FinanceService, InboxService, PhaseOutcome, ProjectService, TimeboxPhaseForm,
        TimeboxService,
    };
    pub use crate::config::Config;
    pub use crate::domain::timebox::{PhaseKind, TeamRole, Timebox, TimeboxStatus};
    pub use crate::domain::user::{Persona, User};
    pub use crate::error::{Error, Result};
    pub use crate::infrastructure::{ApiClient, SessionStore};
    pub use crate::store::EntityStore;
}
