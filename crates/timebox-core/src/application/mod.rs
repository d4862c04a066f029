//! Application service layer
//!
//! Orchestrates domain operations against the repositories and keeps the
//! entity stores in step with what the backend confirmed.

pub mod errors;
pub mod finance_service;
pub mod inbox_service;
pub mod phase_form;
pub mod project_service;
pub mod stepper;
pub mod timebox_service;
pub mod validators;


pub use errors::{FieldError, ValidationErrors};
pub use finance_service::FinanceService;
pub use inbox_service::InboxService;
pub use phase_form::{PhaseOutcome, TimeboxPhaseForm};
pub use project_service::ProjectService;
pub use stepper::{Step, Stepper};
pub use timebox_service::TimeboxService;
