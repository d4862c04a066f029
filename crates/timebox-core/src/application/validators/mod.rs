//! Application validators
//!
//! Input validation for the phase sub-forms.

pub mod phase_validator;

pub use phase_validator::PhaseValidator;
