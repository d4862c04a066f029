//! Timebox domain module
//!
//! # Architecture
//!
//! - **Entities**: `Timebox`, the five phase records, `Entrega`, `PublicacionOferta`
//! - **Value types**: `TimeboxStatus`, `PhaseKind`, `TeamRole`, `Postulacion`
//! - **Repository**: `TimeboxRepository` for backend operations
//!
//! `TimeboxStatus` is derived, never assigned: every mutation that completes a
//! phase, publishes the offer or fills a role re-derives it.

pub mod entity;
pub mod phases;
pub mod postulation;
pub mod repository;
pub mod status;
pub mod team;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export main types
pub use entity::{AssignRoleRequest, CatalogEntry, Entrega, Timebox};
pub use phases::{
    ClosePhase, Completion, Cumplimiento, KickOffPhase, PhaseKind, Phases, PlanningPhase, QaPhase,
    RefinementPhase, Revision,
};
pub use postulation::{Asignacion, EstadoSolicitud, Postulacion, PublicacionOferta};
pub use repository::TimeboxRepository;
pub use status::TimeboxStatus;
pub use team::{TeamMovilization, TeamRole};
