//! Shared builders for timebox tests

use super::entity::Timebox;
use super::team::{TeamMovilization, TeamRole};
use crate::domain::dates::parse_datetime;
use crate::domain::user::Persona;

/// A team with every role filled by `Person {i}` / id `p{i}`
pub fn full_team() -> TeamMovilization {
    let mut team = TeamMovilization::default();
    for (i, role) in TeamRole::ALL.into_iter().enumerate() {
        team.set(
            role,
            Persona::new(format!("Person {}", i)).with_id(format!("p{}", i)),
        );
    }
    team
}

/// A saved timebox with planning data filled in and nothing completed
pub fn planned_timebox() -> Timebox {
    let mut timebox = Timebox::new("proj-1");
    timebox.id = Some("tb-1".to_string());
    timebox.fases.planning.nombre = "Portal de pagos".to_string();
    timebox.fases.planning.fecha_inicio = parse_datetime("2025-01-01");
    timebox.fases.planning.esfuerzo = Some("M".to_string());
    timebox.fases.planning.skills = vec!["Rust".to_string(), "SQL".to_string()];
    timebox
}
