//! The five timebox phases and their business fields

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::team::TeamMovilization;
use crate::domain::user::Persona;

/// Phase identifier, linearly ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseKind {
    Planning,
    KickOff,
    Refinement,
    Qa,
    Close,
}

impl PhaseKind {
    /// All phases in lifecycle order
    pub const ALL: [PhaseKind; 5] = [
        PhaseKind::Planning,
        PhaseKind::KickOff,
        PhaseKind::Refinement,
        PhaseKind::Qa,
        PhaseKind::Close,
    ];

    /// Position in the lifecycle (0-based)
    pub fn index(&self) -> usize {
        match self {
            Self::Planning => 0,
            Self::KickOff => 1,
            Self::Refinement => 2,
            Self::Qa => 3,
            Self::Close => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Wire key inside `fases`
    pub fn key(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::KickOff => "kickOff",
            Self::Refinement => "refinement",
            Self::Qa => "qa",
            Self::Close => "close",
        }
    }

    /// Stepper label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::KickOff => "Kick Off",
            Self::Refinement => "Refinement",
            Self::Qa => "QA",
            Self::Close => "Close",
        }
    }

    /// Parse a phase name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "planning" => Some(Self::Planning),
            "kickoff" => Some(Self::KickOff),
            "refinement" => Some(Self::Refinement),
            "qa" => Some(Self::Qa),
            "close" => Some(Self::Close),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_last(&self) -> bool {
        matches!(self, Self::Close)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Completion flag shared by every phase
///
/// `fecha_fase` is written once, when `completada` first flips to true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    #[serde(default)]
    pub completada: bool,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_fase: Option<DateTime<Utc>>,
}

impl Completion {
    /// Mark complete; returns true only on the first call
    pub fn mark_complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.completada {
            if self.fecha_fase.is_none() {
                self.fecha_fase = Some(now);
            }
            return false;
        }
        self.completada = true;
        if self.fecha_fase.is_none() {
            self.fecha_fase = Some(now);
        }
        true
    }

    /// Completion date, only when actually completed
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        if self.completada { self.fecha_fase } else { None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningPhase {
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_inicio: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_fin: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esfuerzo: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_leader: Option<Persona>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alcance: Option<String>,
    #[serde(flatten)]
    pub completion: Completion,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickOffPhase {
    #[serde(
        default,
        rename = "fechaKickOff",
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_kick_off: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_movilization: Option<TeamMovilization>,
    #[serde(default)]
    pub participantes: Vec<Persona>,
    #[serde(default)]
    pub lista_acuerdos: Vec<String>,
    #[serde(flatten)]
    pub completion: Completion,
}

impl KickOffPhase {
    /// Whether all five team roles have a person
    pub fn roles_filled(&self) -> bool {
        self.team_movilization
            .as_ref()
            .is_some_and(TeamMovilization::all_filled)
    }
}

/// A review request inside Refinement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    #[serde(default)]
    pub id: String,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha: Option<DateTime<Utc>>,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub completada: bool,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_completado: Option<DateTime<Utc>>,
}

impl Revision {
    /// Create a pending review request
    pub fn new(descripcion: impl Into<String>, fecha: Option<DateTime<Utc>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fecha,
            descripcion: descripcion.into(),
            completada: false,
            fecha_completado: None,
        }
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        if !self.completada {
            self.completada = true;
            self.fecha_completado = Some(now);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementPhase {
    #[serde(default)]
    pub revisiones: Vec<Revision>,
    #[serde(flatten)]
    pub completion: Completion,
}

impl RefinementPhase {
    /// Complete one review request; the phase itself stays open
    pub fn complete_revision(&mut self, revision_id: &str, now: DateTime<Utc>) -> bool {
        match self.revisiones.iter_mut().find(|r| r.id == revision_id) {
            Some(revision) => {
                revision.complete(now);
                true
            }
            None => false,
        }
    }

    pub fn pending_revisions(&self) -> usize {
        self.revisiones.iter().filter(|r| !r.completada).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPhase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado_consolidacion: Option<String>,
    #[serde(
        default,
        rename = "fechaPreparacionQa",
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_preparacion_qa: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_entrega: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacion: Option<String>,
    #[serde(flatten)]
    pub completion: Completion,
}

/// Degree of fulfilment recorded at Close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cumplimiento {
    Total,
    Parcial,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePhase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumplimiento: Option<Cumplimiento>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacion: Option<String>,
    #[serde(default)]
    pub mejoras: Vec<String>,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_completado: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub completion: Completion,
}

/// All five phases of a timebox (`fases`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phases {
    #[serde(default)]
    pub planning: PlanningPhase,
    #[serde(default)]
    pub kick_off: KickOffPhase,
    #[serde(default)]
    pub refinement: RefinementPhase,
    #[serde(default)]
    pub qa: QaPhase,
    #[serde(default)]
    pub close: ClosePhase,
}

impl Phases {
    pub fn completion(&self, kind: PhaseKind) -> &Completion {
        match kind {
            PhaseKind::Planning => &self.planning.completion,
            PhaseKind::KickOff => &self.kick_off.completion,
            PhaseKind::Refinement => &self.refinement.completion,
            PhaseKind::Qa => &self.qa.completion,
            PhaseKind::Close => &self.close.completion,
        }
    }

    pub fn completion_mut(&mut self, kind: PhaseKind) -> &mut Completion {
        match kind {
            PhaseKind::Planning => &mut self.planning.completion,
            PhaseKind::KickOff => &mut self.kick_off.completion,
            PhaseKind::Refinement => &mut self.refinement.completion,
            PhaseKind::Qa => &mut self.qa.completion,
            PhaseKind::Close => &mut self.close.completion,
        }
    }

    pub fn is_completed(&self, kind: PhaseKind) -> bool {
        self.completion(kind).completada
    }

    /// Completion flags in lifecycle order
    pub fn completed_flags(&self) -> [bool; 5] {
        PhaseKind::ALL.map(|kind| self.is_completed(kind))
    }

    /// First phase not yet completed, or Close when everything is done
    pub fn current(&self) -> PhaseKind {
        PhaseKind::ALL
            .into_iter()
            .find(|kind| !self.is_completed(*kind))
            .unwrap_or(PhaseKind::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dates::parse_datetime;

    #[test]
    fn test_phase_order() {
        assert_eq!(PhaseKind::Planning.next(), Some(PhaseKind::KickOff));
        assert_eq!(PhaseKind::Close.next(), None);
        for (i, kind) in PhaseKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(PhaseKind::parse(kind.key()), Some(kind));
        }
        assert_eq!(PhaseKind::parse("KICK-OFF"), Some(PhaseKind::KickOff));
        assert_eq!(PhaseKind::parse("delivery"), None);
    }

    #[test]
    fn test_fecha_fase_set_exactly_once() {
        let first = parse_datetime("2025-01-01").unwrap();
        let later = parse_datetime("2025-02-01").unwrap();
        let mut completion = Completion::default();

        assert!(completion.mark_complete(first));
        assert!(!completion.mark_complete(later));
        assert_eq!(completion.fecha_fase, Some(first));
        assert_eq!(completion.completed_at(), Some(first));
    }

    #[test]
    fn test_current_phase_is_first_incomplete() {
        let mut phases = Phases::default();
        assert_eq!(phases.current(), PhaseKind::Planning);

        let now = Utc::now();
        phases.completion_mut(PhaseKind::Planning).mark_complete(now);
        phases.completion_mut(PhaseKind::KickOff).mark_complete(now);
        assert_eq!(phases.current(), PhaseKind::Refinement);
        assert_eq!(phases.completed_flags(), [true, true, false, false, false]);
    }

    #[test]
    fn test_revision_completion_does_not_complete_phase() {
        let mut refinement = RefinementPhase::default();
        let revision = Revision::new("Revisar alcance", None);
        let id = revision.id.clone();
        refinement.revisiones.push(revision);

        assert!(refinement.complete_revision(&id, Utc::now()));
        assert!(!refinement.complete_revision("missing", Utc::now()));
        assert_eq!(refinement.pending_revisions(), 0);
        assert!(!refinement.completion.completada);
    }

    #[test]
    fn test_phase_wire_shape() {
        let json = serde_json::json!({
            "planning": {
                "nombre": "Portal",
                "fechaInicio": "2025-01-01",
                "completada": true,
                "fechaFase": "2025-01-02T10:00:00Z"
            },
            "kickOff": { "fechaKickOff": "2025-01-03" },
            "qa": { "fechaPreparacionQa": "2025-01-20" }
        });
        let phases: Phases = serde_json::from_value(json).unwrap();
        assert_eq!(phases.planning.nombre, "Portal");
        assert!(phases.planning.completion.completada);
        assert!(phases.planning.fecha_inicio.is_some());
        assert!(phases.kick_off.fecha_kick_off.is_some());
        assert!(phases.qa.fecha_preparacion_qa.is_some());

        let back = serde_json::to_value(&phases).unwrap();
        assert_eq!(back["planning"]["completada"], true);
        assert!(back["planning"]["fechaFase"].is_string());
    }
}
