//! Timebox aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phases::{PhaseKind, Phases};
use super::postulation::PublicacionOferta;
use super::status::TimeboxStatus;
use super::team::TeamMovilization;
use crate::domain::attachment::Adjunto;
use crate::domain::user::Persona;
use crate::error::{Error, Result};

/// Delivery record (`entrega`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrega {
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_entrega: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub archivos: Vec<Adjunto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsable: Option<Persona>,
}

/// A fixed-duration unit of work progressing through five phases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timebox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_timebox: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria_id: Option<String>,
    #[serde(default)]
    pub estado: TimeboxStatus,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monto: Option<f64>,
    #[serde(default)]
    pub fases: Phases,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrega: Option<Entrega>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicacion_oferta: Option<PublicacionOferta>,
}

impl Timebox {
    /// A new, unsaved timebox inside a project
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    /// Whether the backend has assigned an id
    pub fn is_persisted(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// The backend id, or an error for unsaved timeboxes
    pub fn require_id(&self) -> Result<&str> {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(Error::InvalidInput(
                "Timebox has not been saved yet".to_string(),
            )),
        }
    }

    /// Display name: the planning name, else the id
    pub fn name(&self) -> &str {
        let nombre = self.fases.planning.nombre.trim();
        if nombre.is_empty() {
            self.id.as_deref().unwrap_or("(sin nombre)")
        } else {
            nombre
        }
    }

    pub fn is_published(&self) -> bool {
        self.publicacion_oferta.as_ref().is_some_and(|o| o.publicado)
    }

    pub fn team(&self) -> Option<&TeamMovilization> {
        self.fases.kick_off.team_movilization.as_ref()
    }

    /// The team, created empty when absent
    pub fn team_mut(&mut self) -> &mut TeamMovilization {
        self.fases
            .kick_off
            .team_movilization
            .get_or_insert_with(TeamMovilization::default)
    }

    pub fn roles_filled(&self) -> bool {
        self.fases.kick_off.roles_filled()
    }

    /// Name in the solution developer slot (empty when unassigned)
    pub fn solution_developer_name(&self) -> &str {
        self.team()
            .map(|t| t.solution_developer.nombre.trim())
            .unwrap_or("")
    }

    pub fn offer(&self) -> Option<&PublicacionOferta> {
        self.publicacion_oferta.as_ref()
    }

    /// The offer block, created empty when absent
    pub fn offer_mut(&mut self) -> &mut PublicacionOferta {
        self.publicacion_oferta
            .get_or_insert_with(PublicacionOferta::default)
    }

    /// Re-derive `estado` from phases, publication and team
    pub fn recompute_status(&mut self) -> TimeboxStatus {
        self.estado = TimeboxStatus::derive(
            self.fases.is_completed(PhaseKind::Close),
            self.roles_filled(),
            self.is_published(),
        );
        self.estado
    }

    /// Mark a phase complete and re-derive the status
    ///
    /// Returns true when the phase was not complete before.
    pub fn complete_phase(&mut self, kind: PhaseKind, now: DateTime<Utc>) -> bool {
        let newly = self.fases.completion_mut(kind).mark_complete(now);
        self.recompute_status();
        newly
    }

    /// Make the offer visible to applicants
    pub fn publish(&mut self, now: DateTime<Utc>) {
        let offer = self.offer_mut();
        offer.publicado = true;
        if offer.fecha_publicacion.is_none() {
            offer.fecha_publicacion = Some(now);
        }
        self.recompute_status();
    }

    pub fn publication_date(&self) -> Option<DateTime<Utc>> {
        self.offer().and_then(|o| o.fecha_publicacion)
    }
}

/// Type or category catalog entry (`/timeboxes/types`, `/timeboxes/categories`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria_id: Option<String>,
}

/// Body of `/timeboxes/{id}/assign-role`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub postulacion_id: String,
    pub rol: super::team::TeamRole,
    pub desarrollador: Persona,
}
