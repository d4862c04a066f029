//! Offer publication and developer applications (postulaciones)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::team::TeamRole;
use crate::domain::user::{Persona, User};

/// Review status of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EstadoSolicitud {
    #[default]
    Pendiente,
    Aprobada,
    Rechazada,
}

impl EstadoSolicitud {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "Pendiente",
            Self::Aprobada => "Aprobada",
            Self::Rechazada => "Rechazada",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asignacion {
    #[serde(default)]
    pub asignado: bool,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_asignacion: Option<DateTime<Utc>>,
}

/// A developer's application to a role (or general interest when `rol` is `None`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Postulacion {
    #[serde(default)]
    pub id: String,
    #[serde(
        default,
        with = "super::team::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub rol: Option<TeamRole>,
    #[serde(default)]
    pub desarrollador: Persona,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_postulacion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estado_solicitud: EstadoSolicitud,
    #[serde(default)]
    pub asignacion: Asignacion,
}

impl Postulacion {
    /// A new pending application
    pub fn new(rol: Option<TeamRole>, desarrollador: Persona, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rol,
            desarrollador,
            fecha_postulacion: Some(now),
            estado_solicitud: EstadoSolicitud::Pendiente,
            asignacion: Asignacion::default(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.estado_solicitud == EstadoSolicitud::Pendiente
    }

    pub fn is_approved(&self) -> bool {
        self.estado_solicitud == EstadoSolicitud::Aprobada
    }

    pub fn is_rejected(&self) -> bool {
        self.estado_solicitud == EstadoSolicitud::Rechazada
    }

    pub fn belongs_to(&self, user: &User) -> bool {
        self.desarrollador.is_user(user)
    }
}

/// Offer publication block (`publicacionOferta`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicacionOferta {
    #[serde(default)]
    pub publicado: bool,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_publicacion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub postulaciones: Vec<Postulacion>,
}

impl PublicacionOferta {
    /// Applications made by a user
    pub fn by_user<'a>(&'a self, user: &'a User) -> impl Iterator<Item = &'a Postulacion> {
        self.postulaciones.iter().filter(move |p| p.belongs_to(user))
    }

    /// Whether the user has a live (non rejected) application for `rol`
    ///
    /// `rol == None` checks for a general-interest application.
    pub fn has_applied(&self, user: &User, rol: Option<TeamRole>) -> bool {
        self.by_user(user)
            .any(|p| p.rol == rol && !p.is_rejected())
    }

    /// The approved application for a role, if any
    pub fn approved_for(&self, rol: TeamRole) -> Option<&Postulacion> {
        self.postulaciones
            .iter()
            .find(|p| p.rol == Some(rol) && p.is_approved())
    }

    pub fn find(&self, postulacion_id: &str) -> Option<&Postulacion> {
        self.postulaciones.iter().find(|p| p.id == postulacion_id)
    }

    pub fn find_mut(&mut self, postulacion_id: &str) -> Option<&mut Postulacion> {
        self.postulaciones.iter_mut().find(|p| p.id == postulacion_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("u1", "Ana", "ana@example.com")
    }

    #[test]
    fn test_has_applied_per_role() {
        let mut offer = PublicacionOferta::default();
        offer.postulaciones.push(Postulacion::new(
            Some(TeamRole::SolutionDeveloper),
            Persona::from(&user()),
            Utc::now(),
        ));

        assert!(offer.has_applied(&user(), Some(TeamRole::SolutionDeveloper)));
        assert!(!offer.has_applied(&user(), Some(TeamRole::SolutionTester)));
        assert!(!offer.has_applied(&user(), None));
    }

    #[test]
    fn test_rejected_application_does_not_count() {
        let mut offer = PublicacionOferta::default();
        let mut postulacion = Postulacion::new(None, Persona::from(&user()), Utc::now());
        postulacion.estado_solicitud = EstadoSolicitud::Rechazada;
        offer.postulaciones.push(postulacion);

        assert!(!offer.has_applied(&user(), None));
    }

    #[test]
    fn test_approved_for() {
        let mut offer = PublicacionOferta::default();
        let mut postulacion = Postulacion::new(
            Some(TeamRole::SolutionTester),
            Persona::new("Bo"),
            Utc::now(),
        );
        postulacion.estado_solicitud = EstadoSolicitud::Aprobada;
        let id = postulacion.id.clone();
        offer.postulaciones.push(postulacion);

        assert_eq!(offer.approved_for(TeamRole::SolutionTester).map(|p| p.id.as_str()), Some(id.as_str()));
        assert!(offer.approved_for(TeamRole::SolutionDeveloper).is_none());
    }

    #[test]
    fn test_wire_status_names() {
        let json = serde_json::json!({
            "id": "p1",
            "rol": "solutionDeveloper",
            "desarrollador": { "nombre": "Ana" },
            "estadoSolicitud": "Aprobada",
            "asignacion": { "asignado": true }
        });
        let postulacion: Postulacion = serde_json::from_value(json).unwrap();
        assert!(postulacion.is_approved());
        assert!(postulacion.asignacion.asignado);
        assert_eq!(postulacion.rol, Some(TeamRole::SolutionDeveloper));
    }

    #[test]
    fn test_role_accepts_labels_and_blanks() {
        let read = |rol: serde_json::Value| -> Option<TeamRole> {
            let json = serde_json::json!({ "id": "p1", "rol": rol });
            serde_json::from_value::<Postulacion>(json).unwrap().rol
        };
        assert_eq!(read("Solution Developer".into()), Some(TeamRole::SolutionDeveloper));
        assert_eq!(read("technical_advisor".into()), Some(TeamRole::TechnicalAdvisor));
        assert_eq!(read("".into()), None);
        assert_eq!(read(serde_json::Value::Null), None);
        assert_eq!(read("scrumMaster".into()), None);

        let out = serde_json::to_value(Postulacion::new(
            Some(TeamRole::BusinessAdvisor),
            Persona::default(),
            Utc::now(),
        ))
        .unwrap();
        assert_eq!(out["rol"], "businessAdvisor");
    }
}
