//! Payment orders (órdenes de pago)

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::attachment::Adjunto;
use crate::domain::timebox::TeamRole;
use crate::error::{Error, Result};

/// Payment order status
///
/// Moves forward only: Pendiente → Aprobada → Pagada, or to Rechazada
/// from any non-final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pendiente,
    Aprobada,
    Pagada,
    Rechazada,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "Pendiente",
            Self::Aprobada => "Aprobada",
            Self::Pagada => "Pagada",
            Self::Rechazada => "Rechazada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" => Some(Self::Pendiente),
            "aprobada" => Some(Self::Aprobada),
            "pagada" => Some(Self::Pagada),
            "rechazada" => Some(Self::Rechazada),
            _ => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Pagada | Self::Rechazada)
    }

    /// Whether `next` is a legal forward move from this status
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pendiente, Self::Aprobada)
                | (Self::Aprobada, Self::Pagada)
                | (Self::Pendiente, Self::Rechazada)
                | (Self::Aprobada, Self::Rechazada)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment issued to a role holder when a timebox closes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdenDePago {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub developer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_nombre: Option<String>,
    #[serde(default)]
    pub monto: f64,
    #[serde(default)]
    pub moneda: String,
    #[serde(default)]
    pub concepto: String,
    #[serde(default)]
    pub estado: PaymentStatus,
    #[serde(default)]
    pub timebox_id: String,
    /// Team role key (`solutionDeveloper`, ...)
    #[serde(default)]
    pub rol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semanas: Option<u32>,
    #[serde(
        default,
        with = "crate::domain::dates::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_creacion: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprobante: Option<Adjunto>,
}

impl OrdenDePago {
    /// The team role this order pays for, when it is one of the standard roles
    pub fn team_role(&self) -> Option<TeamRole> {
        TeamRole::from_key(&self.rol)
    }

    /// Idempotency key: one order per role per timebox
    pub fn key(&self) -> (&str, &str) {
        (&self.timebox_id, &self.rol)
    }

    /// Check and apply a forward status move
    pub fn transition_to(&mut self, next: PaymentStatus) -> Result<()> {
        if !self.estado.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                entity: "payment order".to_string(),
                from: self.estado.to_string(),
                to: next.to_string(),
            });
        }
        self.estado = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> OrdenDePago {
        OrdenDePago {
            id: Some("op-1".to_string()),
            developer_id: "dev-1".to_string(),
            developer_nombre: None,
            monto: 1200.0,
            moneda: "USD".to_string(),
            concepto: "Pago".to_string(),
            estado: PaymentStatus::Pendiente,
            timebox_id: "tb-1".to_string(),
            rol: "solutionDeveloper".to_string(),
            semanas: Some(2),
            fecha_creacion: None,
            comprobante: None,
        }
    }

    #[test]
    fn test_forward_transitions() {
        let mut o = order();
        o.transition_to(PaymentStatus::Aprobada).unwrap();
        o.transition_to(PaymentStatus::Pagada).unwrap();
        assert_eq!(o.estado, PaymentStatus::Pagada);
        assert!(o.estado.is_final());
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut o = order();
        o.estado = PaymentStatus::Pagada;
        let err = o.transition_to(PaymentStatus::Pendiente).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(o.estado, PaymentStatus::Pagada);

        assert!(!PaymentStatus::Pendiente.can_transition_to(PaymentStatus::Pagada));
        assert!(!PaymentStatus::Rechazada.can_transition_to(PaymentStatus::Aprobada));
        assert!(PaymentStatus::Aprobada.can_transition_to(PaymentStatus::Rechazada));
    }

    #[test]
    fn test_team_role_and_key() {
        let o = order();
        assert_eq!(o.team_role(), Some(TeamRole::SolutionDeveloper));
        assert_eq!(o.key(), ("tb-1", "solutionDeveloper"));
    }
}
