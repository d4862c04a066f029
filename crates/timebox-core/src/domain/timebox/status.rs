//! Timebox lifecycle status
//!
//! The status is never set directly. It is a projection of phase completion,
//! offer publication and team assignment, recomputed by
//! [`Timebox::recompute_status`](super::Timebox::recompute_status).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status (`estado`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TimeboxStatus {
    #[default]
    #[serde(rename = "En Definición", alias = "En Definicion")]
    InDefinition,
    #[serde(rename = "Disponible")]
    Available,
    #[serde(rename = "En Ejecución", alias = "En Ejecucion")]
    InExecution,
    #[serde(rename = "Finalizado")]
    Finished,
}

impl TimeboxStatus {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InDefinition => "En Definición",
            Self::Available => "Disponible",
            Self::InExecution => "En Ejecución",
            Self::Finished => "Finalizado",
        }
    }

    /// Parse the wire representation, tolerating missing accents and case
    pub fn parse(s: &str) -> Option<Self> {
        let folded = s.trim().to_lowercase().replace('ó', "o");
        match folded.as_str() {
            "en definicion" => Some(Self::InDefinition),
            "disponible" => Some(Self::Available),
            "en ejecucion" => Some(Self::InExecution),
            "finalizado" => Some(Self::Finished),
            _ => None,
        }
    }

    /// Derive the status from the facts it projects
    pub fn derive(close_completed: bool, roles_filled: bool, published: bool) -> Self {
        if close_completed {
            Self::Finished
        } else if roles_filled {
            Self::InExecution
        } else if published {
            Self::Available
        } else {
            Self::InDefinition
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for TimeboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_priority() {
        assert_eq!(TimeboxStatus::derive(false, false, false), TimeboxStatus::InDefinition);
        assert_eq!(TimeboxStatus::derive(false, false, true), TimeboxStatus::Available);
        assert_eq!(TimeboxStatus::derive(false, true, true), TimeboxStatus::InExecution);
        assert_eq!(TimeboxStatus::derive(true, false, false), TimeboxStatus::Finished);
    }

    #[test]
    fn test_parse_tolerates_accents() {
        assert_eq!(TimeboxStatus::parse("En Ejecucion"), Some(TimeboxStatus::InExecution));
        assert_eq!(TimeboxStatus::parse("en definición"), Some(TimeboxStatus::InDefinition));
        assert_eq!(TimeboxStatus::parse("cerrado"), None);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&TimeboxStatus::InExecution).unwrap(),
            "\"En Ejecución\""
        );
        let status: TimeboxStatus = serde_json::from_str("\"En Definicion\"").unwrap();
        assert_eq!(status, TimeboxStatus::InDefinition);
    }
}
