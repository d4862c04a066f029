//! Team movilization: the five standard roles of a timebox

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::user::{Persona, User};

/// One of the five standard team roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeamRole {
    BusinessAmbassador,
    SolutionDeveloper,
    SolutionTester,
    BusinessAdvisor,
    TechnicalAdvisor,
}

impl TeamRole {
    /// All roles in display order
    pub const ALL: [TeamRole; 5] = [
        TeamRole::BusinessAmbassador,
        TeamRole::SolutionDeveloper,
        TeamRole::SolutionTester,
        TeamRole::BusinessAdvisor,
        TeamRole::TechnicalAdvisor,
    ];

    /// Wire key (`solutionDeveloper`, ...)
    pub fn key(&self) -> &'static str {
        match self {
            Self::BusinessAmbassador => "businessAmbassador",
            Self::SolutionDeveloper => "solutionDeveloper",
            Self::SolutionTester => "solutionTester",
            Self::BusinessAdvisor => "businessAdvisor",
            Self::TechnicalAdvisor => "technicalAdvisor",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::BusinessAmbassador => "Business Ambassador",
            Self::SolutionDeveloper => "Solution Developer",
            Self::SolutionTester => "Solution Tester",
            Self::BusinessAdvisor => "Business Advisor",
            Self::TechnicalAdvisor => "Technical Advisor",
        }
    }

    /// Parse a wire key or label, ignoring case, spaces, dashes and underscores
    pub fn from_key(s: &str) -> Option<Self> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|role| role.key().to_lowercase() == folded)
    }
}

/// Serde adapter for an optional role that tolerates labels and blanks
///
/// `"Solution Developer"` and `"solution_developer"` read as the role; empty or
/// unrecognized values read as `None`.
pub mod lenient {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::TeamRole;

    pub fn serialize<S>(value: &Option<TeamRole>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<TeamRole>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(TeamRole::from_key))
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Assignment of people to the five roles (`teamMovilization`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMovilization {
    #[serde(default)]
    pub business_ambassador: Persona,
    #[serde(default)]
    pub solution_developer: Persona,
    #[serde(default)]
    pub solution_tester: Persona,
    #[serde(default)]
    pub business_advisor: Persona,
    #[serde(default)]
    pub technical_advisor: Persona,
}

impl TeamMovilization {
    /// The person in a role slot
    pub fn get(&self, role: TeamRole) -> &Persona {
        match role {
            TeamRole::BusinessAmbassador => &self.business_ambassador,
            TeamRole::SolutionDeveloper => &self.solution_developer,
            TeamRole::SolutionTester => &self.solution_tester,
            TeamRole::BusinessAdvisor => &self.business_advisor,
            TeamRole::TechnicalAdvisor => &self.technical_advisor,
        }
    }

    /// Replace the person in a role slot
    pub fn set(&mut self, role: TeamRole, persona: Persona) {
        let slot = match role {
            TeamRole::BusinessAmbassador => &mut self.business_ambassador,
            TeamRole::SolutionDeveloper => &mut self.solution_developer,
            TeamRole::SolutionTester => &mut self.solution_tester,
            TeamRole::BusinessAdvisor => &mut self.business_advisor,
            TeamRole::TechnicalAdvisor => &mut self.technical_advisor,
        };
        *slot = persona;
    }

    /// Empty a role slot
    pub fn clear(&mut self, role: TeamRole) {
        self.set(role, Persona::default());
    }

    pub fn is_filled(&self, role: TeamRole) -> bool {
        !self.get(role).is_empty()
    }

    /// Roles with a person assigned, with that person
    pub fn filled(&self) -> impl Iterator<Item = (TeamRole, &Persona)> {
        TeamRole::ALL
            .into_iter()
            .map(|role| (role, self.get(role)))
            .filter(|(_, p)| !p.is_empty())
    }

    /// Roles still waiting for a person
    pub fn missing_roles(&self) -> Vec<TeamRole> {
        TeamRole::ALL
            .into_iter()
            .filter(|role| !self.is_filled(*role))
            .collect()
    }

    pub fn all_filled(&self) -> bool {
        TeamRole::ALL.iter().all(|role| self.is_filled(*role))
    }

    /// First role held by the given user
    pub fn role_of(&self, user: &User) -> Option<TeamRole> {
        TeamRole::ALL
            .into_iter()
            .find(|role| self.get(*role).is_user(user))
    }
}
