//! Weekly rate resolution for team roles
//!
//! Rates come from the backend role catalog, matched by a fixed table of
//! candidate names per role. When the catalog has no usable entry the
//! per-role fallback rate applies. A role with neither gets no rate.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::repository::{Role, RoleRepository};
use crate::domain::timebox::TeamRole;

/// Candidate catalog names and fallback weekly rates per role
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    role_names: BTreeMap<TeamRole, Vec<String>>,
    fallback: BTreeMap<TeamRole, f64>,
}

impl Default for RateTable {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let role_names = BTreeMap::from([
            (
                TeamRole::BusinessAmbassador,
                names(&["Business Ambassador", "Embajador de Negocio"]),
            ),
            (
                TeamRole::SolutionDeveloper,
                names(&["Solution Developer", "Desarrollador", "Developer"]),
            ),
            (
                TeamRole::SolutionTester,
                names(&["Solution Tester", "Tester", "QA"]),
            ),
            (
                TeamRole::BusinessAdvisor,
                names(&["Business Advisor", "Asesor de Negocio"]),
            ),
            (
                TeamRole::TechnicalAdvisor,
                names(&["Technical Advisor", "Asesor Técnico", "Asesor Tecnico"]),
            ),
        ]);
        let fallback = BTreeMap::from([
            (TeamRole::BusinessAmbassador, 400.0),
            (TeamRole::SolutionDeveloper, 600.0),
            (TeamRole::SolutionTester, 500.0),
            (TeamRole::BusinessAdvisor, 450.0),
            (TeamRole::TechnicalAdvisor, 550.0),
        ]);
        Self {
            role_names,
            fallback,
        }
    }
}

impl RateTable {
    pub fn new(
        role_names: BTreeMap<TeamRole, Vec<String>>,
        fallback: BTreeMap<TeamRole, f64>,
    ) -> Self {
        Self {
            role_names,
            fallback,
        }
    }

    /// Build from string-keyed tables (as stored in configuration)
    ///
    /// Keys that do not name a team role are ignored.
    pub fn from_keys(
        role_names: &BTreeMap<String, Vec<String>>,
        fallback: &BTreeMap<String, f64>,
    ) -> Self {
        let role_names = role_names
            .iter()
            .filter_map(|(key, names)| match TeamRole::from_key(key) {
                Some(role) => Some((role, names.clone())),
                None => {
                    warn!(key = %key, "Ignoring role name mapping for unknown role");
                    None
                }
            })
            .collect();
        let fallback = fallback
            .iter()
            .filter_map(|(key, rate)| match TeamRole::from_key(key) {
                Some(role) => Some((role, *rate)),
                None => {
                    warn!(key = %key, "Ignoring fallback rate for unknown role");
                    None
                }
            })
            .collect();
        Self {
            role_names,
            fallback,
        }
    }

    /// Catalog names tried for a role, in order
    pub fn candidate_names(&self, role: TeamRole) -> &[String] {
        self.role_names.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fallback_rate(&self, role: TeamRole) -> Option<f64> {
        self.fallback.get(&role).copied().filter(|r| *r > 0.0)
    }

    /// Drop the fallback rate for a role
    pub fn without_fallback(mut self, role: TeamRole) -> Self {
        self.fallback.remove(&role);
        self
    }

    /// Drop the catalog name mapping for a role
    pub fn without_names(mut self, role: TeamRole) -> Self {
        self.role_names.remove(&role);
        self
    }
}

/// Where a rate came from
#[derive(Debug, Clone, PartialEq)]
pub enum RateSource {
    Catalog { role_id: String },
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub weekly: f64,
    pub source: RateSource,
}

/// Resolves weekly rates against a role catalog snapshot
pub struct RateResolver<'a> {
    roles: &'a dyn RoleRepository,
    table: &'a RateTable,
    catalog: Vec<Role>,
}

impl<'a> RateResolver<'a> {
    /// Load the catalog once; a failed load leaves only fallback rates
    pub async fn load(roles: &'a dyn RoleRepository, table: &'a RateTable) -> Self {
        let catalog = match roles.list().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "Role catalog unavailable, using fallback rates");
                Vec::new()
            }
        };
        Self {
            roles,
            table,
            catalog,
        }
    }

    fn catalog_entry(&self, role: TeamRole) -> Option<&Role> {
        self.table.candidate_names(role).iter().find_map(|candidate| {
            self.catalog
                .iter()
                .find(|r| r.nombre.trim().eq_ignore_ascii_case(candidate.trim()))
        })
    }

    /// Weekly rate for a role, or `None` when neither source knows it
    pub async fn resolve(&self, role: TeamRole) -> Option<ResolvedRate> {
        if let Some(entry) = self.catalog_entry(role) {
            let rate = match entry.sueldo.filter(|s| *s > 0.0) {
                Some(rate) => Some(rate),
                None => match self.roles.weekly_salary(&entry.id).await {
                    Ok(rate) => rate.filter(|s| *s > 0.0),
                    Err(e) => {
                        warn!(role = %role, role_id = %entry.id, error = %e, "Salary lookup failed");
                        None
                    }
                },
            };
            if let Some(weekly) = rate {
                return Some(ResolvedRate {
                    weekly,
                    source: RateSource::Catalog {
                        role_id: entry.id.clone(),
                    },
                });
            }
        }

        debug!(role = %role, "Falling back to configured rate");
        self.table.fallback_rate(role).map(|weekly| ResolvedRate {
            weekly,
            source: RateSource::Fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryRoleRepository;

    #[tokio::test]
    async fn test_catalog_rate_by_candidate_name() {
        let roles = InMemoryRoleRepository::new(vec![Role {
            id: "r1".to_string(),
            nombre: "desarrollador".to_string(),
            sueldo: Some(700.0),
        }]);
        let table = RateTable::default();
        let resolver = RateResolver::load(&roles, &table).await;

        let rate = resolver.resolve(TeamRole::SolutionDeveloper).await.unwrap();
        assert_eq!(rate.weekly, 700.0);
        assert_eq!(
            rate.source,
            RateSource::Catalog {
                role_id: "r1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_salary_endpoint_used_when_not_embedded() {
        let roles = InMemoryRoleRepository::new(vec![Role {
            id: "r2".to_string(),
            nombre: "Tester".to_string(),
            sueldo: None,
        }])
        .with_salary("r2", 520.0);
        let table = RateTable::default();
        let resolver = RateResolver::load(&roles, &table).await;

        let rate = resolver.resolve(TeamRole::SolutionTester).await.unwrap();
        assert_eq!(rate.weekly, 520.0);
    }

    #[tokio::test]
    async fn test_unresolvable_name_falls_back() {
        let roles = InMemoryRoleRepository::new(Vec::new());
        let table = RateTable::default();
        let resolver = RateResolver::load(&roles, &table).await;

        let rate = resolver.resolve(TeamRole::BusinessAdvisor).await.unwrap();
        assert_eq!(rate.weekly, 450.0);
        assert_eq!(rate.source, RateSource::Fallback);
    }

    #[tokio::test]
    async fn test_failed_catalog_falls_back() {
        let roles = InMemoryRoleRepository::failing();
        let table = RateTable::default();
        let resolver = RateResolver::load(&roles, &table).await;

        let rate = resolver.resolve(TeamRole::SolutionDeveloper).await.unwrap();
        assert_eq!(rate.source, RateSource::Fallback);
    }

    #[tokio::test]
    async fn test_unknown_role_has_no_rate() {
        let roles = InMemoryRoleRepository::new(Vec::new());
        let table = RateTable::default()
            .without_names(TeamRole::TechnicalAdvisor)
            .without_fallback(TeamRole::TechnicalAdvisor);
        let resolver = RateResolver::load(&roles, &table).await;

        assert!(resolver.resolve(TeamRole::TechnicalAdvisor).await.is_none());
    }

    #[test]
    fn test_from_keys_ignores_unknown() {
        let names = BTreeMap::from([("solutionDeveloper".to_string(), vec!["Dev".to_string()])]);
        let rates = BTreeMap::from([
            ("solutionDeveloper".to_string(), 650.0),
            ("scrumMaster".to_string(), 900.0),
        ]);
        let table = RateTable::from_keys(&names, &rates);
        assert_eq!(table.fallback_rate(TeamRole::SolutionDeveloper), Some(650.0));
        assert_eq!(table.fallback_rate(TeamRole::BusinessAdvisor), None);
        assert_eq!(table.candidate_names(TeamRole::SolutionDeveloper), ["Dev".to_string()]);
    }
}
