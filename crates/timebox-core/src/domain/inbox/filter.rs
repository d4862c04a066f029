//! Pure filtering of the task inbox
//!
//! Every timebox falls into at most one bucket relative to the current user.
//! Nothing here touches the network.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::timebox::{TeamRole, Timebox, TimeboxStatus};
use crate::domain::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InboxBucket {
    Disponible,
    Solicitado,
    Asignado,
    Finalizado,
}

impl InboxBucket {
    pub const ALL: [InboxBucket; 4] = [
        InboxBucket::Disponible,
        InboxBucket::Solicitado,
        InboxBucket::Asignado,
        InboxBucket::Finalizado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disponible => "Disponible",
            Self::Solicitado => "Solicitado",
            Self::Asignado => "Asignado",
            Self::Finalizado => "Finalizado",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for InboxBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering by publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InboxFilter {
    pub bucket: Option<InboxBucket>,
    pub skill: Option<String>,
    pub effort: Option<String>,
    pub sort: SortOrder,
}

impl InboxFilter {
    pub fn bucket(bucket: InboxBucket) -> Self {
        Self {
            bucket: Some(bucket),
            ..Default::default()
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    pub fn with_effort(mut self, effort: impl Into<String>) -> Self {
        self.effort = Some(effort.into());
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    fn matches(&self, timebox: &Timebox, user: &User) -> bool {
        if let Some(bucket) = self.bucket
            && bucket_of(timebox, user) != Some(bucket)
        {
            return false;
        }
        let planning = &timebox.fases.planning;
        if let Some(skill) = self.skill.as_deref().map(str::trim).filter(|s| !s.is_empty())
            && !planning
                .skills
                .iter()
                .any(|s| s.trim().eq_ignore_ascii_case(skill))
        {
            return false;
        }
        if let Some(effort) = self.effort.as_deref().map(str::trim).filter(|s| !s.is_empty())
            && !planning
                .esfuerzo
                .as_deref()
                .is_some_and(|e| e.trim().eq_ignore_ascii_case(effort))
        {
            return false;
        }
        true
    }
}

/// Whether the user holds a role or has any application on the timebox
fn took_part(timebox: &Timebox, user: &User) -> bool {
    let holds_role = timebox.team().is_some_and(|t| t.role_of(user).is_some());
    let applied = timebox
        .offer()
        .is_some_and(|o| o.by_user(user).next().is_some());
    holds_role || applied
}

/// The bucket a timebox belongs to for this user, if any
pub fn bucket_of(timebox: &Timebox, user: &User) -> Option<InboxBucket> {
    if timebox.estado == TimeboxStatus::Finished {
        return took_part(timebox, user).then_some(InboxBucket::Finalizado);
    }

    let holds_role = timebox.team().is_some_and(|t| t.role_of(user).is_some());
    let mut approved = false;
    let mut pending = false;
    let mut live = false;
    if let Some(offer) = timebox.offer() {
        for p in offer.by_user(user) {
            approved |= p.is_approved();
            pending |= p.is_pending();
            live |= !p.is_rejected();
        }
    }

    if holds_role || approved {
        Some(InboxBucket::Asignado)
    } else if pending {
        Some(InboxBucket::Solicitado)
    } else if timebox.estado == TimeboxStatus::Available
        && timebox.solution_developer_name().is_empty()
        && !live
    {
        Some(InboxBucket::Disponible)
    } else {
        None
    }
}

/// Roles the user can still apply to: not filled and not already applied for
pub fn available_roles(timebox: &Timebox, user: &User) -> Vec<TeamRole> {
    TeamRole::ALL
        .into_iter()
        .filter(|role| !timebox.team().is_some_and(|t| t.is_filled(*role)))
        .filter(|role| {
            !timebox
                .offer()
                .is_some_and(|o| o.has_applied(user, Some(*role)))
        })
        .collect()
}

/// Apply a filter and sort by publication date
///
/// Timeboxes without a publication date sort last in either order.
pub fn filter_inbox<'a>(
    timeboxes: &'a [Timebox],
    user: &User,
    filter: &InboxFilter,
) -> Vec<&'a Timebox> {
    let mut matched: Vec<&Timebox> = timeboxes
        .iter()
        .filter(|t| filter.matches(t, user))
        .collect();
    matched.sort_by(|a, b| match (a.publication_date(), b.publication_date()) {
        (Some(x), Some(y)) => match filter.sort {
            SortOrder::Asc => x.cmp(&y),
            SortOrder::Desc => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    matched
}

/// Number of timeboxes per bucket
pub fn bucket_counts(timeboxes: &[Timebox], user: &User) -> Vec<(InboxBucket, usize)> {
    InboxBucket::ALL
        .into_iter()
        .map(|bucket| {
            let count = timeboxes
                .iter()
                .filter(|t| bucket_of(t, user) == Some(bucket))
                .count();
            (bucket, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dates::parse_datetime;
    use crate::domain::timebox::fixtures::{full_team, planned_timebox};
    use crate::domain::timebox::{EstadoSolicitud, Postulacion};
    use crate::domain::user::Persona;
    use chrono::Utc;

    fn dev() -> User {
        User::new("u-1", "Ana", "ana@example.com")
    }

    fn published(id: &str, date: &str) -> Timebox {
        let mut timebox = planned_timebox();
        timebox.id = Some(id.to_string());
        timebox.publish(parse_datetime(date).unwrap());
        timebox
    }

    fn apply<'a>(timebox: &'a mut Timebox, user: &User, rol: Option<TeamRole>) -> &'a mut Postulacion {
        let offer = timebox.offer_mut();
        offer
            .postulaciones
            .push(Postulacion::new(rol, Persona::from(user), Utc::now()));
        offer.postulaciones.last_mut().unwrap()
    }

    #[test]
    fn test_available_then_requested_after_applying() {
        let user = dev();
        let mut timebox = published("tb-1", "2025-01-10");
        assert_eq!(bucket_of(&timebox, &user), Some(InboxBucket::Disponible));

        apply(&mut timebox, &user, Some(TeamRole::SolutionDeveloper));
        assert_eq!(bucket_of(&timebox, &user), Some(InboxBucket::Solicitado));
    }

    #[test]
    fn test_approved_application_is_assigned() {
        let user = dev();
        let mut timebox = published("tb-1", "2025-01-10");
        apply(&mut timebox, &user, Some(TeamRole::SolutionTester)).estado_solicitud =
            EstadoSolicitud::Aprobada;
        assert_eq!(bucket_of(&timebox, &user), Some(InboxBucket::Asignado));
    }

    #[test]
    fn test_role_holder_is_assigned_until_finished() {
        let user = dev();
        let mut timebox = published("tb-1", "2025-01-10");
        timebox
            .team_mut()
            .set(TeamRole::BusinessAdvisor, Persona::from(&user));
        assert_eq!(bucket_of(&timebox, &user), Some(InboxBucket::Asignado));

        timebox.complete_phase(crate::domain::timebox::PhaseKind::Close, Utc::now());
        assert_eq!(bucket_of(&timebox, &user), Some(InboxBucket::Finalizado));

        let stranger = User::new("u-9", "Otro", "otro@example.com");
        assert_eq!(bucket_of(&timebox, &stranger), None);
    }

    #[test]
    fn test_taken_developer_slot_not_available() {
        let user = dev();
        let mut timebox = published("tb-1", "2025-01-10");
        timebox
            .team_mut()
            .set(TeamRole::SolutionDeveloper, Persona::new("Someone"));
        assert_eq!(bucket_of(&timebox, &user), None);
    }

    #[test]
    fn test_rejected_application_reopens_offer() {
        let user = dev();
        let mut timebox = published("tb-1", "2025-01-10");
        apply(&mut timebox, &user, None).estado_solicitud = EstadoSolicitud::Rechazada;
        assert_eq!(bucket_of(&timebox, &user), Some(InboxBucket::Disponible));
    }

    #[test]
    fn test_available_roles() {
        let user = dev();
        let mut timebox = published("tb-1", "2025-01-10");
        timebox
            .team_mut()
            .set(TeamRole::BusinessAmbassador, Persona::new("BA"));
        apply(&mut timebox, &user, Some(TeamRole::SolutionTester));
        apply(&mut timebox, &user, Some(TeamRole::TechnicalAdvisor)).estado_solicitud =
            EstadoSolicitud::Rechazada;

        let roles = available_roles(&timebox, &user);
        assert_eq!(
            roles,
            vec![
                TeamRole::SolutionDeveloper,
                TeamRole::BusinessAdvisor,
                TeamRole::TechnicalAdvisor
            ]
        );

        let mut full = published("tb-2", "2025-01-10");
        full.fases.kick_off.team_movilization = Some(full_team());
        assert!(available_roles(&full, &user).is_empty());
    }

    #[test]
    fn test_filter_skill_effort_and_sort() {
        let user = dev();
        let older = published("tb-old", "2025-01-01");
        let newer = published("tb-new", "2025-03-01");
        let mut other = published("tb-go", "2025-02-01");
        other.fases.planning.skills = vec!["Go".to_string()];
        other.fases.planning.esfuerzo = Some("L".to_string());
        let list = vec![older, newer, other];

        let desc = filter_inbox(&list, &user, &InboxFilter::bucket(InboxBucket::Disponible));
        let ids: Vec<_> = desc.iter().map(|t| t.id.as_deref().unwrap()).collect();
        assert_eq!(ids, ["tb-new", "tb-go", "tb-old"]);

        let rust = filter_inbox(
            &list,
            &user,
            &InboxFilter::default().with_skill("rust").sorted(SortOrder::Asc),
        );
        let ids: Vec<_> = rust.iter().map(|t| t.id.as_deref().unwrap()).collect();
        assert_eq!(ids, ["tb-old", "tb-new"]);

        let large = filter_inbox(&list, &user, &InboxFilter::default().with_effort("l"));
        assert_eq!(large.len(), 1);
    }

    #[test]
    fn test_bucket_counts() {
        let user = dev();
        let mut requested = published("tb-2", "2025-01-02");
        apply(&mut requested, &user, None);
        let list = vec![published("tb-1", "2025-01-01"), requested];

        let counts = bucket_counts(&list, &user);
        assert_eq!(counts[0], (InboxBucket::Disponible, 1));
        assert_eq!(counts[1], (InboxBucket::Solicitado, 1));
    }
}
