//! Task inbox service
//!
//! Developers browse published timeboxes and apply to roles. Applications
//! are checked locally before anything is sent, so a duplicate never
//! reaches the backend. Reviewers approve or reject applications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::inbox::{InboxBucket, InboxFilter, available_roles, bucket_counts, filter_inbox};
use crate::domain::timebox::{
    AssignRoleRequest, Postulacion, TeamRole, Timebox, TimeboxRepository,
};
use crate::domain::user::{Persona, User};
use crate::error::{Error, Result};
use crate::store::EntityStore;

pub struct InboxService {
    repo: Arc<dyn TimeboxRepository>,
    store: Arc<EntityStore<Timebox>>,
    user: User,
}

impl InboxService {
    pub fn new(repo: Arc<dyn TimeboxRepository>, store: Arc<EntityStore<Timebox>>, user: User) -> Self {
        Self { repo, store, user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    async fn timeboxes(&self) -> Result<Arc<Vec<Timebox>>> {
        self.store.read(|| self.repo.list()).await
    }

    // ========== Browsing ==========

    /// Timeboxes matching the filter, sorted by publication date
    pub async fn list(&self, filter: &InboxFilter) -> Result<Vec<Timebox>> {
        let timeboxes = self.timeboxes().await?;
        Ok(filter_inbox(&timeboxes, &self.user, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Number of timeboxes in each bucket
    pub async fn counts(&self) -> Result<Vec<(InboxBucket, usize)>> {
        let timeboxes = self.timeboxes().await?;
        Ok(bucket_counts(&timeboxes, &self.user))
    }

    /// Roles the user can still apply to
    pub async fn available_roles(&self, timebox_id: &str) -> Result<Vec<TeamRole>> {
        let timebox = self.cached(timebox_id).await?;
        Ok(available_roles(&timebox, &self.user))
    }

    async fn cached(&self, timebox_id: &str) -> Result<Timebox> {
        self.timeboxes().await?;
        self.store
            .get(timebox_id)
            .ok_or_else(|| Error::TimeboxNotFound(timebox_id.to_string()))
    }

    // ========== Applying ==========

    /// Apply to a role, or register general interest when `rol` is `None`
    pub async fn apply(
        &self,
        timebox_id: &str,
        rol: Option<TeamRole>,
        now: DateTime<Utc>,
    ) -> Result<Timebox> {
        let timebox = self.cached(timebox_id).await?;
        self.check_application(&timebox, rol)?;

        let postulacion = Postulacion::new(rol, Persona::from(&self.user), now);
        let mut saved = self.repo.postulate(timebox_id, &postulacion).await?;
        saved.recompute_status();
        self.store.upsert(saved.clone());
        info!(
            timebox_id = %timebox_id,
            role = rol.map(|r| r.key()).unwrap_or("general"),
            "Application sent"
        );
        Ok(saved)
    }

    fn check_application(&self, timebox: &Timebox, rol: Option<TeamRole>) -> Result<()> {
        if !timebox.is_published() || timebox.estado.is_finished() {
            return Err(Error::BusinessRule(format!(
                "'{}' is not open for applications",
                timebox.name()
            )));
        }
        if timebox
            .offer()
            .is_some_and(|offer| offer.has_applied(&self.user, rol))
        {
            let target = rol.map(|r| r.label()).unwrap_or("general interest");
            debug!(timebox_id = ?timebox.id, "Duplicate application blocked");
            return Err(Error::BusinessRule(format!(
                "You already applied to {} on '{}'",
                target,
                timebox.name()
            )));
        }
        if let Some(rol) = rol
            && timebox.team().is_some_and(|team| team.is_filled(rol))
        {
            return Err(Error::BusinessRule(format!(
                "The {} role is already filled",
                rol.label()
            )));
        }
        Ok(())
    }

    // ========== Reviewing ==========

    /// Approve an application and fill its role
    ///
    /// `rol` picks the role for a general-interest application; otherwise the
    /// applied role is used.
    pub async fn approve(
        &self,
        timebox_id: &str,
        postulacion_id: &str,
        rol: Option<TeamRole>,
    ) -> Result<Timebox> {
        let timebox = self.cached(timebox_id).await?;
        let offer = timebox
            .offer()
            .ok_or_else(|| Error::PostulationNotFound(postulacion_id.to_string()))?;
        let postulacion = offer
            .find(postulacion_id)
            .ok_or_else(|| Error::PostulationNotFound(postulacion_id.to_string()))?;
        if !postulacion.is_pending() {
            return Err(Error::BusinessRule(format!(
                "Application is already {}",
                postulacion.estado_solicitud.as_str()
            )));
        }
        let role = rol.or(postulacion.rol).ok_or_else(|| {
            Error::InvalidInput("Choose a role for a general-interest application".to_string())
        })?;
        if offer.approved_for(role).is_some()
            || timebox.team().is_some_and(|team| team.is_filled(role))
        {
            return Err(Error::BusinessRule(format!(
                "The {} role is already assigned",
                role.label()
            )));
        }

        let request = AssignRoleRequest {
            postulacion_id: postulacion_id.to_string(),
            rol: role,
            desarrollador: postulacion.desarrollador.clone(),
        };
        let mut saved = self.repo.assign_role(timebox_id, &request).await?;
        saved.recompute_status();
        self.store.upsert(saved.clone());
        info!(timebox_id = %timebox_id, role = %role, estado = %saved.estado, "Application approved");
        Ok(saved)
    }

    /// Reject a pending application
    pub async fn reject(&self, timebox_id: &str, postulacion_id: &str) -> Result<Timebox> {
        let timebox = self.cached(timebox_id).await?;
        let pending = timebox
            .offer()
            .and_then(|offer| offer.find(postulacion_id))
            .ok_or_else(|| Error::PostulationNotFound(postulacion_id.to_string()))?
            .is_pending();
        if !pending {
            return Err(Error::BusinessRule(
                "Only pending applications can be rejected".to_string(),
            ));
        }
        let mut saved = self.repo.reject_postulation(timebox_id, postulacion_id).await?;
        saved.recompute_status();
        self.store.upsert(saved.clone());
        info!(timebox_id = %timebox_id, postulacion_id = %postulacion_id, "Application rejected");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timebox::fixtures::{full_team, planned_timebox};
    use crate::domain::timebox::{EstadoSolicitud, TimeboxStatus};
    use crate::infrastructure::memory::InMemoryTimeboxRepository;

    fn dev() -> User {
        User::new("dev-1", "Ana", "ana@example.com")
    }

    fn published() -> Timebox {
        let mut timebox = planned_timebox();
        timebox.publish(Utc::now());
        timebox
    }

    fn setup(seed: Vec<Timebox>, user: User) -> (Arc<InMemoryTimeboxRepository>, InboxService) {
        let repo = Arc::new(InMemoryTimeboxRepository::with_timeboxes(seed));
        let service = InboxService::new(repo.clone(), Arc::new(EntityStore::new("timeboxes")), user);
        (repo, service)
    }

    #[tokio::test]
    async fn test_applying_moves_to_solicitado() {
        let (_, inbox) = setup(vec![published()], dev());

        let available = inbox.list(&InboxFilter::bucket(InboxBucket::Disponible)).await.unwrap();
        assert_eq!(available.len(), 1);

        inbox
            .apply("tb-1", Some(TeamRole::SolutionDeveloper), Utc::now())
            .await
            .unwrap();

        let requested = inbox.list(&InboxFilter::bucket(InboxBucket::Solicitado)).await.unwrap();
        assert_eq!(requested.len(), 1);
        assert!(inbox
            .list(&InboxFilter::bucket(InboxBucket::Disponible))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rejected_before_network() {
        let (repo, inbox) = setup(vec![published()], dev());
        inbox
            .apply("tb-1", Some(TeamRole::SolutionTester), Utc::now())
            .await
            .unwrap();
        inbox.apply("tb-1", None, Utc::now()).await.unwrap();
        let calls = repo.calls();

        let err = inbox
            .apply("tb-1", Some(TeamRole::SolutionTester), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BusinessRule(_)));
        let err = inbox.apply("tb-1", None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::BusinessRule(_)));
        assert_eq!(repo.calls(), calls);

        let roles = inbox.available_roles("tb-1").await.unwrap();
        assert!(!roles.contains(&TeamRole::SolutionTester));
        assert_eq!(roles.len(), 4);
    }

    #[tokio::test]
    async fn test_unpublished_or_filled_roles_are_closed() {
        let mut filled = published();
        filled.id = Some("tb-2".to_string());
        filled.fases.kick_off.team_movilization = Some(full_team());
        let (repo, inbox) = setup(vec![planned_timebox(), filled], dev());

        assert!(inbox.apply("tb-1", None, Utc::now()).await.is_err());
        assert!(inbox
            .apply("tb-2", Some(TeamRole::BusinessAdvisor), Utc::now())
            .await
            .is_err());
        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn test_approve_fills_role_once() {
        let (repo, inbox) = setup(vec![published()], dev());
        let applied = inbox
            .apply("tb-1", Some(TeamRole::SolutionDeveloper), Utc::now())
            .await
            .unwrap();
        let postulacion_id = applied.offer().unwrap().postulaciones[0].id.clone();

        let approved = inbox.approve("tb-1", &postulacion_id, None).await.unwrap();
        let team = approved.team().unwrap();
        assert_eq!(team.solution_developer.nombre, "Ana");
        assert_eq!(approved.estado, TimeboxStatus::Available);
        assert_eq!(
            inbox.list(&InboxFilter::bucket(InboxBucket::Asignado)).await.unwrap().len(),
            1
        );

        let calls = repo.calls();
        assert!(inbox.approve("tb-1", &postulacion_id, None).await.is_err());
        assert_eq!(repo.calls(), calls);
    }

    #[tokio::test]
    async fn test_general_interest_needs_role_to_approve() {
        let (_, inbox) = setup(vec![published()], dev());
        let applied = inbox.apply("tb-1", None, Utc::now()).await.unwrap();
        let id = applied.offer().unwrap().postulaciones[0].id.clone();

        let err = inbox.approve("tb-1", &id, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let approved = inbox
            .approve("tb-1", &id, Some(TeamRole::BusinessAdvisor))
            .await
            .unwrap();
        assert!(approved.team().unwrap().is_filled(TeamRole::BusinessAdvisor));
    }

    #[tokio::test]
    async fn test_reject_then_reapply() {
        let (_, inbox) = setup(vec![published()], dev());
        let applied = inbox
            .apply("tb-1", Some(TeamRole::SolutionTester), Utc::now())
            .await
            .unwrap();
        let id = applied.offer().unwrap().postulaciones[0].id.clone();

        let rejected = inbox.reject("tb-1", &id).await.unwrap();
        assert_eq!(
            rejected.offer().unwrap().postulaciones[0].estado_solicitud,
            EstadoSolicitud::Rechazada
        );
        assert!(inbox.reject("tb-1", &id).await.is_err());

        inbox
            .apply("tb-1", Some(TeamRole::SolutionTester), Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_counts() {
        let (_, inbox) = setup(vec![published()], dev());
        let counts = inbox.counts().await.unwrap();
        assert_eq!(counts[0], (InboxBucket::Disponible, 1));
        assert!(counts[1..].iter().all(|(_, n)| *n == 0));
    }
}
