//! In-memory repositories
//!
//! Backend stand-ins for tests and offline runs. Each one counts the calls
//! that would have gone over the network, and mirrors the backend's own
//! checks (one approved application per role, forward-only payment status).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::attachment::{Adjunto, UploadFile, Uploader};
use crate::domain::finance::{
    OrdenDePago, PaymentOrderRepository, PaymentStatus, Role, RoleRepository,
};
use crate::domain::project::{Project, ProjectRepository};
use crate::domain::timebox::{
    AssignRoleRequest, CatalogEntry, EstadoSolicitud, Postulacion, Timebox, TimeboxRepository,
};
use crate::error::{Error, Result};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// ========== Timeboxes ==========

#[derive(Debug, Default)]
pub struct InMemoryTimeboxRepository {
    timeboxes: RwLock<Vec<Timebox>>,
    types: RwLock<Vec<CatalogEntry>>,
    categories: RwLock<Vec<CatalogEntry>>,
    calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryTimeboxRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing timeboxes
    pub fn with_timeboxes(timeboxes: Vec<Timebox>) -> Self {
        let repo = Self::new();
        *write(&repo.timeboxes) = timeboxes;
        repo
    }

    pub fn with_catalogs(self, types: Vec<CatalogEntry>, categories: Vec<CatalogEntry>) -> Self {
        *write(&self.types) = types;
        *write(&self.categories) = categories;
        self
    }

    /// Make every create/update/postulate fail like an unreachable backend
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of repository calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stored copy, bypassing the call counter
    pub fn stored(&self, id: &str) -> Option<Timebox> {
        read(&self.timeboxes)
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
            .cloned()
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::api(503, "Backend unavailable"));
        }
        Ok(())
    }

    fn modify<F>(&self, id: &str, f: F) -> Result<Timebox>
    where
        F: FnOnce(&mut Timebox) -> Result<()>,
    {
        let mut timeboxes = write(&self.timeboxes);
        let timebox = timeboxes
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id))
            .ok_or_else(|| Error::TimeboxNotFound(id.to_string()))?;
        f(timebox)?;
        Ok(timebox.clone())
    }
}

#[async_trait]
impl TimeboxRepository for InMemoryTimeboxRepository {
    async fn list(&self) -> Result<Vec<Timebox>> {
        self.hit();
        Ok(read(&self.timeboxes).clone())
    }

    async fn list_published(&self) -> Result<Vec<Timebox>> {
        self.hit();
        Ok(read(&self.timeboxes)
            .iter()
            .filter(|t| t.is_published())
            .cloned()
            .collect())
    }

    async fn list_with_postulations(&self) -> Result<Vec<Timebox>> {
        self.hit();
        Ok(read(&self.timeboxes)
            .iter()
            .filter(|t| t.offer().is_some_and(|o| !o.postulaciones.is_empty()))
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Timebox>> {
        self.hit();
        Ok(self.stored(id))
    }

    async fn create(&self, timebox: &Timebox) -> Result<Timebox> {
        self.hit();
        self.check_writable()?;
        let mut created = timebox.clone();
        created.id = Some(Uuid::new_v4().to_string());
        write(&self.timeboxes).push(created.clone());
        Ok(created)
    }

    async fn update(&self, timebox: &Timebox) -> Result<Timebox> {
        self.hit();
        self.check_writable()?;
        let id = timebox.require_id()?;
        self.modify(id, |stored| {
            *stored = timebox.clone();
            Ok(())
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.hit();
        let mut timeboxes = write(&self.timeboxes);
        let before = timeboxes.len();
        timeboxes.retain(|t| t.id.as_deref() != Some(id));
        if timeboxes.len() == before {
            return Err(Error::TimeboxNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn postulate(&self, timebox_id: &str, postulacion: &Postulacion) -> Result<Timebox> {
        self.hit();
        self.check_writable()?;
        self.modify(timebox_id, |timebox| {
            timebox.offer_mut().postulaciones.push(postulacion.clone());
            Ok(())
        })
    }

    async fn assign_role(&self, timebox_id: &str, request: &AssignRoleRequest) -> Result<Timebox> {
        self.hit();
        self.check_writable()?;
        self.modify(timebox_id, |timebox| {
            if timebox
                .offer()
                .and_then(|o| o.approved_for(request.rol))
                .is_some_and(|p| p.id != request.postulacion_id)
            {
                return Err(Error::api(409, "Role already assigned"));
            }
            let postulacion = timebox
                .offer_mut()
                .find_mut(&request.postulacion_id)
                .ok_or_else(|| Error::PostulationNotFound(request.postulacion_id.clone()))?;
            postulacion.estado_solicitud = EstadoSolicitud::Aprobada;
            postulacion.rol = Some(request.rol);
            postulacion.asignacion.asignado = true;
            postulacion.asignacion.fecha_asignacion = Some(Utc::now());
            timebox
                .team_mut()
                .set(request.rol, request.desarrollador.clone());
            timebox.recompute_status();
            Ok(())
        })
    }

    async fn reject_postulation(&self, timebox_id: &str, postulacion_id: &str) -> Result<Timebox> {
        self.hit();
        self.check_writable()?;
        self.modify(timebox_id, |timebox| {
            let postulacion = timebox
                .offer_mut()
                .find_mut(postulacion_id)
                .ok_or_else(|| Error::PostulationNotFound(postulacion_id.to_string()))?;
            postulacion.estado_solicitud = EstadoSolicitud::Rechazada;
            Ok(())
        })
    }

    async fn types(&self) -> Result<Vec<CatalogEntry>> {
        self.hit();
        Ok(read(&self.types).clone())
    }

    async fn categories(&self) -> Result<Vec<CatalogEntry>> {
        self.hit();
        Ok(read(&self.categories).clone())
    }
}

// ========== Projects ==========

#[derive(Debug, Default)]
pub struct InMemoryProjectRepository {
    projects: RwLock<Vec<Project>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(projects: Vec<Project>) -> Self {
        let repo = Self::new();
        *write(&repo.projects) = projects;
        repo
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn list(&self) -> Result<Vec<Project>> {
        Ok(read(&self.projects).clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Project>> {
        Ok(read(&self.projects).iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, project: &Project) -> Result<Project> {
        project.validate_tree()?;
        let mut created = project.clone();
        created.id = Uuid::new_v4().to_string();
        write(&self.projects).push(created.clone());
        Ok(created)
    }

    async fn update(&self, project: &Project) -> Result<Project> {
        project.validate_tree()?;
        let mut projects = write(&self.projects);
        let stored = projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or_else(|| Error::ProjectNotFound(project.id.clone()))?;
        *stored = project.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut projects = write(&self.projects);
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Err(Error::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }
}

// ========== Payment orders ==========

#[derive(Debug, Default)]
pub struct InMemoryPaymentOrderRepository {
    orders: RwLock<Vec<OrdenDePago>>,
    failing_roles: Vec<String>,
    create_calls: AtomicUsize,
    calls: AtomicUsize,
}

impl InMemoryPaymentOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<OrdenDePago>) -> Self {
        let repo = Self::new();
        *write(&repo.orders) = orders;
        repo
    }

    /// Make `create` fail for one role key
    pub fn fail_creates_for(mut self, rol: impl Into<String>) -> Self {
        self.failing_roles.push(rol.into());
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of repository calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn modify<F>(&self, order_id: &str, f: F) -> Result<OrdenDePago>
    where
        F: FnOnce(&mut OrdenDePago) -> Result<()>,
    {
        let mut orders = write(&self.orders);
        let order = orders
            .iter_mut()
            .find(|o| o.id.as_deref() == Some(order_id))
            .ok_or_else(|| Error::PaymentOrderNotFound(order_id.to_string()))?;
        f(order)?;
        Ok(order.clone())
    }
}

#[async_trait]
impl PaymentOrderRepository for InMemoryPaymentOrderRepository {
    async fn list_for_developer(&self, developer_id: &str) -> Result<Vec<OrdenDePago>> {
        self.hit();
        Ok(read(&self.orders)
            .iter()
            .filter(|o| o.developer_id == developer_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<OrdenDePago>> {
        self.hit();
        Ok(read(&self.orders).clone())
    }

    async fn list_for_timebox(&self, timebox_id: &str) -> Result<Vec<OrdenDePago>> {
        self.hit();
        Ok(read(&self.orders)
            .iter()
            .filter(|o| o.timebox_id == timebox_id)
            .cloned()
            .collect())
    }

    async fn create(&self, order: &OrdenDePago) -> Result<OrdenDePago> {
        self.hit();
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_roles.contains(&order.rol) {
            return Err(Error::api(500, format!("Could not store order for {}", order.rol)));
        }
        let mut created = order.clone();
        created.id = Some(Uuid::new_v4().to_string());
        write(&self.orders).push(created.clone());
        Ok(created)
    }

    async fn update_status(&self, order_id: &str, estado: PaymentStatus) -> Result<OrdenDePago> {
        self.hit();
        self.modify(order_id, |order| order.transition_to(estado))
    }

    async fn upload_receipt(&self, order_id: &str, file: UploadFile) -> Result<OrdenDePago> {
        self.hit();
        self.modify(order_id, |order| {
            order.comprobante = Some(Adjunto {
                url: format!("memory://comprobantes/{}", file.file_name),
                nombre: file.file_name.clone(),
                tipo: Some(file.mime.clone()),
                tamano: Some(file.bytes.len() as u64),
            });
            Ok(())
        })
    }
}

// ========== Role catalog ==========

#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: Vec<Role>,
    salaries: HashMap<String, f64>,
    failing: bool,
}

impl InMemoryRoleRepository {
    pub fn new(roles: Vec<Role>) -> Self {
        Self {
            roles,
            ..Default::default()
        }
    }

    /// Salary served by `weekly_salary` for a catalog id
    pub fn with_salary(mut self, role_id: impl Into<String>, salary: f64) -> Self {
        self.salaries.insert(role_id.into(), salary);
        self
    }

    /// A catalog whose every call fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(Error::api(503, "Role catalog unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn list(&self) -> Result<Vec<Role>> {
        self.check()?;
        Ok(self.roles.clone())
    }

    async fn weekly_salary(&self, role_id: &str) -> Result<Option<f64>> {
        self.check()?;
        Ok(self.salaries.get(role_id).copied())
    }
}

// ========== Uploads ==========

#[derive(Debug, Default)]
pub struct InMemoryUploader {
    uploads: RwLock<Vec<String>>,
}

impl InMemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the files uploaded so far
    pub fn uploaded(&self) -> Vec<String> {
        read(&self.uploads).clone()
    }
}

#[async_trait]
impl Uploader for InMemoryUploader {
    async fn upload(&self, file: UploadFile) -> Result<Adjunto> {
        if file.is_empty() {
            return Err(Error::InvalidInput(format!(
                "File '{}' is empty",
                file.file_name
            )));
        }
        write(&self.uploads).push(file.file_name.clone());
        Ok(Adjunto {
            url: format!("memory://uploads/{}", file.file_name),
            tipo: Some(file.mime),
            tamano: Some(file.bytes.len() as u64),
            nombre: file.file_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timebox::{TeamRole, TimeboxStatus};
    use crate::domain::timebox::fixtures::planned_timebox;
    use crate::domain::user::Persona;

    #[tokio::test]
    async fn test_assign_role_fills_team_once() {
        let mut timebox = planned_timebox();
        timebox.publish(Utc::now());
        let first = Postulacion::new(Some(TeamRole::SolutionDeveloper), Persona::new("Ana"), Utc::now());
        let second = Postulacion::new(Some(TeamRole::SolutionDeveloper), Persona::new("Luis"), Utc::now());
        timebox.offer_mut().postulaciones = vec![first.clone(), second.clone()];
        let repo = InMemoryTimeboxRepository::with_timeboxes(vec![timebox]);

        let updated = repo
            .assign_role(
                "tb-1",
                &AssignRoleRequest {
                    postulacion_id: first.id.clone(),
                    rol: TeamRole::SolutionDeveloper,
                    desarrollador: first.desarrollador.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.solution_developer_name(), "Ana");
        assert_eq!(updated.estado, TimeboxStatus::Available);

        let err = repo
            .assign_role(
                "tb-1",
                &AssignRoleRequest {
                    postulacion_id: second.id.clone(),
                    rol: TeamRole::SolutionDeveloper,
                    desarrollador: second.desarrollador.clone(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_payment_status_checked_by_store() {
        let repo = InMemoryPaymentOrderRepository::new();
        let created = repo
            .create(&OrdenDePago {
                id: None,
                developer_id: "d".to_string(),
                developer_nombre: None,
                monto: 10.0,
                moneda: "USD".to_string(),
                concepto: "x".to_string(),
                estado: PaymentStatus::Pendiente,
                timebox_id: "tb".to_string(),
                rol: "solutionTester".to_string(),
                semanas: None,
                fecha_creacion: None,
                comprobante: None,
            })
            .await
            .unwrap();
        let id = created.id.unwrap();

        assert!(repo.update_status(&id, PaymentStatus::Pagada).await.is_err());
        let approved = repo.update_status(&id, PaymentStatus::Aprobada).await.unwrap();
        assert_eq!(approved.estado, PaymentStatus::Aprobada);
    }

    #[tokio::test]
    async fn test_uploader_rejects_empty_file() {
        let uploader = InMemoryUploader::new();
        assert!(uploader.upload(UploadFile::new("a.pdf", Vec::new())).await.is_err());
        let adjunto = uploader
            .upload(UploadFile::new("a.pdf", vec![1]))
            .await
            .unwrap();
        assert_eq!(adjunto.nombre, "a.pdf");
        assert_eq!(uploader.uploaded(), vec!["a.pdf".to_string()]);
    }
}
