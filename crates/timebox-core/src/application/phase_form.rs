//! Timebox phase form
//!
//! Holds the local draft of one timebox and drives it through the phases.
//! Every change goes to the backend first; the draft, the stepper and the
//! shared store are only updated with the version the backend returns.
//!
//! Kick Off decouples publishing the offer from completing the phase:
//!
//! | published? | roles filled? | result                                  |
//! |------------|---------------|-----------------------------------------|
//! | yes        | no            | save only                               |
//! | yes        | yes           | complete, then advance                  |
//! | no         | yes           | publish, complete, then advance         |
//! | no         | no            | publish only, warn about missing roles  |
//!
//! Completing Close finishes the timebox and issues payment orders in a
//! background task. Generation failures are logged and never undo the close.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::errors::ValidationErrors;
use super::stepper::Stepper;
use super::validators::PhaseValidator;
use crate::domain::attachment::{UploadFile, Uploader};
use crate::domain::finance::{GenerationReport, PaymentOrderGenerator};
use crate::domain::timebox::{
    Entrega, PhaseKind, Revision, TeamRole, Timebox, TimeboxRepository,
};
use crate::error::{Error, Result};
use crate::store::EntityStore;

/// What a form action did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseOutcome {
    pub phase: PhaseKind,
    /// The phase is completed in the saved timebox
    pub completed: bool,
    /// The offer was published by this action
    pub published: bool,
    /// The stepper moved to the next phase
    pub advanced: bool,
    /// Nothing was saved yet; the timebox is created by [`TimeboxPhaseForm::confirm_create`]
    pub awaiting_confirmation: bool,
    /// Team roles still empty after publishing
    pub missing_roles: Vec<TeamRole>,
}

impl PhaseOutcome {
    fn new(phase: PhaseKind) -> Self {
        Self {
            phase,
            completed: false,
            published: false,
            advanced: false,
            awaiting_confirmation: false,
            missing_roles: Vec::new(),
        }
    }

    /// User-facing warning, when roles are still missing
    pub fn warning(&self) -> Option<String> {
        if self.missing_roles.is_empty() {
            return None;
        }
        let labels: Vec<&str> = self.missing_roles.iter().map(|r| r.label()).collect();
        let lead = if self.published {
            "Offer published"
        } else {
            "Offer already published"
        };
        Some(format!(
            "{}, but these roles are still missing: {}",
            lead,
            labels.join(", ")
        ))
    }
}

/// A new timebox staged until the user confirms its creation
#[derive(Debug, Clone)]
struct PendingCreate {
    timebox: Timebox,
    completes: bool,
    advance: bool,
}

/// Multi-phase form over one timebox
pub struct TimeboxPhaseForm {
    repo: Arc<dyn TimeboxRepository>,
    store: Arc<EntityStore<Timebox>>,
    uploader: Option<Arc<dyn Uploader>>,
    payments: Option<Arc<PaymentOrderGenerator>>,
    draft: Timebox,
    stepper: Stepper,
    errors: ValidationErrors,
    touched: bool,
    pending: Option<PendingCreate>,
    payment_task: Option<JoinHandle<Option<GenerationReport>>>,
}

impl TimeboxPhaseForm {
    /// Open the form on a new or existing timebox
    pub fn new(
        repo: Arc<dyn TimeboxRepository>,
        store: Arc<EntityStore<Timebox>>,
        timebox: Timebox,
    ) -> Self {
        let stepper = Stepper::from_phases(&timebox.fases);
        Self {
            repo,
            store,
            uploader: None,
            payments: None,
            draft: timebox,
            stepper,
            errors: ValidationErrors::new(),
            touched: false,
            pending: None,
            payment_task: None,
        }
    }

    /// Uploader used for delivery files
    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Issue payment orders when Close completes
    pub fn with_payments(mut self, generator: Arc<PaymentOrderGenerator>) -> Self {
        self.payments = Some(generator);
        self
    }

    // ========== State ==========

    pub fn timebox(&self) -> &Timebox {
        &self.draft
    }

    /// Local edits; nothing is sent until a save or completion
    pub fn draft_mut(&mut self) -> &mut Timebox {
        &mut self.draft
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    /// Errors from the last rejected action
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Whether every field should show its error (set after a rejected action)
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    /// Open another phase, subject to the stepper's gating
    pub fn go_to(&mut self, phase: PhaseKind) -> Result<PhaseKind> {
        self.stepper.go_to(phase.index())
    }

    // ========== Save ==========

    /// Save the draft
    ///
    /// A timebox without an id is only staged; call
    /// [`confirm_create`](Self::confirm_create) to create it.
    pub async fn save(&mut self) -> Result<PhaseOutcome> {
        let mut outcome = PhaseOutcome::new(self.stepper.active_phase());
        if !self.draft.is_persisted() {
            self.check(PhaseKind::Planning)?;
            self.stage_create(self.draft.clone(), false, false);
            outcome.awaiting_confirmation = true;
            return Ok(outcome);
        }
        let saved = self.persist(self.draft.clone()).await?;
        outcome.completed = saved.fases.is_completed(outcome.phase);
        Ok(outcome)
    }

    /// Create the staged timebox
    pub async fn confirm_create(&mut self) -> Result<PhaseOutcome> {
        let Some(pending) = self.pending.take() else {
            return Err(Error::BusinessRule(
                "There is no new timebox waiting for confirmation".to_string(),
            ));
        };
        let mut outcome = PhaseOutcome::new(PhaseKind::Planning);
        let PendingCreate {
            timebox,
            completes,
            advance,
        } = pending.clone();
        match self.persist(timebox).await {
            Ok(saved) => {
                info!(
                    timebox_id = saved.id.as_deref().unwrap_or_default(),
                    "Timebox created"
                );
                outcome.completed = completes && saved.fases.is_completed(PhaseKind::Planning);
                outcome.advanced = outcome.completed && advance && self.advance_from(PhaseKind::Planning);
                Ok(outcome)
            }
            Err(e) => {
                // keep the staged version so the user can retry
                self.pending = Some(pending);
                Err(e)
            }
        }
    }

    /// Drop the staged creation
    pub fn cancel_create(&mut self) {
        if self.pending.take().is_some() {
            debug!("Timebox creation cancelled");
        }
    }

    // ========== Phase completion ==========

    /// Complete a phase: validate, mark it complete, save, optionally advance
    ///
    /// On a validation error every field is marked touched and nothing
    /// changes. On a save error the phase stays incomplete.
    pub async fn complete_phase(
        &mut self,
        phase: PhaseKind,
        advance: bool,
        now: DateTime<Utc>,
    ) -> Result<PhaseOutcome> {
        if phase == PhaseKind::KickOff {
            return self.complete_kick_off(advance, now).await;
        }
        if !self.stepper.can_advance_to(phase.index()) {
            return Err(Error::BusinessRule(format!(
                "Cannot complete {}: the previous phase is not completed",
                phase.label()
            )));
        }
        self.check(phase)?;

        let mut candidate = self.draft.clone();
        candidate.complete_phase(phase, now);
        if phase == PhaseKind::Close && candidate.fases.close.fecha_completado.is_none() {
            candidate.fases.close.fecha_completado = Some(now);
        }

        let mut outcome = PhaseOutcome::new(phase);
        if !candidate.is_persisted() {
            if phase != PhaseKind::Planning {
                candidate.require_id()?;
            }
            self.stage_create(candidate, true, advance);
            outcome.awaiting_confirmation = true;
            return Ok(outcome);
        }

        let saved = self.persist(candidate).await?;
        outcome.completed = saved.fases.is_completed(phase);
        info!(
            timebox_id = saved.id.as_deref().unwrap_or_default(),
            phase = %phase,
            estado = %saved.estado,
            "Phase completed"
        );
        if outcome.completed && advance {
            outcome.advanced = self.advance_from(phase);
        }
        if phase == PhaseKind::Close && saved.estado.is_finished() {
            self.spawn_payments(saved, now);
        }
        Ok(outcome)
    }

    async fn complete_kick_off(&mut self, advance: bool, now: DateTime<Utc>) -> Result<PhaseOutcome> {
        self.draft.require_id()?;
        if !self.stepper.can_advance_to(PhaseKind::KickOff.index()) {
            return Err(Error::BusinessRule(
                "Cannot complete Kick Off: Planning is not completed".to_string(),
            ));
        }
        self.check(PhaseKind::KickOff)?;

        let roles_filled = self.draft.roles_filled();
        let mut outcome = PhaseOutcome::new(PhaseKind::KickOff);
        let mut candidate = self.draft.clone();

        if !candidate.is_published() {
            candidate.publish(now);
            outcome.published = true;
        }
        if roles_filled {
            candidate.complete_phase(PhaseKind::KickOff, now);
        } else {
            outcome.missing_roles = candidate
                .team()
                .map(|team| team.missing_roles())
                .unwrap_or_else(|| TeamRole::ALL.to_vec());
        }

        let saved = self.persist(candidate).await?;
        outcome.completed = saved.fases.is_completed(PhaseKind::KickOff);
        if outcome.completed && advance {
            outcome.advanced = self.advance_from(PhaseKind::KickOff);
        }
        if let Some(warning) = outcome.warning() {
            warn!(timebox_id = saved.id.as_deref().unwrap_or_default(), "{}", warning);
        }
        Ok(outcome)
    }

    /// Publish the offer without touching phase completion
    pub async fn publish(&mut self, now: DateTime<Utc>) -> Result<PhaseOutcome> {
        self.draft.require_id()?;
        let mut outcome = PhaseOutcome::new(PhaseKind::KickOff);
        if self.draft.is_published() {
            return Ok(outcome);
        }
        let mut candidate = self.draft.clone();
        candidate.publish(now);
        let saved = self.persist(candidate).await?;
        outcome.published = saved.is_published();
        outcome.missing_roles = saved
            .team()
            .map(|team| team.missing_roles())
            .unwrap_or_else(|| TeamRole::ALL.to_vec());
        Ok(outcome)
    }

    // ========== Refinement ==========

    /// Add a review request to Refinement and save it
    pub async fn add_revision(
        &mut self,
        descripcion: impl Into<String>,
        fecha: Option<DateTime<Utc>>,
    ) -> Result<Revision> {
        self.draft.require_id()?;
        let revision = Revision::new(descripcion, fecha);
        if revision.descripcion.trim().is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add("refinement.revisiones.descripcion", "Description is required");
            return Err(self.reject(errors));
        }
        let mut candidate = self.draft.clone();
        candidate.fases.refinement.revisiones.push(revision.clone());
        self.persist(candidate).await?;
        Ok(revision)
    }

    /// Complete one review request; the phase itself stays open
    pub async fn complete_revision(&mut self, revision_id: &str, now: DateTime<Utc>) -> Result<()> {
        self.draft.require_id()?;
        let mut candidate = self.draft.clone();
        if !candidate.fases.refinement.complete_revision(revision_id, now) {
            return Err(Error::InvalidInput(format!(
                "Review request '{}' not found",
                revision_id
            )));
        }
        self.persist(candidate).await?;
        Ok(())
    }

    // ========== Delivery ==========

    /// Upload delivery files, then save the delivery record
    pub async fn submit_delivery(
        &mut self,
        descripcion: Option<String>,
        files: Vec<UploadFile>,
        now: DateTime<Utc>,
    ) -> Result<Entrega> {
        self.draft.require_id()?;
        if !self.draft.roles_filled() {
            return Err(Error::BusinessRule(
                "Deliveries open once every Kick Off role is filled".to_string(),
            ));
        }
        if files.is_empty() {
            return Err(Error::BusinessRule(
                "A delivery needs at least one file".to_string(),
            ));
        }
        let mut proposed = self.draft.entrega.clone().unwrap_or_default();
        if descripcion.is_some() {
            proposed.descripcion = descripcion;
        }
        let errors = PhaseValidator::validate_delivery(&proposed, files.len());
        if !errors.is_empty() {
            return Err(self.reject(errors));
        }
        let uploader = self.uploader.clone().ok_or_else(|| {
            Error::ConfigError("No uploader configured for delivery files".to_string())
        })?;

        let mut archivos = Vec::with_capacity(files.len());
        for file in files {
            let name = file.file_name.clone();
            let adjunto = uploader.upload(file).await.inspect_err(|e| {
                error!(file = %name, error = %e, "Delivery upload failed");
            })?;
            archivos.push(adjunto);
        }

        let responsable = self
            .draft
            .team()
            .map(|team| team.get(TeamRole::SolutionDeveloper).clone())
            .filter(|p| !p.is_empty());
        proposed.archivos.extend(archivos);
        proposed.fecha_entrega = Some(now);
        if proposed.responsable.is_none() {
            proposed.responsable = responsable;
        }

        let mut candidate = self.draft.clone();
        candidate.entrega = Some(proposed);
        let saved = self.persist(candidate).await?;
        Ok(saved.entrega.unwrap_or_default())
    }

    // ========== Payments ==========

    /// Wait for the payment orders issued by the last Close
    ///
    /// `None` when no generation ran or it failed.
    pub async fn wait_for_payments(&mut self) -> Option<GenerationReport> {
        let task = self.payment_task.take()?;
        match task.await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Payment generation task panicked");
                None
            }
        }
    }

    fn spawn_payments(&mut self, timebox: Timebox, now: DateTime<Utc>) {
        let Some(generator) = self.payments.clone() else {
            return;
        };
        self.payment_task = Some(tokio::spawn(async move {
            let timebox_id = timebox.id.clone().unwrap_or_default();
            match generator.generate(&timebox, now).await {
                Ok(report) => {
                    info!(
                        timebox_id = %timebox_id,
                        created = report.created.len(),
                        skipped = report.skipped.len(),
                        failed = report.failed.len(),
                        "Payment orders generated"
                    );
                    Some(report)
                }
                Err(e) => {
                    error!(timebox_id = %timebox_id, error = %e, "Payment order generation failed");
                    None
                }
            }
        }));
    }

    // ========== Internals ==========

    fn check(&mut self, phase: PhaseKind) -> Result<()> {
        let errors = PhaseValidator::validate(phase, &self.draft.fases);
        if errors.is_empty() {
            self.errors = ValidationErrors::new();
            self.touched = false;
            return Ok(());
        }
        debug!(phase = %phase, errors = errors.len(), "Phase form rejected");
        Err(self.reject(errors))
    }

    fn reject(&mut self, errors: ValidationErrors) -> Error {
        self.touched = true;
        self.errors = errors.clone();
        Error::Validation(errors)
    }

    fn stage_create(&mut self, timebox: Timebox, completes: bool, advance: bool) {
        debug!(project_id = %timebox.project_id, "New timebox waiting for confirmation");
        self.pending = Some(PendingCreate {
            timebox,
            completes,
            advance,
        });
    }

    /// Send a candidate to the backend and adopt what comes back
    async fn persist(&mut self, candidate: Timebox) -> Result<Timebox> {
        let result = if candidate.is_persisted() {
            self.repo.update(&candidate).await
        } else {
            self.repo.create(&candidate).await
        };
        let mut saved = result.inspect_err(|e| {
            error!(
                timebox_id = candidate.id.as_deref().unwrap_or_default(),
                error = %e,
                "Saving timebox failed"
            );
        })?;
        saved.recompute_status();
        self.store.upsert(saved.clone());
        self.stepper.sync(&saved.fases);
        self.draft = saved.clone();
        Ok(saved)
    }

    fn advance_from(&mut self, phase: PhaseKind) -> bool {
        if phase.is_last() {
            return false;
        }
        self.stepper.go_to(phase.index() + 1).is_ok()
    }
}
