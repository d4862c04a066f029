//! Phase validation
//!
//! Validates each phase sub-form before it can be completed. Validators are
//! pure: they never touch the network and return every failure at once.

use crate::application::errors::ValidationErrors;
use crate::domain::timebox::{
    ClosePhase, Cumplimiento, Entrega, KickOffPhase, PhaseKind, Phases, PlanningPhase, QaPhase,
    RefinementPhase,
};

/// Validator for the phase sub-forms
pub struct PhaseValidator;

impl PhaseValidator {
    /// Valid effort sizes for `planning.esfuerzo`
    pub const EFFORT_SIZES: &'static [&'static str] = &["XS", "S", "M", "L", "XL"];

    /// Validate the sub-form of one phase
    pub fn validate(kind: PhaseKind, phases: &Phases) -> ValidationErrors {
        match kind {
            PhaseKind::Planning => Self::validate_planning(&phases.planning),
            PhaseKind::KickOff => Self::validate_kick_off(&phases.kick_off),
            PhaseKind::Refinement => Self::validate_refinement(&phases.refinement),
            PhaseKind::Qa => Self::validate_qa(&phases.qa),
            PhaseKind::Close => Self::validate_close(&phases.close),
        }
    }

    /// Validate Planning
    ///
    /// Rules:
    /// - `nombre` and `fechaInicio` are required
    /// - `fechaFin`, when set, is not before `fechaInicio`
    /// - `esfuerzo`, when set, is one of [`EFFORT_SIZES`](Self::EFFORT_SIZES)
    pub fn validate_planning(planning: &PlanningPhase) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require(
            !planning.nombre.trim().is_empty(),
            "planning.nombre",
            "Name is required",
        );
        if planning.nombre.chars().count() > 120 {
            errors.add("planning.nombre", "Name must be at most 120 characters");
        }
        errors.require(
            planning.fecha_inicio.is_some(),
            "planning.fechaInicio",
            "Start date is required",
        );
        if let (Some(start), Some(end)) = (planning.fecha_inicio, planning.fecha_fin)
            && end < start
        {
            errors.add("planning.fechaFin", "End date cannot be before the start date");
        }
        if let Some(esfuerzo) = planning.esfuerzo.as_deref()
            && !Self::EFFORT_SIZES
                .iter()
                .any(|size| size.eq_ignore_ascii_case(esfuerzo.trim()))
        {
            errors.add(
                "planning.esfuerzo",
                format!(
                    "Invalid effort '{}'. Valid sizes: {}",
                    esfuerzo,
                    Self::EFFORT_SIZES.join(", ")
                ),
            );
        }
        if planning.skills.iter().any(|s| s.trim().is_empty()) {
            errors.add("planning.skills", "Skills cannot be blank");
        }
        errors
    }

    /// Validate KickOff
    ///
    /// Rules:
    /// - `fechaKickOff` is required
    /// - agreements cannot be blank
    ///
    /// Missing team roles do not fail validation; they only decide whether the
    /// phase can be completed after publishing.
    pub fn validate_kick_off(kick_off: &KickOffPhase) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require(
            kick_off.fecha_kick_off.is_some(),
            "kickOff.fechaKickOff",
            "Kick-off date is required",
        );
        if kick_off.lista_acuerdos.iter().any(|a| a.trim().is_empty()) {
            errors.add("kickOff.listaAcuerdos", "Agreements cannot be blank");
        }
        errors
    }

    /// Validate Refinement: every review request needs a description
    pub fn validate_refinement(refinement: &RefinementPhase) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for (i, revision) in refinement.revisiones.iter().enumerate() {
            if revision.descripcion.trim().is_empty() {
                errors.add(
                    format!("refinement.revisiones[{}].descripcion", i),
                    "Description is required",
                );
            }
        }
        errors
    }

    /// Validate QA
    ///
    /// Rules:
    /// - `estadoConsolidacion` is required
    /// - `fechaEntrega`, when set, is not before `fechaPreparacionQa`
    pub fn validate_qa(qa: &QaPhase) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require(
            qa.estado_consolidacion
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty()),
            "qa.estadoConsolidacion",
            "Consolidation status is required",
        );
        if let (Some(prepared), Some(delivered)) = (qa.fecha_preparacion_qa, qa.fecha_entrega)
            && delivered < prepared
        {
            errors.add(
                "qa.fechaEntrega",
                "Delivery date cannot be before the QA preparation date",
            );
        }
        errors
    }

    /// Validate Close
    ///
    /// Rules:
    /// - `cumplimiento` is required
    /// - a partial fulfilment needs an `observacion`
    pub fn validate_close(close: &ClosePhase) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match close.cumplimiento {
            None => errors.add("close.cumplimiento", "Fulfilment is required"),
            Some(Cumplimiento::Parcial)
                if close
                    .observacion
                    .as_deref()
                    .is_none_or(|o| o.trim().is_empty()) =>
            {
                errors.add(
                    "close.observacion",
                    "An observation is required for a partial fulfilment",
                )
            }
            Some(_) => {}
        }
        if close.mejoras.iter().any(|m| m.trim().is_empty()) {
            errors.add("close.mejoras", "Improvements cannot be blank");
        }
        errors
    }

    /// Validate a delivery before its files are uploaded
    ///
    /// `pending_files` counts files about to be uploaded alongside the ones
    /// already attached.
    pub fn validate_delivery(entrega: &Entrega, pending_files: usize) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require(
            entrega.archivos.len() + pending_files > 0,
            "entrega.archivos",
            "At least one file is required",
        );
        if entrega
            .descripcion
            .as_deref()
            .is_some_and(|d| d.chars().count() > 2000)
        {
            errors.add(
                "entrega.descripcion",
                "Description must be at most 2000 characters",
            );
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dates::parse_datetime;
    use crate::domain::timebox::Revision;

    fn planning() -> PlanningPhase {
        PlanningPhase {
            nombre: "Portal".to_string(),
            fecha_inicio: parse_datetime("2025-01-01"),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_planning() {
        assert!(PhaseValidator::validate_planning(&planning()).is_empty());
    }

    #[test]
    fn test_planning_requires_name_and_start() {
        let errors = PhaseValidator::validate_planning(&PlanningPhase::default());
        assert!(errors.has_field("planning.nombre"));
        assert!(errors.has_field("planning.fechaInicio"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_planning_end_before_start() {
        let mut p = planning();
        p.fecha_fin = parse_datetime("2024-12-01");
        let errors = PhaseValidator::validate_planning(&p);
        assert!(errors.has_field("planning.fechaFin"));

        p.fecha_fin = parse_datetime("2025-01-01");
        assert!(PhaseValidator::validate_planning(&p).is_empty());
    }

    #[test]
    fn test_planning_effort() {
        let mut p = planning();
        p.esfuerzo = Some("m".to_string());
        assert!(PhaseValidator::validate_planning(&p).is_empty());

        p.esfuerzo = Some("huge".to_string());
        assert!(PhaseValidator::validate_planning(&p).has_field("planning.esfuerzo"));
    }

    #[test]
    fn test_kick_off_requires_date_only() {
        let errors = PhaseValidator::validate_kick_off(&KickOffPhase::default());
        assert!(errors.has_field("kickOff.fechaKickOff"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_refinement_descriptions() {
        let mut refinement = RefinementPhase::default();
        assert!(PhaseValidator::validate_refinement(&refinement).is_empty());

        refinement.revisiones.push(Revision::new("ok", None));
        refinement.revisiones.push(Revision::new("  ", None));
        let errors = PhaseValidator::validate_refinement(&refinement);
        assert!(errors.has_field("refinement.revisiones[1].descripcion"));
    }

    #[test]
    fn test_qa_rules() {
        let mut qa = QaPhase::default();
        assert!(PhaseValidator::validate_qa(&qa).has_field("qa.estadoConsolidacion"));

        qa.estado_consolidacion = Some("Consolidado".to_string());
        qa.fecha_preparacion_qa = parse_datetime("2025-02-10");
        qa.fecha_entrega = parse_datetime("2025-02-01");
        let errors = PhaseValidator::validate_qa(&qa);
        assert!(errors.has_field("qa.fechaEntrega"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_close_partial_needs_observation() {
        let mut close = ClosePhase::default();
        assert!(PhaseValidator::validate_close(&close).has_field("close.cumplimiento"));

        close.cumplimiento = Some(Cumplimiento::Parcial);
        assert!(PhaseValidator::validate_close(&close).has_field("close.observacion"));

        close.observacion = Some("Falta el reporte".to_string());
        assert!(PhaseValidator::validate_close(&close).is_empty());

        close.cumplimiento = Some(Cumplimiento::Total);
        close.observacion = None;
        assert!(PhaseValidator::validate_close(&close).is_empty());
    }

    #[test]
    fn test_delivery_needs_a_file() {
        let entrega = Entrega::default();
        assert!(PhaseValidator::validate_delivery(&entrega, 0).has_field("entrega.archivos"));
        assert!(PhaseValidator::validate_delivery(&entrega, 1).is_empty());
    }

    #[test]
    fn test_dispatch_by_kind() {
        let phases = Phases::default();
        for kind in [PhaseKind::Planning, PhaseKind::KickOff, PhaseKind::Qa, PhaseKind::Close] {
            assert!(!PhaseValidator::validate(kind, &phases).is_empty(), "{kind}");
        }
        assert!(PhaseValidator::validate(PhaseKind::Refinement, &phases).is_empty());
    }
}
