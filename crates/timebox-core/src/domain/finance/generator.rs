//! Payment-order generation for finished timeboxes
//!
//! One order per filled team role: weekly rate times billable weeks.
//! Roles that already have an order for the timebox are skipped, so running
//! the generator twice never duplicates payments.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::order::{OrdenDePago, PaymentStatus};
use super::rates::{RateResolver, RateTable};
use super::repository::{PaymentOrderRepository, RoleRepository};
use super::weeks::billable_weeks;
use crate::domain::timebox::{TeamRole, Timebox, TimeboxStatus};
use crate::error::{Error, Result};

/// Why a filled role produced no order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An order for `(timeboxId, rol)` already exists
    AlreadyIssued,
    /// Neither the catalog nor the fallback table has a rate
    NoRate,
}

/// Outcome of one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub weeks: u32,
    pub created: Vec<OrdenDePago>,
    pub skipped: Vec<(TeamRole, SkipReason)>,
    pub failed: Vec<(TeamRole, String)>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_amount(&self) -> f64 {
        self.created.iter().map(|o| o.monto).sum()
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct PaymentOrderGenerator {
    orders: Arc<dyn PaymentOrderRepository>,
    roles: Arc<dyn RoleRepository>,
    rates: RateTable,
    currency: String,
}

impl PaymentOrderGenerator {
    pub fn new(
        orders: Arc<dyn PaymentOrderRepository>,
        roles: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            orders,
            roles,
            rates: RateTable::default(),
            currency: "USD".to_string(),
        }
    }

    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Issue the missing payment orders for a finished timebox
    ///
    /// Fails only when the timebox is not eligible or the existing orders
    /// cannot be listed. Per-role failures are collected in the report.
    pub async fn generate(&self, timebox: &Timebox, now: DateTime<Utc>) -> Result<GenerationReport> {
        if timebox.estado != TimeboxStatus::Finished {
            return Err(Error::BusinessRule(format!(
                "Payment orders require a finished timebox (estado is {})",
                timebox.estado
            )));
        }
        let Some(team) = timebox.team() else {
            return Err(Error::BusinessRule(
                "Timebox has no team assignment".to_string(),
            ));
        };
        let timebox_id = timebox.require_id()?;

        let issued: HashSet<String> = self
            .orders
            .list_for_timebox(timebox_id)
            .await?
            .into_iter()
            .map(|o| o.rol)
            .collect();

        let weeks = billable_weeks(timebox, now);
        let resolver = RateResolver::load(self.roles.as_ref(), &self.rates).await;
        let mut report = GenerationReport {
            weeks,
            ..Default::default()
        };

        for (role, persona) in team.filled() {
            if issued.contains(role.key()) {
                report.skipped.push((role, SkipReason::AlreadyIssued));
                continue;
            }
            let Some(rate) = resolver.resolve(role).await else {
                warn!(timebox_id = %timebox_id, role = %role, "No rate for role, skipping order");
                report.skipped.push((role, SkipReason::NoRate));
                continue;
            };

            let order = OrdenDePago {
                id: None,
                developer_id: persona.payee_key().to_string(),
                developer_nombre: Some(persona.nombre.clone()),
                monto: round_cents(rate.weekly * f64::from(weeks)),
                moneda: self.currency.clone(),
                concepto: format!(
                    "Pago {} - {} ({} semanas)",
                    role.label(),
                    timebox.name(),
                    weeks
                ),
                estado: PaymentStatus::Pendiente,
                timebox_id: timebox_id.to_string(),
                rol: role.key().to_string(),
                semanas: Some(weeks),
                fecha_creacion: Some(now),
                comprobante: None,
            };

            match self.orders.create(&order).await {
                Ok(created) => {
                    info!(timebox_id = %timebox_id, role = %role, monto = created.monto, "Payment order created");
                    report.created.push(created);
                }
                Err(e) => {
                    error!(timebox_id = %timebox_id, role = %role, error = %e, "Failed to create payment order");
                    report.failed.push((role, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
