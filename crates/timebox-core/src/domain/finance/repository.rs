//! Repository traits for payment orders and the role catalog

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::order::{OrdenDePago, PaymentStatus};
use crate::domain::attachment::UploadFile;
use crate::error::Result;

/// A role from the backend catalog (`/roles`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    #[serde(default)]
    pub nombre: String,
    /// Weekly rate, when the catalog embeds it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sueldo: Option<f64>,
}

#[async_trait]
pub trait PaymentOrderRepository: Send + Sync {
    /// Orders payable to one developer (`/finanzas/mis-pagos/{developerId}`)
    async fn list_for_developer(&self, developer_id: &str) -> Result<Vec<OrdenDePago>>;

    /// Every order (`/finanzas/mis-pagos/all`)
    async fn list_all(&self) -> Result<Vec<OrdenDePago>>;

    /// Orders already issued for a timebox
    async fn list_for_timebox(&self, timebox_id: &str) -> Result<Vec<OrdenDePago>>;

    /// Persist a new order
    async fn create(&self, order: &OrdenDePago) -> Result<OrdenDePago>;

    /// Change an order's status
    async fn update_status(&self, order_id: &str, estado: PaymentStatus) -> Result<OrdenDePago>;

    /// Attach a payment receipt (comprobante)
    async fn upload_receipt(&self, order_id: &str, file: UploadFile) -> Result<OrdenDePago>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// List the role catalog
    async fn list(&self) -> Result<Vec<Role>>;

    /// Weekly salary for a catalog role (`/roles/{id}/sueldo`)
    async fn weekly_salary(&self, role_id: &str) -> Result<Option<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn PaymentOrderRepository, _: &dyn RoleRepository) {}
}
