//! Payment orders and role catalog over the REST backend

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::attachment::UploadFile;
use crate::domain::finance::{
    OrdenDePago, PaymentOrderRepository, PaymentStatus, Role, RoleRepository,
};
use crate::error::{Error, Result};
use crate::infrastructure::http::ApiClient;

#[derive(Debug, Clone)]
pub struct HttpPaymentOrderRepository {
    client: ApiClient,
}

impl HttpPaymentOrderRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentOrderRepository for HttpPaymentOrderRepository {
    async fn list_for_developer(&self, developer_id: &str) -> Result<Vec<OrdenDePago>> {
        self.client
            .get(&format!("/finanzas/mis-pagos/{}", developer_id))
            .await
    }

    async fn list_all(&self) -> Result<Vec<OrdenDePago>> {
        self.client.get("/finanzas/mis-pagos/all").await
    }

    async fn list_for_timebox(&self, timebox_id: &str) -> Result<Vec<OrdenDePago>> {
        let orders: Vec<OrdenDePago> = self
            .client
            .get_query("/finanzas/ordenes-pago", &[("timeboxId", timebox_id)])
            .await?;
        // Older backends ignore the filter
        Ok(orders
            .into_iter()
            .filter(|o| o.timebox_id == timebox_id)
            .collect())
    }

    async fn create(&self, order: &OrdenDePago) -> Result<OrdenDePago> {
        self.client.post("/finanzas/ordenes-pago", order).await
    }

    async fn update_status(&self, order_id: &str, estado: PaymentStatus) -> Result<OrdenDePago> {
        self.client
            .patch(
                &format!("/finanzas/ordenes-pago/{}/estado", order_id),
                &json!({ "estado": estado }),
            )
            .await
    }

    async fn upload_receipt(&self, order_id: &str, file: UploadFile) -> Result<OrdenDePago> {
        self.client
            .post_multipart(
                &format!("/finanzas/ordenes-pago/{}/comprobante", order_id),
                "comprobante",
                file,
            )
            .await
    }
}

#[derive(Debug, Clone)]
pub struct HttpRoleRepository {
    client: ApiClient,
}

impl HttpRoleRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

/// Accepts `600`, `"600"`, `{ "sueldo": 600 }` or `{ "sueldoSemanal": 600 }`
fn salary_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => ["sueldo", "sueldoSemanal", "salary"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(salary_from),
        _ => None,
    }
}

#[async_trait]
impl RoleRepository for HttpRoleRepository {
    async fn list(&self) -> Result<Vec<Role>> {
        self.client.get("/roles").await
    }

    async fn weekly_salary(&self, role_id: &str) -> Result<Option<f64>> {
        let path = format!("/roles/{}/sueldo", role_id);
        let value: Option<Value> = self.client.get_optional(&path).await?;
        let salary = value.as_ref().and_then(salary_from);
        debug!(role_id = %role_id, salary = ?salary, "Fetched weekly salary");
        match (value, salary) {
            (Some(v), None) if !v.is_null() => Err(Error::InvalidResponse(format!(
                "{}: unexpected salary payload {}",
                path, v
            ))),
            _ => Ok(salary),
        }
    }
}
