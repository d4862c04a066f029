//! Finance service: payment orders and receipts

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::attachment::UploadFile;
use crate::domain::finance::{
    GenerationReport, OrdenDePago, PaymentOrderGenerator, PaymentOrderRepository, PaymentStatus,
};
use crate::domain::timebox::Timebox;
use crate::error::{Error, Result};
use crate::store::EntityStore;

pub struct FinanceService {
    orders: Arc<dyn PaymentOrderRepository>,
    generator: Arc<PaymentOrderGenerator>,
    store: EntityStore<OrdenDePago>,
}

impl FinanceService {
    pub fn new(orders: Arc<dyn PaymentOrderRepository>, generator: Arc<PaymentOrderGenerator>) -> Self {
        Self {
            orders,
            generator,
            store: EntityStore::new("payment-orders"),
        }
    }

    pub fn store(&self) -> &EntityStore<OrdenDePago> {
        &self.store
    }

    /// Orders payable to one developer
    pub async fn my_payments(&self, developer_id: &str) -> Result<Arc<Vec<OrdenDePago>>> {
        self.store
            .refresh(|| self.orders.list_for_developer(developer_id))
            .await
    }

    /// Every order (admin view)
    pub async fn all_payments(&self) -> Result<Arc<Vec<OrdenDePago>>> {
        self.store.refresh(|| self.orders.list_all()).await
    }

    /// Orders for one timebox
    pub async fn for_timebox(&self, timebox_id: &str) -> Result<Vec<OrdenDePago>> {
        self.orders.list_for_timebox(timebox_id).await
    }

    /// Move an order forward
    ///
    /// The order must be in the last loaded list; backwards moves are
    /// refused without contacting the backend.
    pub async fn set_status(&self, order_id: &str, estado: PaymentStatus) -> Result<OrdenDePago> {
        let order = self
            .store
            .get(order_id)
            .ok_or_else(|| Error::PaymentOrderNotFound(order_id.to_string()))?;
        order.clone().transition_to(estado)?;

        let updated = self.orders.update_status(order_id, estado).await?;
        self.store.upsert(updated.clone());
        info!(order_id = %order_id, from = %order.estado, to = %estado, "Payment order updated");
        Ok(updated)
    }

    /// Attach a payment receipt
    pub async fn upload_receipt(&self, order_id: &str, file: UploadFile) -> Result<OrdenDePago> {
        if file.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Receipt '{}' is empty",
                file.file_name
            )));
        }
        let updated = self.orders.upload_receipt(order_id, file).await?;
        self.store.upsert(updated.clone());
        info!(order_id = %order_id, "Receipt uploaded");
        Ok(updated)
    }

    /// Issue the missing orders for a finished timebox
    pub async fn generate(&self, timebox: &Timebox, now: DateTime<Utc>) -> Result<GenerationReport> {
        let report = self.generator.generate(timebox, now).await?;
        if !report.created.is_empty() {
            self.store.invalidate();
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timebox::PhaseKind;
    use crate::domain::timebox::fixtures::{full_team, planned_timebox};
    use crate::infrastructure::memory::{InMemoryPaymentOrderRepository, InMemoryRoleRepository};

    fn order(id: &str, developer: &str, estado: PaymentStatus) -> OrdenDePago {
        OrdenDePago {
            id: Some(id.to_string()),
            developer_id: developer.to_string(),
            developer_nombre: None,
            monto: 1200.0,
            moneda: "USD".to_string(),
            concepto: "Pago".to_string(),
            estado,
            timebox_id: "tb-1".to_string(),
            rol: "solutionDeveloper".to_string(),
            semanas: Some(2),
            fecha_creacion: None,
            comprobante: None,
        }
    }

    fn service(orders: Vec<OrdenDePago>) -> (Arc<InMemoryPaymentOrderRepository>, FinanceService) {
        let repo = Arc::new(InMemoryPaymentOrderRepository::with_orders(orders));
        let generator = PaymentOrderGenerator::new(
            repo.clone(),
            Arc::new(InMemoryRoleRepository::new(vec![])),
        );
        (repo.clone(), FinanceService::new(repo, Arc::new(generator)))
    }

    #[tokio::test]
    async fn test_my_payments_filters_by_developer() {
        let (_, finance) = service(vec![
            order("o1", "dev-1", PaymentStatus::Pendiente),
            order("o2", "dev-2", PaymentStatus::Pendiente),
        ]);
        let mine = finance.my_payments("dev-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(finance.all_payments().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_backward_move_refused_before_network() {
        let (repo, finance) = service(vec![order("o1", "dev-1", PaymentStatus::Pagada)]);
        finance.all_payments().await.unwrap();
        let calls = repo.calls();

        let err = finance
            .set_status("o1", PaymentStatus::Pendiente)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(repo.calls(), calls);
    }

    #[tokio::test]
    async fn test_forward_moves() {
        let (_, finance) = service(vec![order("o1", "dev-1", PaymentStatus::Pendiente)]);
        finance.all_payments().await.unwrap();

        finance.set_status("o1", PaymentStatus::Aprobada).await.unwrap();
        let paid = finance.set_status("o1", PaymentStatus::Pagada).await.unwrap();
        assert_eq!(paid.estado, PaymentStatus::Pagada);
        assert_eq!(finance.store().get("o1").unwrap().estado, PaymentStatus::Pagada);

        assert!(matches!(
            finance.set_status("missing", PaymentStatus::Pagada).await,
            Err(Error::PaymentOrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_receipt_upload() {
        let (_, finance) = service(vec![order("o1", "dev-1", PaymentStatus::Pagada)]);
        let err = finance
            .upload_receipt("o1", UploadFile::new("recibo.pdf", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let updated = finance
            .upload_receipt("o1", UploadFile::new("recibo.pdf", b"%PDF".to_vec()))
            .await
            .unwrap();
        assert_eq!(updated.comprobante.unwrap().nombre, "recibo.pdf");
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let (_, finance) = service(vec![]);
        let mut timebox = planned_timebox();
        timebox.fases.kick_off.team_movilization = Some(full_team());
        timebox.complete_phase(PhaseKind::Close, Utc::now());

        let first = finance.generate(&timebox, Utc::now()).await.unwrap();
        assert_eq!(first.created.len(), 5);
        let second = finance.generate(&timebox, Utc::now()).await.unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 5);
        assert_eq!(finance.for_timebox("tb-1").await.unwrap().len(), 5);
    }
}
