use async_trait::async_trait;

use crate::cache::ResourceKey;
use crate::types::{
    CurrentUser, DashboardStats, Medicine, MedicineId, MedicinePage, MedicineWriteRequest, Sale,
    SaleCreateRequest, SaleId, SalePage,
};

use super::error::ApiError;

/// The remote inventory/sales API.
///
/// List reads take the resolved [`ResourceKey`] so the cache key and the
/// request always describe the same endpoint and parameters.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_medicines(&self, key: &ResourceKey) -> Result<MedicinePage, ApiError>;

    async fn create_medicine(&self, body: &MedicineWriteRequest) -> Result<Medicine, ApiError>;

    async fn update_medicine(
        &self,
        id: MedicineId,
        body: &MedicineWriteRequest,
    ) -> Result<Medicine, ApiError>;

    async fn delete_medicine(&self, id: MedicineId) -> Result<(), ApiError>;

    async fn create_sale(&self, body: &SaleCreateRequest) -> Result<Sale, ApiError>;

    async fn get_sale(&self, id: SaleId) -> Result<Sale, ApiError>;

    async fn list_sales(&self, key: &ResourceKey) -> Result<SalePage, ApiError>;

    async fn cancel_sale(&self, id: SaleId) -> Result<(), ApiError>;

    async fn current_user(&self) -> Result<CurrentUser, ApiError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError>;
}
