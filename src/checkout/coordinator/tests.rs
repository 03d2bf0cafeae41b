use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{OnceLock, Weak};

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use time::macros::{date, datetime};
use tokio::sync::Notify;

use super::*;
use crate::api::ApiError;
use crate::cache::{
    CacheConfig, InvalidationScope, ResourceCache, ResourceKey, StaleMarker,
};
use crate::checkout::RecordingNavigator;
use crate::domain::StockConflict;
use crate::types::{
    CurrentUser, DashboardStats, MedicinePage, MedicineWriteRequest, SaleCreateRequest, SaleId,
    SalePage, SaleStatus,
};

fn sale(id: SaleId, status: SaleStatus) -> Sale {
    Sale {
        id,
        customer_name: "Ada".into(),
        customer_phone: "555-0100".into(),
        items: Vec::new(),
        subtotal: Decimal::new(1198, 2),
        tax: Decimal::new(120, 2),
        total: Decimal::new(1318, 2),
        status,
        created_by: 3,
        created_by_username: Some("clerk".into()),
        created_at: datetime!(2025-01-15 10:30 UTC),
    }
}

fn aspirin(stock: u32) -> Product {
    Product {
        id: 1,
        name: "Aspirin".into(),
        unit_price: Decimal::new(599, 2),
        available_stock: stock,
    }
}

fn medicine(id: MedicineId, quantity: u32) -> Medicine {
    Medicine {
        id,
        name: "Aspirin".into(),
        category: None,
        category_name: None,
        quantity,
        price: Decimal::new(599, 2),
        expiry_date: date!(2025 - 12 - 31),
        is_low_stock: false,
        is_near_expiry: false,
        created_at: None,
        updated_at: None,
    }
}

#[derive(Default)]
struct FakeBackend {
    reject: Option<(StatusCode, &'static str)>,
    gate: Option<Arc<Notify>>,
    create_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    drafts: Mutex<Vec<SaleCreateRequest>>,
}

impl FakeBackend {
    fn unsupported() -> ApiError {
        ApiError::Http {
            status: StatusCode::NOT_IMPLEMENTED,
            message: "not used by checkout".into(),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_medicines(&self, _key: &ResourceKey) -> Result<MedicinePage, ApiError> {
        Err(Self::unsupported())
    }

    async fn create_medicine(&self, _body: &MedicineWriteRequest) -> Result<Medicine, ApiError> {
        Err(Self::unsupported())
    }

    async fn update_medicine(
        &self,
        _id: MedicineId,
        _body: &MedicineWriteRequest,
    ) -> Result<Medicine, ApiError> {
        Err(Self::unsupported())
    }

    async fn delete_medicine(&self, _id: MedicineId) -> Result<(), ApiError> {
        Err(Self::unsupported())
    }

    async fn create_sale(&self, body: &SaleCreateRequest) -> Result<Sale, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.drafts.lock().expect("drafts").push(body.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.reject {
            Some((status, body)) => Err(ApiError::from_response(status, body.as_bytes())),
            None => Ok(sale(42, SaleStatus::Completed)),
        }
    }

    async fn get_sale(&self, id: SaleId) -> Result<Sale, ApiError> {
        Ok(sale(id, SaleStatus::Completed))
    }

    async fn list_sales(&self, _key: &ResourceKey) -> Result<SalePage, ApiError> {
        Err(Self::unsupported())
    }

    async fn cancel_sale(&self, _id: SaleId) -> Result<(), ApiError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        Err(Self::unsupported())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        Err(Self::unsupported())
    }
}

struct Harness {
    coordinator: Arc<CheckoutCoordinator>,
    backend: Arc<FakeBackend>,
    cache: Arc<ResourceCache>,
    navigator: Arc<RecordingNavigator>,
}

fn harness(backend: FakeBackend) -> Harness {
    let backend = Arc::new(backend);
    let cache = Arc::new(ResourceCache::new(&CacheConfig::default()));
    let navigator = Arc::new(RecordingNavigator::new());
    let coordinator = Arc::new(CheckoutCoordinator::new(
        backend.clone(),
        MutationInvalidator::new(cache.clone()),
        navigator.clone(),
    ));
    Harness {
        coordinator,
        backend,
        cache,
        navigator,
    }
}

fn fill(coordinator: &CheckoutCoordinator, stock: u32, quantity: u32) {
    coordinator.add_item(&aspirin(stock)).expect("in stock");
    coordinator.set_quantity(1, quantity).expect("within stock");
    coordinator.set_customer_name("Ada").expect("idle");
    coordinator.set_customer_phone("555-0100").expect("idle");
}

#[tokio::test]
async fn validation_failures_never_reach_the_network() {
    let h = harness(FakeBackend::default());

    let err = h.coordinator.submit().await.expect_err("no customer");
    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::MissingCustomerName)
    ));
    assert_eq!(h.coordinator.phase(), CheckoutPhase::Failed);

    h.coordinator.set_customer_name("  Ada ").expect("edit");
    assert_eq!(h.coordinator.phase(), CheckoutPhase::Idle);
    h.coordinator.set_customer_phone("   ").expect("edit");
    let err = h.coordinator.submit().await.expect_err("blank phone");
    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::MissingCustomerPhone)
    ));

    h.coordinator.set_customer_phone("555").expect("edit");
    let err = h.coordinator.submit().await.expect_err("empty cart");
    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::EmptyCart)
    ));
    assert!(err.is_local());

    assert_eq!(h.backend.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stock_conflict_blocks_submission() {
    let h = harness(FakeBackend::default());
    fill(&h.coordinator, 5, 3);
    h.coordinator.sync_stock([&medicine(1, 0)]).expect("idle");

    let err = h.coordinator.submit().await.expect_err("sold out");
    assert!(matches!(
        err,
        CheckoutError::StockConflict(StockConflict::OutOfStock { product_id: 1, .. })
    ));
    assert_eq!(h.backend.create_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.coordinator.cart().len(), 1);
}

#[tokio::test]
async fn accepted_sale_invalidates_clears_and_navigates() {
    let h = harness(FakeBackend::default());
    let listing = ResourceKey::new(family::MEDICINES)
        .with_param("search", "")
        .with_param("page", 1);
    h.cache.insert(listing.clone(), 0_u8);
    h.cache.insert(ResourceKey::new(family::MEDICINES_LOW_STOCK), 0_u8);
    h.cache.insert(ResourceKey::dashboard_stats(), 0_u8);
    h.cache.insert(ResourceKey::new("auth/me"), 0_u8);

    fill(&h.coordinator, 150, 2);
    let outcome = h.coordinator.submit().await.expect("accepted");

    let SubmitOutcome::Completed { sale, route } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(sale.id, 42);
    assert_eq!(route, Route::SaleSummary(42));
    assert_eq!(h.navigator.current(), Some(Route::SaleSummary(42)));
    assert_eq!(h.coordinator.phase(), CheckoutPhase::Success);
    assert!(h.coordinator.cart().is_empty());
    assert_eq!(h.coordinator.customer(), Customer::default());

    assert_eq!(h.cache.is_stale(&listing), Some(true));
    assert_eq!(
        h.cache.is_stale(&ResourceKey::new(family::MEDICINES_LOW_STOCK)),
        Some(true)
    );
    assert_eq!(h.cache.is_stale(&ResourceKey::dashboard_stats()), Some(true));
    assert_eq!(h.cache.is_stale(&ResourceKey::new("auth/me")), Some(false));

    let drafts = h.backend.drafts.lock().expect("drafts");
    assert_eq!(drafts[0].customer_name, "Ada");
    assert_eq!(drafts[0].items[0].quantity, 2);
}

#[tokio::test]
async fn rejection_preserves_cart_and_surfaces_message() {
    let h = harness(FakeBackend {
        reject: Some((
            StatusCode::BAD_REQUEST,
            r#"{"non_field_errors": ["Insufficient stock for Aspirin. Available: 1"]}"#,
        )),
        ..Default::default()
    });
    let listing = ResourceKey::new(family::MEDICINES).with_param("page", 1);
    h.cache.insert(listing.clone(), 0_u8);

    fill(&h.coordinator, 5, 3);
    let err = h.coordinator.submit().await.expect_err("rejected");

    assert!(matches!(err, CheckoutError::Http(_)));
    assert!(!err.is_local());
    assert_eq!(h.coordinator.phase(), CheckoutPhase::Failed);
    assert_eq!(
        h.coordinator.last_error().as_deref(),
        Some("Insufficient stock for Aspirin. Available: 1")
    );
    assert_eq!(h.coordinator.cart().get(1).map(|l| l.quantity()), Some(3));
    assert_eq!(h.coordinator.customer().name, "Ada");
    assert_eq!(h.cache.is_stale(&listing), Some(false));
    assert!(h.navigator.history().is_empty());
    assert_eq!(h.backend.create_calls.load(Ordering::SeqCst), 1);

    h.coordinator.remove_item(1).expect("edit after failure");
    assert_eq!(h.coordinator.phase(), CheckoutPhase::Idle);
    assert_eq!(h.coordinator.last_error(), None);
}

#[tokio::test]
async fn second_submit_while_in_flight_is_ignored() {
    let gate = Arc::new(Notify::new());
    let h = harness(FakeBackend {
        gate: Some(gate.clone()),
        ..Default::default()
    });
    fill(&h.coordinator, 10, 1);

    let coordinator = &h.coordinator;
    let (first, second) = tokio::join!(coordinator.submit(), async {
        assert_eq!(coordinator.phase(), CheckoutPhase::Submitting);
        let edit = coordinator.add_item(&aspirin(10));
        assert!(matches!(edit, Err(CheckoutError::SubmissionInFlight)));
        let second = coordinator.submit().await;
        gate.notify_one();
        second
    });

    assert!(matches!(first, Ok(SubmitOutcome::Completed { .. })));
    assert!(matches!(second, Ok(SubmitOutcome::Ignored)));
    assert_eq!(h.backend.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.navigator.history().len(), 1);
}

/// Records the cart size seen by each invalidation and navigation.
struct Observer {
    cache: Arc<ResourceCache>,
    coordinator: OnceLock<Weak<CheckoutCoordinator>>,
    events: Mutex<Vec<(String, usize)>>,
}

impl Observer {
    fn cart_len(&self) -> usize {
        self.coordinator
            .get()
            .and_then(Weak::upgrade)
            .map(|c| c.cart().len())
            .unwrap_or(usize::MAX)
    }
}

impl StaleMarker for Observer {
    fn mark_stale(&self, scope: &InvalidationScope) -> usize {
        let len = self.cart_len();
        self.events
            .lock()
            .expect("events")
            .push((format!("invalidate:{}", scope.token()), len));
        self.cache.mark_stale(scope)
    }
}

impl Navigator for Observer {
    fn navigate(&self, route: Route) {
        let len = self.cart_len();
        self.events
            .lock()
            .expect("events")
            .push((format!("navigate:{}", route.path()), len));
    }
}

#[tokio::test]
async fn invalidation_precedes_cart_clear_and_navigation() {
    let observer = Arc::new(Observer {
        cache: Arc::new(ResourceCache::new(&CacheConfig::default())),
        coordinator: OnceLock::new(),
        events: Mutex::new(Vec::new()),
    });
    let coordinator = Arc::new(CheckoutCoordinator::new(
        Arc::new(FakeBackend::default()),
        MutationInvalidator::new(observer.clone()),
        observer.clone(),
    ));
    let _ = observer.coordinator.set(Arc::downgrade(&coordinator));

    fill(&coordinator, 10, 2);
    coordinator.submit().await.expect("accepted");

    let events = observer.events.lock().expect("events").clone();
    assert_eq!(
        events,
        vec![
            ("invalidate:medicines".to_string(), 1),
            ("invalidate:sales".to_string(), 1),
            ("invalidate:dashboard".to_string(), 1),
            ("navigate:/checkout/42".to_string(), 0),
        ]
    );
}

#[tokio::test]
async fn cancel_completed_sale_invalidates_sales_only() {
    let h = harness(FakeBackend::default());
    let history = ResourceKey::new(family::SALES).with_param("page", 1);
    let listing = ResourceKey::new(family::MEDICINES).with_param("page", 1);
    h.cache.insert(history.clone(), 0_u8);
    h.cache.insert(ResourceKey::sale(42), 0_u8);
    h.cache.insert(listing.clone(), 0_u8);

    let updated = h
        .coordinator
        .cancel_sale(&sale(42, SaleStatus::Completed))
        .await
        .expect("cancelled");

    assert_eq!(updated.status, SaleStatus::Cancelled);
    assert_eq!(h.backend.cancel_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.cache.is_stale(&history), Some(true));
    assert_eq!(h.cache.is_stale(&ResourceKey::sale(42)), Some(true));
    assert_eq!(h.cache.is_stale(&listing), Some(false));
    assert_eq!(h.coordinator.phase(), CheckoutPhase::Idle);
}

#[tokio::test]
async fn cancelling_a_cancelled_sale_fails_locally() {
    let h = harness(FakeBackend::default());
    let history = ResourceKey::new(family::SALES).with_param("page", 1);
    h.cache.insert(history.clone(), 0_u8);

    let err = h
        .coordinator
        .cancel_sale(&sale(42, SaleStatus::Cancelled))
        .await
        .expect_err("already cancelled");

    assert!(matches!(err, CheckoutError::InvalidStateTransition(_)));
    assert_eq!(h.backend.cancel_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.cache.is_stale(&history), Some(false));
}

#[tokio::test(start_paused = true)]
async fn dropped_submission_does_not_wedge_the_coordinator() {
    let gate = Arc::new(Notify::new());
    let h = harness(FakeBackend {
        gate: Some(gate.clone()),
        ..Default::default()
    });
    let listing = ResourceKey::new(family::MEDICINES).with_param("page", 1);
    h.cache.insert(listing.clone(), 0_u8);
    fill(&h.coordinator, 150, 2);

    let timed_out =
        tokio::time::timeout(std::time::Duration::from_millis(20), h.coordinator.submit()).await;
    assert!(timed_out.is_err());
    assert_eq!(h.backend.create_calls.load(Ordering::SeqCst), 1);

    assert_eq!(h.coordinator.phase(), CheckoutPhase::Failed);
    assert!(h.coordinator.last_error().is_some());
    assert_eq!(h.coordinator.cart().len(), 1);
    assert_eq!(h.cache.is_stale(&listing), Some(true));
    assert!(h.navigator.history().is_empty());

    h.coordinator.set_quantity(1, 3).expect("edits are accepted again");
    assert_eq!(h.coordinator.phase(), CheckoutPhase::Idle);

    let resubmit = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move { coordinator.submit().await })
    };
    tokio::task::yield_now().await;
    gate.notify_one();
    let outcome = resubmit.await.expect("join").expect("accepted");
    assert!(matches!(outcome, SubmitOutcome::Completed { .. }));
    assert_eq!(h.backend.create_calls.load(Ordering::SeqCst), 2);
}
