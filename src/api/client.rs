use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::ResourceKey;
use crate::session::Session;
use crate::types::{
    CurrentUser, DashboardStats, ListBody, Medicine, MedicineId, MedicinePage,
    MedicineWriteRequest, Sale, SaleCreateRequest, SaleId, SalePage,
};

use super::backend::Backend;
use super::error::ApiError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `reqwest`-backed [`Backend`].
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    session: Arc<dyn Session>,
}

impl HttpBackend {
    pub fn new(base_url: &str, session: Arc<dyn Session>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, session, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<dyn Session>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base,
            session,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("pharmadesk/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn auth_header(&self) -> Result<Option<HeaderValue>, ApiError> {
        self.session
            .bearer_token()
            .map(|token| {
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| ApiError::Credential(e.to_string()))
            })
            .transpose()
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<RequestBuilder, ApiError> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }

        let mut req = self.client.request(method, url);
        if let Some(header) = self.auth_header()? {
            req = req.header(AUTHORIZATION, header);
        }
        Ok(req)
    }

    async fn execute(&self, req: RequestBuilder, method: &Method, path: &str) -> Result<Response, ApiError> {
        let started = Instant::now();
        let resp = req.send().await?;
        let status = resp.status();
        debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend request completed"
        );
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.bytes().await?;
        let err = ApiError::from_response(status, &body);
        warn!(%method, path, status = status.as_u16(), error = %err, "Backend request rejected");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(resp: Response, path: &str) -> Result<T, ApiError> {
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let req = self.request(Method::GET, path, query)?;
        let resp = self.execute(req, &Method::GET, path).await?;
        Self::decode(resp, path).await
    }

    pub async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.request(method.clone(), path, &[])?.json(body);
        let resp = self.execute(req, &method, path).await?;
        Self::decode(resp, path).await
    }

    /// Send a request whose response body is ignored.
    pub async fn send_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(), ApiError> {
        let mut req = self.request(method.clone(), path, &[])?;
        if let Some(body) = body {
            req = req.json(body);
        }
        self.execute(req, &method, path).await.map(|_| ())
    }

    async fn get_key<T: DeserializeOwned>(&self, key: &ResourceKey) -> Result<T, ApiError> {
        self.get_json(&key.path(), &key.query_pairs()).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_medicines(&self, key: &ResourceKey) -> Result<MedicinePage, ApiError> {
        let body: ListBody<Medicine> = self.get_key(key).await?;
        Ok(body.into())
    }

    async fn create_medicine(&self, body: &MedicineWriteRequest) -> Result<Medicine, ApiError> {
        self.send_json(Method::POST, "/api/medicines/", body).await
    }

    async fn update_medicine(
        &self,
        id: MedicineId,
        body: &MedicineWriteRequest,
    ) -> Result<Medicine, ApiError> {
        self.send_json(Method::PUT, &format!("/api/medicines/{id}/"), body)
            .await
    }

    async fn delete_medicine(&self, id: MedicineId) -> Result<(), ApiError> {
        self.send_unit(Method::DELETE, &format!("/api/medicines/{id}/"), None)
            .await
    }

    async fn create_sale(&self, body: &SaleCreateRequest) -> Result<Sale, ApiError> {
        self.send_json(Method::POST, "/api/sales/", body).await
    }

    async fn get_sale(&self, id: SaleId) -> Result<Sale, ApiError> {
        self.get_key(&ResourceKey::sale(id)).await
    }

    async fn list_sales(&self, key: &ResourceKey) -> Result<SalePage, ApiError> {
        self.get_key(key).await
    }

    async fn cancel_sale(&self, id: SaleId) -> Result<(), ApiError> {
        let empty = serde_json::json!({});
        self.send_unit(Method::POST, &format!("/api/sales/{id}/cancel/"), Some(&empty))
            .await
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get_json("/api/auth/me/", &[]).await
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_key(&ResourceKey::dashboard_stats()).await
    }
}
