#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::sync::Arc;

use pharmadesk::api::{ApiError, Backend, HttpBackend};
use pharmadesk::cache::{CacheConfig, MutationInvalidator, ResourceCache};
use pharmadesk::checkout::{CheckoutCoordinator, CheckoutError, RecordingNavigator};
use pharmadesk::config::{LoadError, Settings};
use pharmadesk::infra::InfraError;
use pharmadesk::inventory::{FilteredPageState, InventoryView};
use pharmadesk::session::StaticSession;
use thiserror::Error;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read token file: {0}")]
    TokenFile(std::io::Error),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Telemetry(#[from] InfraError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Checkout(#[from] CheckoutError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Session-scoped handles shared by every command.
#[derive(Clone)]
pub struct Ctx {
    pub settings: Settings,
    pub backend: Arc<dyn Backend>,
    pub cache: Arc<ResourceCache>,
    pub invalidator: MutationInvalidator,
}

impl Ctx {
    pub fn new(settings: Settings, session: StaticSession) -> Result<Self, CliError> {
        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::with_timeout(
            settings.api.base_url.as_str(),
            Arc::new(session),
            settings.api.timeout,
        )?);
        let cache = Arc::new(ResourceCache::new(&CacheConfig::from(&settings.cache)));
        let invalidator = MutationInvalidator::new(cache.clone());
        Ok(Self {
            settings,
            backend,
            cache,
            invalidator,
        })
    }

    pub fn inventory(&self, state: FilteredPageState) -> InventoryView {
        InventoryView::new(
            state,
            Arc::clone(&self.cache),
            Arc::clone(&self.backend),
            self.invalidator.clone(),
        )
        .with_search_debounce(self.settings.search.debounce)
    }

    pub fn checkout(&self, navigator: Arc<RecordingNavigator>) -> CheckoutCoordinator {
        CheckoutCoordinator::new(
            Arc::clone(&self.backend),
            self.invalidator.clone(),
            navigator,
        )
    }
}

/// Token from `--token-file`, else from the environment, else anonymous.
pub fn session_from_cli(cli: &Cli) -> Result<StaticSession, CliError> {
    if let Some(path) = &cli.token_file {
        let token = fs::read_to_string(path).map_err(CliError::TokenFile)?;
        return Ok(StaticSession::new(token));
    }
    Ok(cli
        .token_env
        .as_deref()
        .map_or_else(StaticSession::anonymous, |token| StaticSession::new(token)))
}

pub fn build_ctx_from_cli(cli: &Cli, settings: Settings) -> Result<Ctx, CliError> {
    Ctx::new(settings, session_from_cli(cli)?)
}
