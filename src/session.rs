//! Session collaborator: supplies the bearer credential for API calls.
//!
//! Token storage and login screens live outside this crate; this module only
//! reads what the session holds and performs the initial session check.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::api::{ApiError, Backend};
use crate::types::CurrentUser;

/// Source of the bearer credential attached to every request.
pub trait Session: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A session whose token is fixed for its lifetime.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    token: Option<String>,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into().trim().to_string();
        Self {
            token: (!token.is_empty()).then_some(token),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Read the token from a file, trimming surrounding whitespace.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(fs::read_to_string(path)?))
    }
}

impl Session for StaticSession {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Initial session check.
///
/// A `401` here means "not authenticated" and yields `Ok(None)`; every other
/// failure propagates. Outside this check a `401` is always an error.
pub async fn check_session(backend: &dyn Backend) -> Result<Option<CurrentUser>, ApiError> {
    match backend.current_user().await {
        Ok(user) => {
            info!(username = %user.username, role = %user.role, "Session authenticated");
            Ok(Some(user))
        }
        Err(err) if err.is_unauthorized() => {
            debug!(error = %err, "Session check: not authenticated");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
