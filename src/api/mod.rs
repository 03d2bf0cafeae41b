//! Backend collaborator: the REST API consumed by this layer.

mod backend;
mod client;
mod error;

pub use backend::Backend;
pub use client::HttpBackend;
pub use error::{ApiError, error_message, parse_error_payload};
