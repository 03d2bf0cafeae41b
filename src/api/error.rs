use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failures talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not authenticated: {message}")]
    Unauthorized { message: String },
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("invalid credential: {0}")]
    Credential(String),
}

impl ApiError {
    /// Build the error for a non-success response from its raw body.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let message = error_message(status, body);
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized { message }
        } else {
            Self::Http { status, message }
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// User-facing message for a failed response.
///
/// Structured per-field payloads are flattened; otherwise the raw body text
/// is used, and an empty body falls back to the status phrase.
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return parse_error_payload(&value);
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Flatten a JSON error payload.
///
/// `non_field_errors` wins and is joined with `", "`. Other fields become
/// `field: msg, msg` joined with `"; "`. Anything else is returned as JSON text.
pub fn parse_error_payload(value: &Value) -> String {
    if let Some(Value::Array(errors)) = value.get("non_field_errors") {
        return errors.iter().map(message_text).collect::<Vec<_>>().join(", ");
    }

    let Value::Object(fields) = value else {
        return value.to_string();
    };

    let field_errors: Vec<String> = fields
        .iter()
        .filter_map(|(field, messages)| match messages {
            Value::Array(items) => Some(format!(
                "{field}: {}",
                items.iter().map(message_text).collect::<Vec<_>>().join(", ")
            )),
            Value::String(message) => Some(format!("{field}: {message}")),
            _ => None,
        })
        .collect();

    if field_errors.is_empty() {
        value.to_string()
    } else {
        field_errors.join("; ")
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
