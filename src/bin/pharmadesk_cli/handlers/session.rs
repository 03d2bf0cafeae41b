#![deny(clippy::all, clippy::pedantic)]

use pharmadesk::session::check_session;
use serde_json::json;

use crate::args::{SessionArgs, SessionCmd};
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: SessionArgs) -> Result<(), CliError> {
    match cmd.action {
        SessionCmd::Me => match check_session(ctx.backend.as_ref()).await? {
            Some(user) => print_json(&json!({
                "authenticated": true,
                "is_admin": user.is_admin(),
                "user": user,
            })),
            None => print_json(&json!({ "authenticated": false })),
        },
    }
}

/// Fail unless the current session belongs to an administrator.
pub async fn require_admin(ctx: &Ctx, action: &str) -> Result<(), CliError> {
    match check_session(ctx.backend.as_ref()).await? {
        Some(user) if user.is_admin() => Ok(()),
        Some(user) => Err(CliError::Forbidden(format!(
            "{action} requires the admin role (signed in as `{}` with role `{}`)",
            user.username, user.role
        ))),
        None => Err(CliError::Forbidden(format!("{action} requires a signed-in admin"))),
    }
}
