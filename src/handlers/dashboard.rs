use axum::{extract::State, response::Response};
use tracing::{instrument, trace};

use super::{page_context, render};
use crate::error::AppError;
use crate::schemas::AppState;
use crate::session::CurrentUser;

#[instrument(skip_all, fields(user_id = current.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    trace!("Rendering dashboard");
    let mut context = page_context(Some(&current.user));
    context.insert("section", "dashboard");
    render(&state, "account/dashboard.html", &context)
}
