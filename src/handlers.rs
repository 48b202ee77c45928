pub mod dashboard;
pub mod edit;
pub mod health;
pub mod login;
pub mod password;
pub mod register;

use auth::Identity;
use axum::extract::rejection::FormRejection;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tera::Context;
use tracing::warn;

use crate::error::AppError;
use crate::forms::{FormErrors, UNREADABLE_FORM};
use crate::schemas::{AppState, UserView};

/// Template context carrying the header's view of the logged-in user.
pub(crate) fn page_context(user: Option<&Identity>) -> Context {
    let mut context = Context::new();
    if let Some(user) = user {
        context.insert("user", &UserView::from(user));
    }
    context
}

/// Context for a form page. `form` holds the submitted values to echo back.
pub(crate) fn form_context<F: Serialize>(
    user: Option<&Identity>,
    form: &F,
    errors: &FormErrors,
) -> Context {
    let mut context = page_context(user);
    context.insert("form", form);
    context.insert("errors", errors);
    context
}

pub(crate) fn render(state: &AppState, template: &str, context: &Context) -> Result<Response, AppError> {
    Ok(state.templates.render(template, context)?.into_response())
}

/// Errors for a body that could not be decoded as the expected form. The page
/// is re-rendered with them instead of failing the request.
pub(crate) fn unreadable_form(rejection: &FormRejection) -> FormErrors {
    warn!("Unreadable form submission: {}", rejection);
    FormErrors::non_field(UNREADABLE_FORM)
}
