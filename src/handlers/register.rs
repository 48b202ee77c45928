use auth::AuthError;
use auth::accounts::{create_user, username_taken};
use axum::{
    extract::{Form, State, rejection::FormRejection},
    response::Response,
};
use tracing::{debug, error, info, instrument, trace};

use super::{form_context, page_context, render, unreadable_form};
use crate::error::AppError;
use crate::forms::{AccountForm, FormErrors, RegistrationForm, USERNAME_TAKEN};
use crate::helpers::redirect::found;
use crate::schemas::AppState;
use crate::session::MaybeUser;

const REGISTER_TEMPLATE: &str = "account/register.html";

pub async fn register_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    let form = RegistrationForm::default();
    render(
        &state,
        REGISTER_TEMPLATE,
        &form_context(user.as_ref(), &form, &FormErrors::new()),
    )
}

/// Create an account from the registration form and send the visitor to the
/// confirmation page. Invalid input re-renders the form and creates nothing.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    submitted: Result<Form<RegistrationForm>, FormRejection>,
) -> Result<Response, AppError> {
    trace!("Entering register function");

    let mut form = match submitted {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let errors = unreadable_form(&rejection);
            let form = RegistrationForm::default();
            return render(&state, REGISTER_TEMPLATE, &form_context(current.as_ref(), &form, &errors));
        }
    };

    let mut errors = match form.full_clean() {
        Ok(()) => FormErrors::new(),
        Err(errors) => errors,
    };
    if !errors.has("username") && username_taken(&state.db, &form.username, None).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        debug!("Registration form invalid: {:?}", errors);
        return render(&state, REGISTER_TEMPLATE, &form_context(current.as_ref(), &form, &errors));
    }

    match create_user(&state.db, form.clone().into_new_account()).await {
        Ok(user) => {
            info!("Registered user '{}' with ID {}", user.username, user.id);
            Ok(found("/register_done"))
        }
        Err(AuthError::UsernameTaken(username)) => {
            // Lost a race with a concurrent registration of the same name.
            debug!("Username '{}' taken on insert", username);
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            render(&state, REGISTER_TEMPLATE, &form_context(current.as_ref(), &form, &errors))
        }
        Err(e) => {
            error!("Failed to register user: {}", e);
            Err(e.into())
        }
    }
}

pub async fn register_done(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    render(&state, "account/register_done.html", &page_context(user.as_ref()))
}
