use auth::accounts::set_password;
use auth::password::spawn_check_password;
use axum::{
    extract::{Form, State, rejection::FormRejection},
    response::Response,
};
use tracing::{debug, info, instrument, trace, warn};

use super::{form_context, page_context, render, unreadable_form};
use crate::error::AppError;
use crate::forms::{AccountForm, FormErrors, OLD_PASSWORD_INCORRECT, PasswordChangeForm};
use crate::helpers::redirect::found;
use crate::schemas::AppState;
use crate::session::CurrentUser;

const PASSWORD_CHANGE_TEMPLATE: &str = "registration/password_change_form.html";

pub async fn password_change_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    render(
        &state,
        PASSWORD_CHANGE_TEMPLATE,
        &form_context(
            Some(&current.user),
            &PasswordChangeForm::default(),
            &FormErrors::new(),
        ),
    )
}

/// Replace the password after checking the old one. Every other session of
/// the user is ended; the one making the change stays logged in.
#[instrument(skip_all, fields(user_id = current.user.id))]
pub async fn password_change(
    State(state): State<AppState>,
    current: CurrentUser,
    submitted: Result<Form<PasswordChangeForm>, FormRejection>,
) -> Result<Response, AppError> {
    trace!("Entering password_change function");

    let mut form = match submitted {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let errors = unreadable_form(&rejection);
            return render(
                &state,
                PASSWORD_CHANGE_TEMPLATE,
                &form_context(Some(&current.user), &PasswordChangeForm::default(), &errors),
            );
        }
    };

    let mut errors = match form.full_clean() {
        Ok(()) => FormErrors::new(),
        Err(errors) => errors,
    };
    if !errors.has("old_password")
        && !spawn_check_password(&form.old_password, &current.user.password).await
    {
        warn!("Wrong old password on password change");
        errors.add("old_password", OLD_PASSWORD_INCORRECT);
    }
    if !errors.is_empty() {
        debug!("Password change form invalid: {:?}", errors);
        return render(
            &state,
            PASSWORD_CHANGE_TEMPLATE,
            &form_context(Some(&current.user), &form, &errors),
        );
    }

    let updated = set_password(&state.db, current.user, &form.new_password1).await?;
    let ended = state.auth.end_other_sessions(&updated, &current.token).await?;
    info!("Password changed, {} other session(s) ended", ended);

    Ok(found("/password_change_done"))
}

pub async fn password_change_done(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    render(
        &state,
        "registration/password_change_done.html",
        &page_context(Some(&current.user)),
    )
}
