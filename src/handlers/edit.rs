use auth::AuthError;
use auth::accounts::{update_profile, username_taken};
use axum::{
    extract::{Form, State, rejection::FormRejection},
    response::Response,
};
use tracing::{debug, info, instrument, trace};

use super::{form_context, render, unreadable_form};
use crate::error::AppError;
use crate::forms::{AccountForm, EditForm, FormErrors, USERNAME_TAKEN};
use crate::helpers::redirect::found;
use crate::schemas::AppState;
use crate::session::CurrentUser;

const EDIT_TEMPLATE: &str = "account/edit.html";

#[instrument(skip_all, fields(user_id = current.user.id))]
pub async fn edit_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let form = EditForm::from(&current.user);
    render(
        &state,
        EDIT_TEMPLATE,
        &form_context(Some(&current.user), &form, &FormErrors::new()),
    )
}

/// Save username, names and email of the logged-in user.
#[instrument(skip_all, fields(user_id = current.user.id))]
pub async fn edit(
    State(state): State<AppState>,
    current: CurrentUser,
    submitted: Result<Form<EditForm>, FormRejection>,
) -> Result<Response, AppError> {
    trace!("Entering edit function");

    let mut form = match submitted {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let errors = unreadable_form(&rejection);
            let form = EditForm::from(&current.user);
            return render(
                &state,
                EDIT_TEMPLATE,
                &form_context(Some(&current.user), &form, &errors),
            );
        }
    };

    let mut errors = match form.full_clean() {
        Ok(()) => FormErrors::new(),
        Err(errors) => errors,
    };
    if !errors.has("username")
        && username_taken(&state.db, &form.username, Some(current.user.id)).await?
    {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        debug!("Edit form invalid: {:?}", errors);
        return render(
            &state,
            EDIT_TEMPLATE,
            &form_context(Some(&current.user), &form, &errors),
        );
    }

    match update_profile(&state.db, current.user.clone(), form.clone().into_update()).await {
        Ok(updated) => {
            info!("Profile of user ID {} updated", updated.id);
            Ok(found("/"))
        }
        Err(AuthError::UsernameTaken(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            render(
                &state,
                EDIT_TEMPLATE,
                &form_context(Some(&current.user), &form, &errors),
            )
        }
        Err(e) => Err(e.into()),
    }
}
