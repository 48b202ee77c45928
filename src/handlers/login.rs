use axum::{
    extract::{Form, Query, State, rejection::FormRejection},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{debug, info, instrument, trace, warn};

use super::{form_context, page_context, render, unreadable_form};
use crate::error::AppError;
use crate::forms::{AccountForm, DISABLED_ACCOUNT, FormErrors, INVALID_LOGIN, LoginForm};
use crate::helpers::redirect::{found, safe_next};
use crate::schemas::AppState;
use crate::session::{MaybeUser, cleared_session_cookie, session_cookie, session_token};

const LOGIN_TEMPLATE: &str = "account/login.html";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[instrument(skip_all)]
pub async fn login_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let form = LoginForm {
        next: query.next,
        ..Default::default()
    };
    render(
        &state,
        LOGIN_TEMPLATE,
        &form_context(user.as_ref(), &form, &FormErrors::new()),
    )
}

/// Check the credentials and open a session.
///
/// Every failure re-renders the form with HTTP 200. On success the client's
/// previous session is ended and it is redirected to `next` when that is a
/// local path, to the dashboard otherwise.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    jar: CookieJar,
    submitted: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    trace!("Entering login function");

    let mut form = match submitted {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let errors = unreadable_form(&rejection);
            let form = LoginForm::default();
            return render(&state, LOGIN_TEMPLATE, &form_context(current.as_ref(), &form, &errors));
        }
    };

    if let Err(errors) = form.full_clean() {
        debug!("Login form invalid: {:?}", errors);
        return render(&state, LOGIN_TEMPLATE, &form_context(current.as_ref(), &form, &errors));
    }

    let Some(user) = state.auth.authenticate(&form.credentials()).await? else {
        warn!("Invalid login for username '{}'", form.username);
        let errors = FormErrors::non_field(INVALID_LOGIN);
        return render(&state, LOGIN_TEMPLATE, &form_context(current.as_ref(), &form, &errors));
    };

    if !user.is_active {
        warn!("Login attempt on disabled account ID {}", user.id);
        let errors = FormErrors::non_field(DISABLED_ACCOUNT);
        return render(&state, LOGIN_TEMPLATE, &form_context(current.as_ref(), &form, &errors));
    }

    if let Some(previous) = session_token(&jar, &state.settings) {
        debug!("Ending the previous session of this client");
        state.auth.end_session(&previous).await?;
    }

    let token = state.auth.start_session(&user).await?;
    let target = safe_next(form.next.as_deref());
    info!("User ID {} authenticated, redirecting to {}", user.id, target);

    let cookie = session_cookie(&state.settings, token.into_inner(), state.auth.session_ttl());
    let jar = jar.add(cookie);
    Ok((jar, found(target)).into_response())
}

#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    trace!("Entering logout function");
    if let Some(token) = session_token(&jar, &state.settings) {
        state.auth.end_session(&token).await?;
        info!("Session ended");
    }

    let jar = jar.add(cleared_session_cookie(&state.settings));
    Ok((jar, found("/logout_done")).into_response())
}

pub async fn logout_done(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    render(&state, "registration/logged_out.html", &page_context(user.as_ref()))
}
