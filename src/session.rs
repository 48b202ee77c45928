//! Session cookie handling and the extractor guarding account pages.

use auth::Identity;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, trace};

use crate::config::Settings;
use crate::error::AppError;
use crate::helpers::redirect::login_redirect;
use crate::schemas::AppState;

/// The session token sent by the client, if any.
pub fn session_token(jar: &CookieJar, settings: &Settings) -> Option<String> {
    jar.get(&settings.session_cookie_name)
        .map(Cookie::value)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Cookie carrying `token`, kept by the browser for as long as the session lives.
pub fn session_cookie(settings: &Settings, token: String, ttl: chrono::Duration) -> Cookie<'static> {
    Cookie::build((settings.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.cookie_secure)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// An expired, empty session cookie that makes the browser drop the real one.
pub fn cleared_session_cookie(settings: &Settings) -> Cookie<'static> {
    Cookie::build((settings.session_cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.cookie_secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// The logged-in user of the current request.
///
/// Handlers taking this extractor are only reachable with a valid session;
/// everyone else is redirected to the login page with `next` set to the
/// requested path.
#[derive(Debug)]
pub struct CurrentUser {
    pub user: Identity,
    /// Token of the session the request was made with.
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        trace!("Resolving current user");
        let requested = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = session_token(&jar, &state.settings) else {
            debug!("No session cookie, redirecting to login");
            return Err(login_redirect(&requested));
        };

        match state.auth.current_identity(&token).await {
            Ok(Some(user)) => Ok(CurrentUser { user, token }),
            Ok(None) => {
                debug!("Session is unknown or expired, redirecting to login");
                Err(login_redirect(&requested))
            }
            Err(e) => Err(AppError::from(e).into_response()),
        }
    }
}

/// The logged-in user if there is one. Public pages use it for the header.
#[derive(Debug)]
pub struct MaybeUser(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user = match session_token(&jar, &state.settings) {
            Some(token) => state.auth.current_identity(&token).await?,
            None => None,
        };
        Ok(MaybeUser(user))
    }
}
