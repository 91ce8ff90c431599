use axum::{
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts, HeaderValue},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};

use mediarank_api::{db, Flash};

use crate::error::ApiErr;
use crate::flash;
use crate::storage::{sq_execute, sq_query_row, Db};
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const MUST_BE_LOGGED_IN: &str = "You must be logged in to do that.";

// ---------------------------------------------------------------------------
// Request-scoped identity
// ---------------------------------------------------------------------------

/// The authenticated user resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

/// Request-scoped identity context: who, if anyone, is logged in.
///
/// Never rejects — anonymous is not an error at this layer. Handlers that
/// admit anonymous callers (landing page, upvote's not-found-first check)
/// take this and decide per operation.
pub struct Visitor {
    pub user: Option<AuthUser>,
    pub session_id: Option<String>,
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
    Db: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db = Db::from_ref(state);
        let session_id = flash::parse_cookie(&parts.headers, SESSION_COOKIE);

        let user = session_id.as_deref().and_then(|sid| {
            let conn = db.conn();
            sq_query_row(&conn, db::sessions::resolve_user(sid), |row| {
                Ok(AuthUser {
                    user_id: row.get(0)?,
                    username: row.get(1)?,
                })
            })
            .ok()
        });

        Ok(Visitor { user, session_id })
    }
}

impl Visitor {
    /// Resolve to the logged-in user, or the standard anonymous rejection:
    /// a redirect to the landing page with the login-required flash.
    pub fn require_login(self) -> Result<AuthUser, Response> {
        self.user.ok_or_else(login_required)
    }
}

/// Extractor for handlers that flatly require authentication. Anonymous
/// requests are rejected with the login-required redirect before the
/// handler body runs.
pub struct CurrentUser(pub AuthUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Db: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let visitor = Visitor::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        visitor.require_login().map(CurrentUser)
    }
}

/// The standard response for anonymous access to a protected operation.
pub fn login_required() -> Response {
    flash::redirect_with("/", Flash::failure(MUST_BE_LOGGED_IN))
}

fn session_cookie(session_id: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "session=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/; HttpOnly; SameSite=Lax",
    )
}

/// Redirect to `/` binding a fresh session and carrying the login flash.
pub fn login_redirect(session_id: &str, flash: Flash) -> Response {
    let mut headers = Vec::new();
    if let Some(cookie) = session_cookie(session_id) {
        headers.push((header::SET_COOKIE, cookie));
    }
    if let Some(cookie) = flash::set_cookie(&flash) {
        headers.push(cookie);
    }
    (AppendHeaders(headers), Redirect::to("/")).into_response()
}

// ---------------------------------------------------------------------------
// GET /login — entry point; hands the browser to the identity provider
// ---------------------------------------------------------------------------

pub async fn login_form(State(state): State<AppState>) -> Result<Response, ApiErr> {
    let provider = state
        .config
        .oauth_providers
        .first()
        .ok_or_else(|| ApiErr::unavailable("OAuth login not configured"))?;

    super::oauth::begin_redirect(&state.db, &state.config, provider)
}

// ---------------------------------------------------------------------------
// DELETE /logout
// ---------------------------------------------------------------------------

/// Clears the session if present. Idempotent: logging out while logged out
/// is a plain redirect, not an error.
pub async fn logout(State(db): State<Db>, visitor: Visitor) -> Result<Response, ApiErr> {
    let logged_in = visitor.user.is_some();

    if let Some(ref sid) = visitor.session_id {
        let conn = db.conn();
        sq_execute(&conn, db::sessions::delete(sid)).map_err(ApiErr::from_db("delete session"))?;
    }

    let mut headers = vec![(header::SET_COOKIE, clear_session_cookie())];
    if logged_in {
        if let Some(cookie) = flash::set_cookie(&Flash::success("Successfully logged out!")) {
            headers.push(cookie);
        }
    }

    Ok((AppendHeaders(headers), Redirect::to("/")).into_response())
}
