use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use mediarank_api::{
    db,
    oauth::{self, OAuthProviderConfig},
    service, Flash,
};

use crate::error::ApiErr;
use crate::flash;
use crate::routes::session;
use crate::storage::{sq_execute, sq_query_row, Db};
use crate::{AppConfig, AppState};

fn find_provider<'a>(config: &'a AppConfig, id: &str) -> Result<&'a OAuthProviderConfig, ApiErr> {
    config
        .oauth_providers
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ApiErr::not_found(format!("OAuth provider '{id}' not found")))
}

fn callback_uri(config: &AppConfig, provider_id: &str) -> String {
    format!("{}/auth/callback/{}", config.base_url, provider_id)
}

/// Adapter failures before a user record is involved. Reported with the
/// raw underlying detail to make operator debugging easier.
fn login_failed(detail: &str) -> Response {
    tracing::warn!("oauth login failed: {detail}");
    flash::redirect_with("/", Flash::failure(format!("Login failed: {detail}")))
}

/// Persist a state token and hand the browser to the provider.
pub fn begin_redirect(
    db: &Db,
    config: &AppConfig,
    provider: &OAuthProviderConfig,
) -> Result<Response, ApiErr> {
    let state = format!("mst_{}", Uuid::new_v4().simple());
    let expires_at = (chrono::Utc::now() + chrono::Duration::minutes(10))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let conn = db.conn();
    sq_execute(&conn, db::oauth_states::insert(&state, &provider.id, &expires_at))
        .map_err(ApiErr::from_db("oauth state insert"))?;

    let redirect_uri = callback_uri(config, &provider.id);
    let url = oauth::build_authorize_url(provider, &redirect_uri, &state);

    Ok(Redirect::to(&url).into_response())
}

// ---------------------------------------------------------------------------
// GET /auth/:provider — redirect to the provider's authorize page
// ---------------------------------------------------------------------------

pub async fn begin(
    Path(provider_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiErr> {
    let provider = find_provider(&state.config, &provider_id)?;
    begin_redirect(&state.db, &state.config, provider)
}

// ---------------------------------------------------------------------------
// GET|POST /auth/callback/:provider — complete the OAuth exchange
// ---------------------------------------------------------------------------

pub async fn callback(
    Path(provider_id): Path<String>,
    State(state): State<AppState>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Response, ApiErr> {
    let db = state.db.clone();
    let config = state.config.clone();
    let provider = find_provider(&config, &provider_id)?;

    let Some(code) = params.get("code") else {
        return Ok(login_failed("missing code parameter"));
    };
    let Some(state_param) = params.get("state") else {
        return Ok(login_failed("missing state parameter"));
    };

    // Validate the state token (scope the MutexGuard so it's dropped
    // before any await).
    {
        let conn = db.conn();
        let row = sq_query_row(&conn, db::oauth_states::get(state_param), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        });

        let (state_provider, expires_at) = match row {
            Ok(pair) => pair,
            Err(_) => return Ok(login_failed("invalid OAuth state")),
        };

        // Single use, even when the rest of the exchange fails.
        sq_execute(&conn, db::oauth_states::delete(state_param)).ok();

        if state_provider != provider_id {
            return Ok(login_failed("OAuth state provider mismatch"));
        }

        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        if expires_at < now {
            return Ok(login_failed("OAuth state expired"));
        }
    }

    // Exchange the code for an access token.
    let redirect_uri = callback_uri(&config, &provider_id);
    let token_body = oauth::build_token_request_body(provider, code, &redirect_uri);

    let client = reqwest::Client::new();
    let token_raw = match client
        .post(&provider.token_url)
        .header("Accept", "application/json")
        .json(&token_body)
        .send()
        .await
    {
        Ok(resp) => match resp.text().await {
            Ok(body) => body,
            Err(e) => return Ok(login_failed(&format!("token response read failed: {e}"))),
        },
        Err(e) => return Ok(login_failed(&format!("token exchange failed: {e}"))),
    };

    let access_token = match oauth::parse_access_token_response(&token_raw) {
        Ok(token) => token,
        Err(e) => return Ok(login_failed(e.message())),
    };

    // Fetch the userinfo profile.
    let userinfo: serde_json::Value = match client
        .get(&provider.userinfo_url)
        .bearer_auth(&access_token)
        .header("User-Agent", "mediarank-server")
        .header("Accept", "application/json")
        .send()
        .await
    {
        Ok(resp) => match resp.json().await {
            Ok(json) => json,
            Err(e) => return Ok(login_failed(&format!("userinfo parse failed: {e}"))),
        },
        Err(e) => return Ok(login_failed(&format!("userinfo fetch failed: {e}"))),
    };

    // A payload without the required profile fields is a validation
    // failure: no account, no session.
    let profile = match oauth::extract_user_info(provider, &userinfo) {
        Ok(profile) => profile,
        Err(e) => {
            return Ok(flash::redirect_with(
                "/",
                Flash::failure(format!("Could not create new user account: {}", e.message())),
            ));
        }
    };

    // Resolve or create the local user, then bind a session.
    let conn = db.conn();

    let existing: Option<String> = sq_query_row(
        &conn,
        db::users::find_by_identity(&provider_id, &profile.provider_user_id),
        |row| row.get(0),
    )
    .ok();

    let (user_id, greeting) = if let Some(user_id) = existing {
        // Returning user — refresh the profile fields.
        sq_execute(
            &conn,
            db::users::update_profile(&user_id, &profile.username, profile.avatar_url.as_deref()),
        )
        .map_err(ApiErr::from_db("refresh user profile"))?;

        let text = format!("Logged in as returning user {}", profile.username);
        (user_id, Flash::success(text))
    } else {
        let user_id = Uuid::new_v4().to_string();
        let inserted = sq_execute(
            &conn,
            db::users::insert(
                &user_id,
                &provider_id,
                &profile.provider_user_id,
                &profile.username,
                profile.avatar_url.as_deref(),
            ),
        );

        if let Err(e) = inserted {
            tracing::error!("create user from oauth: {e}");
            return Ok(flash::redirect_with(
                "/",
                Flash::failure(format!("Could not create new user account: {e}")),
            ));
        }

        let text = format!("Logged in as new user {}", profile.username);
        (user_id, Flash::success(text))
    };

    let session_id = service::generate_session_id();
    sq_execute(&conn, db::sessions::insert(&session_id, &user_id))
        .map_err(ApiErr::from_db("create session"))?;

    Ok(session::login_redirect(&session_id, greeting))
}
