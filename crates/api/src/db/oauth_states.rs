//! OAuth CSRF state query builders.

use sea_query::{Expr, Query, SqliteQueryBuilder};

use super::tables::OauthStates;
use super::Built;

/// Persist a fresh state token before redirecting to the provider.
pub fn insert(state: &str, provider: &str, expires_at: &str) -> Built {
    Query::insert()
        .into_table(OauthStates::Table)
        .columns([OauthStates::State, OauthStates::Provider, OauthStates::ExpiresAt])
        .values_panic([state.into(), provider.into(), expires_at.into()])
        .build(SqliteQueryBuilder)
}

/// Look up a state token: (provider, expires_at).
pub fn get(state: &str) -> Built {
    Query::select()
        .columns([OauthStates::Provider, OauthStates::ExpiresAt])
        .from(OauthStates::Table)
        .and_where(Expr::col(OauthStates::State).eq(state))
        .build(SqliteQueryBuilder)
}

/// States are single-use: deleted as soon as they are validated.
pub fn delete(state: &str) -> Built {
    Query::delete()
        .from_table(OauthStates::Table)
        .and_where(Expr::col(OauthStates::State).eq(state))
        .build(SqliteQueryBuilder)
}
