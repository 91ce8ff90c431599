//! Login session query builders.

use sea_query::{Expr, Query, SqliteQueryBuilder};

use super::tables::{Sessions, Users};
use super::Built;

/// Bind a session id to a user at login.
pub fn insert(id: &str, user_id: &str) -> Built {
    Query::insert()
        .into_table(Sessions::Table)
        .columns([Sessions::Id, Sessions::UserId])
        .values_panic([id.into(), user_id.into()])
        .build(SqliteQueryBuilder)
}

/// Resolve a session cookie to its user (id, username).
pub fn resolve_user(session_id: &str) -> Built {
    Query::select()
        .column((Users::Table, Users::Id))
        .column((Users::Table, Users::Username))
        .from(Sessions::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((Sessions::Table, Sessions::UserId)),
        )
        .and_where(Expr::col((Sessions::Table, Sessions::Id)).eq(session_id))
        .build(SqliteQueryBuilder)
}

/// Clear a session at logout. Deleting an absent row is a no-op.
pub fn delete(session_id: &str) -> Built {
    Query::delete()
        .from_table(Sessions::Table)
        .and_where(Expr::col(Sessions::Id).eq(session_id))
        .build(SqliteQueryBuilder)
}
