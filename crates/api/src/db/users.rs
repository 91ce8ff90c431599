//! User directory query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::tables::Users;
use super::Built;

/// Column order shared with the server's `user_from_row` mapper.
pub const USER_COLUMNS: [Users; 6] = [
    Users::Id,
    Users::Provider,
    Users::ProviderUid,
    Users::Username,
    Users::AvatarUrl,
    Users::CreatedAt,
];

/// Find a user id by OAuth identity.
pub fn find_by_identity(provider: &str, provider_uid: &str) -> Built {
    Query::select()
        .column(Users::Id)
        .from(Users::Table)
        .and_where(Expr::col(Users::Provider).eq(provider))
        .and_where(Expr::col(Users::ProviderUid).eq(provider_uid))
        .build(SqliteQueryBuilder)
}

/// Full user row by id.
pub fn get_by_id(user_id: &str) -> Built {
    Query::select()
        .columns(USER_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// All users, oldest first.
pub fn list_all() -> Built {
    Query::select()
        .columns(USER_COLUMNS)
        .from(Users::Table)
        .order_by(Users::CreatedAt, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Insert a user created from an OAuth profile.
pub fn insert(
    id: &str,
    provider: &str,
    provider_uid: &str,
    username: &str,
    avatar_url: Option<&str>,
) -> Built {
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Id,
            Users::Provider,
            Users::ProviderUid,
            Users::Username,
            Users::AvatarUrl,
        ])
        .values_panic([
            id.into(),
            provider.into(),
            provider_uid.into(),
            username.into(),
            avatar_url.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Refresh profile fields on a returning login.
pub fn update_profile(user_id: &str, username: &str, avatar_url: Option<&str>) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::Username, username)
        .value(Users::AvatarUrl, avatar_url.map(|s| s.to_string()))
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}
