//! Vote ledger query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::tables::Votes;
use super::Built;

/// Column order shared with the server's `vote_from_row` mapper.
pub const VOTE_COLUMNS: [Votes; 4] = [Votes::Id, Votes::UserId, Votes::WorkId, Votes::CreatedAt];

/// Record an up-vote. The table's UNIQUE (user_id, work_id) constraint
/// rejects a duplicate pair; callers map that violation to a conflict.
pub fn insert(id: &str, user_id: &str, work_id: &str) -> Built {
    Query::insert()
        .into_table(Votes::Table)
        .columns([Votes::Id, Votes::UserId, Votes::WorkId])
        .values_panic([id.into(), user_id.into(), work_id.into()])
        .build(SqliteQueryBuilder)
}

/// Votes cast on a work, newest first.
pub fn list_for_work(work_id: &str) -> Built {
    Query::select()
        .columns(VOTE_COLUMNS)
        .from(Votes::Table)
        .and_where(Expr::col(Votes::WorkId).eq(work_id))
        .order_by(Votes::CreatedAt, Order::Desc)
        .build(SqliteQueryBuilder)
}
