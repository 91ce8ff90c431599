//! Work catalog query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::tables::Works;
use super::Built;
use crate::service::{NewWork, WorkPatch};
use crate::Category;

/// Column order shared with the server's `work_from_row` mapper.
pub const WORK_COLUMNS: [Works; 9] = [
    Works::Id,
    Works::Title,
    Works::Category,
    Works::Creator,
    Works::Description,
    Works::PublicationYear,
    Works::OwnerId,
    Works::VoteCount,
    Works::CreatedAt,
];

/// Full work row by id.
pub fn get_by_id(work_id: &str) -> Built {
    Query::select()
        .columns(WORK_COLUMNS)
        .from(Works::Table)
        .and_where(Expr::col(Works::Id).eq(work_id))
        .build(SqliteQueryBuilder)
}

/// All works in one category, most-voted first.
pub fn list_by_category(category: Category) -> Built {
    Query::select()
        .columns(WORK_COLUMNS)
        .from(Works::Table)
        .and_where(Expr::col(Works::Category).eq(category.as_str()))
        .order_by(Works::VoteCount, Order::Desc)
        .order_by(Works::CreatedAt, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Top-voted work in one category.
pub fn best_in_category(category: Category) -> Built {
    Query::select()
        .columns(WORK_COLUMNS)
        .from(Works::Table)
        .and_where(Expr::col(Works::Category).eq(category.as_str()))
        .order_by(Works::VoteCount, Order::Desc)
        .order_by(Works::CreatedAt, Order::Asc)
        .limit(1)
        .build(SqliteQueryBuilder)
}

/// Top-voted work overall.
pub fn best_overall() -> Built {
    Query::select()
        .columns(WORK_COLUMNS)
        .from(Works::Table)
        .order_by(Works::VoteCount, Order::Desc)
        .order_by(Works::CreatedAt, Order::Asc)
        .limit(1)
        .build(SqliteQueryBuilder)
}

/// Insert a validated new work owned by `owner_id`.
pub fn insert(id: &str, work: &NewWork, owner_id: &str) -> Built {
    Query::insert()
        .into_table(Works::Table)
        .columns([
            Works::Id,
            Works::Title,
            Works::Category,
            Works::Creator,
            Works::Description,
            Works::PublicationYear,
            Works::OwnerId,
        ])
        .values_panic([
            id.into(),
            work.title.as_str().into(),
            work.category.as_str().into(),
            work.creator.clone().into(),
            work.description.clone().into(),
            work.publication_year.into(),
            owner_id.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Apply a validated partial update. Callers skip empty patches.
pub fn update(work_id: &str, patch: &WorkPatch) -> Built {
    let mut stmt = Query::update();
    stmt.table(Works::Table);

    if let Some(ref title) = patch.title {
        stmt.value(Works::Title, title.as_str());
    }
    if let Some(category) = patch.category {
        stmt.value(Works::Category, category.as_str());
    }
    if let Some(ref creator) = patch.creator {
        stmt.value(Works::Creator, creator.as_str());
    }
    if let Some(ref description) = patch.description {
        stmt.value(Works::Description, description.as_str());
    }
    if let Some(year) = patch.publication_year {
        stmt.value(Works::PublicationYear, year);
    }

    stmt.and_where(Expr::col(Works::Id).eq(work_id))
        .build(SqliteQueryBuilder)
}

/// Permanently remove a work. Its votes go with it (FK cascade).
pub fn delete(work_id: &str) -> Built {
    Query::delete()
        .from_table(Works::Table)
        .and_where(Expr::col(Works::Id).eq(work_id))
        .build(SqliteQueryBuilder)
}

/// Bump the derived vote counter. Runs in the same transaction as the
/// vote insert.
pub fn increment_vote_count(work_id: &str) -> Built {
    Query::update()
        .table(Works::Table)
        .value(Works::VoteCount, Expr::col(Works::VoteCount).add(1))
        .and_where(Expr::col(Works::Id).eq(work_id))
        .build(SqliteQueryBuilder)
}
