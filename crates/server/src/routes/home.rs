use axum::{
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use rusqlite::Connection;

use mediarank_api::{db, Category, HomeResponse, WorkResponse};

use crate::error::ApiErr;
use crate::flash;
use crate::storage::{sq_query_row, work_from_row, Db};

fn best(conn: &Connection, built: db::Built) -> Result<Option<WorkResponse>, ApiErr> {
    match sq_query_row(conn, built, work_from_row) {
        Ok(work) => Ok(Some(work)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(ApiErr::from_db("best work query")(e)),
    }
}

/// GET / — public landing page: top-voted work per category plus the
/// global best. Works for anonymous and authenticated callers, with any
/// category empty, or with no media at all.
pub async fn root(State(db): State<Db>, headers: HeaderMap) -> Result<Response, ApiErr> {
    let pending = flash::take(&headers);

    let conn = db.conn();
    let body = HomeResponse {
        best_album: best(&conn, db::works::best_in_category(Category::Album))?,
        best_book: best(&conn, db::works::best_in_category(Category::Book))?,
        best_movie: best(&conn, db::works::best_in_category(Category::Movie))?,
        best_work: best(&conn, db::works::best_overall())?,
        flash: pending,
    };

    // Flash is one-shot: reporting it here consumes it.
    if body.flash.is_some() {
        Ok((AppendHeaders([flash::clear_cookie()]), Json(body)).into_response())
    } else {
        Ok(Json(body).into_response())
    }
}
