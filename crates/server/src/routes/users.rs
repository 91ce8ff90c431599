use axum::{
    extract::{Path, State},
    Json,
};

use mediarank_api::{db, ListUsersResponse, UserResponse};

use crate::error::ApiErr;
use crate::routes::session::CurrentUser;
use crate::storage::{sq_query_all, sq_query_row, user_from_row, Db};

// ---------------------------------------------------------------------------
// GET /users
// ---------------------------------------------------------------------------

pub async fn index(
    State(db): State<Db>,
    _user: CurrentUser,
) -> Result<Json<ListUsersResponse>, ApiErr> {
    let conn = db.conn();
    let users = sq_query_all(&conn, db::users::list_all(), user_from_row)
        .map_err(ApiErr::from_db("list users"))?;

    Ok(Json(ListUsersResponse { users }))
}

// ---------------------------------------------------------------------------
// GET /users/:id
// ---------------------------------------------------------------------------

pub async fn show(
    State(db): State<Db>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiErr> {
    let conn = db.conn();
    match sq_query_row(&conn, db::users::get_by_id(&id), user_from_row) {
        Ok(user) => Ok(Json(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(ApiErr::not_found("user not found")),
        Err(e) => Err(ApiErr::from_db("load user")(e)),
    }
}
