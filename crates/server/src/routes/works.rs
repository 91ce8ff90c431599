use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use mediarank_api::{
    db,
    service::{self, ValidationErrors},
    Category, Flash, NewWorkResponse, WorkDetailResponse, WorkErrorsResponse, WorkForm,
    WorksByCategoryResponse,
};

use crate::error::ApiErr;
use crate::flash;
use crate::routes::session::CurrentUser;
use crate::storage::{load_work, sq_execute, sq_query_all, vote_from_row, work_from_row, Db};

fn work_path(id: &str) -> String {
    format!("/works/{id}")
}

/// 400 body for a rejected payload: failure text, field messages, and the
/// submitted input echoed back for form re-rendering.
fn validation_failure(text: String, errors: &ValidationErrors, form: WorkForm) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(WorkErrorsResponse {
            text,
            messages: errors.messages(),
            work: form,
        }),
    )
        .into_response()
}

/// The submitted category when canonical, for flash texts; "work" otherwise.
fn category_label(form: &WorkForm) -> &'static str {
    form.category
        .as_deref()
        .and_then(Category::parse)
        .map(|c| c.as_str())
        .unwrap_or("work")
}

// ---------------------------------------------------------------------------
// GET /works — list by category
// ---------------------------------------------------------------------------

pub async fn index(
    State(db): State<Db>,
    _user: CurrentUser,
) -> Result<Json<WorksByCategoryResponse>, ApiErr> {
    let conn = db.conn();
    let list = |category: Category| {
        sq_query_all(&conn, db::works::list_by_category(category), work_from_row)
            .map_err(ApiErr::from_db("list works"))
    };

    Ok(Json(WorksByCategoryResponse {
        albums: list(Category::Album)?,
        books: list(Category::Book)?,
        movies: list(Category::Movie)?,
    }))
}

// ---------------------------------------------------------------------------
// GET /works/new — create-form scaffold
// ---------------------------------------------------------------------------

pub async fn new_form(_user: CurrentUser) -> Json<NewWorkResponse> {
    Json(NewWorkResponse {
        categories: Category::ALL.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// POST /works — create
// ---------------------------------------------------------------------------

pub async fn create(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<WorkForm>,
) -> Result<Response, ApiErr> {
    let new_work = match service::validate_work_create(&form) {
        Ok(new_work) => new_work,
        Err(errors) => {
            let text = format!("Could not create {}", category_label(&form));
            return Ok(validation_failure(text, &errors, form));
        }
    };

    let id = Uuid::new_v4().to_string();
    let conn = db.conn();
    sq_execute(&conn, db::works::insert(&id, &new_work, &user.user_id))
        .map_err(ApiErr::from_db("create work"))?;

    Ok(flash::redirect_with(
        &work_path(&id),
        Flash::success(format!("Successfully created {} {id}", new_work.category)),
    ))
}

// ---------------------------------------------------------------------------
// GET /works/:id — detail with votes, newest first
// ---------------------------------------------------------------------------

pub async fn show(
    State(db): State<Db>,
    _user: CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiErr> {
    let pending = flash::take(&headers);

    let conn = db.conn();
    let work = load_work(&conn, &id)
        .map_err(ApiErr::from_db("load work"))?
        .ok_or_else(|| ApiErr::not_found("work not found"))?;

    let votes = sq_query_all(&conn, db::votes::list_for_work(&id), vote_from_row)
        .map_err(ApiErr::from_db("list votes"))?;

    let body = WorkDetailResponse {
        work,
        votes,
        flash: pending,
    };

    if body.flash.is_some() {
        Ok((AppendHeaders([flash::clear_cookie()]), Json(body)).into_response())
    } else {
        Ok(Json(body).into_response())
    }
}

// ---------------------------------------------------------------------------
// GET /works/:id/edit — current values for the edit form
// ---------------------------------------------------------------------------

pub async fn edit_form(
    State(db): State<Db>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiErr> {
    let conn = db.conn();
    let work = load_work(&conn, &id)
        .map_err(ApiErr::from_db("load work"))?
        .ok_or_else(|| ApiErr::not_found("work not found"))?;

    Ok(Json(work).into_response())
}

// ---------------------------------------------------------------------------
// PUT /works/:id — partial update, owner only
// ---------------------------------------------------------------------------

pub async fn update(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(form): Json<WorkForm>,
) -> Result<Response, ApiErr> {
    let conn = db.conn();
    let work = load_work(&conn, &id)
        .map_err(ApiErr::from_db("load work"))?
        .ok_or_else(|| ApiErr::not_found("work not found"))?;

    // Ownership is decided before any save is attempted.
    if work.owner_id != user.user_id {
        return Ok(flash::redirect_with(
            &work_path(&id),
            Flash::failure("You can't update a work you don't own."),
        ));
    }

    let patch = match service::validate_work_patch(&form) {
        Ok(patch) => patch,
        Err(errors) => {
            // Same 400 convention as create; nothing is partially persisted.
            let text = format!("Could not update {}", work.category);
            return Ok(validation_failure(text, &errors, form));
        }
    };

    if !patch.is_empty() {
        sq_execute(&conn, db::works::update(&id, &patch))
            .map_err(ApiErr::from_db("update work"))?;
    }

    let category = patch.category.unwrap_or(work.category);
    Ok(flash::redirect_with(
        &work_path(&id),
        Flash::success(format!("Successfully updated {category} {id}")),
    ))
}

// ---------------------------------------------------------------------------
// DELETE /works/:id — owner only, votes cascade
// ---------------------------------------------------------------------------

pub async fn destroy(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiErr> {
    let conn = db.conn();
    let work = load_work(&conn, &id)
        .map_err(ApiErr::from_db("load work"))?
        .ok_or_else(|| ApiErr::not_found("work not found"))?;

    if work.owner_id != user.user_id {
        return Ok(flash::redirect_with(
            &work_path(&id),
            Flash::failure("You can't delete a work you don't own."),
        ));
    }

    sq_execute(&conn, db::works::delete(&id)).map_err(ApiErr::from_db("delete work"))?;

    Ok(flash::redirect_with(
        "/",
        Flash::success(format!("Successfully destroyed {} {id}", work.category)),
    ))
}
