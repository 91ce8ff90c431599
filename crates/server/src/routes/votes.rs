use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

use mediarank_api::{db, Flash};

use crate::error::ApiErr;
use crate::flash;
use crate::routes::session::{self, Visitor};
use crate::storage::{load_work, sq_execute, Db};

// ---------------------------------------------------------------------------
// POST /works/:id/upvote
// ---------------------------------------------------------------------------

/// Cast a single up-vote on a work the caller does not own.
///
/// The unknown-work check runs before the authorization logic, so this
/// handler takes the optional `Visitor` context rather than the rejecting
/// `CurrentUser` extractor. Every outcome redirects with a flash.
pub async fn upvote(
    State(db): State<Db>,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Result<Response, ApiErr> {
    let conn = db.conn();

    let work = load_work(&conn, &id)
        .map_err(ApiErr::from_db("load work"))?
        .ok_or_else(|| ApiErr::not_found("work not found"))?;

    let Some(user) = visitor.user else {
        return Ok(session::login_required());
    };

    let work_page = format!("/works/{id}");

    if user.user_id == work.owner_id {
        return Ok(flash::redirect_with(
            &work_page,
            Flash::failure("You can't upvote your own work."),
        ));
    }

    // Vote insert and counter increment are one atomic unit. The UNIQUE
    // (user_id, work_id) constraint does the duplicate check inside the
    // insert itself, so two concurrent upvotes cannot both land.
    let tx = conn
        .unchecked_transaction()
        .map_err(ApiErr::from_db("begin vote transaction"))?;

    let vote_id = Uuid::new_v4().to_string();
    match sq_execute(&tx, db::votes::insert(&vote_id, &user.user_id, &id)) {
        Ok(_) => {
            sq_execute(&tx, db::works::increment_vote_count(&id))
                .map_err(ApiErr::from_db("increment vote count"))?;
            tx.commit().map_err(ApiErr::from_db("commit vote"))?;

            Ok(flash::redirect_with(
                &work_page,
                Flash::success("Successfully upvoted!"),
            ))
        }
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            // Already voted; the original vote stands, the transaction
            // rolls back on drop.
            let mut messages = BTreeMap::new();
            messages.insert(
                "user".to_string(),
                vec!["has already voted for this work".to_string()],
            );

            Ok(flash::redirect_with(
                &work_page,
                Flash::failure("Could not upvote").with_messages(messages),
            ))
        }
        Err(e) => Err(ApiErr::from_db("insert vote")(e)),
    }
}
