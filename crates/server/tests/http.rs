//! HTTP-level tests: boot the router on an ephemeral port and drive it
//! with a redirect-disabled client, asserting status codes, redirect
//! targets, and flash payloads.

use mediarank_api::{db, service, Flash, FlashStatus, HomeResponse, WorkDetailResponse};
use mediarank_server::storage::{self, sq_execute, Db};
use mediarank_server::{build_router, AppConfig, AppState};
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::StatusCode;
use uuid::Uuid;

const MUST_BE_LOGGED_IN: &str = "You must be logged in to do that.";

struct TestApp {
    base: String,
    db: Db,
    client: reqwest::Client,
    _data_dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let db = storage::init_db(data_dir.path()).expect("init db");

    let state = AppState {
        db: db.clone(),
        config: AppConfig {
            base_url: "http://localhost".into(),
            oauth_providers: Vec::new(),
        },
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client");

    TestApp {
        base: format!("http://{addr}"),
        db,
        client,
        _data_dir: data_dir,
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Insert a user directly, as the OAuth callback would.
    fn create_user(&self, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let uid = Uuid::new_v4().simple().to_string();
        let conn = self.db.conn();
        sq_execute(&conn, db::users::insert(&id, "github", &uid, username, None))
            .expect("insert user");
        id
    }

    /// Bind a session to a user, returning the Cookie header value.
    fn login(&self, user_id: &str) -> String {
        let sid = service::generate_session_id();
        let conn = self.db.conn();
        sq_execute(&conn, db::sessions::insert(&sid, user_id)).expect("insert session");
        format!("session={sid}")
    }

    fn create_work(&self, owner_id: &str, title: &str, category: &str) -> String {
        let form = mediarank_api::WorkForm {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            ..Default::default()
        };
        let new_work = service::validate_work_create(&form).expect("valid fixture");
        let id = Uuid::new_v4().to_string();
        let conn = self.db.conn();
        sq_execute(&conn, db::works::insert(&id, &new_work, owner_id)).expect("insert work");
        id
    }

    async fn work_detail(&self, cookie: &str, work_id: &str) -> WorkDetailResponse {
        let resp = self
            .client
            .get(self.url(&format!("/works/{work_id}")))
            .header(COOKIE, cookie)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.expect("detail body")
    }
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Read the flash set on a redirect response, skipping clearing cookies.
fn response_flash(resp: &reqwest::Response) -> Option<Flash> {
    for value in resp.headers().get_all(SET_COOKIE) {
        let Ok(s) = value.to_str() else { continue };
        let Some(rest) = s.strip_prefix("flash=") else {
            continue;
        };
        let raw = rest.split(';').next().unwrap_or("");
        if raw.is_empty() {
            continue;
        }
        let Ok(json) = urlencoding::decode(raw) else {
            continue;
        };
        if let Ok(flash) = serde_json::from_str(&json) {
            return Some(flash);
        }
    }
    None
}

fn assert_login_required(resp: &reqwest::Response) {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(resp), "/");
    let flash = response_flash(resp).expect("flash cookie");
    assert_eq!(flash.status, FlashStatus::Failure);
    assert_eq!(flash.text, MUST_BE_LOGGED_IN);
}

// ---------------------------------------------------------------------------
// Authentication gating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anonymous_requests_to_protected_routes_redirect_home() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let work = app.create_work(&dan, "Dirty Computer", "album");

    let c = &app.client;
    let responses = vec![
        c.get(app.url("/works")).send().await.unwrap(),
        c.get(app.url("/works/new")).send().await.unwrap(),
        c.post(app.url("/works"))
            .json(&serde_json::json!({"title": "X", "category": "album"}))
            .send()
            .await
            .unwrap(),
        c.get(app.url(&format!("/works/{work}"))).send().await.unwrap(),
        c.get(app.url(&format!("/works/{work}/edit"))).send().await.unwrap(),
        c.put(app.url(&format!("/works/{work}")))
            .json(&serde_json::json!({"title": "Y"}))
            .send()
            .await
            .unwrap(),
        c.delete(app.url(&format!("/works/{work}"))).send().await.unwrap(),
        c.post(app.url(&format!("/works/{work}/upvote"))).send().await.unwrap(),
        c.get(app.url("/users")).send().await.unwrap(),
    ];

    for resp in responses {
        assert_login_required(&resp);
    }
}

#[tokio::test]
async fn landing_page_is_public() {
    let app = spawn_app().await;
    let resp = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let home: HomeResponse = resp.json().await.unwrap();
    assert!(home.best_work.is_none());
    assert!(home.flash.is_none());
}

#[tokio::test]
async fn landing_page_reports_and_clears_pending_flash() {
    let app = spawn_app().await;

    // Trigger a flash by hitting a protected route anonymously.
    let redirect = app.client.get(app.url("/works")).send().await.unwrap();
    let flash = response_flash(&redirect).expect("flash set");

    let cookie = format!(
        "flash={}",
        urlencoding::encode(&serde_json::to_string(&flash).unwrap())
    );
    let resp = app
        .client
        .get(app.url("/"))
        .header(COOKIE, cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The response clears the consumed flash cookie.
    let cleared = resp
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|v| v.to_str().is_ok_and(|s| s.starts_with("flash=;")));
    assert!(cleared);

    let home: HomeResponse = resp.json().await.unwrap();
    let reported = home.flash.expect("flash reported");
    assert_eq!(reported.text, MUST_BE_LOGGED_IN);
}

// ---------------------------------------------------------------------------
// Work catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_work_persists_and_redirects_to_detail() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let cookie = app.login(&dan);

    let resp = app
        .client
        .post(app.url("/works"))
        .header(COOKIE, &cookie)
        .json(&serde_json::json!({"title": "Dirty Computer", "category": "album"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let loc = location(&resp).to_string();
    assert!(loc.starts_with("/works/"), "locator was {loc}");

    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.status, FlashStatus::Success);
    assert!(flash.text.starts_with("Successfully created album"));

    let id = loc.trim_start_matches("/works/");
    let detail = app.work_detail(&cookie, id).await;
    assert_eq!(detail.work.title, "Dirty Computer");
    assert_eq!(detail.work.owner_id, dan);
    assert_eq!(detail.work.vote_count, 0);
}

#[tokio::test]
async fn create_work_rejects_invalid_categories_without_persisting() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let cookie = app.login(&dan);

    for category in ["nope", "42", "", "  ", "albumstrailingtext"] {
        let resp = app
            .client
            .post(app.url("/works"))
            .header(COOKIE, &cookie)
            .json(&serde_json::json!({"title": "Invalid Work", "category": category}))
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status(),
            StatusCode::BAD_REQUEST,
            "category {category:?} accepted"
        );

        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["messages"]["category"].is_array());
        // Submitted input is echoed back for the re-rendered form.
        assert_eq!(body["work"]["title"], "Invalid Work");
    }

    // Nothing was persisted.
    let home: HomeResponse = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(home.best_work.is_none());
}

#[tokio::test]
async fn create_work_rejects_blank_title() {
    let app = spawn_app().await;
    let cookie = app.login(&app.create_user("dan"));

    let resp = app
        .client
        .post(app.url("/works"))
        .header(COOKIE, &cookie)
        .json(&serde_json::json!({"category": "book"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["messages"]["title"][0], "can't be blank");
}

#[tokio::test]
async fn unknown_work_ids_yield_not_found() {
    let app = spawn_app().await;
    let cookie = app.login(&app.create_user("dan"));

    for path in ["/works/bogus", "/works/bogus/edit"] {
        let resp = app
            .client
            .get(app.url(path))
            .header(COOKIE, &cookie)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let resp = app
        .client
        .put(app.url("/works/bogus"))
        .header(COOKIE, &cookie)
        .json(&serde_json::json!({"title": "Test Title"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .client
        .delete(app.url("/works/bogus"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_can_update_their_work() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let cookie = app.login(&dan);
    let work = app.create_work(&dan, "Old Title", "album");

    let resp = app
        .client
        .put(app.url(&format!("/works/{work}")))
        .header(COOKIE, &cookie)
        .json(&serde_json::json!({"title": "Dirty Computer"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/works/{work}"));
    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.status, FlashStatus::Success);
    assert_eq!(flash.text, format!("Successfully updated album {work}"));

    let detail = app.work_detail(&cookie, &work).await;
    assert_eq!(detail.work.title, "Dirty Computer");
}

#[tokio::test]
async fn non_owner_update_is_rejected_without_mutation() {
    let app = spawn_app().await;
    let kari = app.create_user("kari");
    let work = app.create_work(&kari, "Practical Object-Oriented Design", "book");

    let dan = app.create_user("dan");
    let dan_cookie = app.login(&dan);

    let resp = app
        .client
        .put(app.url(&format!("/works/{work}")))
        .header(COOKIE, &dan_cookie)
        .json(&serde_json::json!({"title": "Dirty Computer"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/works/{work}"));
    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.status, FlashStatus::Failure);
    assert_eq!(flash.text, "You can't update a work you don't own.");

    let detail = app.work_detail(&dan_cookie, &work).await;
    assert_eq!(detail.work.title, "Practical Object-Oriented Design");
}

#[tokio::test]
async fn invalid_update_returns_bad_request_and_preserves_record() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let cookie = app.login(&dan);
    let work = app.create_work(&dan, "Original", "album");

    // Blank category on update gets the same 400 convention as create.
    let resp = app
        .client
        .put(app.url(&format!("/works/{work}")))
        .header(COOKIE, &cookie)
        .json(&serde_json::json!({"title": "", "category": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["messages"]["title"].is_array());
    assert!(body["messages"]["category"].is_array());

    let detail = app.work_detail(&cookie, &work).await;
    assert_eq!(detail.work.title, "Original");
    assert_eq!(detail.work.category.as_str(), "album");
}

#[tokio::test]
async fn owner_can_destroy_their_work() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let cookie = app.login(&dan);
    let work = app.create_work(&dan, "Dirty Computer", "album");

    let resp = app
        .client
        .delete(app.url(&format!("/works/{work}")))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.text, format!("Successfully destroyed album {work}"));

    let resp = app
        .client
        .get(app.url(&format!("/works/{work}")))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_destroy_leaves_record_and_votes() {
    let app = spawn_app().await;
    let kari = app.create_user("kari");
    let work = app.create_work(&kari, "Parable of the Sower", "book");

    // A third user's vote should survive the failed destroy.
    let voter = app.create_user("voter");
    let voter_cookie = app.login(&voter);
    app.client
        .post(app.url(&format!("/works/{work}/upvote")))
        .header(COOKIE, &voter_cookie)
        .send()
        .await
        .unwrap();

    let dan_cookie = app.login(&app.create_user("dan"));
    let resp = app
        .client
        .delete(app.url(&format!("/works/{work}")))
        .header(COOKIE, &dan_cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/works/{work}"));
    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.status, FlashStatus::Failure);
    assert_eq!(flash.text, "You can't delete a work you don't own.");

    let detail = app.work_detail(&dan_cookie, &work).await;
    assert_eq!(detail.work.vote_count, 1);
    assert_eq!(detail.votes.len(), 1);
}

// ---------------------------------------------------------------------------
// Vote ledger
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upvote_succeeds_once_then_conflicts() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let work = app.create_work(&dan, "Another Album", "album");

    let kari = app.create_user("kari");
    let cookie = app.login(&kari);

    let resp = app
        .client
        .post(app.url(&format!("/works/{work}/upvote")))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/works/{work}"));
    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.status, FlashStatus::Success);
    assert_eq!(flash.text, "Successfully upvoted!");

    let detail = app.work_detail(&cookie, &work).await;
    assert_eq!(detail.work.vote_count, 1);
    assert_eq!(detail.votes.len(), 1);
    assert_eq!(detail.votes[0].user_id, kari);

    // Second upvote from the same user: failure, nothing changes.
    let resp = app
        .client
        .post(app.url(&format!("/works/{work}/upvote")))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.status, FlashStatus::Failure);
    assert_eq!(flash.text, "Could not upvote");

    let detail = app.work_detail(&cookie, &work).await;
    assert_eq!(detail.work.vote_count, 1);
    assert_eq!(detail.votes.len(), 1);
}

#[tokio::test]
async fn upvoting_your_own_work_is_forbidden() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let cookie = app.login(&dan);
    let work = app.create_work(&dan, "Dirty Computer", "album");

    let resp = app
        .client
        .post(app.url(&format!("/works/{work}/upvote")))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/works/{work}"));
    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.status, FlashStatus::Failure);
    assert_eq!(flash.text, "You can't upvote your own work.");

    let detail = app.work_detail(&cookie, &work).await;
    assert_eq!(detail.work.vote_count, 0);
    assert!(detail.votes.is_empty());
}

#[tokio::test]
async fn upvoting_an_unknown_work_is_not_found_even_before_auth() {
    let app = spawn_app().await;

    // The existence check runs before the authorization logic.
    let resp = app
        .client
        .post(app.url("/works/bogus/upvote"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_clears_the_session_and_is_idempotent() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let cookie = app.login(&dan);

    let resp = app
        .client
        .delete(app.url("/logout"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let flash = response_flash(&resp).expect("flash");
    assert_eq!(flash.text, "Successfully logged out!");

    // The session no longer authenticates.
    let resp = app
        .client
        .get(app.url("/works"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_login_required(&resp);

    // Logging out while logged out is a plain redirect, not an error.
    let resp = app.client.delete(app.url("/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(response_flash(&resp).is_none());
}

// ---------------------------------------------------------------------------
// User directory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_directory_lists_users_and_distinguishes_unknown_ids() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let kari = app.create_user("kari");
    let cookie = app.login(&dan);

    let resp = app
        .client
        .get(app.url("/users"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let listing: mediarank_api::ListUsersResponse = resp.json().await.unwrap();
    assert_eq!(listing.users.len(), 2);

    let resp = app
        .client
        .get(app.url(&format!("/users/{kari}")))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: mediarank_api::UserResponse = resp.json().await.unwrap();
    assert_eq!(user.username, "kari");

    // An id that resolves to no row is a 404, not a server error.
    let resp = app
        .client
        .get(app.url("/users/bogus"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "user not found");
}

// ---------------------------------------------------------------------------
// Landing page rankings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn landing_page_ranks_works_by_votes() {
    let app = spawn_app().await;
    let dan = app.create_user("dan");
    let album_low = app.create_work(&dan, "Quiet Album", "album");
    let album_top = app.create_work(&dan, "Loud Album", "album");
    let book = app.create_work(&dan, "Only Book", "book");

    for name in ["u1", "u2"] {
        let cookie = app.login(&app.create_user(name));
        app.client
            .post(app.url(&format!("/works/{album_top}/upvote")))
            .header(COOKIE, &cookie)
            .send()
            .await
            .unwrap();
    }

    let home: HomeResponse = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let best_album = home.best_album.expect("album present");
    assert_eq!(best_album.id, album_top);
    assert_ne!(best_album.id, album_low);
    assert_eq!(best_album.vote_count, 2);

    assert_eq!(home.best_book.expect("book present").id, book);
    assert!(home.best_movie.is_none());
    assert_eq!(home.best_work.expect("global best").id, album_top);
}
