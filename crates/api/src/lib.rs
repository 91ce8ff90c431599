//! Shared types, validation, OAuth logic, and SQL builders for mediarank.
//!
//! This crate is the single source of truth for request/response types and
//! for the business rules the route handlers enforce: the closed work
//! category set, field-level validation, and the vote/ownership invariants'
//! error vocabulary. The Axum server consumes it; route handlers stay thin.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod db;
pub mod oauth;
pub mod service;

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// The closed set of media categories a work can belong to.
///
/// Matching is case-sensitive and exact: `"album"`, `"book"`, `"movie"`.
/// Anything else — digits, blank strings, a valid prefix with trailing
/// text — is rejected at validation time, never coerced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Album,
    Book,
    Movie,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Album, Category::Book, Category::Movie];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Book => "book",
            Self::Movie => "movie",
        }
    }

    /// Parse a canonical category string. Exact match only.
    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "album" => Some(Self::Album),
            "book" => Some(Self::Book),
            "movie" => Some(Self::Movie),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome tag carried by a flash message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashStatus {
    Success,
    Failure,
}

/// One-shot status message attached to the next rendered response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub status: FlashStatus,
    pub text: String,
    /// Field-level error messages, present on validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<BTreeMap<String, Vec<String>>>,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            status: FlashStatus::Success,
            text: text.into(),
            messages: None,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            status: FlashStatus::Failure,
            text: text.into(),
            messages: None,
        }
    }

    pub fn with_messages(mut self, messages: BTreeMap<String, Vec<String>>) -> Self {
        self.messages = Some(messages);
        self
    }
}

// ─── Request Types ───────────────────────────────────────────────────────────

/// Submitted work fields. All optional so the same shape serves create
/// (missing required fields fail validation) and partial update (absent
/// fields are left untouched).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkForm {
    pub title: Option<String>,
    pub category: Option<String>,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub publication_year: Option<i64>,
}

// ─── Response Types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub provider: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkResponse {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub publication_year: Option<i64>,
    pub owner_id: String,
    pub vote_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub id: String,
    pub user_id: String,
    pub work_id: String,
    pub created_at: String,
}

/// Landing page: top-voted work per category plus the global best.
#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub best_album: Option<WorkResponse>,
    pub best_book: Option<WorkResponse>,
    pub best_movie: Option<WorkResponse>,
    pub best_work: Option<WorkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
}

/// Works listing grouped by category.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorksByCategoryResponse {
    pub albums: Vec<WorkResponse>,
    pub books: Vec<WorkResponse>,
    pub movies: Vec<WorkResponse>,
}

/// Work detail with its votes, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkDetailResponse {
    pub work: WorkResponse,
    pub votes: Vec<VoteResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
}

/// Scaffold for the create form: the category choices.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewWorkResponse {
    pub categories: Vec<Category>,
}

/// 400 body for a rejected create/update: the failure flash text, the
/// field-level messages, and the submitted input echoed back so the form
/// can be re-rendered with it.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkErrorsResponse {
    pub text: String,
    pub messages: BTreeMap<String, Vec<String>>,
    pub work: WorkForm,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Service-level error carried between shared logic and route adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}
