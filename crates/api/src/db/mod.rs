//! Shared database schema, migrations, and query builders.
//!
//! The server binds these built statements through its rusqlite helpers;
//! nothing in here touches a connection.

pub mod migrations;
pub mod oauth_states;
pub mod sessions;
pub mod tables;
pub mod users;
pub mod votes;
pub mod works;

// Re-export tables for convenience
pub use tables::*;

/// A built statement: SQL plus its bind values.
pub type Built = (String, sea_query::Values);
