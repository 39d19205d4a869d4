//! Shared database schema, migrations, and query builders.
//!
//! Builders return `(sql, values)` pairs; the server binds the values into
//! `rusqlite` statements.

pub mod badges;
pub mod challenges;
pub mod lessons;
pub mod migrations;
pub mod notifications;
pub mod progress;
pub mod quizzes;
pub mod signins;
pub mod stats;
pub mod tables;
pub mod users;
pub mod xp;

// Re-export tables for convenience
pub use tables::*;

/// A built statement: SQL text plus positional values.
pub type Built = (String, sea_query::Values);
