//! Relational persistence for users and refresh tokens.
//!
//! - **Turso/SQLite** via libsql: local file, in-memory, or remote Turso
//!   (`turso` feature)
//! - **Collaborator traits**: [`UserDirectory`] and [`RefreshTokenRepository`]
//!   are the only surfaces the authentication core depends on

#![allow(missing_docs)]

pub mod traits;
pub mod turso;

pub use traits::{DatabaseProvider, RefreshTokenRepository, UserDirectory, UserRecord};
pub use turso::TursoClient;
