//! Chat API service
//!
//! Converts users, messages and rooms to and from their JSON exchange
//! representation and serves them over HTTP. Storage is PostgreSQL through
//! sqlx, or an in-memory store.

pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod password;
pub mod repositories;
pub mod representers;
pub mod routes;
pub mod state;
pub mod validation;

pub use state::AppState;
