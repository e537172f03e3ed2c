//! Flashdeck Store - SQLite persistence
//!
//! One [`Store`] handle over a connection pool, with query methods grouped by
//! entity. Multi-row writes (review application, generation persistence with
//! the quota guard, card acceptance) each run in a single transaction.

#![forbid(unsafe_code)]

mod cards;
mod decks;
pub mod error;
mod generations;
mod issues;
pub mod quota;
mod rows;
pub mod store;
mod study;

pub use error::{Error, Result};
pub use quota::QuotaTracker;
pub use store::{default_data_dir, default_db_path, Store};
pub use study::ReviewInput;

#[cfg(test)]
mod tests;
