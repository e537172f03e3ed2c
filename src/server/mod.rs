//! Server module for Flashdeck
//!
//! Contains the main server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `state`: Shared request state
//! - `validation`: Production configuration validation
//! - `init`: Main server initialization and run loop

pub mod config;
mod init;
mod loader;
mod state;
mod validation;

// Re-export public API
pub use init::{open_store, run};
pub use loader::load_config;
pub use state::AppState;
