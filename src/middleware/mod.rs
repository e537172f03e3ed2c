//! Middleware for the Flashdeck API

pub mod auth;
