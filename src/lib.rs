//! Field Inspector
//!
//! Offline-first core of the field inspection app: engineers log in, record
//! per-unit inspection outcomes, and queue them in a local SQLite store until
//! they are synchronized with the backend.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod store;
