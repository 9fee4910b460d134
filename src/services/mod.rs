pub mod api;
pub mod auth;
pub mod connectivity;
pub mod repository;
pub mod session;
