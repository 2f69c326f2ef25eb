//! BileMo catalogue API: clients, their customers and phones, served over
//! axum with paginated listings behind a tag-invalidated read-through cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
