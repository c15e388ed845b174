pub mod app;
pub mod bigquery;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod output;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;
