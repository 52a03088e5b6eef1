pub mod client;
pub mod controller;
pub mod debouncer;
pub mod guard;
pub mod history;
pub mod models;
pub mod pagination;
pub mod query_builder;
pub mod suggestions;
pub mod url_sync;
