pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod events;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod store;
