pub mod api;
pub mod config;
pub mod error;
pub mod hub;
pub mod ingest;
pub mod models;
pub mod observability;
pub mod registry;
pub mod state;
