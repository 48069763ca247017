pub mod config;
pub mod models;
pub mod query;
pub mod registry;
pub mod settings;
pub mod sync;
