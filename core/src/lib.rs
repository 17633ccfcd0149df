pub mod db;
pub mod habit_migration;
pub mod legacy_import;
pub mod models;
pub mod schema;
pub mod service;
pub mod store;
