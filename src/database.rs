//! SQLite persistence for Leopold matrices.
pub mod connection;
pub mod conversions;
pub mod dao;
pub mod entities;
pub mod migration;

pub use connection::connect_database;
pub use dao::{ActivityDao, ComponentDao, ImpactDao, ProjectDao};
pub use migration::run_migrations;
