//! Data Access Objects, one per table. Every function takes any
//! `ConnectionTrait`; multi-statement writes open their own transaction.
mod activities;
mod components;
mod impacts;
mod projects;

pub use activities::ActivityDao;
pub use components::ComponentDao;
pub use impacts::ImpactDao;
pub use projects::ProjectDao;
