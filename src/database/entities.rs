//! Module to export all database entities.
pub mod activity;
pub mod environmental_component;
pub mod impact;
pub mod project;

pub use activity::Entity as ActivityEntity;
pub use environmental_component::Entity as ComponentEntity;
pub use impact::Entity as ImpactEntity;
pub use project::Entity as ProjectEntity;
