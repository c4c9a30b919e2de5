//! Database entities.

pub mod incident;

pub use incident::{Conclusion, Entity as Incident, IncidentAction};
