//! Database repositories.

pub mod incident;

pub use incident::IncidentLedger;
