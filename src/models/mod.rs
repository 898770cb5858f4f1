//! Data models for the CRM domain.

mod customer;
mod followup;
mod lead;

pub use customer::*;
pub use followup::*;
pub use lead::*;
