//! Data models for the hackathon portal.
//!
//! Field names serialize in camelCase to match the document store records.

mod application;
mod metadata;
mod profile;
mod user;

pub use application::*;
pub use metadata::*;
pub use profile::*;
pub use user::*;
