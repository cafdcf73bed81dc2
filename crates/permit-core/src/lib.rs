//! Permit Core - Domain types and storage contracts for the permission engine

pub mod catalog;
pub mod error;
pub mod ids;
pub mod models;
pub mod traits;

#[cfg(test)]
mod tests;

pub use catalog::*;
pub use error::*;
pub use ids::*;
pub use models::*;
pub use traits::*;
