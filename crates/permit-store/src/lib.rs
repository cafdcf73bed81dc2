//! Permit Store - In-memory grant storage for the permission engine

pub mod fixture;
pub mod memory;


pub use fixture::GrantFixture;
pub use memory::MemoryGrantStore;
