//! ResourceCounter implementations

pub mod inmemory;

pub use inmemory::InMemoryResourceCounter;
