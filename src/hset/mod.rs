//! Hash Set Module
//!
//! A thread-safe set backed by a hash table, with JSON encoding.

pub mod json;
pub mod set;

pub use set::ConcurrentSet;
