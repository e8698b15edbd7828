//! # notebase-core
//!
//! Core types, traits, and abstractions for the notebase note service.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the database and service crates depend on. It performs no I/O.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
