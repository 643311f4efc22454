//! Archive Kernel - Foundational types for the field archive
//!
//! This crate provides the building blocks shared by the persistence layer
//! and the services that sit on top of it:
//! - Plain entity records for recordings and their locations
//! - A cancellable, deadline-bearing request context
//! - The interruption error raised when a context stops an operation

pub mod entities;
pub mod context;
pub mod error;

pub use entities::{GeoPoint, Location, Recording};
pub use context::RequestContext;
pub use error::Interrupted;
