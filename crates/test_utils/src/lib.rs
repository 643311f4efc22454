//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! field archive test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built recordings and locations
//! - `builders`: Builder patterns for test data construction
//! - `database`: PostGIS test container management
//! - `assertions`: Assertion helpers for archive entities
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
