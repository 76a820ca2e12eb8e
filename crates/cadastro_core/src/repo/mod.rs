//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes persist draft fields as given; schema constraints are the only gate.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`,
//!   `Transient`) instead of masking failures as empty results.

pub mod registrant_repo;
