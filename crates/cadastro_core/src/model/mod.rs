//! Registrant domain model and its read-only lookup entities.
//!
//! # Responsibility
//! - Define the records mapped from `CADASTRO`, `REGIAO` and `TERMO` rows.
//! - Keep password material out of diagnostic and serialized output.
//!
//! # Invariants
//! - Registrant identifiers are assigned by the database and never change.
//! - Region/Term associations are optional and absent until explicitly set.

pub mod lookup;
pub mod registrant;
