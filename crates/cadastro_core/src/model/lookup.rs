//! Read-only lookup entities referenced by registrants.

use serde::{Deserialize, Serialize};

/// Primary key of a `REGIAO` row.
pub type RegionId = i64;

/// Primary key of a `TERMO` row.
pub type TermId = i64;

/// Country association stored in `REGIAO`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Maps to `REGIAO.PAIS_NOME`.
    pub country_name: String,
}

/// Terms-of-service acceptance stored in `TERMO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    /// Maps to `TERMO.ACEITAR_TERMO`.
    pub accepted: bool,
}
