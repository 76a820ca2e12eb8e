//! Registrant domain model.
//!
//! # Responsibility
//! - Define the persisted registrant record and its write payload.
//! - Keep password material out of `Debug` output and serialized views.
//!
//! Scalar fields are stored verbatim; no format rules apply to them.
//!
//! # Invariants
//! - `id` is database-assigned and immutable.
//! - `region`/`term` are hydrated from lookups and are `None` when the
//!   association is unset or the referenced row is missing.
//! - Writes carry scalar fields only; associations change through dedicated
//!   repository calls.

use crate::model::lookup::{Region, Term};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Primary key of a `CADASTRO` row.
pub type RegistrantId = i64;

const REDACTED: &str = "<redacted>";

/// Scalar fields written by create/update.
///
/// Field names follow the domain; column mapping lives in the repository
/// (`name` → `NOME`, `phone` → `TELEFONE`, and so on).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrantDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    /// Stored as-is in `SENHA`; never serialized back out.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub company: String,
    pub language: String,
}

impl RegistrantDraft {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        company: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            password: password.into(),
            company: company.into(),
            language: language.into(),
        }
    }
}

impl Debug for RegistrantDraft {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrantDraft")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .field("company", &self.company)
            .field("language", &self.language)
            .finish()
    }
}

/// Persisted registrant hydrated with its lookup associations.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    pub id: RegistrantId,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub company: String,
    pub language: String,
    pub region: Option<Region>,
    pub term: Option<Term>,
}

impl Registrant {
    /// Returns the scalar write payload of this record.
    pub fn draft(&self) -> RegistrantDraft {
        RegistrantDraft {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            company: self.company.clone(),
            language: self.language.clone(),
        }
    }

    /// Whether the associated term row records acceptance.
    ///
    /// `false` when no term is associated.
    pub fn has_accepted_terms(&self) -> bool {
        self.term.is_some_and(|term| term.accepted)
    }
}

impl Debug for Registrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .field("company", &self.company)
            .field("language", &self.language)
            .field("region", &self.region)
            .field("term", &self.term)
            .finish()
    }
}
