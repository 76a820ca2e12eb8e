//! Registrant use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for core callers.
//! - Compose create + association into a single registration flow.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::lookup::{Region, RegionId, Term, TermId};
use crate::model::registrant::{Registrant, RegistrantDraft, RegistrantId};
use crate::repo::registrant_repo::{RegistrantRepository, RepoError, RepoResult};
use log::{error, info};

/// Use-case service wrapper for registrant operations.
pub struct RegistrantService<R: RegistrantRepository> {
    repo: R,
}

impl<R: RegistrantRepository> RegistrantService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn list_registrants(&self) -> RepoResult<Vec<Registrant>> {
        self.repo.list_all()
    }

    pub fn get_registrant(&self, id: RegistrantId) -> RepoResult<Option<Registrant>> {
        self.repo.get(id)
    }

    /// Creates a registrant with scalar fields only.
    pub fn create_registrant(&self, draft: &RegistrantDraft) -> RepoResult<RegistrantId> {
        self.repo.create(draft)
    }

    /// Creates a registrant, associates the given lookups and returns the
    /// hydrated record.
    ///
    /// # Contract
    /// - When an association fails, the freshly created row is removed and the
    ///   association error is returned.
    /// - Returns `RepoError::NotFound` if the row disappears before re-read.
    pub fn register(
        &self,
        draft: &RegistrantDraft,
        region_id: Option<RegionId>,
        term_id: Option<TermId>,
    ) -> RepoResult<Registrant> {
        let id = self.repo.create(draft)?;

        if let Err(err) = self.associate(id, region_id, term_id) {
            if let Err(cleanup_err) = self.repo.delete(id) {
                error!(
                    "event=registrant_register module=service status=error registrant_id={} error_code=cleanup_failed error={}",
                    id, cleanup_err
                );
            }
            return Err(err);
        }

        let registrant = self.repo.get(id)?.ok_or(RepoError::NotFound(id))?;
        info!(
            "event=registrant_register module=service status=ok registrant_id={} has_region={} has_term={}",
            id,
            registrant.region.is_some(),
            registrant.term.is_some()
        );
        Ok(registrant)
    }

    fn associate(
        &self,
        id: RegistrantId,
        region_id: Option<RegionId>,
        term_id: Option<TermId>,
    ) -> RepoResult<()> {
        if region_id.is_some() {
            self.repo.set_region(id, region_id)?;
        }
        if term_id.is_some() {
            self.repo.set_term(id, term_id)?;
        }
        Ok(())
    }

    /// Replaces scalar fields of an existing registrant.
    ///
    /// Returns repository-level not-found errors unchanged.
    pub fn update_registrant(&self, id: RegistrantId, draft: &RegistrantDraft) -> RepoResult<()> {
        self.repo.update(id, draft)
    }

    pub fn delete_registrant(&self, id: RegistrantId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    pub fn assign_region(&self, id: RegistrantId, region_id: Option<RegionId>) -> RepoResult<()> {
        self.repo.set_region(id, region_id)
    }

    pub fn assign_term(&self, id: RegistrantId, term_id: Option<TermId>) -> RepoResult<()> {
        self.repo.set_term(id, term_id)
    }

    pub fn find_region(&self, id: RegionId) -> RepoResult<Option<Region>> {
        self.repo.lookup_region(id)
    }

    pub fn find_term(&self, id: TermId) -> RepoResult<Option<Term>> {
        self.repo.lookup_term(id)
    }

    pub fn count_registrants(&self) -> RepoResult<u64> {
        self.repo.count()
    }
}
