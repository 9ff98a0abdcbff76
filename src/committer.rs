//! The [CacheCommitter] turns an admitted [Resource] into a [CacheEntry]: load it, then record it in the index.
//!
//! Usage is the external usage the pass started from plus everything the index holds, so the index itself is the
//! running total.  The index is only locked to check and to insert, never while loading.
use std::sync::Mutex;

use crate::*;

#[derive(Debug, thiserror::Error)]
pub enum CommitError<LoadError> {
    /// The loader failed.  Nothing was recorded.
    #[error("failed to load resource")]
    Load(#[source] LoadError),
    /// Something with this name is already in the index.
    #[error("resource is already cached")]
    AlreadyCached,
    /// Committing would have gone over budget, which the plan should never allow.
    #[error(transparent)]
    BudgetExceeded(#[from] BudgetExceeded),
}

pub struct CacheCommitter<LoaderImpl: ResourceLoader> {
    loader: LoaderImpl,
}

impl<LoaderImpl: ResourceLoader> CacheCommitter<LoaderImpl> {
    pub fn new(loader: LoaderImpl) -> CacheCommitter<LoaderImpl> {
        CacheCommitter { loader }
    }

    pub fn loader(&self) -> &LoaderImpl {
        &self.loader
    }

    fn check_admissible(
        index: &CacheIndex,
        external: &Budget,
        resource: &Resource,
    ) -> Result<(), CommitError<LoaderImpl::Error>> {
        if index.contains(resource.name()) {
            return Err(CommitError::AlreadyCached);
        }
        external
            .with_usage(index.total_bytes())
            .check(resource.size_bytes())?;
        Ok(())
    }

    /// Load `resource` and record it in `index`.
    ///
    /// `external` is the usage outside the index and the maximum.  The resource is checked before loading, so a
    /// refused resource is never loaded, and checked again before inserting, since another controller sharing the index
    /// may have committed in the meantime.  A failed load leaves the index untouched.
    pub fn commit(
        &self,
        index: &Mutex<CacheIndex>,
        external: &Budget,
        resource: &Resource,
    ) -> Result<CacheEntry, CommitError<LoaderImpl::Error>> {
        Self::check_admissible(&index.lock().unwrap(), external, resource)?;

        log::debug!("Loading resource: {}", resource.name());
        self.loader.load(resource).map_err(CommitError::Load)?;

        let mut guard = index.lock().unwrap();
        Self::check_admissible(&guard, external, resource)?;
        let entry = CacheEntry::from_resource(resource);
        guard.insert(entry.clone());
        log::debug!(
            "Added {} to the cache index ({} bytes in use)",
            resource.name(),
            external.with_usage(guard.total_bytes()).current_usage()
        );
        Ok(entry)
    }
}
