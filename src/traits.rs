//! The collaborators the controller drives.
//!
//! A [MemoryMonitor] says how much memory is in use and how much may be used, a [ResourceCatalog] says what could be
//! cached, and a [ResourceLoader] actually makes a resource resident.  What "frequently used" means is decided by a
//! [crate::UsagePredictor].
use std::io::Error;

use crate::*;

pub trait MemoryMonitor: Send + Sync {
    /// Bytes currently in use, not counting anything in the cache index: the controller adds the index's total itself.
    /// Failing here aborts the pass.
    fn current_usage(&self) -> Result<u64, Error>;

    /// The most bytes which may be in use once admission is done.
    fn max_budget(&self) -> u64;
}

/// Produce the candidates for one pass.
///
/// Each call should return a fresh snapshot; the controller never caches the result across passes.
pub trait ResourceCatalog: Send + Sync {
    fn candidates(&self) -> Result<Vec<Resource>, Error>;
}

/// Make the bytes of a resource resident.
///
/// Loaders which impose their own timeouts should report them through their error type.
pub trait ResourceLoader: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&self, resource: &Resource) -> Result<(), Self::Error>;
}

impl<T: MemoryMonitor + ?Sized> MemoryMonitor for std::sync::Arc<T> {
    fn current_usage(&self) -> Result<u64, Error> {
        (**self).current_usage()
    }

    fn max_budget(&self) -> u64 {
        (**self).max_budget()
    }
}

impl<T: ResourceCatalog + ?Sized> ResourceCatalog for std::sync::Arc<T> {
    fn candidates(&self) -> Result<Vec<Resource>, Error> {
        (**self).candidates()
    }
}

impl<T: ResourceLoader + ?Sized> ResourceLoader for std::sync::Arc<T> {
    type Error = T::Error;

    fn load(&self, resource: &Resource) -> Result<(), T::Error> {
        (**self).load(resource)
    }
}
