//! The values which flow through a pass: candidate [Resource]s, their [UsageScore]s, and the [CacheEntry]s left behind
//! in the index.
use std::sync::Arc;

/// Something which may be loaded into the cache.
///
/// Names are only unique within a single pass, and are used as the key in the [crate::CacheIndex].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Resource {
    name: Arc<str>,
    size_bytes: u64,
}

impl Resource {
    pub fn new(name: impl Into<Arc<str>>, size_bytes: u64) -> Resource {
        Resource {
            name: name.into(),
            size_bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }
}

/// Whether a resource is expected to be used often enough to be worth caching.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UsageScore {
    FrequentlyUsed,
    NotFrequentlyUsed,
}

impl UsageScore {
    pub fn is_frequent(&self) -> bool {
        matches!(self, UsageScore::FrequentlyUsed)
    }
}

impl From<bool> for UsageScore {
    fn from(frequent: bool) -> UsageScore {
        if frequent {
            UsageScore::FrequentlyUsed
        } else {
            UsageScore::NotFrequentlyUsed
        }
    }
}

/// The record of a committed resource.
///
/// By the time one of these exists its size has already been charged against the budget.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CacheEntry {
    name: Arc<str>,
    size_bytes: u64,
}

impl CacheEntry {
    pub(crate) fn from_resource(resource: &Resource) -> CacheEntry {
        CacheEntry {
            name: resource.shared_name(),
            size_bytes: resource.size_bytes(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }
}
