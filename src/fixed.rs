//! In-memory collaborators: a [FixedMemoryMonitor] whose usage is set by hand and a [StaticCatalog] over a fixed list.
use std::io::Error;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::*;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;

#[derive(Debug)]
pub struct FixedMemoryMonitor {
    usage: AtomicU64,
    max_bytes: u64,
}

impl FixedMemoryMonitor {
    pub fn new(usage: u64, max_bytes: u64) -> FixedMemoryMonitor {
        FixedMemoryMonitor {
            usage: AtomicU64::new(usage),
            max_bytes,
        }
    }

    /// 10 MiB used out of 100 MiB.
    pub fn standard() -> FixedMemoryMonitor {
        FixedMemoryMonitor::new(10 * MB, 100 * MB)
    }

    pub fn set_usage(&self, usage: u64) {
        self.usage.store(usage, Ordering::Relaxed);
    }
}

impl MemoryMonitor for FixedMemoryMonitor {
    fn current_usage(&self) -> Result<u64, Error> {
        Ok(self.usage.load(Ordering::Relaxed))
    }

    fn max_budget(&self) -> u64 {
        self.max_bytes
    }
}

#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    resources: Vec<Resource>,
}

impl StaticCatalog {
    pub fn new(resources: Vec<Resource>) -> StaticCatalog {
        StaticCatalog { resources }
    }

    /// A couple of textures and audio clips.
    pub fn standard() -> StaticCatalog {
        StaticCatalog::new(vec![
            Resource::new("Texture1", MB),
            Resource::new("Texture2", 2 * MB),
            Resource::new("Audio1", 512 * KB),
            Resource::new("Audio2", MB),
        ])
    }
}

impl ResourceCatalog for StaticCatalog {
    fn candidates(&self) -> Result<Vec<Resource>, Error> {
        Ok(self.resources.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor() {
        let monitor = FixedMemoryMonitor::standard();
        assert_eq!(monitor.current_usage().unwrap(), 10 * MB);
        assert_eq!(monitor.max_budget(), 100 * MB);
        monitor.set_usage(5);
        assert_eq!(monitor.current_usage().unwrap(), 5);
    }

    #[test]
    fn test_catalog_snapshot() {
        let catalog = StaticCatalog::standard();
        let first = catalog.candidates().unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(first, catalog.candidates().unwrap());
        assert!(StaticCatalog::default().candidates().unwrap().is_empty());
    }
}
