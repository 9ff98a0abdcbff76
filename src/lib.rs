//! Decide which resources to load into a memory-bounded cache.
//!
//! Loading everything an application might want up front is wasteful, and loading it on first use is slow.  This crate
//! sits in between: given some candidates and a memory budget, it loads the ones worth having until the budget runs
//! out, and records what it loaded.  It never evicts anything it already loaded.
//!
//! One admission pass goes like this:
//!
//! - Read current memory usage and the maximum from a [MemoryMonitor], and the candidates from a [ResourceCatalog].
//! - Score every candidate with a [UsagePredictor].  Only candidates scored as frequently used are considered.
//! - Sort the survivors smallest first and walk them against the budget, stopping at the first one which doesn't fit.
//!   This is the [AdmissionPlanner].
//! - Load each admitted resource through a [ResourceLoader] and record it in the [CacheIndex].  A resource which fails
//!   to load is skipped and costs nothing.  This is the [CacheCommitter].
//!
//! [CacheController] ties it together and guarantees that passes never overlap.
//!
//! To use this crate, implement [MemoryMonitor], [ResourceCatalog] and [ResourceLoader], or use the provided
//! [FixedMemoryMonitor], [StaticCatalog], [DirectoryCatalog] and [DirectoryLoader], then construct a [CacheController]
//! with a predictor such as [RuleTablePredictor] and your chosen [CacheControllerConfig].
mod budget;
mod cache_index;
mod committer;
mod controller;
mod filesystem;
mod fixed;
mod planner;
mod predictor;
mod resource;
mod traits;

pub use budget::*;
pub use cache_index::*;
pub use committer::*;
pub use controller::*;
pub use filesystem::*;
pub use fixed::*;
pub use planner::*;
pub use predictor::*;
pub use resource::*;
pub use traits::*;
