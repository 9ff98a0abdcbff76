//! The [CacheController] runs admission passes.
//!
//! A pass reads current usage from the [MemoryMonitor] and candidates from the [ResourceCatalog], scores each candidate
//! with the [UsagePredictor], asks the [AdmissionPlanner] for a plan, then commits the plan one resource at a time.
//!
//! Passes never overlap: triggering one while another is running waits for it to finish.  The [CacheIndex] is the only
//! state shared between passes and lives behind its own mutex, so it can be shared with readers or with other
//! controllers via [CacheController::with_shared_index].  The index is only locked to read or insert, never while a
//! resource loads.
//!
//! The monitor reports usage outside the cache; everything in the index is added on top.  Candidates whose name is
//! already in the index are rejected, so repeated passes over the same catalog don't admit anything twice.
//!
//! A pass is not transactional.  Whatever was committed before a fatal error stays committed.
use std::io::Error as IoError;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::*;

#[derive(Clone, Debug, Default, derive_builder::Builder)]
pub struct CacheControllerConfig {
    /// Bytes below the monitor's maximum which admission must leave free.
    #[builder(default)]
    pub reserve_bytes: u64,
    /// Resources larger than this are never admitted.
    #[builder(default)]
    pub max_single_resource_bytes: Option<u64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Unavailable {
    MemoryUsage,
    Candidates,
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("could not read {what:?}")]
    ResourceUnavailable {
        what: Unavailable,
        #[source]
        source: IoError,
    },
    /// A commit would have exceeded the budget, because the plan was wrong or because another controller sharing the
    /// index used the headroom first.  The pass stops.
    #[error("budget invariant violated committing {name}")]
    BudgetViolation {
        name: String,
        #[source]
        source: BudgetExceeded,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControllerState {
    Idle,
    Planning,
}

const IDLE: u8 = 0;
const PLANNING: u8 = 1;

#[derive(Debug)]
pub struct LoadFailure<LoadError> {
    pub resource: Resource,
    pub error: LoadError,
}

/// What happened during one pass.
#[derive(Debug)]
pub struct PassReport<LoadError> {
    /// The monitor's usage plus everything already in the index when the pass started.
    pub baseline_usage: u64,
    /// The monitor's usage plus everything in the index when the pass ended.
    pub final_usage: u64,
    /// The monitor's maximum less the configured reserve.
    pub max_bytes: u64,
    pub committed: Vec<CacheEntry>,
    pub failed: Vec<LoadFailure<LoadError>>,
    pub rejected: Vec<Rejection>,
    /// Planned resources which were never attempted because shutdown was requested.
    pub interrupted: Vec<Resource>,
}

impl<LoadError> PassReport<LoadError> {
    pub fn committed_bytes(&self) -> u64 {
        self.committed.iter().map(|e| e.size_bytes()).sum()
    }

    pub fn was_interrupted(&self) -> bool {
        !self.interrupted.is_empty()
    }
}

pub struct CacheController<
    MonitorImpl: MemoryMonitor,
    CatalogImpl: ResourceCatalog,
    PredictorImpl: UsagePredictor,
    LoaderImpl: ResourceLoader,
> {
    monitor: MonitorImpl,
    catalog: CatalogImpl,
    predictor: PredictorImpl,
    planner: AdmissionPlanner,
    committer: CacheCommitter<LoaderImpl>,
    config: CacheControllerConfig,
    index: Arc<Mutex<CacheIndex>>,
    /// Held for the duration of a pass.
    pass_guard: Mutex<()>,
    state: AtomicU8,
    shutdown_requested: AtomicBool,
}

/// Puts the state back to idle however the pass ends.
struct PlanningState<'a>(&'a AtomicU8);

impl<'a> PlanningState<'a> {
    fn enter(state: &'a AtomicU8) -> PlanningState<'a> {
        state.store(PLANNING, Ordering::Release);
        PlanningState(state)
    }
}

impl Drop for PlanningState<'_> {
    fn drop(&mut self) {
        self.0.store(IDLE, Ordering::Release);
    }
}

impl<MonitorImpl, CatalogImpl, PredictorImpl, LoaderImpl>
    CacheController<MonitorImpl, CatalogImpl, PredictorImpl, LoaderImpl>
where
    MonitorImpl: MemoryMonitor,
    CatalogImpl: ResourceCatalog,
    PredictorImpl: UsagePredictor,
    LoaderImpl: ResourceLoader,
{
    pub fn new(
        monitor: MonitorImpl,
        catalog: CatalogImpl,
        predictor: PredictorImpl,
        loader: LoaderImpl,
        config: CacheControllerConfig,
    ) -> Self {
        Self::with_shared_index(
            monitor,
            catalog,
            predictor,
            loader,
            config,
            Arc::new(Mutex::new(CacheIndex::new())),
        )
    }

    /// Build a controller which commits into an index owned elsewhere.
    pub fn with_shared_index(
        monitor: MonitorImpl,
        catalog: CatalogImpl,
        predictor: PredictorImpl,
        loader: LoaderImpl,
        config: CacheControllerConfig,
        index: Arc<Mutex<CacheIndex>>,
    ) -> Self {
        CacheController {
            monitor,
            catalog,
            predictor,
            planner: AdmissionPlanner::with_max_single_resource_bytes(
                config.max_single_resource_bytes,
            ),
            committer: CacheCommitter::new(loader),
            config,
            index,
            pass_guard: Mutex::new(()),
            state: AtomicU8::new(IDLE),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    pub fn index(&self) -> &Arc<Mutex<CacheIndex>> {
        &self.index
    }

    pub fn loader(&self) -> &LoaderImpl {
        self.committer.loader()
    }

    pub fn state(&self) -> ControllerState {
        match self.state.load(Ordering::Acquire) {
            PLANNING => ControllerState::Planning,
            _ => ControllerState::Idle,
        }
    }

    /// Ask the running pass, and any later one, to stop before the next commit.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
    }

    pub fn clear_shutdown(&self) {
        self.shutdown_requested.store(false, Ordering::Release);
    }

    fn read_budget(&self) -> Result<Budget, ControllerError> {
        let usage = self.monitor.current_usage().map_err(|source| {
            log::error!("Memory usage is unavailable: {}", source);
            ControllerError::ResourceUnavailable {
                what: Unavailable::MemoryUsage,
                source,
            }
        })?;
        let max = self
            .monitor
            .max_budget()
            .saturating_sub(self.config.reserve_bytes);
        Ok(Budget::new(usage, max))
    }

    fn read_candidates(&self) -> Result<Vec<(Resource, UsageScore)>, ControllerError> {
        let candidates = self.catalog.candidates().map_err(|source| {
            log::error!("Candidates are unavailable: {}", source);
            ControllerError::ResourceUnavailable {
                what: Unavailable::Candidates,
                source,
            }
        })?;

        Ok(candidates
            .into_iter()
            .map(|r| {
                let score = self.predictor.score(&r);
                (r, score)
            })
            .collect())
    }

    /// Run one admission pass.
    ///
    /// Individual load failures are recorded in the report and don't stop the pass.  Only an unavailable monitor or
    /// catalog, or a budget violation, returns an error.
    pub fn run_pass(&self) -> Result<PassReport<LoaderImpl::Error>, ControllerError> {
        let _pass: std::sync::MutexGuard<()> = self.pass_guard.lock().unwrap();
        let _state = PlanningState::enter(&self.state);

        let external = self.read_budget()?;
        let candidates = self.read_candidates()?;

        // Anything already cached is out, and what the index holds counts as used.
        let mut rejected = vec![];
        let (fresh, budget) = {
            let index = self.index.lock().unwrap();
            let mut fresh = vec![];
            for (resource, score) in candidates {
                if index.contains(resource.name()) {
                    rejected.push(Rejection {
                        resource,
                        reason: RejectionReason::AlreadyCached,
                    });
                } else {
                    fresh.push((resource, score));
                }
            }
            (fresh, external.with_usage(index.total_bytes()))
        };
        let baseline_usage = budget.current_usage();

        let plan = self.planner.plan(fresh, &budget);
        log::debug!(
            "Planned {} admissions, {} rejections, {} bytes projected",
            plan.admitted.len(),
            plan.rejected.len() + rejected.len(),
            plan.projected_usage
        );
        rejected.extend(plan.rejected);

        let mut committed = vec![];
        let mut failed = vec![];
        let mut interrupted = vec![];
        let mut planned = plan.admitted.into_iter();

        for resource in &mut planned {
            if self.shutdown_requested.load(Ordering::Acquire) {
                log::info!("Shutdown requested, stopping before {}", resource.name());
                interrupted.push(resource);
                break;
            }

            match self.committer.commit(&self.index, &external, &resource) {
                Ok(entry) => committed.push(entry),
                Err(CommitError::Load(error)) => {
                    log::warn!("Failed to load {}: {}", resource.name(), error);
                    failed.push(LoadFailure { resource, error });
                }
                Err(CommitError::AlreadyCached) => {
                    log::debug!("{} was cached earlier in this pass", resource.name());
                    rejected.push(Rejection {
                        resource,
                        reason: RejectionReason::AlreadyCached,
                    });
                }
                Err(CommitError::BudgetExceeded(source)) => {
                    log::error!("Refusing {}: {}", resource.name(), source);
                    return Err(ControllerError::BudgetViolation {
                        name: resource.name().to_string(),
                        source,
                    });
                }
            }
        }
        interrupted.extend(planned);

        let final_usage = external
            .with_usage(self.index.lock().unwrap().total_bytes())
            .current_usage();
        let report = PassReport {
            baseline_usage,
            final_usage,
            max_bytes: budget.max_bytes(),
            committed,
            failed,
            rejected,
            interrupted,
        };
        log::info!(
            "Admission pass done: {} committed, {} failed, {} rejected, {} of {} bytes in use",
            report.committed.len(),
            report.failed.len(),
            report.rejected.len(),
            report.final_usage,
            report.max_bytes
        );
        Ok(report)
    }
}
