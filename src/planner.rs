//! The [AdmissionPlanner] decides, for one pass, which candidates get committed and in what order.
//!
//! Only frequently used candidates are considered.  They are sorted smallest first, then walked against the budget
//! until the first one that doesn't fit, at which point the walk stops and nothing after it is admitted.
use crate::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RejectionReason {
    NotFrequentlyUsed,
    /// Larger than the configured single-resource limit.
    TooLarge,
    /// This candidate, or an earlier one in the walk, would have overflowed the budget.
    OverBudget,
    /// Already in the cache index.
    AlreadyCached,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rejection {
    pub resource: Resource,
    pub reason: RejectionReason,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AdmissionPlan {
    /// In the order they should be committed.
    pub admitted: Vec<Resource>,
    pub rejected: Vec<Rejection>,
    /// Usage once everything in `admitted` is committed.
    pub projected_usage: u64,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct AdmissionPlanner {
    max_single_resource_bytes: Option<u64>,
}

impl AdmissionPlanner {
    pub fn new() -> AdmissionPlanner {
        Default::default()
    }

    /// Refuse anything bigger than `limit`, regardless of headroom.
    pub fn with_max_single_resource_bytes(limit: Option<u64>) -> AdmissionPlanner {
        AdmissionPlanner {
            max_single_resource_bytes: limit,
        }
    }

    pub fn plan(
        &self,
        candidates: impl IntoIterator<Item = (Resource, UsageScore)>,
        budget: &Budget,
    ) -> AdmissionPlan {
        let mut rejected = vec![];
        let mut eligible = vec![];

        for (resource, score) in candidates {
            let reason = if !score.is_frequent() {
                Some(RejectionReason::NotFrequentlyUsed)
            } else if self
                .max_single_resource_bytes
                .map_or(false, |limit| resource.size_bytes() > limit)
            {
                Some(RejectionReason::TooLarge)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    log::debug!("Rejecting {}: {:?}", resource.name(), reason);
                    rejected.push(Rejection { resource, reason });
                }
                None => eligible.push(resource),
            }
        }

        // Stable, so equal sizes keep catalog order.
        eligible.sort_by_key(|r| r.size_bytes());

        let mut projected = *budget;
        let mut admitted = vec![];
        let mut walk = eligible.into_iter();
        for resource in &mut walk {
            if projected.charge(resource.size_bytes()).is_err() {
                log::debug!(
                    "Stopping at {}: {} bytes with {} of headroom",
                    resource.name(),
                    resource.size_bytes(),
                    projected.headroom()
                );
                rejected.push(Rejection {
                    resource,
                    reason: RejectionReason::OverBudget,
                });
                break;
            }
            admitted.push(resource);
        }
        rejected.extend(walk.map(|resource| Rejection {
            resource,
            reason: RejectionReason::OverBudget,
        }));

        AdmissionPlan {
            admitted,
            rejected,
            projected_usage: projected.current_usage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    fn frequent(name: &str, size: u64) -> (Resource, UsageScore) {
        (Resource::new(name, size), UsageScore::FrequentlyUsed)
    }

    fn names(resources: &[Resource]) -> Vec<&str> {
        resources.iter().map(|r| r.name()).collect()
    }

    #[test]
    fn test_mixed_candidates() {
        let candidates = vec![
            frequent("A", 512 * KB),
            frequent("B", MB),
            (Resource::new("C", MB), UsageScore::NotFrequentlyUsed),
            frequent("D", 2 * MB),
        ];
        let plan = AdmissionPlanner::new().plan(candidates, &Budget::new(10 * MB, 100 * MB));

        assert_eq!(names(&plan.admitted), vec!["A", "B", "D"]);
        assert_eq!(plan.projected_usage, 10 * MB + 3 * MB + 512 * KB);
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.rejected[0].resource.name(), "C");
        assert_eq!(plan.rejected[0].reason, RejectionReason::NotFrequentlyUsed);
    }

    #[test]
    fn test_single_oversized() {
        let plan = AdmissionPlanner::new()
            .plan(vec![frequent("big", 2 * MB)], &Budget::new(99 * MB, 100 * MB));
        assert!(plan.admitted.is_empty());
        assert_eq!(plan.projected_usage, 99 * MB);
        assert_eq!(plan.rejected[0].reason, RejectionReason::OverBudget);
    }

    #[test]
    fn test_no_candidates() {
        let plan = AdmissionPlanner::new().plan(Vec::new(), &Budget::new(5, 10));
        assert_eq!(
            plan,
            AdmissionPlan {
                projected_usage: 5,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_stops_at_first_overflow() {
        // Headroom 10: a, b and c fit, leaving 1, so the walk stops at d.
        let candidates = vec![
            frequent("d", 4),
            frequent("e", 5),
            frequent("a", 3),
            frequent("b", 3),
            frequent("c", 3),
        ];
        let plan = AdmissionPlanner::new().plan(candidates, &Budget::new(0, 10));
        assert_eq!(names(&plan.admitted), vec!["a", "b", "c"]);
        let rejected = plan
            .rejected
            .iter()
            .map(|r| (r.resource.name(), r.reason))
            .collect::<Vec<_>>();
        assert_eq!(
            rejected,
            vec![
                ("d", RejectionReason::OverBudget),
                ("e", RejectionReason::OverBudget)
            ]
        );
    }

    #[test]
    fn test_ties_keep_catalog_order_and_duplicates() {
        let candidates = vec![frequent("x", 2), frequent("y", 1), frequent("x", 1)];
        let plan = AdmissionPlanner::new().plan(candidates, &Budget::new(0, 100));
        let admitted = plan
            .admitted
            .iter()
            .map(|r| (r.name(), r.size_bytes()))
            .collect::<Vec<_>>();
        assert_eq!(admitted, vec![("y", 1), ("x", 1), ("x", 2)]);
    }

    #[test]
    fn test_single_resource_limit() {
        let candidates = vec![frequent("small", 1), frequent("large", 50)];
        let plan = AdmissionPlanner::with_max_single_resource_bytes(Some(10))
            .plan(candidates, &Budget::new(0, 100));
        assert_eq!(names(&plan.admitted), vec!["small"]);
        assert_eq!(plan.rejected[0].reason, RejectionReason::TooLarge);
    }

    fn candidate_strat() -> impl Strategy<Value = Vec<(Resource, UsageScore)>> {
        prop::collection::vec((0..50u64, 0..200u64, any::<bool>()), 0..40).prop_map(|v| {
            v.into_iter()
                .map(|(n, size, freq)| (Resource::new(format!("r{}", n), size), UsageScore::from(freq)))
                .collect::<Vec<_>>()
        })
    }

    proptest! {
        #[test]
        fn test_plan_invariants(
            candidates in candidate_strat(),
            baseline in 0..500u64,
            max in 0..1000u64,
        ) {
            let plan = AdmissionPlanner::new().plan(candidates.clone(), &Budget::new(baseline, max));

            // Everything is accounted for exactly once.
            prop_assert_eq!(plan.admitted.len() + plan.rejected.len(), candidates.len());

            // Within budget.
            let admitted_bytes: u64 = plan.admitted.iter().map(|r| r.size_bytes()).sum();
            prop_assert_eq!(plan.projected_usage, baseline + admitted_bytes);
            if !plan.admitted.is_empty() {
                prop_assert!(plan.projected_usage <= max);
            }

            // Ascending by size.
            for pair in plan.admitted.windows(2) {
                prop_assert!(pair[0].size_bytes() <= pair[1].size_bytes());
            }

            // No budget rejection is smaller than an admitted resource, so nothing skipped ahead.
            let largest_admitted = plan.admitted.iter().map(|r| r.size_bytes()).max();
            for rejection in &plan.rejected {
                match rejection.reason {
                    RejectionReason::OverBudget => {
                        if let Some(largest) = largest_admitted {
                            prop_assert!(rejection.resource.size_bytes() >= largest);
                        }
                    }
                    RejectionReason::NotFrequentlyUsed => {}
                    RejectionReason::TooLarge | RejectionReason::AlreadyCached => {
                        prop_assert!(false, "unexpected {:?}", rejection.reason)
                    }
                }
            }

            // Not frequently used never gets in.
            let infrequent = candidates.iter().filter(|(_, s)| !s.is_frequent()).count();
            let rejected_infrequent = plan
                .rejected
                .iter()
                .filter(|r| r.reason == RejectionReason::NotFrequentlyUsed)
                .count();
            prop_assert_eq!(infrequent, rejected_infrequent);
        }
    }
}
