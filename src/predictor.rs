//! Scoring resources by how likely they are to be used often.
//!
//! [RuleTablePredictor] is the stock strategy: an ordered table of name patterns, each either deterministic or a
//! coin flip with a stated probability.  Anything implementing `Fn(&Resource) -> UsageScore` is also a predictor,
//! which is how tests swap in something deterministic.
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::*;

pub trait UsagePredictor: Send + Sync {
    /// Must be total: resources nothing knows about are [UsageScore::NotFrequentlyUsed].
    fn score(&self, resource: &Resource) -> UsageScore;
}

impl<F> UsagePredictor for F
where
    F: Fn(&Resource) -> UsageScore + Send + Sync,
{
    fn score(&self, resource: &Resource) -> UsageScore {
        self(resource)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Rule {
    Always,
    Never,
    /// Frequently used with this probability, drawn independently on every call.
    Probability(f64),
}

impl Rule {
    /// Probabilities are clamped to `[0, 1]`, and NaN never matches.
    fn sanitized(self) -> Rule {
        match self {
            Rule::Probability(p) if p.is_nan() => Rule::Never,
            Rule::Probability(p) => Rule::Probability(p.clamp(0.0, 1.0)),
            r => r,
        }
    }
}

#[derive(Debug)]
pub struct RuleTablePredictor {
    /// Checked in order; the first pattern contained in the name wins.
    rules: Vec<(String, Rule)>,
    default_rule: Rule,
    rng: Mutex<StdRng>,
}

impl RuleTablePredictor {
    /// An empty table: everything is not frequently used until rules are added.
    pub fn new(seed: u64) -> RuleTablePredictor {
        RuleTablePredictor {
            rules: vec![],
            default_rule: Rule::Never,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Textures are always frequently used, audio is frequently used 70% of the time, and nothing else is.
    pub fn standard(seed: u64) -> RuleTablePredictor {
        RuleTablePredictor::new(seed)
            .with_rule("Texture", Rule::Always)
            .with_rule("Audio", Rule::Probability(0.7))
    }

    /// Add a rule matching any name containing `pattern`.  Earlier rules take precedence.
    pub fn with_rule(mut self, pattern: impl Into<String>, rule: Rule) -> RuleTablePredictor {
        self.rules.push((pattern.into(), rule.sanitized()));
        self
    }

    pub fn with_default_rule(mut self, rule: Rule) -> RuleTablePredictor {
        self.default_rule = rule.sanitized();
        self
    }

    fn rule_for(&self, name: &str) -> Rule {
        self.rules
            .iter()
            .find(|(pattern, _)| name.contains(pattern.as_str()))
            .map(|(_, rule)| *rule)
            .unwrap_or(self.default_rule)
    }
}

impl UsagePredictor for RuleTablePredictor {
    fn score(&self, resource: &Resource) -> UsageScore {
        let frequent = match self.rule_for(resource.name()) {
            Rule::Always => true,
            Rule::Never => false,
            Rule::Probability(p) => self.rng.lock().unwrap().gen_bool(p),
        };
        frequent.into()
    }
}
