//! Versioned Probe Runner
//!
//! Evaluates an ordered list of (release range, action) strategies against
//! the running release. Strategies are tried strictly in the order given,
//! which by convention is newest release first:
//!
//! - a strategy whose range excludes the release is skipped without running;
//! - the first strategy that succeeds ends the run;
//! - a failing strategy is recorded and the run continues.
//!
//! Running out of strategies yields absence, not an error: a facility that
//! doesn't exist on this release is an expected outcome.

use std::fmt;

use tracing::debug;
use xplugin_host::HostValue;

use crate::error::ProbeError;

/// Inclusive release range, either bound may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReleaseRange {
    low: Option<u32>,
    high: Option<u32>,
}

impl ReleaseRange {
    /// Every release
    pub const ANY: Self = Self {
        low: None,
        high: None,
    };

    /// `[low, high]`
    pub const fn between(low: u32, high: u32) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }

    /// `[low, ~]`
    pub const fn at_least(low: u32) -> Self {
        Self {
            low: Some(low),
            high: None,
        }
    }

    /// `[~, high]`
    pub const fn up_to(high: u32) -> Self {
        Self {
            low: None,
            high: Some(high),
        }
    }

    /// Check if `release` lies within the range
    pub fn contains(&self, release: u32) -> bool {
        self.low.map_or(true, |low| release >= low) && self.high.map_or(true, |high| release <= high)
    }
}

impl fmt::Display for ReleaseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.low {
            Some(low) => write!(f, "[{}, ", low)?,
            None => f.write_str("[~, ")?,
        }
        match self.high {
            Some(high) => write!(f, "{}]", high),
            None => f.write_str("~]"),
        }
    }
}

type Action<'a, T> = Box<dyn FnOnce() -> Result<T, ProbeError> + 'a>;

/// One release-specific way of producing a value
pub struct ProbeStrategy<'a, T = HostValue> {
    label: String,
    range: ReleaseRange,
    action: Action<'a, T>,
}

impl<'a, T> ProbeStrategy<'a, T> {
    /// Create a strategy
    pub fn new(
        label: impl Into<String>,
        range: ReleaseRange,
        action: impl FnOnce() -> Result<T, ProbeError> + 'a,
    ) -> Self {
        Self {
            label: label.into(),
            range,
            action: Box::new(action),
        }
    }

    /// Strategy label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Release range the strategy applies to
    pub fn range(&self) -> ReleaseRange {
        self.range
    }
}

impl<T> fmt::Debug for ProbeStrategy<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeStrategy")
            .field("label", &self.label)
            .field("range", &self.range)
            .finish()
    }
}

/// A strategy that ran and failed
#[derive(Debug, Clone)]
pub struct ProbeFailure {
    /// Strategy label
    pub label: String,
    /// Why it failed
    pub error: ProbeError,
}

/// Result of a probe run
#[derive(Debug)]
pub struct ProbeOutcome<T> {
    /// Value of the winning strategy
    pub value: Option<T>,
    /// Label of the winning strategy
    pub winner: Option<String>,
    /// Strategies skipped because their range excludes the release
    pub skipped: Vec<String>,
    /// Strategies that ran and failed, in order
    pub failures: Vec<ProbeFailure>,
}

impl<T> ProbeOutcome<T> {
    /// Take the value, discarding the report
    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

/// Runs strategy lists against one release
#[derive(Debug, Clone, Copy)]
pub struct ProbeRunner {
    release: u32,
}

impl ProbeRunner {
    /// Create a runner for `release`
    pub fn new(release: u32) -> Self {
        Self { release }
    }

    /// Release this runner filters against
    pub fn release(&self) -> u32 {
        self.release
    }

    /// Try strategies in order until one succeeds
    pub fn run<T>(&self, strategies: Vec<ProbeStrategy<'_, T>>) -> ProbeOutcome<T> {
        let mut outcome = ProbeOutcome {
            value: None,
            winner: None,
            skipped: Vec::new(),
            failures: Vec::new(),
        };

        for strategy in strategies {
            if !strategy.range.contains(self.release) {
                debug!(
                    strategy = %strategy.label,
                    range = %strategy.range,
                    release = self.release,
                    "strategy skipped"
                );
                outcome.skipped.push(strategy.label);
                continue;
            }

            match (strategy.action)() {
                Ok(value) => {
                    debug!(strategy = %strategy.label, release = self.release, "strategy succeeded");
                    outcome.value = Some(value);
                    outcome.winner = Some(strategy.label);
                    return outcome;
                }
                Err(error) => {
                    debug!(strategy = %strategy.label, error = %error, "strategy failed");
                    outcome.failures.push(ProbeFailure {
                        label: strategy.label,
                        error,
                    });
                }
            }
        }

        outcome
    }

    /// Resolve an internal singleton; a null result counts as a failure
    pub fn resolve_singleton(&self, strategies: Vec<ProbeStrategy<'_>>) -> Option<HostValue> {
        let strategies = strategies
            .into_iter()
            .map(|s| ProbeStrategy {
                action: reject_null(s.label.clone(), s.action),
                label: s.label,
                range: s.range,
            })
            .collect();
        self.run(strategies).into_value()
    }
}

fn reject_null<'a>(label: String, action: Action<'a, HostValue>) -> Action<'a, HostValue> {
    Box::new(move || match action() {
        Ok(value) if value.is_null() => Err(ProbeError::Absent(label)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LookupError, LookupReason};
    use std::cell::Cell;

    fn not_found(label: &str) -> ProbeError {
        ProbeError::Lookup(LookupError::new(LookupReason::NotFound, label))
    }

    #[test]
    fn test_range_contains() {
        assert!(ReleaseRange::between(26, 28).contains(26));
        assert!(ReleaseRange::between(26, 28).contains(28));
        assert!(!ReleaseRange::between(26, 28).contains(29));
        assert!(ReleaseRange::at_least(29).contains(35));
        assert!(!ReleaseRange::at_least(29).contains(28));
        assert!(ReleaseRange::up_to(25).contains(1));
        assert!(ReleaseRange::ANY.contains(0));
        assert_eq!(ReleaseRange::at_least(29).to_string(), "[29, ~]");
    }

    #[test]
    fn test_skip_out_of_range_and_short_circuit() {
        let s1_runs = Cell::new(0);
        let s2_runs = Cell::new(0);
        let s3_runs = Cell::new(0);

        let strategies = vec![
            ProbeStrategy::new("s1", ReleaseRange::at_least(29), || {
                s1_runs.set(s1_runs.get() + 1);
                Err(not_found("s1"))
            }),
            ProbeStrategy::new("s2", ReleaseRange::between(26, 28), || {
                s2_runs.set(s2_runs.get() + 1);
                Ok(HostValue::Int(2))
            }),
            ProbeStrategy::new("s3", ReleaseRange::between(19, 25), || {
                s3_runs.set(s3_runs.get() + 1);
                Ok(HostValue::Int(3))
            }),
        ];

        let outcome = ProbeRunner::new(27).run(strategies);
        assert_eq!(outcome.value, Some(HostValue::Int(2)));
        assert_eq!(outcome.winner.as_deref(), Some("s2"));
        assert_eq!(outcome.skipped, vec!["s1".to_string()]);
        assert_eq!((s1_runs.get(), s2_runs.get(), s3_runs.get()), (0, 1, 0));
    }

    #[test]
    fn test_failures_recorded_and_fall_through() {
        let strategies = vec![
            ProbeStrategy::new("newest", ReleaseRange::ANY, || Err(not_found("newest"))),
            ProbeStrategy::new("older", ReleaseRange::ANY, || Ok("found".to_string())),
        ];
        let outcome = ProbeRunner::new(30).run(strategies);
        assert_eq!(outcome.value.as_deref(), Some("found"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].label, "newest");
    }

    #[test]
    fn test_all_fail_or_none_match_is_absence() {
        let failing: Vec<ProbeStrategy<'_>> = vec![
            ProbeStrategy::new("a", ReleaseRange::ANY, || Err(not_found("a"))),
            ProbeStrategy::new("b", ReleaseRange::ANY, || Err(not_found("b"))),
        ];
        assert_eq!(ProbeRunner::new(27).resolve_singleton(failing), None);

        let none_match: Vec<ProbeStrategy<'_>> = vec![ProbeStrategy::new(
            "future",
            ReleaseRange::at_least(40),
            || Ok(HostValue::Int(1)),
        )];
        assert_eq!(ProbeRunner::new(27).resolve_singleton(none_match), None);

        assert_eq!(ProbeRunner::new(27).resolve_singleton(Vec::new()), None);
    }

    #[test]
    fn test_null_singleton_falls_through() {
        let strategies = vec![
            ProbeStrategy::new("null", ReleaseRange::ANY, || Ok(HostValue::Null)),
            ProbeStrategy::new("real", ReleaseRange::ANY, || Ok(HostValue::Int(9))),
        ];
        assert_eq!(ProbeRunner::new(21).resolve_singleton(strategies), Some(HostValue::Int(9)));
    }
}
