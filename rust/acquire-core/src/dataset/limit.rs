// rust/acquire-core/src/dataset/limit.rs

//! Truncation policy for test runs.

use crate::config::{LimitConfig, RunMode};
use crate::error::{AcquireError, Result};

/// Corpus size assumed when converting a percentage into a record count.
/// Streaming sources do not know their size up front, so `percent` limits are
/// an approximation against this fixed figure, kept for compatibility with
/// earlier runs.
pub const ASSUMED_CORPUS_SIZE: u64 = 10_000;

/// How many records a test run admits from a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LimitSpec {
    #[default]
    None,
    Rows(u64),
    Percent(f64),
}

impl LimitSpec {
    /// Record cap for this spec under `mode`, or `None` for pass-through.
    pub fn cap(&self, mode: RunMode) -> Option<u64> {
        if mode == RunMode::Full {
            return None;
        }
        match *self {
            LimitSpec::None => None,
            LimitSpec::Rows(n) => Some(n),
            LimitSpec::Percent(p) => Some((ASSUMED_CORPUS_SIZE as f64 * p / 100.0).floor() as u64),
        }
    }
}

impl TryFrom<&LimitConfig> for LimitSpec {
    type Error = AcquireError;

    fn try_from(raw: &LimitConfig) -> Result<Self> {
        let positive_value = || -> Result<f64> {
            match raw.value {
                Some(v) if v.is_finite() && v > 0.0 => Ok(v),
                Some(v) => Err(AcquireError::config(format!(
                    "test_limit value must be positive for type '{}', got {v}",
                    raw.kind
                ))),
                None => Err(AcquireError::config(format!(
                    "test_limit value is required for type '{}'",
                    raw.kind
                ))),
            }
        };

        match raw.kind.as_str() {
            "none" => Ok(LimitSpec::None),
            "rows" => {
                let value = positive_value()?;
                if value.fract() != 0.0 {
                    return Err(AcquireError::config(format!(
                        "test_limit rows value must be a whole number, got {value}"
                    )));
                }
                Ok(LimitSpec::Rows(value as u64))
            }
            "percent" => Ok(LimitSpec::Percent(positive_value()?)),
            other => Err(AcquireError::config(format!("unknown limit type: '{other}'"))),
        }
    }
}

/// Resolve an optional raw limit block; a missing block means no truncation.
pub fn resolve_limit(raw: Option<&LimitConfig>) -> Result<LimitSpec> {
    raw.map_or(Ok(LimitSpec::None), LimitSpec::try_from)
}

/// Lazily admit records from `source` according to `spec` and `mode`.
///
/// Full mode always streams everything, whatever limit is configured.
pub fn apply_limit<I: Iterator>(source: I, spec: &LimitSpec, mode: RunMode) -> std::iter::Take<I> {
    let cap = spec
        .cap(mode)
        .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
    source.take(cap)
}
