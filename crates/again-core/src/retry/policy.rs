use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::classify::ClassificationLists;
use super::error::{ConfigError, ParseModeError};

/// Formula family used to compute the wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffMode {
    /// Always wait `multiplier` seconds.
    #[default]
    Fixed,
    /// Wait `multiplier * attempt` seconds.
    Linear,
    /// Wait `multiplier ^ attempt` seconds.
    Exponential,
}

impl fmt::Display for BackoffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackoffMode::Fixed => "Fixed",
            BackoffMode::Linear => "Linear",
            BackoffMode::Exponential => "Exponential",
        };
        f.write_str(s)
    }
}

impl FromStr for BackoffMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(BackoffMode::Fixed),
            "linear" => Ok(BackoffMode::Linear),
            "exponential" => Ok(BackoffMode::Exponential),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Smallest base that makes exponential backoff actually grow.
pub const MIN_EXPONENTIAL_MULTIPLIER: u32 = 2;

/// Wait time in whole seconds for a 1-based `attempt`.
///
/// Saturates at `u64::MAX` instead of wrapping.
pub fn compute_delay(mode: BackoffMode, multiplier: u32, attempt: u32) -> u64 {
    let multiplier = u64::from(multiplier);
    match mode {
        BackoffMode::Fixed => multiplier,
        BackoffMode::Linear => multiplier.saturating_mul(u64::from(attempt)),
        BackoffMode::Exponential => multiplier.saturating_pow(attempt),
    }
}

/// Everything one retry loop needs to know about how to behave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub mode: BackoffMode,
    /// Fixed wait, linear increment or exponential base, depending on `mode`.
    pub multiplier: u32,
    /// Retries allowed after the first attempt.
    pub max_retry: u32,
    pub lists: ClassificationLists,
    /// Optional prefix for every wait message.
    pub message: Option<String>,
    /// Report loop decisions (recovered, stopped, exhausted) as warnings
    /// instead of verbose lines. Retry waits are always warnings.
    pub warning: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            mode: BackoffMode::Fixed,
            multiplier: 2,
            max_retry: 5,
            lists: ClassificationLists::default(),
            message: None,
            warning: false,
        }
    }
}

impl RetryPolicy {
    /// Reject configurations that can never behave as asked. Checked once,
    /// before the first attempt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == BackoffMode::Exponential
            && self.multiplier < MIN_EXPONENTIAL_MULTIPLIER
        {
            return Err(ConfigError::MultiplierTooSmall {
                multiplier: self.multiplier,
            });
        }
        Ok(())
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_secs(compute_delay(self.mode, self.multiplier, attempt))
    }

    /// Delays applied after attempts `1..=max_retry` when every attempt fails.
    /// Lazy: `max_retry` may be as large as `u32::MAX`.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_retry).map(|a| self.delay_for(a))
    }

    /// Sum of [`schedule`](Self::schedule) in seconds, saturating at `u64::MAX`.
    /// Closed form, so it never walks the whole budget.
    pub fn total_delay_secs(&self) -> u64 {
        let m = u128::from(self.multiplier);
        let n = u128::from(self.max_retry);
        let total = match self.mode {
            BackoffMode::Fixed => m * n,
            BackoffMode::Linear => m * (n * (n + 1) / 2),
            // 0^a and 1^a are constant.
            BackoffMode::Exponential if self.multiplier < 2 => m * n,
            BackoffMode::Exponential => {
                let mut acc = 0u64;
                for attempt in 1..=self.max_retry {
                    acc = acc.saturating_add(compute_delay(self.mode, self.multiplier, attempt));
                    if acc == u64::MAX {
                        break;
                    }
                }
                u128::from(acc)
            }
        };
        u64::try_from(total).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ignores_attempt() {
        for attempt in 1..=10 {
            assert_eq!(compute_delay(BackoffMode::Fixed, 7, attempt), 7);
        }
    }

    #[test]
    fn linear_scales_with_attempt() {
        assert_eq!(compute_delay(BackoffMode::Linear, 5, 1), 5);
        assert_eq!(compute_delay(BackoffMode::Linear, 5, 2), 10);
        assert_eq!(compute_delay(BackoffMode::Linear, 3, 7), 21);
    }

    #[test]
    fn exponential_is_integer_power() {
        let got: Vec<u64> = (1..=6)
            .map(|a| compute_delay(BackoffMode::Exponential, 2, a))
            .collect();
        assert_eq!(got, vec![2, 4, 8, 16, 32, 64]);
        assert_eq!(compute_delay(BackoffMode::Exponential, 3, 4), 81);
    }

    #[test]
    fn huge_attempt_saturates() {
        assert_eq!(compute_delay(BackoffMode::Exponential, 10, 200), u64::MAX);
        assert_eq!(
            compute_delay(BackoffMode::Linear, u32::MAX, u32::MAX),
            u64::from(u32::MAX) * u64::from(u32::MAX)
        );
    }

    #[test]
    fn exponential_rejects_small_multiplier() {
        for multiplier in [0, 1] {
            let p = RetryPolicy {
                mode: BackoffMode::Exponential,
                multiplier,
                ..RetryPolicy::default()
            };
            assert_eq!(
                p.validate(),
                Err(ConfigError::MultiplierTooSmall { multiplier })
            );
        }
    }

    #[test]
    fn small_multiplier_fine_for_other_modes() {
        let mut p = RetryPolicy {
            multiplier: 0,
            ..RetryPolicy::default()
        };
        assert!(p.validate().is_ok());
        p.mode = BackoffMode::Linear;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn schedule_lists_one_delay_per_retry() {
        let p = RetryPolicy {
            mode: BackoffMode::Linear,
            multiplier: 5,
            max_retry: 3,
            ..RetryPolicy::default()
        };
        assert_eq!(
            p.schedule().collect::<Vec<_>>(),
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(15)
            ]
        );
        assert_eq!(p.total_delay_secs(), 30);
    }

    #[test]
    fn schedule_is_lazy_for_huge_budgets() {
        let p = RetryPolicy {
            max_retry: u32::MAX,
            ..RetryPolicy::default()
        };
        let mut it = p.schedule();
        assert_eq!(it.next(), Some(Duration::from_secs(2)));
        assert_eq!(it.size_hint().0, u32::MAX as usize - 1);
        assert_eq!(p.total_delay_secs(), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn total_delay_matches_schedule_sum_and_saturates() {
        for mode in [BackoffMode::Fixed, BackoffMode::Linear, BackoffMode::Exponential] {
            let p = RetryPolicy {
                mode,
                multiplier: 3,
                max_retry: 6,
                ..RetryPolicy::default()
            };
            let summed: u64 = p.schedule().map(|d| d.as_secs()).sum();
            assert_eq!(p.total_delay_secs(), summed, "{mode}");
        }
        let p = RetryPolicy {
            mode: BackoffMode::Exponential,
            multiplier: 10,
            max_retry: u32::MAX,
            ..RetryPolicy::default()
        };
        assert_eq!(p.total_delay_secs(), u64::MAX);
        let p = RetryPolicy {
            mode: BackoffMode::Linear,
            multiplier: u32::MAX,
            max_retry: u32::MAX,
            ..RetryPolicy::default()
        };
        assert_eq!(p.total_delay_secs(), u64::MAX);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Linear".parse::<BackoffMode>().unwrap(), BackoffMode::Linear);
        assert_eq!(
            "EXPONENTIAL".parse::<BackoffMode>().unwrap(),
            BackoffMode::Exponential
        );
        assert!("quadratic".parse::<BackoffMode>().is_err());
    }
}
