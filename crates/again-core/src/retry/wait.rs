//! Wait step: announce the backoff, then block for it.

use std::fmt;
use std::time::Duration;

use super::policy::BackoffMode;

/// Output channels for retry decisions. Advisory only.
pub trait RetrySink {
    fn warn(&mut self, message: &str);
    fn verbose(&mut self, message: &str);
}

impl<T: RetrySink + ?Sized> RetrySink for &mut T {
    fn warn(&mut self, message: &str) {
        (**self).warn(message)
    }

    fn verbose(&mut self, message: &str) {
        (**self).verbose(message)
    }
}

/// Default sink: warnings at `warn`, verbose lines at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RetrySink for TracingSink {
    fn warn(&mut self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn verbose(&mut self, message: &str) {
        tracing::debug!("{}", message);
    }
}

/// Blocks the calling thread for a backoff delay.
pub trait Sleeper {
    fn sleep(&mut self, delay: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for &mut T {
    fn sleep(&mut self, delay: Duration) {
        (**self).sleep(delay)
    }
}

/// Real wall-clock sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Human-readable description of one pending wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitNotice<'a> {
    /// Caller context placed before the backoff description.
    pub prefix: Option<&'a str>,
    pub mode: BackoffMode,
    pub attempt: u32,
    pub delay: Duration,
}

impl fmt::Display for WaitNotice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.prefix.map(str::trim).filter(|p| !p.is_empty()) {
            write!(f, "{} ", prefix)?;
        }
        write!(
            f,
            "{} backoff: attempt {}, waiting {}s",
            self.mode,
            self.attempt,
            self.delay.as_secs()
        )
    }
}

/// Emit the notice on the selected channel, then block for `notice.delay`.
/// A zero delay still emits the notice.
pub fn apply_delay<S, Z>(notice: &WaitNotice<'_>, warning: bool, sink: &mut S, sleeper: &mut Z)
where
    S: RetrySink + ?Sized,
    Z: Sleeper + ?Sized,
{
    let message = notice.to_string();
    if warning {
        sink.warn(&message);
    } else {
        sink.verbose(&message);
    }
    sleeper.sleep(notice.delay);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Lines {
        warn: Vec<String>,
        verbose: Vec<String>,
    }

    impl RetrySink for Lines {
        fn warn(&mut self, message: &str) {
            self.warn.push(message.to_string());
        }

        fn verbose(&mut self, message: &str) {
            self.verbose.push(message.to_string());
        }
    }

    #[derive(Default)]
    struct Slept(Vec<Duration>);

    impl Sleeper for Slept {
        fn sleep(&mut self, delay: Duration) {
            self.0.push(delay);
        }
    }

    fn notice(prefix: Option<&str>, delay: u64) -> WaitNotice<'_> {
        WaitNotice {
            prefix,
            mode: BackoffMode::Linear,
            attempt: 2,
            delay: Duration::from_secs(delay),
        }
    }

    #[test]
    fn notice_formats_mode_attempt_and_wait() {
        assert_eq!(
            notice(None, 10).to_string(),
            "Linear backoff: attempt 2, waiting 10s"
        );
        assert_eq!(
            notice(Some("nightly sync:"), 10).to_string(),
            "nightly sync: Linear backoff: attempt 2, waiting 10s"
        );
        assert_eq!(
            notice(Some("   "), 1).to_string(),
            "Linear backoff: attempt 2, waiting 1s"
        );
    }

    #[test]
    fn warning_flag_selects_channel() {
        let mut lines = Lines::default();
        let mut slept = Slept::default();
        apply_delay(&notice(None, 3), true, &mut lines, &mut slept);
        apply_delay(&notice(None, 4), false, &mut lines, &mut slept);
        assert_eq!(lines.warn.len(), 1);
        assert_eq!(lines.verbose.len(), 1);
        assert!(lines.warn[0].contains("waiting 3s"));
        assert!(lines.verbose[0].contains("waiting 4s"));
        assert_eq!(slept.0, vec![Duration::from_secs(3), Duration::from_secs(4)]);
    }

    #[test]
    fn zero_delay_still_announced() {
        let mut lines = Lines::default();
        let mut slept = Slept::default();
        apply_delay(&notice(None, 0), false, &mut lines, &mut slept);
        assert_eq!(lines.verbose, vec!["Linear backoff: attempt 2, waiting 0s"]);
        assert_eq!(slept.0, vec![Duration::ZERO]);
    }

    #[test]
    fn thread_sleeper_blocks_for_the_delay() {
        let start = std::time::Instant::now();
        ThreadSleeper.sleep(Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
