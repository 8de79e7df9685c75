//! Hourly, time-gated triggering of posting runs.
//!
//! The loop fires once immediately and then once per interval. Each tick
//! checks the local hour in the configured timezone and skips the run during
//! quiet hours. Runs never overlap: the next tick is only awaited after the
//! current run has finished, and ticks missed while a run was in flight are
//! delayed rather than replayed in a burst.
//!
//! A run that panics is caught and logged; the loop keeps going until the
//! shutdown token is cancelled.

use crate::config::{AppConfig, QuietHours};
use crate::models::RunOutcome;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct Scheduler {
    timezone: Tz,
    quiet_hours: QuietHours,
    interval: Duration,
    clock: fn() -> DateTime<Utc>,
}

impl Scheduler {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            timezone: config.timezone,
            quiet_hours: config.quiet_hours,
            interval: config.interval,
            clock: Utc::now,
        }
    }

    /// Whether `now` falls inside the quiet window of the configured timezone.
    pub fn is_quiet(&self, now: DateTime<Utc>) -> bool {
        self.quiet_hours
            .contains(now.with_timezone(&self.timezone).hour())
    }

    /// Run `job` once unless `now` is inside quiet hours.
    pub async fn tick<F, Fut>(&self, now: DateTime<Utc>, job: F) -> RunOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RunOutcome>,
    {
        let local = now.with_timezone(&self.timezone);
        if self.is_quiet(now) {
            info!(
                local_time = %local.format("%H:%M"),
                resume_hour = (self.quiet_hours.end + 1) % 24,
                "Quiet hours; posting paused"
            );
            return RunOutcome::Skipped;
        }

        info!(local_time = %local.format("%Y-%m-%d %H:%M:%S"), "Starting run");
        match AssertUnwindSafe(job()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(%reason, "Run panicked; scheduler continues");
                RunOutcome::Aborted
            }
        }
    }

    /// Tick immediately and then every interval until `shutdown` is cancelled.
    ///
    /// A run in progress when shutdown is requested is allowed to finish.
    pub async fn run_loop<F, Fut>(&self, shutdown: CancellationToken, mut job: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RunOutcome>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), timezone = %self.timezone, "Scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let outcome = self.tick((self.clock)(), &mut job).await;
            info!(?outcome, "Tick finished");
        }

        info!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Orchestrator;
    use crate::pipeline::tests::{FakeExtractor, FakeFeeds, FakePublisher, candidates, sources};
    use crate::state::{FileStateStore, StateStore};
    use chrono::TimeZone;
    use std::cell::Cell;

    fn scheduler(interval: Duration) -> Scheduler {
        Scheduler {
            timezone: chrono_tz::Europe::Kyiv,
            quiet_hours: QuietHours::default(),
            interval,
            clock: || {
                chrono_tz::Europe::Kyiv
                    .with_ymd_and_hms(2025, 5, 6, 12, 0, 0)
                    .unwrap()
                    .with_timezone(&Utc)
            },
        }
    }

    fn kyiv(hour: u32) -> DateTime<Utc> {
        chrono_tz::Europe::Kyiv
            .with_ymd_and_hms(2025, 1, 15, hour, 30, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn quiet_hours_skip_the_job() {
        let sched = scheduler(Duration::from_secs(3600));
        for hour in 1..=7 {
            let ran = Cell::new(false);
            let outcome = sched
                .tick(kyiv(hour), || async {
                    ran.set(true);
                    RunOutcome::Exhausted
                })
                .await;
            assert_eq!(outcome, RunOutcome::Skipped, "hour {hour}");
            assert!(!ran.get(), "hour {hour}");
        }
    }

    #[tokio::test]
    async fn active_hours_run_the_job() {
        let sched = scheduler(Duration::from_secs(3600));
        for hour in [0, 8, 9, 13, 20, 23] {
            let outcome = sched.tick(kyiv(hour), || async { RunOutcome::Exhausted }).await;
            assert_eq!(outcome, RunOutcome::Exhausted, "hour {hour}");
        }
    }

    #[test]
    fn gate_uses_configured_timezone() {
        let sched = scheduler(Duration::from_secs(3600));
        // 23:30 UTC in January is 01:30 in Kyiv
        let utc = Utc.with_ymd_and_hms(2025, 1, 15, 23, 30, 0).unwrap();
        assert!(sched.is_quiet(utc));
        // 05:30 UTC in January is 07:30 in Kyiv, 06:30 UTC is 08:30
        assert!(sched.is_quiet(Utc.with_ymd_and_hms(2025, 1, 15, 5, 30, 0).unwrap()));
        assert!(!sched.is_quiet(Utc.with_ymd_and_hms(2025, 1, 15, 6, 30, 0).unwrap()));
    }

    #[tokio::test]
    async fn quiet_tick_touches_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path());
        let srcs = sources(&["a"]);
        let mut feeds = FakeFeeds::default();
        feeds.feeds.insert("a".into(), candidates(&["Storm warning"]));
        let extractor = FakeExtractor::default();
        let publisher = FakePublisher::default();
        let orchestrator = Orchestrator {
            sources: &srcs,
            fetcher: &feeds,
            extractor: &extractor,
            publisher: &publisher,
            store: store.clone(),
        };

        let sched = scheduler(Duration::from_secs(3600));
        let outcome = sched.tick(kyiv(4), || orchestrator.run()).await;

        assert_eq!(outcome, RunOutcome::Skipped);
        assert!(feeds.calls.borrow().is_empty());
        assert!(publisher.sent.borrow().is_empty());
        assert_eq!(store.read_rotation_index().await.unwrap(), None);

        let outcome = sched.tick(kyiv(10), || orchestrator.run()).await;
        assert!(matches!(outcome, RunOutcome::Posted { source_index: 0, .. }));
    }

    #[tokio::test]
    async fn panicking_run_does_not_stop_the_loop() {
        let sched = scheduler(Duration::from_millis(5));
        let shutdown = CancellationToken::new();
        let calls = Cell::new(0u32);

        sched
            .run_loop(shutdown.clone(), || {
                let n = calls.get() + 1;
                calls.set(n);
                let shutdown = shutdown.clone();
                async move {
                    if n == 1 {
                        panic!("feed exploded");
                    }
                    if n == 3 {
                        shutdown.cancel();
                    }
                    RunOutcome::Exhausted
                }
            })
            .await;

        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_run() {
        let sched = scheduler(Duration::from_secs(3600));
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let calls = Cell::new(0u32);

        sched
            .run_loop(shutdown, || {
                calls.set(calls.get() + 1);
                async { RunOutcome::Exhausted }
            })
            .await;

        assert_eq!(calls.get(), 0);
    }
}
