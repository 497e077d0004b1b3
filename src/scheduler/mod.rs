use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info};

use crate::config::Config;
use crate::domain::RunSummary;
use crate::errors::{NewsreelError, NewsreelResult};
use crate::parser::FeedParser;
use crate::services::{FetchService, RetentionService};
use crate::storage::traits::{ArticleRepository, FeedRepository};

/// Seam between the scheduler and the fetch orchestration, so scheduled
/// runs and manual triggers share one code path.
pub trait FetchRunner: Send + Sync {
    fn run_fetch(&self) -> NewsreelResult<RunSummary>;
}

pub trait CleanupRunner: Send + Sync {
    fn run_cleanup(&self, days_to_keep: u32) -> NewsreelResult<usize>;
}

impl<F, A, P> FetchRunner for FetchService<F, A, P>
where
    F: FeedRepository,
    A: ArticleRepository,
    P: FeedParser,
{
    fn run_fetch(&self) -> NewsreelResult<RunSummary> {
        self.fetch_all()
    }
}

impl<A: ArticleRepository> CleanupRunner for RetentionService<A> {
    fn run_cleanup(&self, days_to_keep: u32) -> NewsreelResult<usize> {
        self.cleanup(days_to_keep)
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub fetch_interval: StdDuration,
    pub cleanup_hour: u32,
    pub timezone: Tz,
    pub retention_days: u32,
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            enabled: config.scheduler_enabled,
            fetch_interval: StdDuration::from_secs(config.fetch_interval_secs),
            cleanup_hour: config.cleanup_hour,
            timezone: config.timezone,
            retention_days: config.retention_days,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub running: bool,
    pub fetch_job_armed: bool,
    pub cleanup_job_armed: bool,
    pub timezone: String,
    pub retention_days: u32,
}

struct Worker {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the two periodic jobs: a fetch loop on a fixed interval and a
/// cleanup loop firing daily at the configured local hour. Constructed once
/// at startup and passed by reference to anything that needs to trigger it.
pub struct Scheduler {
    fetch: Arc<dyn FetchRunner>,
    retention: Arc<dyn CleanupRunner>,
    config: SchedulerConfig,
    fetch_worker: Option<Worker>,
    cleanup_worker: Option<Worker>,
}

impl Scheduler {
    pub fn new(
        fetch: Arc<dyn FetchRunner>,
        retention: Arc<dyn CleanupRunner>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            fetch,
            retention,
            config,
            fetch_worker: None,
            cleanup_worker: None,
        }
    }

    pub fn start(&mut self) -> NewsreelResult<()> {
        if !self.config.enabled {
            return Err(NewsreelError::Scheduler(
                "scheduler is disabled by configuration".to_string(),
            ));
        }
        if self.fetch_worker.is_some() || self.cleanup_worker.is_some() {
            return Err(NewsreelError::Scheduler(
                "scheduler is already running".to_string(),
            ));
        }

        self.fetch_worker = Some(self.spawn_fetch_worker()?);
        self.cleanup_worker = Some(self.spawn_cleanup_worker()?);

        info!(
            interval_secs = self.config.fetch_interval.as_secs(),
            cleanup_hour = self.config.cleanup_hour,
            timezone = %self.config.timezone,
            "scheduler started"
        );
        Ok(())
    }

    fn spawn_fetch_worker(&self) -> NewsreelResult<Worker> {
        let fetch = Arc::clone(&self.fetch);
        let interval = self.config.fetch_interval;
        let (shutdown, rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("newsreel-fetch".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => match fetch.run_fetch() {
                        Ok(summary) => info!(
                            fetched = summary.total_fetched,
                            errors = summary.total_errors,
                            "scheduled fetch run complete"
                        ),
                        Err(e) => error!(error = %e, "scheduled fetch run failed"),
                    },
                    _ => break,
                }
            })?;

        Ok(Worker { shutdown, handle })
    }

    fn spawn_cleanup_worker(&self) -> NewsreelResult<Worker> {
        let retention = Arc::clone(&self.retention);
        let hour = self.config.cleanup_hour;
        let timezone = self.config.timezone;
        let days = self.config.retention_days;
        let (shutdown, rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("newsreel-cleanup".to_string())
            .spawn(move || loop {
                let wait = next_cleanup_delay(Utc::now(), hour, timezone);
                match rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => match retention.run_cleanup(days) {
                        Ok(deleted) => info!(deleted, "scheduled cleanup complete"),
                        Err(e) => error!(error = %e, "scheduled cleanup failed"),
                    },
                    _ => break,
                }
            })?;

        Ok(Worker { shutdown, handle })
    }

    /// Stop both jobs and wait for them to finish the iteration they are in.
    /// Safe to call when already stopped.
    pub fn stop(&mut self) {
        let workers: Vec<Worker> = [self.fetch_worker.take(), self.cleanup_worker.take()]
            .into_iter()
            .flatten()
            .collect();
        if workers.is_empty() {
            return;
        }

        for worker in workers {
            let _ = worker.shutdown.send(());
            let _ = worker.handle.join();
        }
        info!("scheduler stopped");
    }

    pub fn status(&self) -> SchedulerStatus {
        let armed = |worker: &Option<Worker>| {
            worker
                .as_ref()
                .map(|w| !w.handle.is_finished())
                .unwrap_or(false)
        };

        let fetch_job_armed = armed(&self.fetch_worker);
        let cleanup_job_armed = armed(&self.cleanup_worker);

        SchedulerStatus {
            running: fetch_job_armed || cleanup_job_armed,
            fetch_job_armed,
            cleanup_job_armed,
            timezone: self.config.timezone.name().to_string(),
            retention_days: self.config.retention_days,
        }
    }

    /// Run the fetch job body now, outside the schedule.
    pub fn trigger_fetch(&self) -> NewsreelResult<RunSummary> {
        self.fetch.run_fetch()
    }

    /// Run the cleanup job body now; `days` overrides the configured window.
    pub fn trigger_cleanup(&self, days: Option<u32>) -> NewsreelResult<usize> {
        self.retention
            .run_cleanup(days.unwrap_or(self.config.retention_days))
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Time until the next occurrence of `hour:00` in `timezone`.
fn next_cleanup_delay(now: DateTime<Utc>, hour: u32, timezone: Tz) -> StdDuration {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.with_timezone(&timezone).date_naive();

    for day_offset in 0..=1 {
        let naive = (today + Duration::days(day_offset)).and_time(time);
        let target = resolve_local(naive, timezone);
        if target > now {
            return (target - now).to_std().unwrap_or(StdDuration::ZERO);
        }
    }

    StdDuration::from_secs(24 * 3600)
}

/// Resolve a naive local datetime, taking the earlier side of DST overlaps
/// and treating nonexistent times (spring-forward gap) as UTC.
fn resolve_local(naive: NaiveDateTime, timezone: Tz) -> DateTime<Utc> {
    naive
        .and_local_timezone(timezone)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::from_naive_utc_and_offset(naive, Utc))
}
