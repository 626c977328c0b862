//! CriticalPathRefresher - background task keeping critical-path flags current.
//!
//! Periodically recomputes the critical path of every active job and saves
//! the jobs whose flags changed. A job modified concurrently is skipped and
//! picked up on the next pass.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::analysis::CriticalSequenceManager;
use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode};
use crate::ports::{Clock, EventPublisher, JobFilter, JobRepository};

use crate::application::handlers::job::publish_job_events;

#[derive(Debug, Clone)]
pub struct CriticalPathRefresherConfig {
    pub interval: StdDuration,
}

impl Default for CriticalPathRefresherConfig {
    fn default() -> Self {
        Self {
            interval: StdDuration::from_secs(3600),
        }
    }
}

impl CriticalPathRefresherConfig {
    pub fn with_interval(mut self, interval: StdDuration) -> Self {
        self.interval = interval;
        self
    }
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub examined: usize,
    pub updated: usize,
    pub skipped_conflicts: usize,
}

pub struct CriticalPathRefresher {
    job_repository: Arc<dyn JobRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    manager: CriticalSequenceManager,
    metadata: CommandMetadata,
    config: CriticalPathRefresherConfig,
}

impl CriticalPathRefresher {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        metadata: CommandMetadata,
    ) -> Self {
        Self {
            job_repository,
            event_publisher,
            clock,
            manager: CriticalSequenceManager::default(),
            metadata,
            config: CriticalPathRefresherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CriticalPathRefresherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_manager(mut self, manager: CriticalSequenceManager) -> Self {
        self.manager = manager;
        self
    }

    /// Runs refresh passes until the shutdown flag turns true.
    ///
    /// The first pass runs immediately. A failed pass is logged and retried
    /// on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("critical path refresher stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    match self.refresh_once().await {
                        Ok(summary) => tracing::debug!(
                            examined = summary.examined,
                            updated = summary.updated,
                            skipped = summary.skipped_conflicts,
                            "critical paths refreshed"
                        ),
                        Err(e) => tracing::warn!(error = %e, "critical path refresh failed"),
                    }
                }
            }
        }
    }

    /// One pass over the active jobs.
    pub async fn refresh_once(&self) -> Result<RefreshSummary, DomainError> {
        let now = self.clock.now();
        let jobs = self
            .job_repository
            .find_by_filters(&JobFilter::active())
            .await?;
        let mut summary = RefreshSummary {
            examined: jobs.len(),
            ..RefreshSummary::default()
        };

        for mut job in jobs {
            let report = self.manager.critical_path(&job);
            if !job.apply_critical_path(&report.critical_task_ids, now)? {
                continue;
            }
            let events = job.take_events();
            match self.job_repository.save_job(job).await {
                Ok(_) => {
                    publish_job_events(self.event_publisher.as_ref(), events, &self.metadata)
                        .await?;
                    summary.updated += 1;
                }
                Err(e) if e.code == ErrorCode::ConcurrencyConflict => {
                    tracing::debug!(error = %e, "job changed during refresh, skipping");
                    summary.skipped_conflicts += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::job::test_support::{new_job, routing, Fixture};
    use crate::application::handlers::job::{CreateJobCommand, CreateJobHandler};
    use crate::domain::foundation::{JobStatus, MachineId};
    use crate::domain::job::Job;

    async fn seeded(fx: &Fixture, number: &str) -> Job {
        CreateJobHandler::new(fx.repo.clone(), fx.bus.clone(), fx.clock.clone())
            .handle(
                CreateJobCommand {
                    job: new_job(number),
                    tasks: routing(MachineId::new(), &[10, 20, 30]),
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap()
    }

    fn refresher(fx: &Fixture) -> CriticalPathRefresher {
        CriticalPathRefresher::new(
            fx.repo.clone(),
            fx.bus.clone(),
            fx.clock.clone(),
            CommandMetadata::test_fixture().with_source("refresher"),
        )
    }

    #[tokio::test]
    async fn flags_critical_tasks_once() {
        let fx = Fixture::new();
        let job = seeded(&fx, "J-700").await;
        let refresher = refresher(&fx);

        let first = refresher.refresh_once().await.unwrap();
        assert_eq!(first.examined, 1);
        assert_eq!(first.updated, 1);
        let stored = fx.repo.load_job(&job.id()).await.unwrap();
        assert!(stored.tasks().iter().all(|t| t.is_critical_path()));
        assert!(fx.bus.has_event("job.critical_path_updated.v1"));

        let second = refresher.refresh_once().await.unwrap();
        assert_eq!(second.updated, 0);
    }

    #[tokio::test]
    async fn held_jobs_are_not_examined() {
        let fx = Fixture::new();
        let job = seeded(&fx, "J-701").await;
        let mut held = job.clone();
        held.change_status(JobStatus::OnHold, fx.clock.now()).unwrap();
        fx.repo.save_job(held).await.unwrap();

        let summary = refresher(&fx).refresh_once().await.unwrap();
        assert_eq!(summary.examined, 0);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let fx = Fixture::new();
        seeded(&fx, "J-702").await;
        let refresher = Arc::new(
            refresher(&fx)
                .with_config(CriticalPathRefresherConfig::default().with_interval(StdDuration::from_millis(10))),
        );
        let (tx, rx) = watch::channel(false);

        let task = {
            let refresher = refresher.clone();
            tokio::spawn(async move { refresher.run(rx).await })
        };
        time::sleep(StdDuration::from_millis(50)).await;
        tx.send(true).unwrap();
        time::timeout(StdDuration::from_secs(1), task)
            .await
            .expect("refresher did not stop")
            .unwrap();

        assert!(fx.bus.has_event("job.critical_path_updated.v1"));
    }
}
