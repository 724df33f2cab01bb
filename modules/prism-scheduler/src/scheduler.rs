use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::pipeline::Pipeline;

/// `T_cleanup` default (§4.9).
pub const DEFAULT_CLEANUP_INTERVAL_HOURS: u64 = 6;

/// One tick's worth of work, guarded so an overrunning tick can't overlap
/// itself: a tick that's still running when the next one fires is skipped,
/// not queued (§5).
async fn guarded_tick<F, Fut>(name: &'static str, busy: &AtomicBool, work: F)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    if busy
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        tracing::warn!(task = name, "previous tick still running, skipping");
        return;
    }
    work().await;
    busy.store(false, Ordering::SeqCst);
}

/// Drives the pipeline on three independent timers: ingest, enrich, and
/// cleanup. Mirrors the per-task spawned-interval-plus-stop-flag shape of a
/// scheduled pipeline runner, generalised from two named tasks (RSS/social)
/// to this pipeline's three.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    ingest_interval: Duration,
    enrich_interval: Duration,
    cleanup_interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, ingest_interval_minutes: u64) -> Self {
        Self {
            pipeline,
            ingest_interval: Duration::from_secs(ingest_interval_minutes.max(1) * 60),
            enrich_interval: Duration::from_secs(ingest_interval_minutes.max(1) * 60),
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_HOURS * 3600),
        }
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Spawn the three timer tasks and run until SIGINT/SIGTERM, then await
    /// their shutdown.
    pub async fn run_until_shutdown(self) {
        let handle = self.start();
        shutdown_signal().await;
        tracing::info!("shutdown signal received, stopping scheduler");
        handle.stop().await;
    }

    fn start(self) -> SchedulerHandle {
        let stop_flag = Arc::new(RwLock::new(false));

        let ingest_busy = Arc::new(AtomicBool::new(false));
        let pipeline = Arc::clone(&self.pipeline);
        let stop = Arc::clone(&stop_flag);
        let period = self.ingest_interval;
        let ingest_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if *stop.read().await {
                    break;
                }
                let pipeline = Arc::clone(&pipeline);
                guarded_tick("ingest", &ingest_busy, || async move {
                    if let Err(err) = pipeline.run_ingest().await {
                        tracing::error!(%err, "scheduled ingest failed");
                    }
                })
                .await;
            }
        });

        let enrich_busy = Arc::new(AtomicBool::new(false));
        let pipeline = Arc::clone(&self.pipeline);
        let stop = Arc::clone(&stop_flag);
        let period = self.enrich_interval;
        let enrich_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if *stop.read().await {
                    break;
                }
                let pipeline = Arc::clone(&pipeline);
                guarded_tick("enrich", &enrich_busy, || async move {
                    if let Err(err) = pipeline.run_enrich().await {
                        tracing::error!(%err, "scheduled enrich failed");
                    }
                })
                .await;
            }
        });

        let cleanup_busy = Arc::new(AtomicBool::new(false));
        let pipeline = Arc::clone(&self.pipeline);
        let stop = Arc::clone(&stop_flag);
        let period = self.cleanup_interval;
        let cleanup_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if *stop.read().await {
                    break;
                }
                let pipeline = Arc::clone(&pipeline);
                guarded_tick("cleanup", &cleanup_busy, || async move {
                    if let Err(err) = pipeline.run_cleanup().await {
                        tracing::error!(%err, "scheduled cleanup failed");
                    }
                })
                .await;
            }
        });

        SchedulerHandle {
            stop_flag,
            tasks: vec![ingest_task, enrich_task, cleanup_task],
        }
    }
}

struct SchedulerHandle {
    stop_flag: Arc<RwLock<bool>>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl SchedulerHandle {
    async fn stop(self) {
        *self.stop_flag.write().await = true;
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Waits for SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl_c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn guarded_tick_skips_while_busy() {
        let busy = AtomicBool::new(true);
        let runs = AtomicUsize::new(0);
        guarded_tick("test", &busy, || async {
            runs.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert_eq!(runs.load(Ordering::SeqCst), 0, "should not run while busy");
    }

    #[tokio::test]
    async fn guarded_tick_runs_and_clears_flag_when_free() {
        let busy = AtomicBool::new(false);
        let runs = AtomicUsize::new(0);
        guarded_tick("test", &busy, || async {
            runs.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!busy.load(Ordering::SeqCst), "flag should clear after the tick");
    }
}
