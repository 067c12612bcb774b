//! Market mutator: runs the five market jobs on fixed periods.
//!
//! One driver task ticks once a second and fires every job whose next-fire
//! instant has passed. Each fired job runs on its own task, supervised by a
//! wrapper that records the outcome, so a failing or panicking job never
//! reaches the driver. A job that is still in flight when its period comes
//! round again is skipped, not queued.

pub mod jobs;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::catalog::CatalogStore;
use crate::engine::MarketEngine;

pub use jobs::{JobKind, JobReport};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job: JobKind,
    pub period_secs: u64,
    pub running: bool,
    pub runs: u64,
    pub failures: u64,
    pub skipped: u64,
    pub last_started: Option<DateTime<Utc>>,
    pub last_finished: Option<DateTime<Utc>>,
    pub last_report: Option<JobReport>,
    pub last_error: Option<String>,
    pub next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub jobs: Vec<JobStatus>,
}

struct JobSlot {
    kind: JobKind,
    in_flight: AtomicBool,
    status: Mutex<JobStatus>,
}

impl JobSlot {
    fn new(kind: JobKind) -> Self {
        Self {
            kind,
            in_flight: AtomicBool::new(false),
            status: Mutex::new(JobStatus {
                job: kind,
                period_secs: kind.period().as_secs(),
                running: false,
                runs: 0,
                failures: 0,
                skipped: 0,
                last_started: None,
                last_finished: None,
                last_report: None,
                last_error: None,
                next_run: None,
            }),
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, JobStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claims the slot. False when a previous run is still in flight.
    fn try_claim(&self) -> bool {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            self.lock_status().skipped += 1;
            return false;
        }
        let mut status = self.lock_status();
        status.running = true;
        status.last_started = Some(Utc::now());
        true
    }

    fn release(&self, outcome: &Result<JobReport, String>) {
        {
            let mut status = self.lock_status();
            status.running = false;
            status.runs += 1;
            status.last_finished = Some(Utc::now());
            match outcome {
                Ok(report) => {
                    status.last_report = Some(report.clone());
                    status.last_error = None;
                }
                Err(message) => {
                    status.failures += 1;
                    status.last_error = Some(message.clone());
                }
            }
        }
        self.in_flight.store(false, Ordering::Release);
    }

    fn set_next_run(&self, delay: Duration) {
        let next = chrono::Duration::from_std(delay)
            .ok()
            .map(|d| Utc::now() + d);
        self.lock_status().next_run = next;
    }
}

struct DriverHandle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct MarketScheduler {
    engine: Arc<MarketEngine>,
    store: Arc<dyn CatalogStore>,
    slots: Vec<Arc<JobSlot>>,
    tick: Duration,
    driver: Mutex<Option<DriverHandle>>,
}

impl MarketScheduler {
    pub fn new(engine: Arc<MarketEngine>, store: Arc<dyn CatalogStore>) -> Self {
        Self::with_tick(engine, store, DEFAULT_TICK)
    }

    pub fn with_tick(engine: Arc<MarketEngine>, store: Arc<dyn CatalogStore>, tick: Duration) -> Self {
        Self {
            engine,
            store,
            slots: JobKind::ALL.iter().map(|k| Arc::new(JobSlot::new(*k))).collect(),
            tick,
            driver: Mutex::new(None),
        }
    }

    /// Starts the driver. Returns false if it is already running.
    pub fn start(&self) -> bool {
        let mut driver = self.lock_driver();
        if driver.as_ref().is_some_and(|d| !d.handle.is_finished()) {
            return false;
        }

        let (shutdown, receiver) = watch::channel(false);
        let handle = tokio::spawn(drive(
            self.slots.clone(),
            self.engine.clone(),
            self.store.clone(),
            self.tick,
            receiver,
        ));
        *driver = Some(DriverHandle { shutdown, handle });
        info!("Market scheduler started");
        true
    }

    /// Stops the driver and waits for it to exit. Jobs already in flight run
    /// to completion. Returns false if it was not running.
    pub async fn stop(&self) -> bool {
        let driver = self.lock_driver().take();
        let Some(driver) = driver else {
            return false;
        };

        let _ = driver.shutdown.send(true);
        if let Err(e) = driver.handle.await {
            warn!("Market scheduler driver ended abnormally: {e}");
        }
        for slot in &self.slots {
            slot.lock_status().next_run = None;
        }
        info!("Market scheduler stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.lock_driver()
            .as_ref()
            .is_some_and(|d| !d.handle.is_finished())
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            jobs: self.slots.iter().map(|s| s.lock_status().clone()).collect(),
        }
    }

    /// Runs one job now and waits for it, sharing the in-flight guard with
    /// scheduled runs. `Ok(None)` means a run was already in flight.
    ///
    /// The job runs on its own task, so a caller that gives up waiting does
    /// not leave the slot claimed.
    pub async fn run_now(&self, kind: JobKind) -> anyhow::Result<Option<JobReport>> {
        let Some(slot) = self.slots.iter().find(|s| s.kind == kind) else {
            return Err(anyhow::anyhow!("no slot for {}", kind.name()));
        };
        if !slot.try_claim() {
            return Ok(None);
        }

        let handle = spawn_claimed(slot.clone(), self.engine.clone(), self.store.clone());
        match handle.await {
            Ok(result) => result.map(Some),
            Err(e) => Err(anyhow::anyhow!("{} supervisor aborted: {e}", kind.name())),
        }
    }

    fn lock_driver(&self) -> MutexGuard<'_, Option<DriverHandle>> {
        self.driver.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn drive(
    slots: Vec<Arc<JobSlot>>,
    engine: Arc<MarketEngine>,
    store: Arc<dyn CatalogStore>,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let started = Instant::now();
    let mut next_fire: Vec<Instant> = slots.iter().map(|s| started + s.kind.period()).collect();
    for slot in &slots {
        slot.set_next_run(slot.kind.period());
    }

    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }

        let now = Instant::now();
        for (slot, next) in slots.iter().zip(next_fire.iter_mut()) {
            if now < *next {
                continue;
            }
            while *next <= now {
                *next += slot.kind.period();
            }
            slot.set_next_run(*next - now);
            fire(slot.clone(), engine.clone(), store.clone());
        }
    }
}

fn fire(slot: Arc<JobSlot>, engine: Arc<MarketEngine>, store: Arc<dyn CatalogStore>) {
    if !slot.try_claim() {
        warn!("Skipping {}: previous run still in progress", slot.kind.name());
        return;
    }
    spawn_claimed(slot, engine, store);
}

/// Runs a claimed job on its own task and releases the slot when it ends.
/// Dropping the returned handle detaches the run; the slot is still released.
fn spawn_claimed(
    slot: Arc<JobSlot>,
    engine: Arc<MarketEngine>,
    store: Arc<dyn CatalogStore>,
) -> JoinHandle<anyhow::Result<JobReport>> {
    let kind = slot.kind;
    tokio::spawn(async move {
        let job = tokio::spawn(async move { jobs::run_job(kind, &engine, store.as_ref()).await });
        let result = match job.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("job aborted: {e}")),
        };

        let outcome = result.as_ref().cloned().map_err(|e| format!("{e:#}"));
        match &outcome {
            Ok(report) => info!("Finished {} ({} affected)", kind.name(), report.affected),
            Err(message) => error!("{} failed: {message}", kind.name()),
        }
        slot.release(&outcome);
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::catalog::store::memory::MemoryCatalog;
    use crate::engine::taxonomy::CATEGORIES;
    use crate::models::product::{NewProduct, ProductRow};
    use crate::models::user::{NewUser, UserRow};

    fn scheduler_with(catalog: Arc<MemoryCatalog>) -> MarketScheduler {
        MarketScheduler::new(Arc::new(MarketEngine::new(None)), catalog)
    }

    fn job_status(scheduler: &MarketScheduler, kind: JobKind) -> JobStatus {
        scheduler
            .status()
            .jobs
            .into_iter()
            .find(|j| j.job == kind)
            .unwrap()
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_are_idempotent() {
        let scheduler = scheduler_with(Arc::new(MemoryCatalog::with_users(1)));

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());

        assert!(scheduler.stop().await);
        assert!(!scheduler.stop().await);
        assert!(!scheduler.is_running());

        assert!(scheduler.start());
        assert!(scheduler.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_fire_on_their_periods() {
        let catalog = Arc::new(MemoryCatalog::with_users(2));
        for category in CATEGORIES.iter().map(|c| c.name) {
            catalog.seed_product(category, 50.0, 1);
        }
        let scheduler = scheduler_with(catalog);
        scheduler.start();
        settle().await;

        tokio::time::sleep(Duration::from_secs(5 * 60 + 2)).await;
        settle().await;
        assert_eq!(job_status(&scheduler, JobKind::PriceRefresh).runs, 1);
        assert_eq!(job_status(&scheduler, JobKind::AvailabilityRefresh).runs, 0);

        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        settle().await;
        assert_eq!(job_status(&scheduler, JobKind::PriceRefresh).runs, 2);
        assert_eq!(job_status(&scheduler, JobKind::AvailabilityRefresh).runs, 1);
        assert_eq!(job_status(&scheduler, JobKind::TrendingRefresh).runs, 0);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_does_not_stop_the_driver() {
        let catalog = Arc::new(MemoryCatalog::with_users(2));
        catalog.seed_product("Books", 20.0, 1);
        catalog.fail_writes.store(true, Ordering::SeqCst);
        let scheduler = scheduler_with(catalog.clone());
        scheduler.start();
        settle().await;

        // New listings always write, so every run fails.
        tokio::time::sleep(Duration::from_secs(15 * 60 + 2)).await;
        settle().await;
        let status = job_status(&scheduler, JobKind::NewListings);
        assert_eq!(status.runs, 1);
        assert_eq!(status.failures, 1);
        assert!(status.last_error.is_some());
        assert!(scheduler.is_running());

        catalog.fail_writes.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(15 * 60)).await;
        settle().await;
        let status = job_status(&scheduler, JobKind::NewListings);
        assert_eq!(status.runs, 2);
        assert_eq!(status.failures, 1);
        assert!(status.last_error.is_none());

        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_run_now_records_outcome() {
        let catalog = Arc::new(MemoryCatalog::with_users(1));
        catalog.seed_product("Sports", 80.0, 1);
        let scheduler = scheduler_with(catalog);

        let report = scheduler.run_now(JobKind::PriceRefresh).await.unwrap();
        assert!(report.is_some());
        let status = job_status(&scheduler, JobKind::PriceRefresh);
        assert_eq!(status.runs, 1);
        assert!(!status.running);
    }

    /// Catalog whose product listing takes a while, to hold a job open.
    struct SlowCatalog {
        inner: MemoryCatalog,
        delay: Duration,
    }

    #[async_trait]
    impl CatalogStore for SlowCatalog {
        async fn list_products(&self) -> Result<Vec<ProductRow>, sqlx::Error> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_products().await
        }

        async fn update_product(&self, product: &ProductRow) -> Result<(), sqlx::Error> {
            self.inner.update_product(product).await
        }

        async fn insert_product(&self, product: &NewProduct) -> Result<ProductRow, sqlx::Error> {
            self.inner.insert_product(product).await
        }

        async fn list_users(&self) -> Result<Vec<UserRow>, sqlx::Error> {
            self.inner.list_users().await
        }

        async fn insert_user(&self, user: &NewUser) -> Result<UserRow, sqlx::Error> {
            self.inner.insert_user(user).await
        }

        async fn add_cart_item(&self, user_id: i64, product_id: i64) -> Result<(), sqlx::Error> {
            self.inner.add_cart_item(user_id, product_id).await
        }

        async fn insert_purchase(
            &self,
            user_id: i64,
            product_id: i64,
            purchased_at: DateTime<Utc>,
        ) -> Result<(), sqlx::Error> {
            self.inner.insert_purchase(user_id, product_id, purchased_at).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_manual_run_still_releases_slot() {
        let inner = MemoryCatalog::with_users(1);
        inner.seed_product("Books", 20.0, 1);
        let store = Arc::new(SlowCatalog {
            inner,
            delay: Duration::from_secs(30),
        });
        let scheduler = MarketScheduler::new(Arc::new(MarketEngine::new(None)), store);

        let abandoned = tokio::time::timeout(
            Duration::from_secs(1),
            scheduler.run_now(JobKind::PriceRefresh),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        let status = job_status(&scheduler, JobKind::PriceRefresh);
        assert!(!status.running);
        assert_eq!(status.runs, 1);

        let report = scheduler.run_now(JobKind::PriceRefresh).await.unwrap();
        assert!(report.is_some());
        assert_eq!(job_status(&scheduler, JobKind::PriceRefresh).runs, 2);
    }

    #[tokio::test]
    async fn test_run_now_skips_when_in_flight() {
        let scheduler = scheduler_with(Arc::new(MemoryCatalog::default()));
        let slot = scheduler
            .slots
            .iter()
            .find(|s| s.kind == JobKind::PriceRefresh)
            .unwrap()
            .clone();
        assert!(slot.try_claim());

        let report = scheduler.run_now(JobKind::PriceRefresh).await.unwrap();
        assert!(report.is_none());
        assert_eq!(job_status(&scheduler, JobKind::PriceRefresh).skipped, 1);
    }
}
