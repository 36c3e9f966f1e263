//! Periodic database refresh.
//!
//! A [`RefreshManager`] downloads every configured edition, stages each file
//! next to the live one, verifies it opens and classifies, then renames it into
//! place. Once at least one edition was updated, all editions are reloaded from
//! disk and the new set is swapped into the [`GeoIpService`] as a whole.
//!
//! Lookups never wait on a refresh: they keep serving the previous set until the
//! swap, and a failed cycle leaves that set untouched.

mod fetch;
mod lock;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::GeoIpConfig;
use crate::error_handling::GeoIpError;
use crate::geoip::{load_active_set, GeoDatabase, GeoIpService};

pub use fetch::{Fetcher, HttpFetcher};
pub use lock::UpdateLock;

/// Where the refresh task currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    /// Waiting for the next cycle.
    #[default]
    Idle,
    /// Downloading and staging database files.
    Fetching,
    /// Reloading databases and installing the new set.
    Swapping,
}

/// Per-edition result of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Editions whose live file was replaced.
    pub updated: Vec<String>,
    /// Editions that failed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl RefreshReport {
    /// Whether the active set was rebuilt.
    pub fn swapped(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Callback invoked on every cycle state transition.
pub type StateListener = Arc<dyn Fn(RefreshState) + Send + Sync>;

/// Shared cycle state, plus the optional listener told about each change.
#[derive(Default)]
struct StateTracker {
    state: Mutex<RefreshState>,
    listener: Option<StateListener>,
}

impl StateTracker {
    fn with_listener(listener: StateListener) -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
            listener: Some(listener),
        }
    }

    fn set(&self, next: RefreshState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        if let Some(listener) = &self.listener {
            listener(next);
        }
    }

    fn get(&self) -> RefreshState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for StateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTracker")
            .field("state", &self.get())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Resets the shared state to `Idle` however a cycle ends.
struct StateGuard<'a> {
    tracker: &'a StateTracker,
}

impl<'a> StateGuard<'a> {
    fn enter(tracker: &'a StateTracker, next: RefreshState) -> Self {
        tracker.set(next);
        Self { tracker }
    }

    fn advance(&self, next: RefreshState) {
        self.tracker.set(next);
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.tracker.set(RefreshState::Idle);
    }
}

/// Downloads new database files and swaps them into a [`GeoIpService`].
#[derive(Clone)]
pub struct RefreshManager {
    config: Arc<GeoIpConfig>,
    service: Arc<GeoIpService>,
    fetcher: Arc<dyn Fetcher>,
    state: Arc<StateTracker>,
    interval: Duration,
}

impl std::fmt::Debug for RefreshManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshManager")
            .field("editions", &self.config.edition_ids)
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RefreshManager {
    /// Creates a manager refreshing `service` every `update_frequency_secs`.
    pub fn new(config: GeoIpConfig, service: Arc<GeoIpService>, fetcher: Arc<dyn Fetcher>) -> Self {
        let interval = Duration::from_secs(config.update_frequency_secs);
        Self {
            config: Arc::new(config),
            service,
            fetcher,
            state: Arc::new(StateTracker::default()),
            interval,
        }
    }

    /// Registers `listener` to be called on every state transition.
    ///
    /// The listener runs on the refresh task and must not block.
    pub fn with_state_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(RefreshState) + Send + Sync + 'static,
    {
        self.state = Arc::new(StateTracker::with_listener(Arc::new(listener)));
        self
    }

    /// Overrides the refresh interval. Zero runs a single cycle.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current cycle state.
    pub fn state(&self) -> RefreshState {
        self.state.get()
    }

    /// Runs one refresh cycle.
    ///
    /// Fails only when the update lock cannot be taken; per-edition failures
    /// are reported in [`RefreshReport::failed`].
    pub async fn refresh_once(&self) -> Result<RefreshReport, GeoIpError> {
        let _lock = UpdateLock::acquire(&self.config.lock_file)?;
        let guard = StateGuard::enter(&self.state, RefreshState::Fetching);

        let mut report = RefreshReport::default();
        for edition in &self.config.edition_ids {
            match self.refresh_edition(edition).await {
                Ok(()) => {
                    log::info!("Updated geoip database {}", edition);
                    report.updated.push(edition.clone());
                }
                Err(e) => {
                    log::error!("{}", e);
                    report.failed.push((edition.clone(), e.to_string()));
                }
            }
        }

        if report.swapped() {
            guard.advance(RefreshState::Swapping);
            let outcome = load_active_set(&self.config).await;
            for skipped in &outcome.skipped {
                log::warn!("Not serving after refresh: {}", skipped);
            }
            self.service.install(outcome.set);
        } else {
            log::debug!("No geoip database updated, keeping active set");
        }

        Ok(report)
    }

    /// Fetches `edition`, stages it, verifies it, and renames it over the live file.
    async fn refresh_edition(&self, edition: &str) -> Result<(), GeoIpError> {
        let bytes = self.fetcher.fetch(edition).await?;

        let staging = self.config.staging_path(edition);
        let live = self.config.database_path(edition);
        log::debug!("Staging {} ({} bytes) at {}", edition, bytes.len(), staging.display());

        if let Err(e) = tokio::fs::write(&staging, &bytes).await {
            discard_staging(&staging).await;
            return Err(GeoIpError::io(&staging, e));
        }

        // Reject files that would not load before they replace a working one
        match GeoDatabase::open(&staging, edition).await {
            Ok(database) => drop(database),
            Err(e) => {
                discard_staging(&staging).await;
                return Err(e);
            }
        }

        if let Err(e) = tokio::fs::rename(&staging, &live).await {
            discard_staging(&staging).await;
            return Err(GeoIpError::io(&live, e));
        }
        Ok(())
    }

    async fn run_cycle(&self) {
        match self.refresh_once().await {
            Ok(report) if report.failed.is_empty() => {
                log::info!(
                    "GeoIP refresh complete: {} database(s) updated",
                    report.updated.len()
                )
            }
            Ok(report) => log::warn!(
                "GeoIP refresh finished with {} failure(s), {} database(s) updated",
                report.failed.len(),
                report.updated.len()
            ),
            Err(e @ GeoIpError::LockHeld { .. }) => {
                log::warn!("Skipping geoip refresh: {}", e)
            }
            Err(e) => log::error!("GeoIP refresh failed: {}", e),
        }
    }

    /// Cancellation only ends the wait between cycles. A cycle in progress
    /// always runs to completion.
    async fn run(self, cancel: CancellationToken) {
        self.run_cycle().await;

        if self.interval.is_zero() {
            log::debug!("GeoIP refresh interval is zero, not scheduling further updates");
            return;
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("GeoIP refresh task shutting down");
                    break;
                }
                _ = ticker.tick() => self.run_cycle().await,
            }
        }
    }

    /// Starts the background refresh task.
    ///
    /// Without credentials no task is started. Otherwise one cycle runs
    /// immediately, then one per interval until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> RefreshHandle {
        let state = Arc::clone(&self.state);
        if !self.config.has_credentials() {
            log::info!("No MaxMind credentials configured, geoip database refresh disabled");
            return RefreshHandle {
                cancel,
                task: None,
                state,
            };
        }

        log::info!(
            "Starting geoip refresh for {} (interval: {:?})",
            self.config.edition_ids.join(","),
            self.interval
        );
        let task = tokio::spawn(self.run(cancel.clone()));
        RefreshHandle {
            cancel,
            task: Some(task),
            state,
        }
    }
}

async fn discard_staging(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove staging file {}: {}", path.display(), e);
        }
    }
}

/// Handle on a spawned refresh task.
#[derive(Debug)]
pub struct RefreshHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    state: Arc<StateTracker>,
}

impl RefreshHandle {
    /// Whether a background task was started.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Current cycle state of the task.
    pub fn state(&self) -> RefreshState {
        self.state.get()
    }

    /// Cancels the task and waits for it to stop.
    ///
    /// A cycle already in progress runs to completion first.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                log::error!("GeoIP refresh task ended abnormally: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Fetcher returning fixed bytes, or an error when `bytes` is `None`.
    struct ScriptedFetcher {
        bytes: Option<Vec<u8>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn returning(bytes: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                bytes: Some(bytes.to_vec()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                bytes: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for ScriptedFetcher {
        fn fetch<'a>(&'a self, edition: &'a str) -> BoxFuture<'a, Result<Vec<u8>, GeoIpError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = match &self.bytes {
                Some(bytes) => Ok(bytes.clone()),
                None => Err(GeoIpError::fetch(edition, "503 Service Unavailable")),
            };
            Box::pin(async move { result })
        }
    }

    fn config_in(dir: &TempDir, with_credentials: bool) -> GeoIpConfig {
        GeoIpConfig {
            account_id: if with_credentials { 42 } else { 0 },
            license_key: if with_credentials {
                "secret".to_string()
            } else {
                String::new()
            },
            database_directory: dir.path().to_path_buf(),
            lock_file: dir.path().join("geoip2.lock"),
            edition_ids: vec!["GeoLite2-City".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_state_and_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = config_in(&temp_dir, true);
        let live = config.database_path("GeoLite2-City");
        tokio::fs::write(&live, b"previous").await.unwrap();

        let fetcher = ScriptedFetcher::failing();
        let manager = RefreshManager::new(config.clone(), Arc::new(GeoIpService::new()), fetcher.clone());
        let report = manager.refresh_once().await.expect("lock should be free");

        assert!(report.updated.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "GeoLite2-City");
        assert!(report.failed[0].1.contains("503"));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(manager.state(), RefreshState::Idle);
        assert!(!config.lock_file.exists());
        assert_eq!(tokio::fs::read(&live).await.unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_invalid_download_is_not_installed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = config_in(&temp_dir, true);
        let live = config.database_path("GeoLite2-City");
        tokio::fs::write(&live, b"previous").await.unwrap();

        let manager = RefreshManager::new(
            config.clone(),
            Arc::new(GeoIpService::new()),
            ScriptedFetcher::returning(b"not a maxmind database"),
        );
        let report = manager.refresh_once().await.expect("lock should be free");

        assert!(!report.swapped());
        assert_eq!(report.failed.len(), 1);
        assert!(!config.staging_path("GeoLite2-City").exists());
        assert_eq!(tokio::fs::read(&live).await.unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_listener_sees_failed_cycle_transitions() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let manager = RefreshManager::new(
            config_in(&temp_dir, true),
            Arc::new(GeoIpService::new()),
            ScriptedFetcher::failing(),
        )
        .with_state_listener(move |state| recorder.lock().unwrap().push(state));

        let report = manager.refresh_once().await.expect("lock should be free");

        assert!(!report.swapped());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![RefreshState::Fetching, RefreshState::Idle]
        );
    }

    #[tokio::test]
    async fn test_held_lock_skips_cycle() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = config_in(&temp_dir, true);
        let _held = UpdateLock::acquire(&config.lock_file).unwrap();

        let fetcher = ScriptedFetcher::failing();
        let manager = RefreshManager::new(config, Arc::new(GeoIpService::new()), fetcher.clone());
        let result = manager.refresh_once().await;

        assert!(matches!(result, Err(GeoIpError::LockHeld { .. })));
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(manager.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_spawn_without_credentials_does_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fetcher = ScriptedFetcher::failing();
        let manager = RefreshManager::new(
            config_in(&temp_dir, false),
            Arc::new(GeoIpService::new()),
            fetcher.clone(),
        );

        let handle = manager.spawn(CancellationToken::new());
        assert!(!handle.is_running());
        handle.shutdown().await;
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_interval_runs_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fetcher = ScriptedFetcher::failing();
        let manager = RefreshManager::new(
            config_in(&temp_dir, true),
            Arc::new(GeoIpService::new()),
            fetcher.clone(),
        )
        .with_interval(Duration::ZERO);

        let handle = manager.spawn(CancellationToken::new());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!handle.is_running());
        handle.shutdown().await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_interval_repeats_until_cancelled() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fetcher = ScriptedFetcher::failing();
        let manager = RefreshManager::new(
            config_in(&temp_dir, true),
            Arc::new(GeoIpService::new()),
            fetcher.clone(),
        )
        .with_interval(Duration::from_millis(20));

        let cancel = CancellationToken::new();
        let handle = manager.spawn(cancel.clone());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(handle.is_running());
        handle.shutdown().await;

        let calls = fetcher.calls();
        assert!(calls >= 2, "expected repeated cycles, got {}", calls);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.calls(), calls, "no cycle may run after shutdown");
        assert!(cancel.is_cancelled());
    }
}
