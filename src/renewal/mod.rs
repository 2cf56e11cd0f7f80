use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::RenewalConfig;
use crate::session::SessionController;

/// Periodically renews the token while a session is authenticated.
///
/// Renewal is a policy, not a hard-coded behavior: `start` does nothing
/// unless `renewal.auto_enabled` is set (default off), while `stop` always
/// works.
pub struct RenewalScheduler {
    session: Arc<SessionController>,
    policy: RenewalConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RenewalScheduler {
    pub fn new(session: Arc<SessionController>, policy: RenewalConfig) -> Self {
        Self {
            session,
            policy,
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_handle().is_some()
    }

    pub fn start(&self) {
        if !self.policy.auto_enabled {
            info!("automatic token renewal is disabled by configuration");
            return;
        }

        let mut handle = self.lock_handle();
        if let Some(previous) = handle.take() {
            previous.abort();
        }

        let session = self.session.clone();
        let interval = Duration::from_secs(self.policy.interval_hours * 3600);
        info!(interval_hours = self.policy.interval_hours, "starting automatic token renewal");

        *handle = Some(tokio::spawn(async move {
            // Renew once at startup if there is an active session, then on
            // the fixed interval. renew_token logs its own failures.
            if session.is_authenticated() {
                session.renew_token().await;
            }

            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                if session.is_authenticated() {
                    session.renew_token().await;
                }
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(handle) = self.lock_handle().take() {
            handle.abort();
            info!("automatic token renewal stopped");
        }
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(|poisoned| {
            warn!("renewal scheduler lock poisoned");
            poisoned.into_inner()
        })
    }
}

impl Drop for RenewalScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::store::{MemoryBackend, TokenStore};

    fn scheduler(auto_enabled: bool) -> RenewalScheduler {
        let config = Arc::new(Settings::new_for_test().expect("Failed to load test config"));
        let store = Arc::new(TokenStore::new(Box::new(MemoryBackend::new())));
        let session = Arc::new(SessionController::new(config, store, None));
        RenewalScheduler::new(
            session,
            RenewalConfig {
                auto_enabled,
                interval_hours: 1,
            },
        )
    }

    #[tokio::test]
    async fn test_start_is_noop_when_disabled() {
        let scheduler = scheduler(false);
        scheduler.start();
        assert!(!scheduler.is_running());
        // stop remains functional regardless
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_start_and_stop_when_enabled() {
        let scheduler = scheduler(true);
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop();
        assert!(!scheduler.is_running());
    }
}
