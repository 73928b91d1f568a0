use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

use super::pipeline::PresentationSink;
use super::translation::TranslationService;
use crate::shared::error::{PipelineError, TranslationError};

/// How often the server is probed once the app is running
pub const CONNECTION_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically probes the translation server so the connection status stays fresh
pub struct ConnectionMonitor {
    service: Arc<dyn TranslationService>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionMonitor {
    pub fn new(service: Arc<dyn TranslationService>) -> Self {
        Self::with_interval(service, CONNECTION_CHECK_INTERVAL)
    }

    pub fn with_interval(service: Arc<dyn TranslationService>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Probe once at startup. An unreachable server is reported to the sink.
    pub async fn initial_check(&self, sink: &dyn PresentationSink) -> bool {
        let connected = self.service.check_connection().await;
        if !connected {
            tracing::warn!("[Monitor] Translation server unreachable at startup");
            sink.show_error(&PipelineError::Translation(TranslationError::ServerUnavailable));
        }
        connected
    }

    /// Start the periodic probe. Calling it while already running is a no-op.
    ///
    /// Must be called from within a tokio runtime context.
    pub fn start(&self) {
        let mut task = self.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let service = Arc::clone(&self.service);
        let period = self.interval;

        *task = Some(tokio::spawn(async move {
            tracing::info!("[Monitor] Started, checking every {:?}", period);

            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let connected = service.check_connection().await;
                tracing::debug!("[Monitor] {}", service.connection_status());
                if !connected {
                    tracing::warn!("[Monitor] Translation server unreachable");
                }
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(handle) = self.lock().take() {
            handle.abort();
            tracing::info!("[Monitor] Stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("[Monitor] Mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{ConnectionStatus, Language, TranslationResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct ProbeCounter {
        checks: AtomicUsize,
        down: AtomicBool,
    }

    #[async_trait]
    impl TranslationService for ProbeCounter {
        async fn translate(
            &self,
            _text: &str,
            _source: Language,
            _target: Language,
        ) -> Result<TranslationResult, TranslationError> {
            Err(TranslationError::ServerUnavailable)
        }

        async fn check_connection(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst);
            !self.down.load(Ordering::SeqCst)
        }

        fn connection_status(&self) -> ConnectionStatus {
            if self.down.load(Ordering::SeqCst) {
                ConnectionStatus::Disconnected
            } else {
                ConnectionStatus::Connected
            }
        }
    }

    #[derive(Default)]
    struct ErrorCounter(AtomicUsize);

    impl PresentationSink for ErrorCounter {
        fn show_result(&self, _result: TranslationResult) {}

        fn show_error(&self, error: &PipelineError) {
            assert!(matches!(
                error,
                PipelineError::Translation(TranslationError::ServerUnavailable)
            ));
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_initial_check_reports_unreachable_server() {
        let probe = Arc::new(ProbeCounter::default());
        probe.down.store(true, Ordering::SeqCst);
        let monitor = ConnectionMonitor::new(probe.clone());
        let sink = ErrorCounter::default();

        assert!(!monitor.initial_check(&sink).await);
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_initial_check_is_silent_when_connected() {
        let monitor = ConnectionMonitor::new(Arc::new(ProbeCounter::default()));
        let sink = ErrorCounter::default();

        assert!(monitor.initial_check(&sink).await);
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_checks_until_stopped() {
        let probe = Arc::new(ProbeCounter::default());
        let monitor = ConnectionMonitor::with_interval(probe.clone(), Duration::from_secs(30));

        monitor.start();
        monitor.start();
        assert!(monitor.is_running());

        // First probe is one full period after start
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(probe.checks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(probe.checks.load(Ordering::SeqCst), 3);

        monitor.stop();
        assert!(!monitor.is_running());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(probe.checks.load(Ordering::SeqCst), 3);
    }
}
