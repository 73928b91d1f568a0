//! Translation orchestration
//!
//! One trigger runs one cycle: acquire selection, translate, report. At most one
//! cycle runs at a time and triggers that arrive meanwhile are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use super::capture::TextAcquirer;
use super::translation::TranslationService;
use crate::shared::error::{CaptureError, PipelineError, SelectionUnavailable, Stage, TranslationError};
use crate::shared::settings::ConfigProvider;
use crate::shared::types::TranslationResult;

/// Receives the outcome of every completed cycle
pub trait PresentationSink: Send + Sync {
    fn show_result(&self, result: TranslationResult);

    fn show_error(&self, error: &PipelineError);
}

/// Asks the user to grant accessibility access
pub trait PermissionPrompt: Send + Sync {
    fn request_permission(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Another cycle was running; nothing happened
    Busy,
    Completed,
    Failed(Stage),
}

/// Clears the in-progress flag when dropped, whatever path the cycle took
struct InProgressGuard(Arc<AtomicBool>);

impl InProgressGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TranslationOrchestrator {
    acquirer: Arc<TextAcquirer>,
    translator: Arc<dyn TranslationService>,
    config: Arc<dyn ConfigProvider>,
    sink: Arc<dyn PresentationSink>,
    permission: Arc<dyn PermissionPrompt>,
    in_progress: Arc<AtomicBool>,
    /// Capture that outlived its deadline and is still occupying a blocking thread
    stale_capture: Mutex<Option<CaptureTask>>,
}

type CaptureTask = JoinHandle<Result<String, SelectionUnavailable>>;

/// Selected text that is blank after trimming is a translation-stage failure
fn require_text(text: String) -> Result<String, PipelineError> {
    if text.trim().is_empty() {
        return Err(PipelineError::Translation(TranslationError::NoTextSelected));
    }
    Ok(text)
}

fn timed_out() -> SelectionUnavailable {
    SelectionUnavailable {
        cause: CaptureError::Timeout,
    }
}

impl TranslationOrchestrator {
    pub fn new(
        acquirer: Arc<TextAcquirer>,
        translator: Arc<dyn TranslationService>,
        config: Arc<dyn ConfigProvider>,
        sink: Arc<dyn PresentationSink>,
        permission: Arc<dyn PermissionPrompt>,
    ) -> Self {
        Self {
            acquirer,
            translator,
            config,
            sink,
            permission,
            in_progress: Arc::new(AtomicBool::new(false)),
            stale_capture: Mutex::new(None),
        }
    }

    fn stale_capture(&self) -> std::sync::MutexGuard<'_, Option<CaptureTask>> {
        match self.stale_capture.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("[Pipeline] Mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    pub fn is_translating(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Start a cycle in the background. Returns `None` when one is already running.
    ///
    /// Must be called from within a tokio runtime context.
    pub fn trigger(self: &Arc<Self>) -> Option<JoinHandle<TriggerOutcome>> {
        let Some(guard) = InProgressGuard::try_acquire(&self.in_progress) else {
            tracing::info!("[Pipeline] Translation already in progress");
            return None;
        };

        let this = Arc::clone(self);
        Some(tokio::spawn(async move { this.run(guard).await }))
    }

    /// Run a cycle to completion on the current task
    pub async fn handle_trigger(&self) -> TriggerOutcome {
        match InProgressGuard::try_acquire(&self.in_progress) {
            Some(guard) => self.run(guard).await,
            None => {
                tracing::info!("[Pipeline] Translation already in progress");
                TriggerOutcome::Busy
            }
        }
    }

    async fn run(&self, _guard: InProgressGuard) -> TriggerOutcome {
        match self.translate_selection().await {
            Ok(result) => {
                self.sink.show_result(result);
                TriggerOutcome::Completed
            }
            Err(err) => {
                tracing::warn!("[Pipeline] {:?} stage failed: {}", err.stage(), err);
                if let PipelineError::Acquisition(unavailable) = &err {
                    if unavailable.permission_denied() {
                        self.permission.request_permission();
                    }
                }
                self.sink.show_error(&err);
                TriggerOutcome::Failed(err.stage())
            }
        }
    }

    async fn translate_selection(&self) -> Result<TranslationResult, PipelineError> {
        let text = self.acquire().await.map_err(PipelineError::Acquisition)?;
        let text = require_text(text)?;

        let source = self.config.source_language();
        let target = self.config.target_language();

        self.translator
            .translate(&text, source, target)
            .await
            .map_err(PipelineError::Translation)
    }

    /// Capture talks to blocking OS APIs, so it runs on the blocking pool with a deadline.
    ///
    /// A capture that misses its deadline keeps running; until it finishes, later
    /// cycles fail fast instead of stacking more blocked threads behind it.
    async fn acquire(&self) -> Result<String, SelectionUnavailable> {
        {
            let mut stale = self.stale_capture();
            if stale.as_ref().is_some_and(|task| !task.is_finished()) {
                tracing::warn!("[Pipeline] Previous capture still running, skipping");
                return Err(timed_out());
            }
            *stale = None;
        }

        let acquirer = Arc::clone(&self.acquirer);
        let deadline = self.config.capture_timeout();
        let mut task = tokio::task::spawn_blocking(move || acquirer.acquire());

        let outcome = tokio::time::timeout(deadline, &mut task).await;
        match outcome {
            Ok(Ok(captured)) => captured,
            Ok(Err(join_error)) => Err(SelectionUnavailable {
                cause: CaptureError::System(format!("Capture task failed: {}", join_error)),
            }),
            Err(_) => {
                tracing::warn!("[Pipeline] Capture timed out after {:?}", deadline);
                *self.stale_capture() = Some(task);
                Err(timed_out())
            }
        }
    }
}
