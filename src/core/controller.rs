//! Keeps running components in step with the persisted settings

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::gesture::{GestureDetector, GestureError};
use super::pipeline::TranslationOrchestrator;
use super::translation::TranslationClient;
use crate::shared::events::{AppEvent, EventBus};
use crate::shared::settings::{AppSettings, SettingsStore};

pub struct AppController {
    settings: Arc<SettingsStore>,
    client: Arc<TranslationClient>,
    detector: Arc<GestureDetector>,
    orchestrator: Arc<TranslationOrchestrator>,
}

impl AppController {
    pub fn new(
        settings: Arc<SettingsStore>,
        client: Arc<TranslationClient>,
        detector: Arc<GestureDetector>,
        orchestrator: Arc<TranslationOrchestrator>,
    ) -> Self {
        Self {
            settings,
            client,
            detector,
            orchestrator,
        }
    }

    pub fn detector(&self) -> Arc<GestureDetector> {
        Arc::clone(&self.detector)
    }

    /// Push `settings` into the client and the gesture detector.
    ///
    /// Languages need no propagation: the orchestrator reads them per cycle.
    pub fn apply_settings(&self, settings: &AppSettings) -> Result<(), GestureError> {
        match settings.endpoint_url() {
            Ok(endpoint) if endpoint != self.client.endpoint() => self.client.update_endpoint(endpoint),
            Ok(_) => {}
            Err(e) => tracing::warn!("[Controller] {}, keeping {}", e, self.client.endpoint()),
        }

        if settings.hotkey_enabled {
            let orchestrator = Arc::clone(&self.orchestrator);
            self.detector.register(move || {
                orchestrator.trigger();
            })?;
        } else {
            self.detector.unregister();
        }
        Ok(())
    }

    /// Apply the stored settings, then follow every `SettingsUpdated` event
    pub fn listen(self: &Arc<Self>, events: &EventBus) -> Result<JoinHandle<()>, GestureError> {
        let mut receiver = events.subscribe();
        self.apply_settings(&self.settings.current())?;

        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            loop {
                let settings = match receiver.recv().await {
                    Ok(AppEvent::SettingsUpdated(settings)) => settings,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("[Controller] Missed {} settings events, resyncing", skipped);
                        this.settings.current()
                    }
                    Err(RecvError::Closed) => break,
                };

                if let Err(e) = this.apply_settings(&settings) {
                    tracing::error!("[Controller] Failed to apply settings: {}", e);
                }
            }
            tracing::debug!("[Controller] Event bus closed");
        }))
    }
}
