use tokio::sync::broadcast;
use super::settings::AppSettings;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Settings were saved; carries the new values
    SettingsUpdated(AppSettings),
}

/// Fan-out channel for application events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to every current subscriber
    pub fn emit(&self, event: AppEvent) {
        // Err only means nobody is listening yet
        if self.sender.send(event).is_err() {
            tracing::debug!("[Events] No subscribers for event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
