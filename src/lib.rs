pub mod core;
pub mod shared;
pub mod system;

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::gesture::GestureError;
use crate::core::{
    AppController, Chord, ConnectionMonitor, GestureDetector, PresentationSink, TextAcquirer,
    TranslationClient, TranslationOrchestrator,
};
use crate::shared::error::{SettingsError, TranslationError};
use crate::shared::events::EventBus;
use crate::shared::settings::{AppSettings, ConfigProvider, SettingsStore};
use crate::system::keyboard::{self, KeyTapError};
use crate::system::{LogPresenter, SystemPermissionPrompt};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Gesture(#[from] GestureError),
}

/// Long-lived components; dropping this stops the background tasks
struct App {
    controller: Arc<AppController>,
    monitor: ConnectionMonitor,
    listener: JoinHandle<()>,
}

impl App {
    async fn start() -> Result<Self, StartupError> {
        let events = EventBus::new();
        let settings = Arc::new(SettingsStore::open(AppSettings::get_settings_path()?, events.clone()).await?);
        let endpoint = settings.server_endpoint()?;
        tracing::info!("[Startup] Translation server: {}", endpoint);

        let client = Arc::new(TranslationClient::new(endpoint)?);
        let sink: Arc<dyn PresentationSink> = Arc::new(LogPresenter);

        let orchestrator = Arc::new(TranslationOrchestrator::new(
            Arc::new(TextAcquirer::platform_default()),
            client.clone(),
            settings.clone(),
            sink.clone(),
            Arc::new(SystemPermissionPrompt),
        ));
        let detector = Arc::new(GestureDetector::new(Chord::copy()));

        let controller = Arc::new(AppController::new(settings, client.clone(), detector, orchestrator));
        let listener = controller.listen(&events)?;

        let monitor = ConnectionMonitor::new(client);
        monitor.initial_check(sink.as_ref()).await;
        monitor.start();

        Ok(Self {
            controller,
            monitor,
            listener,
        })
    }

    fn shutdown(self) {
        self.monitor.stop();
        self.listener.abort();
        self.controller.detector().unregister();
        tracing::info!("[Shutdown] Stopped");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub fn run() {
    init_tracing();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("[Startup] Failed to create async runtime: {}", e);
            return;
        }
    };
    let _context = runtime.enter();

    let app = match runtime.block_on(App::start()) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("[Startup] {}", e);
            return;
        }
    };
    tracing::info!("✅ Ready. Select text and press {:?}+C twice", Chord::copy().modifier);

    // The key tap owns the main thread until its run loop exits
    match keyboard::run_key_tap(app.controller.detector()) {
        Ok(()) => {}
        Err(KeyTapError::Unsupported) => {
            tracing::warn!("[Startup] {}; waiting for Ctrl+C", KeyTapError::Unsupported);
            if let Err(e) = runtime.block_on(tokio::signal::ctrl_c()) {
                tracing::error!("[Startup] Failed to listen for Ctrl+C: {}", e);
            }
        }
        Err(e) => tracing::error!("[Startup] {}", e),
    }

    app.shutdown();
}
