pub mod capture;
pub mod controller;
pub mod gesture;
pub mod monitor;
pub mod pipeline;
pub mod translation;

pub use capture::TextAcquirer;
pub use controller::AppController;
pub use gesture::{Chord, GestureDetector, KeyEvent};
pub use monitor::ConnectionMonitor;
pub use pipeline::{PermissionPrompt, PresentationSink, TranslationOrchestrator};
pub use translation::{TranslationClient, TranslationService};
