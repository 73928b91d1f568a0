pub mod accessibility;
pub mod keyboard;
pub mod presenter;

pub use accessibility::SystemPermissionPrompt;
pub use presenter::LogPresenter;
