//! Translation server access
//!
//! `TranslationService` is the seam the pipeline depends on; `TranslationClient`
//! is the HTTP implementation talking to the local `/mcp` endpoint.

pub mod client;

use async_trait::async_trait;
use crate::shared::error::TranslationError;
use crate::shared::types::{ConnectionStatus, Language, TranslationResult};

pub use client::TranslationClient;

#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult, TranslationError>;

    /// Probe the server. Never fails; unreachable means `false`.
    async fn check_connection(&self) -> bool;

    fn connection_status(&self) -> ConnectionStatus;
}
