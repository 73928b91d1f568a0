use crate::core::pipeline::PresentationSink;
use crate::shared::error::{PipelineError, Stage};
use crate::shared::types::TranslationResult;

/// Writes translations to stdout and failures to the log
pub struct LogPresenter;

impl LogPresenter {
    fn render(result: &TranslationResult) -> String {
        format!(
            "[{} -> {}] {}\n  {}",
            result.source_language,
            result.target_language,
            result.original_text.trim(),
            result.translated_text.trim(),
        )
    }
}

impl PresentationSink for LogPresenter {
    fn show_result(&self, result: TranslationResult) {
        tracing::info!(
            "[Result] Translated {} chars in {:.2}s",
            result.original_text.chars().count(),
            result.elapsed.as_secs_f64()
        );
        println!("{}", Self::render(&result));
    }

    fn show_error(&self, error: &PipelineError) {
        match error.stage() {
            Stage::Acquisition => tracing::warn!("[Result] {}", error),
            Stage::Translation => tracing::error!("[Result] {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Language;
    use chrono::Local;
    use std::time::Duration;

    #[test]
    fn test_render_trims_and_labels_languages() {
        let result = TranslationResult {
            original_text: " hello \n".to_string(),
            translated_text: "こんにちは\n".to_string(),
            source_language: Language::English,
            target_language: Language::Japanese,
            timestamp: Local::now(),
            elapsed: Duration::from_millis(420),
        };

        assert_eq!(
            LogPresenter::render(&result),
            "[English -> Japanese] hello\n  こんにちは"
        );
    }
}
