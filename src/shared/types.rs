use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ============================================================================
// Languages
// ============================================================================

/// Languages understood by the translation server.
///
/// The serialized form is the exact tag the server expects, including the
/// composite `English|Japanese` which asks the server to detect which of the
/// two the input is written in. Any pair is forwarded as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "Japanese")]
    Japanese,
    #[serde(rename = "Japanese(easy)")]
    JapaneseEasy,
    #[serde(rename = "English")]
    English,
    #[serde(rename = "Chinese")]
    Chinese,
    #[serde(rename = "Taiwanese")]
    Taiwanese,
    #[serde(rename = "Korean")]
    Korean,
    #[serde(rename = "Arabic")]
    Arabic,
    #[serde(rename = "Italian")]
    Italian,
    #[serde(rename = "Indonesian")]
    Indonesian,
    #[serde(rename = "Dutch")]
    Dutch,
    #[serde(rename = "Spanish")]
    Spanish,
    #[serde(rename = "Thai")]
    Thai,
    #[serde(rename = "German")]
    German,
    #[serde(rename = "French")]
    French,
    #[serde(rename = "Vietnamese")]
    Vietnamese,
    #[serde(rename = "Russian")]
    Russian,
    #[serde(rename = "English|Japanese")]
    EnglishJapanese,
}

impl Language {
    /// Canonical wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Japanese => "Japanese",
            Language::JapaneseEasy => "Japanese(easy)",
            Language::English => "English",
            Language::Chinese => "Chinese",
            Language::Taiwanese => "Taiwanese",
            Language::Korean => "Korean",
            Language::Arabic => "Arabic",
            Language::Italian => "Italian",
            Language::Indonesian => "Indonesian",
            Language::Dutch => "Dutch",
            Language::Spanish => "Spanish",
            Language::Thai => "Thai",
            Language::German => "German",
            Language::French => "French",
            Language::Vietnamese => "Vietnamese",
            Language::Russian => "Russian",
            Language::EnglishJapanese => "English|Japanese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Body of `POST /mcp`
#[derive(Debug, Clone, Serialize)]
pub struct TranslationRequest {
    pub messages: Vec<Message>,
    pub source_language: String,
    pub target_language: String,
}

impl TranslationRequest {
    /// A request carries exactly one user message holding the text verbatim.
    pub fn new(text: &str, source: Language, target: Language) -> Self {
        Self {
            messages: vec![Message {
                role: "user".to_string(),
                content: text.to_string(),
            }],
            source_language: source.as_str().to_string(),
            target_language: target.as_str().to_string(),
        }
    }
}

/// Successful `POST /mcp` payload. Only `translated_text` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationResponse {
    pub translated_text: String,
    #[serde(default)]
    pub source_language: Option<String>,
    #[serde(default)]
    pub target_language: Option<String>,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

// ============================================================================
// Results and status
// ============================================================================

/// Outcome of one successful translation, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub original_text: String,
    pub translated_text: String,
    pub source_language: Language,
    pub target_language: Language,
    pub timestamp: DateTime<Local>,
    /// Wall-clock time measured by the client, not the server-reported value
    pub elapsed: Duration,
}

/// The client's current belief about server reachability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Connecting,
    Error(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => f.write_str("Connected"),
            ConnectionStatus::Disconnected => f.write_str("Disconnected"),
            ConnectionStatus::Connecting => f.write_str("Connecting..."),
            ConnectionStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}
