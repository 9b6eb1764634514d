//! Data models
//!
//! Wire types exchanged with the analysis backend and the state
//! snapshots published to the editor front-end.

use serde::{Deserialize, Serialize};

/// Emotional polarity reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive mood",
            Sentiment::Neutral => "Neutral mood",
            Sentiment::Negative => "Negative mood",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Sentiment::Positive => "😊",
            Sentiment::Neutral => "😐",
            Sentiment::Negative => "😢",
        }
    }
}

/// Result of one analysis call; replaces the previous one wholesale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAnalysis {
    pub sentiment: Sentiment,
    /// Model certainty in [0, 1]
    pub confidence: f64,
    pub keywords: Vec<String>,
}

impl MoodAnalysis {
    /// Confidence as a whole percentage, 0 when the backend sent garbage
    pub fn confidence_percent(&self) -> u8 {
        if !self.confidence.is_finite() {
            return 0;
        }
        (self.confidence * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Request body for the analysis endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub content: &'a str,
}

/// Response body of the upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Lifecycle of the analysis for the current content
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "analysis", rename_all = "snake_case")]
pub enum AnalysisRequestState {
    #[default]
    Idle,
    PendingDebounce,
    InFlight,
    Resolved(MoodAnalysis),
    Failed,
}

/// Snapshot of the analysis panel, published on every transition
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisView {
    pub char_count: usize,
    pub state: AnalysisRequestState,
    /// Result currently on screen; kept while a newer one is pending
    pub analysis: Option<MoodAnalysis>,
    /// Requests started and not yet answered, stale ones included
    pub in_flight: usize,
}

impl AnalysisView {
    /// True while any analysis call is outstanding, even if a newer edit
    /// has already moved the state back to `PendingDebounce`
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Footer hint for the editor, `None` while the editor is empty
    pub fn hint(content: &str, min_chars: usize) -> Option<String> {
        if content.is_empty() {
            return None;
        }

        let trimmed = trimmed_len(content);
        if trimmed < min_chars {
            Some(format!(
                "{} more characters to start analysis",
                min_chars - trimmed
            ))
        } else {
            Some("Analyzing...".to_string())
        }
    }
}

/// Progress of the single upload currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UploadState {
    pub uploading: bool,
    /// Whole percent, 0-100
    pub progress: u8,
}

/// Character count shown next to the editor
pub fn char_count(content: &str) -> usize {
    content.chars().count()
}

/// Length used by the analysis gate
pub fn trimmed_len(content: &str) -> usize {
    content.trim().chars().count()
}
