//! Analysis service
//!
//! Posts diary content to the sentiment endpoint. `MoodAnalyzer` is the seam
//! the debounce controller depends on.

use crate::config::ANALYZE_PATH;
use crate::error::Result;
use crate::http::RequestClient;
use crate::models::{AnalyzeRequest, MoodAnalysis};
use async_trait::async_trait;
use std::sync::Arc;

/// Anything that can turn diary text into a mood analysis
#[async_trait]
pub trait MoodAnalyzer: Send + Sync + 'static {
    async fn analyze(&self, content: &str) -> Result<MoodAnalysis>;
}

/// Remote analyzer backed by the shared request client
#[derive(Clone)]
pub struct AnalysisService {
    client: Arc<RequestClient>,
}

impl AnalysisService {
    pub fn new(client: Arc<RequestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MoodAnalyzer for AnalysisService {
    async fn analyze(&self, content: &str) -> Result<MoodAnalysis> {
        tracing::info!("Requesting mood analysis ({} chars)", content.chars().count());

        let analysis: MoodAnalysis = self
            .client
            .post_json(ANALYZE_PATH, &AnalyzeRequest { content })
            .await?;

        tracing::info!(
            "Analysis received: {:?} ({}%), {} keywords",
            analysis.sentiment,
            analysis.confidence_percent(),
            analysis.keywords.len()
        );

        Ok(analysis)
    }
}
