//! Diary editor
//!
//! Owns the diary text, forwards every edit to the debounce controller and
//! inserts uploaded images as Markdown references.

use crate::error::AppError;
use crate::models::{AnalysisView, UploadState};
use crate::services::analysis::MoodAnalyzer;
use crate::services::debounce::DebounceController;
use crate::services::uploads::UploadService;
use std::path::PathBuf;
use tokio::sync::watch;

/// Outcome of inserting a batch of files
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Markdown references appended to the content, in order
    pub inserted: Vec<String>,
    pub failed: Vec<(PathBuf, AppError)>,
}

pub struct DiaryEditor<A: MoodAnalyzer> {
    content: String,
    controller: DebounceController<A>,
    uploads: UploadService,
}

impl<A: MoodAnalyzer> DiaryEditor<A> {
    pub fn new(controller: DebounceController<A>, uploads: UploadService) -> Self {
        Self {
            content: String::new(),
            controller,
            uploads,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn view(&self) -> AnalysisView {
        self.controller.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisView> {
        self.controller.subscribe()
    }

    pub fn subscribe_uploads(&self) -> watch::Receiver<UploadState> {
        self.uploads.subscribe()
    }

    /// Footer hint for the current content
    pub fn hint(&self) -> Option<String> {
        AnalysisView::hint(&self.content, self.controller.settings().min_chars)
    }

    pub fn has_pending(&self) -> bool {
        self.controller.has_pending()
    }

    /// Let the last pause in typing play out and return the resulting view
    pub async fn settle(&self) -> AnalysisView {
        self.controller.settle().await
    }

    /// Replace the whole content, as a text area change event does
    pub fn on_input(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.controller.on_change(&self.content);
    }

    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
        self.controller.on_change(&self.content);
    }

    /// Upload and insert files one after another. A failed file is reported
    /// and skipped; it never changes the content.
    pub async fn insert_files(&mut self, paths: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();

        for path in paths {
            match self.uploads.upload_file(path).await {
                Ok(url) => {
                    let alt = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let markdown = image_markdown(&alt, &url);

                    if !self.content.is_empty() && !self.content.ends_with('\n') {
                        self.content.push('\n');
                    }
                    self.content.push_str(&markdown);
                    self.content.push('\n');
                    self.controller.on_change(&self.content);

                    report.inserted.push(markdown);
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    report.failed.push((path.clone(), e));
                }
            }
        }

        tracing::info!(
            "Inserted {} of {} files",
            report.inserted.len(),
            paths.len()
        );

        report
    }
}

/// Markdown image reference; brackets and line breaks are stripped from the alt text
pub fn image_markdown(alt: &str, url: &str) -> String {
    let alt: String = alt
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '\n' | '\r'))
        .collect();
    format!("![{}]({})", alt, url)
}
