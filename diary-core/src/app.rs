//! Application state and initialization
//!
//! Builds the shared request client once and wires every service to it.
//! Front-ends hold an `AppState` and create editors from it.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{Notifier, RequestClient};
use crate::services::{
    AnalysisService, DebounceController, DebounceSettings, DiaryEditor, UploadService,
};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub client: Arc<RequestClient>,
    pub analysis_service: Arc<AnalysisService>,
    pub upload_service: UploadService,
}

impl AppState {
    pub fn new(config: ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        tracing::info!("Initializing application");

        let client = Arc::new(RequestClient::new(&config, notifier)?);
        let analysis_service = Arc::new(AnalysisService::new(Arc::clone(&client)));
        let upload_service = UploadService::new(Arc::clone(&client), &config);

        tracing::info!("Application initialized successfully");

        Ok(Self {
            config,
            client,
            analysis_service,
            upload_service,
        })
    }

    /// A fresh, empty editor wired to the shared services
    pub fn editor(&self) -> DiaryEditor<AnalysisService> {
        let controller = DebounceController::new(
            Arc::clone(&self.analysis_service),
            DebounceSettings::from(&self.config),
        );
        DiaryEditor::new(controller, self.upload_service.clone())
    }
}
