//! Uploads service
//!
//! Sends one file at a time to the upload endpoint as a streamed multipart
//! body and publishes `UploadState` while doing so. Oversized files are
//! refused before any network activity.

use crate::config::{ClientConfig, UPLOAD_FIELD, UPLOAD_PATH};
use crate::error::{AppError, Result};
use crate::http::{Notice, RequestClient};
use crate::models::{UploadResponse, UploadState};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

#[derive(Clone)]
pub struct UploadService {
    client: Arc<RequestClient>,
    state: Arc<watch::Sender<UploadState>>,
    serial: Arc<Mutex<()>>,
    max_bytes: u64,
    chunk_bytes: usize,
}

impl UploadService {
    pub fn new(client: Arc<RequestClient>, config: &ClientConfig) -> Self {
        let (state, _) = watch::channel(UploadState::default());

        Self {
            client,
            state: Arc::new(state),
            serial: Arc::new(Mutex::new(())),
            max_bytes: config.max_upload_bytes,
            chunk_bytes: config.upload_chunk_bytes.max(1),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> UploadState {
        *self.state.borrow()
    }

    /// Upload a file from disk; the size is checked before the file is read
    pub async fn upload_file(&self, path: &Path) -> Result<String> {
        let size = tokio::fs::metadata(path).await?.len();
        self.check_size(size)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let data = tokio::fs::read(path).await?;
        self.upload_bytes(&file_name, data).await
    }

    /// Upload in-memory data and return the absolute URL of the stored asset
    pub async fn upload_bytes(&self, file_name: &str, data: impl Into<Bytes>) -> Result<String> {
        let data: Bytes = data.into();
        let total = data.len() as u64;
        self.check_size(total)?;

        let _serial = self.serial.lock().await;
        let session = UploadSession::begin(&self.state);

        tracing::info!("Uploading {} ({} bytes)", file_name, total);

        let mut tracker = ProgressTracker::new(total, Arc::clone(&self.state), session.active());
        let chunks = split_chunks(data, self.chunk_bytes);
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            tracker.advance(chunk.len() as u64);
            Ok::<_, std::io::Error>(chunk)
        });

        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response: UploadResponse = self.client.post_multipart(UPLOAD_PATH, form).await?;
        let url = self.client.resolve_url(&response.url)?;

        tracing::info!("Upload complete: {}", url);

        Ok(url)
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size <= self.max_bytes {
            return Ok(());
        }

        tracing::warn!("Refusing upload of {} bytes (limit {})", size, self.max_bytes);
        self.client.notifier().notify(&Notice::warning(format!(
            "File is too large: the maximum upload size is {}.",
            format_limit(self.max_bytes)
        )));

        Err(AppError::FileTooLarge {
            size,
            limit: self.max_bytes,
        })
    }
}

/// Marks one upload as running; resets the published state when dropped,
/// whether the upload succeeded, failed or was cancelled
struct UploadSession<'a> {
    state: &'a watch::Sender<UploadState>,
    active: Arc<AtomicBool>,
}

impl<'a> UploadSession<'a> {
    fn begin(state: &'a watch::Sender<UploadState>) -> Self {
        state.send_replace(UploadState {
            uploading: true,
            progress: 0,
        });

        Self {
            state,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    fn active(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }
}

impl Drop for UploadSession<'_> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.state.send_replace(UploadState::default());
    }
}

/// Converts transferred byte counts into a non-decreasing percentage
pub struct ProgressTracker {
    total: u64,
    loaded: u64,
    state: Arc<watch::Sender<UploadState>>,
    active: Arc<AtomicBool>,
}

impl ProgressTracker {
    pub fn new(
        total: u64,
        state: Arc<watch::Sender<UploadState>>,
        active: Arc<AtomicBool>,
    ) -> Self {
        Self {
            total,
            loaded: 0,
            state,
            active,
        }
    }

    /// Record an absolute transferred byte count
    pub fn record(&mut self, loaded: u64) {
        self.loaded = self.loaded.max(loaded.min(self.total));

        // a body still draining after its upload ended must not touch the next one
        if !self.active.load(Ordering::SeqCst) {
            return;
        }

        let percent = progress_percent(self.loaded, self.total);
        self.state.send_if_modified(|state| {
            if state.uploading && percent > state.progress {
                state.progress = percent;
                true
            } else {
                false
            }
        });
    }

    pub fn advance(&mut self, bytes: u64) {
        self.record(self.loaded.saturating_add(bytes));
    }
}

/// Whole percent of `loaded` over `total`, rounded
pub fn progress_percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = loaded.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

fn split_chunks(data: Bytes, chunk_bytes: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(data.len() / chunk_bytes + 1);
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + chunk_bytes).min(data.len());
        chunks.push(data.slice(offset..end));
        offset = end;
    }
    chunks
}

fn format_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}
