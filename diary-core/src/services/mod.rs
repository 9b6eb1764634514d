//! Services module
//!
//! Business logic that sits between the editor front-end and the request client.

pub mod analysis;
pub mod debounce;
pub mod editor;
pub mod uploads;

pub use analysis::{AnalysisService, MoodAnalyzer};
pub use debounce::{DebounceController, DebounceSettings};
pub use editor::{BatchReport, DiaryEditor};
pub use uploads::UploadService;
