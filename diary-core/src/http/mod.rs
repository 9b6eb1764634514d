//! HTTP layer
//!
//! - `client`: the shared transport with centralized failure interception
//! - `classify`: pure mapping from raw failures to `ClassifiedError` and notices
//! - `notify`: notice dispatch, decoupled from classification

pub mod classify;
pub mod client;
pub mod notify;

pub use classify::{classify, describe, RawFailure};
pub use client::RequestClient;
pub use notify::{ChannelNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
