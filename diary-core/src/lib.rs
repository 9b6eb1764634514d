//! Mood diary library
//!
//! Client core of the journaling app: debounced mood analysis of the
//! editor content, classified HTTP failures with user notices, and image
//! uploads with progress.

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
