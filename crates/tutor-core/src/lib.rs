//! Tutor Core Library
//!
//! This crate provides configuration and the application error type for the
//! offline host.

pub mod config;
pub mod error;

pub use config::OfflineConfig;
pub use error::{TutorError, TutorResult};
