//! Configuration module for readaloud.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for playback and
//! the console narrator, `AppPaths` for the platform config directory, and
//! TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, NarratorConfig, PlaybackConfig};
