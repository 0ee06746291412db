//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\voice-turn\
//!   macOS:   ~/Library/Application Support/voice-turn/
//!   Linux:   ~/.config/voice-turn/
//!
//! Data dir (topic scripts):
//!   Windows: %LOCALAPPDATA%\voice-turn\topics\
//!   macOS:   ~/Library/Application Support/voice-turn/topics/
//!   Linux:   ~/.local/share/voice-turn/topics/

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory searched for `<topic>.json` dialogue scripts.
    pub topics_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-turn";

    /// Resolves all paths using the `dirs` crate, falling back to the
    /// current directory when the platform has no standard location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            topics_dir: data_dir.join("topics"),
        }
    }

    /// Path of the script file for `topic` inside [`topics_dir`](Self::topics_dir).
    pub fn topic_file(&self, topic: &str) -> PathBuf {
        self.topics_dir.join(Path::new(topic).with_extension("json"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
