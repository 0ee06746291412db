//! Configuration module for the voice turn engine.
//!
//! Provides `EngineConfig` (top-level settings), sub-configs for each engine
//! component, `AppPaths` for cross-platform directories, and TOML
//! persistence via `EngineConfig::load` / `EngineConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    CaptureConfig, DeviceConfig, EngineConfig, PlaybackConfig, TurnConfig, VoiceConfig,
    VoiceParams,
};
