//! Engine settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Timings are stored in milliseconds and exposed as [`Duration`]s.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::device::{DeviceClass, DeviceProfile, Platform};

// ---------------------------------------------------------------------------
// DeviceConfig
// ---------------------------------------------------------------------------

/// Which device profile to tune for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Mobile or desktop.
    pub class: DeviceClass,
    /// Platform family, used only for synthesis quirks.
    pub platform: Platform,
    /// When set, overrides `class` and `platform` with the classification of
    /// this user-agent string.
    pub user_agent: Option<String>,
}

impl DeviceConfig {
    /// Resolve the effective [`DeviceProfile`].
    pub fn profile(&self) -> DeviceProfile {
        match &self.user_agent {
            Some(ua) => DeviceProfile::from_user_agent(ua),
            None => DeviceProfile::new(self.class, self.platform),
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Endpoint-detection tuning for the capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Recogniser language tag.
    pub language: String,
    /// Silence after the last result event that ends a turn.
    pub pause_timeout_ms: u64,
    /// Minimum time since first detected speech before a pause may end the
    /// turn.
    pub min_speech_ms: u64,
    /// Delay before restarting a session that ended without any speech.
    pub restart_delay_ms: u64,
    /// How long to wait for more speech after a pause that came before
    /// `min_speech_ms`.  When nothing arrives the turn closes with what was
    /// said.  `0` keeps listening indefinitely.
    pub stall_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            language: "en-US".into(),
            pause_timeout_ms: 5_500,
            min_speech_ms: 1_500,
            restart_delay_ms: 300,
            stall_timeout_ms: 60_000,
        }
    }
}

impl CaptureConfig {
    pub fn pause_timeout(&self) -> Duration {
        Duration::from_millis(self.pause_timeout_ms)
    }

    pub fn min_speech(&self) -> Duration {
        Duration::from_millis(self.min_speech_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn stall_timeout(&self) -> Option<Duration> {
        (self.stall_timeout_ms > 0).then(|| Duration::from_millis(self.stall_timeout_ms))
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Rate / pitch / volume for one device class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Chunking and per-utterance parameters for the playback scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Language tag set on every utterance.
    pub language: String,
    /// Maximum characters per chunk on mobile devices.
    pub mobile_chunk_chars: usize,
    /// Maximum characters per chunk on desktop devices.
    pub desktop_chunk_chars: usize,
    /// Pause between consecutive chunks.
    pub inter_chunk_pause_ms: u64,
    /// Pitch multiplier applied to every second chunk on mobile.
    pub mobile_pitch_variation: f32,
    /// Start muted.
    pub muted: bool,
    pub mobile: VoiceParams,
    pub desktop: VoiceParams,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            language: "en-US".into(),
            mobile_chunk_chars: 120,
            desktop_chunk_chars: 200,
            inter_chunk_pause_ms: 50,
            mobile_pitch_variation: 1.01,
            muted: false,
            mobile: VoiceParams {
                rate: 0.92,
                pitch: 1.02,
                volume: 1.0,
            },
            desktop: VoiceParams {
                rate: 1.0,
                pitch: 1.0,
                volume: 1.0,
            },
        }
    }
}

impl PlaybackConfig {
    pub fn chunk_limit(&self, class: DeviceClass) -> usize {
        match class {
            DeviceClass::Mobile => self.mobile_chunk_chars,
            DeviceClass::Desktop => self.desktop_chunk_chars,
        }
    }

    pub fn params(&self, class: DeviceClass) -> VoiceParams {
        match class {
            DeviceClass::Mobile => self.mobile,
            DeviceClass::Desktop => self.desktop,
        }
    }

    pub fn inter_chunk_pause(&self) -> Duration {
        Duration::from_millis(self.inter_chunk_pause_ms)
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Voice selection preferences and the voice-loading retry schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Language prefix voices must match (e.g. `"en"`).
    pub language: String,
    /// Hand-ranked voice names for mobile, matched by substring.
    pub mobile_preferred: Vec<String>,
    /// Hand-ranked voice names for desktop, matched by substring.
    pub desktop_preferred: Vec<String>,
    /// Query offsets from the start of selection.
    pub retry_offsets_ms: Vec<u64>,
    /// Extra query offset used only on mobile.
    pub mobile_extra_retry_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            language: "en".into(),
            mobile_preferred: names(&[
                "Samantha",
                "Daniel",
                "Karen",
                "Moira",
                "Tessa",
                "Google UK English Female",
                "Google UK English Male",
                "en-GB-Standard-A",
                "en-GB-Standard-B",
                "en-GB-Standard-C",
                "en-GB-Standard-D",
                "Microsoft Hazel",
                "Microsoft Sonia",
                "Microsoft Zira",
                "English United Kingdom",
                "Microsoft Lucy",
                "Microsoft David",
            ]),
            desktop_preferred: names(&[
                "Google UK English Female",
                "Microsoft Hazel - English (United Kingdom)",
                "Microsoft Sonia",
                "Microsoft Zira - English (United States)",
                "Microsoft Lucy",
                "Microsoft David",
                "Apple Samantha",
                "Google UK English Male",
                "English United Kingdom",
            ]),
            retry_offsets_ms: vec![0, 500, 1_500],
            mobile_extra_retry_ms: 3_000,
        }
    }
}

impl VoiceConfig {
    pub fn preferred(&self, class: DeviceClass) -> &[String] {
        match class {
            DeviceClass::Mobile => &self.mobile_preferred,
            DeviceClass::Desktop => &self.desktop_preferred,
        }
    }

    /// Ordered query offsets for `class`.
    pub fn retry_schedule(&self, class: DeviceClass) -> Vec<Duration> {
        let mut offsets = self.retry_offsets_ms.clone();
        if class == DeviceClass::Mobile {
            offsets.push(self.mobile_extra_retry_ms);
        }
        offsets.sort_unstable();
        offsets.dedup();
        offsets.into_iter().map(Duration::from_millis).collect()
    }
}

// ---------------------------------------------------------------------------
// TurnConfig
// ---------------------------------------------------------------------------

/// Turn orchestration timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Delay after each reply finishes before the next one starts or
    /// capture resumes.
    pub settle_delay_ms: u64,
    /// Start listening automatically once replies have drained.
    pub auto_listen: bool,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1_000,
            auto_listen: true,
        }
    }
}

impl TurnConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// EngineConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level engine configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use voice_turn_engine::config::EngineConfig;
///
/// // Load (returns Default when file is missing)
/// let config = EngineConfig::load().unwrap();
/// assert_eq!(config.capture.pause_timeout_ms, 5_500);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub device: DeviceConfig,
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
    pub voice: VoiceConfig,
    pub turn: TurnConfig,
}

impl EngineConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(EngineConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
