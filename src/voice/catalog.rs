//! Voice ranking and the retrying catalog lookup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::VoiceConfig;
use crate::device::{DeviceClass, VoiceSource};

// ---------------------------------------------------------------------------
// VoiceDescriptor
// ---------------------------------------------------------------------------

/// Immutable snapshot of one platform voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub name: String,
    /// Language tag as reported by the platform (`"en-GB"`, `"en_US"`, …).
    pub lang: String,
    /// Synthesised on-device rather than by a network service.
    #[serde(default)]
    pub local_service: bool,
    /// The platform's own default voice.
    #[serde(default)]
    pub default: bool,
}

impl VoiceDescriptor {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            local_service: false,
            default: false,
        }
    }

    pub fn local(mut self) -> Self {
        self.local_service = true;
        self
    }

    pub fn platform_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Case-insensitive prefix match that treats `_` like `-`.
    pub fn speaks(&self, language: &str) -> bool {
        let normalise = |s: &str| s.to_ascii_lowercase().replace('_', "-");
        normalise(&self.lang).starts_with(&normalise(language))
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Which rule picked the voice.  Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SelectionTier {
    /// Named in the device-class preference list.
    Preferred,
    /// Mobile only: target language and on-device.
    LocalLanguage,
    /// Target language.
    Language,
    /// Flagged as the platform default.
    PlatformDefault,
    /// First voice in the list.
    First,
}

/// Pick the best voice in `voices` for `class`.  First match wins.
///
/// Returns `None` only for an empty list.
///
/// ```
/// use voice_turn_engine::config::VoiceConfig;
/// use voice_turn_engine::device::DeviceClass;
/// use voice_turn_engine::voice::{rank_voices, SelectionTier, VoiceDescriptor};
///
/// let voices = vec![
///     VoiceDescriptor::new("Thomas", "fr-FR"),
///     VoiceDescriptor::new("Google UK English Female", "en-GB"),
/// ];
/// let (voice, tier) = rank_voices(&voices, DeviceClass::Desktop, &VoiceConfig::default()).unwrap();
/// assert_eq!(voice.name, "Google UK English Female");
/// assert_eq!(tier, SelectionTier::Preferred);
/// ```
pub fn rank_voices<'a>(
    voices: &'a [VoiceDescriptor],
    class: DeviceClass,
    config: &VoiceConfig,
) -> Option<(&'a VoiceDescriptor, SelectionTier)> {
    for name in config.preferred(class) {
        if let Some(v) = voices.iter().find(|v| v.name.contains(name.as_str())) {
            return Some((v, SelectionTier::Preferred));
        }
    }

    if class == DeviceClass::Mobile {
        if let Some(v) = voices
            .iter()
            .find(|v| v.local_service && v.speaks(&config.language))
        {
            return Some((v, SelectionTier::LocalLanguage));
        }
    }

    if let Some(v) = voices.iter().find(|v| v.speaks(&config.language)) {
        return Some((v, SelectionTier::Language));
    }

    if let Some(v) = voices.iter().find(|v| v.default) {
        return Some((v, SelectionTier::PlatformDefault));
    }

    voices.first().map(|v| (v, SelectionTier::First))
}

// ---------------------------------------------------------------------------
// VoiceCatalog
// ---------------------------------------------------------------------------

/// Retrying voice lookup against a [`VoiceSource`].
pub struct VoiceCatalog {
    source: Arc<dyn VoiceSource>,
    config: VoiceConfig,
}

impl VoiceCatalog {
    pub fn new(source: Arc<dyn VoiceSource>, config: VoiceConfig) -> Self {
        Self { source, config }
    }

    /// Query the platform at each offset of the retry schedule and rank the
    /// first non-empty list.
    ///
    /// Resolves to `None` when every attempt saw zero voices.  Callers treat
    /// that as degraded output: replies are still delivered, just without an
    /// explicit voice.
    pub async fn select_voice(&self, class: DeviceClass) -> Option<VoiceDescriptor> {
        let schedule = self.config.retry_schedule(class);
        let started = Instant::now();

        for (attempt, offset) in schedule.iter().enumerate() {
            tokio::time::sleep_until(started + *offset).await;

            let voices = self.source.voices();
            if voices.is_empty() {
                log::debug!(
                    "voice: no voices available yet (attempt {}/{})",
                    attempt + 1,
                    schedule.len()
                );
                continue;
            }

            log::debug!("voice: platform reports {} voices", voices.len());
            if let Some((voice, tier)) = rank_voices(&voices, class, &self.config) {
                log::info!(
                    "voice: selected {} ({}) via {:?} after {} attempt(s)",
                    voice.name,
                    voice.lang,
                    tier,
                    attempt + 1
                );
                return Some(voice.clone());
            }
        }

        log::warn!(
            "voice: platform reported no voices after {} attempts; speech output degraded",
            schedule.len()
        );
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
