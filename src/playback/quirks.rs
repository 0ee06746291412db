//! Per-utterance parameters and platform workarounds.
//!
//! Nothing here touches sequencing; it only shapes the [`Utterance`] handed to
//! the synthesis device for one chunk.

use crate::config::PlaybackConfig;
use crate::device::{DeviceClass, DeviceProfile, Platform, Utterance};
use crate::voice::VoiceDescriptor;

use super::chunker::SpeechChunk;

/// Build the utterance for `chunk`, including platform quirks.
pub fn build_utterance(
    chunk: &SpeechChunk,
    voice: Option<&VoiceDescriptor>,
    profile: DeviceProfile,
    config: &PlaybackConfig,
) -> Utterance {
    let params = config.params(profile.class);
    let mut pitch = params.pitch;

    // Every second chunk on mobile gets a slight lift so long replies sound
    // less monotone.
    if profile.class == DeviceClass::Mobile && (chunk.index + 1) % 2 == 0 {
        pitch *= config.mobile_pitch_variation;
    }

    let mut utterance = Utterance {
        text: chunk.text.clone(),
        voice: voice.cloned(),
        lang: config.language.clone(),
        rate: params.rate,
        pitch,
        volume: params.volume,
    };
    apply_platform_quirks(&mut utterance, profile.platform, voice);
    utterance
}

/// iOS: clamp rate and pitch into the accepted range and pad the text so the
/// last syllable is not clipped.  Android: clamp rate and re-assert the voice.
pub fn apply_platform_quirks(
    utterance: &mut Utterance,
    platform: Platform,
    voice: Option<&VoiceDescriptor>,
) {
    match platform {
        Platform::Ios => {
            utterance.rate = utterance.rate.clamp(0.1, 1.0);
            utterance.pitch = utterance.pitch.clamp(0.5, 2.0);
            utterance.text.push(' ');
        }
        Platform::Android => {
            utterance.rate = utterance.rate.clamp(0.1, 1.0);
            // Only reachable for utterances built outside `build_utterance`,
            // e.g. one a device handed back without its voice.
            if utterance.voice.is_none() {
                if let Some(v) = voice {
                    log::debug!("playback: re-applying voice {} for android", v.name);
                    utterance.voice = Some(v.clone());
                }
            }
        }
        Platform::Other => {}
    }
}
