//! Single-flight, chunked playback on the synthesis device.
//!
//! ```text
//! start(text)
//!   ├─ blank            ──▶ Err(InvalidInput)          (no side effect)
//!   ├─ cancel previous playback
//!   ├─ unavailable/muted──▶ Skipped                    (resolves at once)
//!   └─ spawn task: for chunk in chunks
//!                     speak(chunk) ─┬─ Ok  ─┐
//!                                   └─ Err ─┴─ pause ─▶ next chunk
//!                  ──▶ Completed { chunks, failed }
//! cancel() ──▶ token.cancel() + device.cancel_all() ──▶ Cancelled
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::PlaybackConfig;
use crate::device::{DeviceProfile, SynthesisDevice};
use crate::error::EngineError;
use crate::voice::VoiceDescriptor;

use super::chunker::{split_into_chunks, SpeechChunk};
use super::quirks::build_utterance;

// ---------------------------------------------------------------------------
// PlaybackOutcome / PlaybackHandle
// ---------------------------------------------------------------------------

/// Why a playback request resolved without speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Muted,
    Unavailable,
}

/// How one playback request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every chunk was handed to the device.  `failed` of them reported an
    /// error and were skipped.
    Completed { chunks: usize, failed: usize },
    /// Superseded by a newer request or cancelled explicitly.
    Cancelled,
    /// Nothing was spoken.
    Skipped(SkipReason),
}

/// Resolves when the playback it was returned for ends.
///
/// Dropping the handle does not stop playback; use
/// [`PlaybackScheduler::cancel`] for that.
#[derive(Debug)]
pub struct PlaybackHandle {
    rx: oneshot::Receiver<PlaybackOutcome>,
}

impl PlaybackHandle {
    fn ready(outcome: PlaybackOutcome) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self { rx }
    }
}

impl Future for PlaybackHandle {
    type Output = PlaybackOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the task went away without reporting.
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(PlaybackOutcome::Cancelled))
    }
}

// ---------------------------------------------------------------------------
// PlaybackScheduler
// ---------------------------------------------------------------------------

struct Inner {
    device: Arc<dyn SynthesisDevice>,
    config: PlaybackConfig,
    profile: DeviceProfile,
    voice: Mutex<Option<VoiceDescriptor>>,
    muted: AtomicBool,
    generation: AtomicU64,
    /// Token of the playback currently in flight, tagged with its generation.
    current: Mutex<Option<(u64, CancellationToken)>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Speaks reply text chunk by chunk, one playback at a time.
///
/// Cheap to clone; all clones drive the same device.
#[derive(Clone)]
pub struct PlaybackScheduler {
    inner: Arc<Inner>,
}

impl PlaybackScheduler {
    pub fn new(
        device: Arc<dyn SynthesisDevice>,
        config: PlaybackConfig,
        profile: DeviceProfile,
    ) -> Self {
        let muted = config.muted;
        Self {
            inner: Arc::new(Inner {
                device,
                config,
                profile,
                voice: Mutex::new(None),
                muted: AtomicBool::new(muted),
                generation: AtomicU64::new(0),
                current: Mutex::new(None),
            }),
        }
    }

    /// Voice used for subsequent playbacks.  `None` leaves the choice to the
    /// device.
    pub fn set_voice(&self, voice: Option<VoiceDescriptor>) {
        *lock(&self.inner.voice) = voice;
    }

    pub fn voice(&self) -> Option<VoiceDescriptor> {
        lock(&self.inner.voice).clone()
    }

    pub fn is_muted(&self) -> bool {
        self.inner.muted.load(Ordering::SeqCst)
    }

    /// Muting silences the current playback as well.
    pub fn set_muted(&self, muted: bool) {
        self.inner.muted.store(muted, Ordering::SeqCst);
        log::info!("playback: {}", if muted { "muted" } else { "unmuted" });
        if muted {
            self.cancel();
        }
    }

    /// Flip the mute flag and return the new value.
    pub fn toggle_mute(&self) -> bool {
        let muted = !self.is_muted();
        self.set_muted(muted);
        muted
    }

    pub fn is_speaking(&self) -> bool {
        lock(&self.inner.current).is_some()
    }

    /// Speak `text` and wait for the outcome.
    pub async fn speak(&self, text: &str) -> Result<PlaybackOutcome, EngineError> {
        Ok(self.start(text)?.await)
    }

    /// Start speaking `text`, replacing whatever is playing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, text: &str) -> Result<PlaybackHandle, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "cannot speak blank text".to_string(),
            ));
        }

        self.cancel();

        if !self.inner.device.is_available() {
            log::warn!("playback: synthesis unavailable, reply not spoken");
            return Ok(PlaybackHandle::ready(PlaybackOutcome::Skipped(
                SkipReason::Unavailable,
            )));
        }
        if self.is_muted() {
            log::debug!("playback: muted, reply not spoken");
            return Ok(PlaybackHandle::ready(PlaybackOutcome::Skipped(
                SkipReason::Muted,
            )));
        }

        let limit = self.inner.config.chunk_limit(self.inner.profile.class);
        let chunks = split_into_chunks(text, limit);
        let voice = self.voice();

        let token = CancellationToken::new();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.inner.current) = Some((generation, token.clone()));

        log::debug!(
            "playback: #{generation} speaking {} chars in {} chunk(s)",
            text.chars().count(),
            chunks.len()
        );

        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = inner.play(chunks, voice, &token).await;

            {
                let mut current = lock(&inner.current);
                if matches!(current.as_ref(), Some((g, _)) if *g == generation) {
                    *current = None;
                }
            }

            log::debug!("playback: #{generation} finished: {outcome:?}");
            let _ = tx.send(outcome);
        });

        Ok(PlaybackHandle { rx })
    }

    /// Stop the playback in flight, if any.  Its handle resolves to
    /// [`PlaybackOutcome::Cancelled`].
    pub fn cancel(&self) {
        let current = lock(&self.inner.current).take();
        if let Some((generation, token)) = current {
            log::debug!("playback: cancelling #{generation}");
            token.cancel();
            self.inner.device.cancel_all();
        }
    }
}

impl Inner {
    async fn play(
        &self,
        chunks: Vec<SpeechChunk>,
        voice: Option<VoiceDescriptor>,
        token: &CancellationToken,
    ) -> PlaybackOutcome {
        let total = chunks.len();
        let mut failed = 0;

        for chunk in &chunks {
            let utterance = build_utterance(chunk, voice.as_ref(), self.profile, &self.config);

            tokio::select! {
                biased;
                _ = token.cancelled() => return PlaybackOutcome::Cancelled,
                result = self.device.speak(utterance) => {
                    if let Err(e) = result {
                        failed += 1;
                        log::warn!(
                            "playback: chunk {}/{} failed ({e}), continuing",
                            chunk.index + 1,
                            total
                        );
                    }
                }
            }

            if chunk.index + 1 < total {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return PlaybackOutcome::Cancelled,
                    _ = tokio::time::sleep(self.config.inter_chunk_pause()) => {}
                }
            }
        }

        PlaybackOutcome::Completed {
            chunks: total,
            failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
