//! Test doubles for the device traits.
//!
//! All doubles run on tokio's clock so tests can use the paused runtime
//! (`#[tokio::test(start_paused = true)]`) and stay deterministic.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{
    CaptureDevice, CaptureEvent, CaptureEventSender, CaptureStartError, SynthesisDevice,
    SynthesisError, TranscriptSegment, Utterance, VoiceSource,
};
use crate::voice::VoiceDescriptor;

// ---------------------------------------------------------------------------
// MockCapture
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CaptureInner {
    sender: Option<CaptureEventSender>,
    active: bool,
    starts: usize,
    stops: usize,
    aborts: usize,
    max_active: usize,
    refuse_next: Option<CaptureStartError>,
    unsupported: bool,
}

/// Scriptable capture device.  Tests push events through [`emit`](Self::emit).
#[derive(Default)]
pub struct MockCapture {
    inner: Mutex<CaptureInner>,
}

impl MockCapture {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unsupported() -> Arc<Self> {
        let mock = Self::default();
        mock.inner.lock().unwrap().unsupported = true;
        Arc::new(mock)
    }

    /// Deliver `event` on the current session's sender.  Returns `false` when
    /// no session is open.
    pub fn emit(&self, event: CaptureEvent) -> bool {
        let inner = self.inner.lock().unwrap();
        match &inner.sender {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn partial(&self, text: &str) -> bool {
        self.emit(CaptureEvent::Result(vec![TranscriptSegment::interim(text)]))
    }

    pub fn final_(&self, text: &str) -> bool {
        self.emit(CaptureEvent::Result(vec![TranscriptSegment::final_(text)]))
    }

    /// Simulate the device ending its session on its own.
    pub fn end_session(&self) -> bool {
        let sent = self.emit(CaptureEvent::SessionEnded);
        let mut inner = self.inner.lock().unwrap();
        inner.active = false;
        inner.sender = None;
        sent
    }

    pub fn error(&self, code: &str) -> bool {
        self.emit(CaptureEvent::Error(code.to_string()))
    }

    pub fn refuse_next_start(&self, err: CaptureStartError) {
        self.inner.lock().unwrap().refuse_next = Some(err);
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().unwrap().active
    }

    pub fn starts(&self) -> usize {
        self.inner.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.inner.lock().unwrap().stops
    }

    pub fn aborts(&self) -> usize {
        self.inner.lock().unwrap().aborts
    }

    pub fn max_active(&self) -> usize {
        self.inner.lock().unwrap().max_active
    }
}

impl CaptureDevice for MockCapture {
    fn is_supported(&self) -> bool {
        !self.inner.lock().unwrap().unsupported
    }

    fn start(&self, events: CaptureEventSender) -> Result<(), CaptureStartError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.refuse_next.take() {
            return Err(err);
        }
        if inner.active {
            // A real recogniser would allow only one session; record the
            // overlap so tests can assert it never happens.
            inner.max_active = inner.max_active.max(2);
            return Err(CaptureStartError::AlreadyStarted);
        }
        inner.active = true;
        inner.starts += 1;
        inner.max_active = inner.max_active.max(1);
        let _ = events.send(CaptureEvent::SessionStarted);
        inner.sender = Some(events);
        Ok(())
    }

    fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.stops += 1;
        if let Some(tx) = inner.sender.take() {
            let _ = tx.send(CaptureEvent::SessionEnded);
        }
        inner.active = false;
    }

    fn abort(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.aborts += 1;
        inner.sender = None;
        inner.active = false;
    }
}

// ---------------------------------------------------------------------------
// MockSynthesis
// ---------------------------------------------------------------------------

/// Synthesis double that "speaks" for a fixed duration per utterance.
pub struct MockSynthesis {
    utterance_time: Duration,
    available: bool,
    voices: Vec<VoiceDescriptor>,
    started: Mutex<Vec<Utterance>>,
    finished: Mutex<Vec<String>>,
    fail_calls: Mutex<HashSet<usize>>,
    calls: AtomicUsize,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    cancels: AtomicUsize,
}

impl MockSynthesis {
    pub fn new(utterance_time: Duration) -> Arc<Self> {
        Arc::new(Self::build(utterance_time, true))
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self::build(Duration::from_millis(10), false))
    }

    /// Make the `n`-th call to `speak` (0-based) fail.
    pub fn failing_on(utterance_time: Duration, calls: &[usize]) -> Arc<Self> {
        let mock = Self::build(utterance_time, true);
        mock.fail_calls.lock().unwrap().extend(calls.iter().copied());
        Arc::new(mock)
    }

    fn build(utterance_time: Duration, available: bool) -> Self {
        Self {
            utterance_time,
            available,
            voices: vec![VoiceDescriptor::new("Mock Voice", "en-US")],
            started: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
            fail_calls: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Texts of every utterance that was started, in order.
    pub fn started_texts(&self) -> Vec<String> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }

    pub fn started(&self) -> Vec<Utterance> {
        self.started.lock().unwrap().clone()
    }

    /// Texts of every utterance that ran to completion, in order.
    pub fn finished_texts(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

/// Decrements the active counter even when the speak future is dropped.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl VoiceSource for MockSynthesis {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.clone()
    }
}

#[async_trait]
impl SynthesisDevice for MockSynthesis {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SynthesisError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let text = utterance.text.clone();
        self.started.lock().unwrap().push(utterance);

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        let _guard = ActiveGuard(Arc::clone(&self.active));

        tokio::time::sleep(self.utterance_time).await;

        if self.fail_calls.lock().unwrap().contains(&call) {
            return Err(SynthesisError::Failed(format!("mock failure on call {call}")));
        }
        self.finished.lock().unwrap().push(text);
        Ok(())
    }

    fn cancel_all(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// TimedVoices
// ---------------------------------------------------------------------------

/// Voice source that reports nothing until `ready_after` has elapsed.
pub struct TimedVoices {
    created: Instant,
    ready_after: Duration,
    voices: Vec<VoiceDescriptor>,
    calls: AtomicUsize,
}

impl TimedVoices {
    pub fn new(ready_after: Duration, voices: Vec<VoiceDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            created: Instant::now(),
            ready_after,
            voices,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VoiceSource for TimedVoices {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.created.elapsed() >= self.ready_after {
            self.voices.clone()
        } else {
            Vec::new()
        }
    }
}
