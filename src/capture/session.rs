//! Capture session: a device session plus silence-based endpoint detection.
//!
//! [`CaptureSession`] is a cheap handle; the work happens in a driver task
//! that owns the device session, the transcript and every timer:
//!
//! ```text
//!  start() / stop() ──Command──▶ ┌──────────────┐ ──CaptureOutput──▶ consumer
//!                                │ Driver task  │
//!  CaptureDevice ──CaptureEvent─▶│  pause timer │
//!                                │  stall timer │
//!                                │  restart     │
//!                                └──────────────┘
//! ```
//!
//! Only the driver mutates the transcript, so events are handled strictly in
//! delivery order.

use std::future::pending;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant, Sleep};

use crate::config::CaptureConfig;
use crate::device::{CaptureDevice, CaptureEvent, CaptureStartError, TranscriptSegment};

use super::error::CaptureErrorKind;
use super::state::{CaptureState, SessionState};

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

/// What a capture session reports to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutput {
    /// The microphone opened after an explicit `start`.
    Started,
    /// Live transcript for display.
    Interim { interim: String, final_text: String },
    /// Endpoint detected; the user's complete turn.
    Utterance(String),
    /// Closed by an explicit `stop`.
    Stopped,
    /// The session failed and is back to `Idle`.
    Error(CaptureErrorKind),
}

#[derive(Debug)]
enum Command {
    Start,
    Stop,
}

/// Handle to a running capture session.
///
/// Dropping every handle shuts the driver down and aborts the device.
#[derive(Clone)]
pub struct CaptureSession {
    commands: mpsc::UnboundedSender<Command>,
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureSession {
    /// Spawn the driver task.  Must be called from within a tokio runtime.
    pub fn spawn(
        device: Arc<dyn CaptureDevice>,
        config: CaptureConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureOutput>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(CaptureState::Idle));

        let driver = Driver {
            device,
            config,
            shared: Arc::clone(&state),
            session: SessionState::default(),
            output: out_tx,
            events: None,
            pause: None,
            stall: None,
            restart: None,
        };
        tokio::spawn(driver.run(cmd_rx));

        (
            Self {
                commands: cmd_tx,
                state,
            },
            out_rx,
        )
    }

    /// Open the microphone.  An already running device session is aborted
    /// first.
    pub fn start(&self) {
        let _ = self.commands.send(Command::Start);
    }

    /// Close the microphone without emitting an utterance.
    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    pub fn state(&self) -> CaptureState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

type Timer = Option<Pin<Box<Sleep>>>;

struct Driver {
    device: Arc<dyn CaptureDevice>,
    config: CaptureConfig,
    shared: Arc<Mutex<CaptureState>>,
    session: SessionState,
    output: mpsc::UnboundedSender<CaptureOutput>,
    /// Events of the current device session; `None` when no session is open.
    events: Option<mpsc::UnboundedReceiver<CaptureEvent>>,
    pause: Timer,
    stall: Timer,
    restart: Timer,
}

async fn next_event(
    events: &mut Option<mpsc::UnboundedReceiver<CaptureEvent>>,
) -> Option<CaptureEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

async fn fire(timer: &mut Timer) {
    match timer {
        Some(t) => t.as_mut().await,
        None => pending().await,
    }
}

fn timer(after: Duration) -> Timer {
    Some(Box::pin(sleep(after)))
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Start) => self.handle_start(),
                    Some(Command::Stop) => self.handle_stop(true),
                    None => break,
                },
                event = next_event(&mut self.events) => match event {
                    Some(event) => self.handle_event(event),
                    // Sender dropped without a SessionEnded.
                    None => self.handle_event(CaptureEvent::SessionEnded),
                },
                _ = fire(&mut self.pause) => {
                    self.pause = None;
                    self.on_pause_elapsed();
                }
                _ = fire(&mut self.stall) => {
                    self.stall = None;
                    log::info!("capture: no speech since an early pause, closing turn");
                    self.finish();
                }
                _ = fire(&mut self.restart) => {
                    self.restart = None;
                    self.open_device(false);
                }
            }
        }

        log::debug!("capture: all handles dropped, shutting down");
        self.handle_stop(false);
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn handle_start(&mut self) {
        if !self.device.is_supported() {
            log::error!("capture: no capture device on this platform");
            self.fail(CaptureErrorKind::Unsupported);
            return;
        }

        if self.events.is_some() {
            log::debug!("capture: aborting previous device session before start");
            self.close_device(true);
        }
        self.clear_timers();
        self.open_device(true);
    }

    fn handle_stop(&mut self, announce: bool) {
        let was_active = self.session.state.is_listening() || self.restart.is_some();
        self.clear_timers();
        self.close_device(true);
        self.session.reset(CaptureState::Idle);
        self.publish();
        if announce && was_active {
            log::debug!("capture: stopped");
            self.emit(CaptureOutput::Stopped);
        }
    }

    // -----------------------------------------------------------------------
    // Device session
    // -----------------------------------------------------------------------

    /// Start a fresh device session.  `announce` is `false` for silent
    /// restarts.
    fn open_device(&mut self, announce: bool) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.session.reset(CaptureState::Listening);

        match self.device.start(tx) {
            Ok(()) => {
                self.events = Some(rx);
                self.publish();
                if announce {
                    log::info!("capture: listening");
                    self.emit(CaptureOutput::Started);
                } else {
                    log::debug!("capture: restarted");
                }
            }
            Err(CaptureStartError::AlreadyStarted) => {
                log::warn!("capture: device already running, aborting and retrying");
                self.device.abort();
                self.restart = timer(self.config.restart_delay());
                self.publish();
                if announce {
                    self.emit(CaptureOutput::Started);
                }
            }
            Err(CaptureStartError::Unsupported) => self.fail(CaptureErrorKind::Unsupported),
            Err(CaptureStartError::Other(msg)) => {
                log::error!("capture: failed to start: {msg}");
                self.fail(CaptureErrorKind::Other(msg));
            }
        }
    }

    /// Drop the event receiver first so nothing from the old session leaks
    /// into the next one.
    fn close_device(&mut self, abort: bool) {
        if self.events.take().is_some() {
            if abort {
                self.device.abort();
            } else {
                self.device.stop();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    fn handle_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::SessionStarted => log::debug!("capture: device session started"),
            CaptureEvent::Result(segments) => self.on_result(&segments),
            CaptureEvent::SessionEnded => self.on_session_ended(),
            CaptureEvent::Error(code) => self.on_error(&code),
        }
    }

    fn on_result(&mut self, segments: &[TranscriptSegment]) {
        if !self.session.state.is_listening() {
            return;
        }

        let effect = self.session.apply_result(segments, Instant::now());
        self.pause = None;
        self.stall = None;

        if effect.first_speech {
            log::debug!("capture: speech detected");
        }
        if effect.arm_pause {
            self.pause = timer(self.config.pause_timeout());
        }

        self.publish();
        self.emit(CaptureOutput::Interim {
            interim: self.session.interim_text.clone(),
            final_text: self.session.final_text.clone(),
        });
    }

    fn on_session_ended(&mut self) {
        self.events = None;
        if !self.session.state.is_listening() {
            return;
        }

        if self.session.speech_detected && self.session.utterance_text().is_some() {
            self.finish();
        } else {
            log::debug!("capture: session ended without speech, restarting");
            self.schedule_restart();
        }
    }

    fn on_error(&mut self, code: &str) {
        let kind = CaptureErrorKind::from_code(code);

        if kind == CaptureErrorKind::Aborted && self.session.state.is_listening() {
            log::debug!("capture: device session aborted, restarting");
            self.close_device(true);
            self.schedule_restart();
            return;
        }

        self.fail(kind);
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    fn on_pause_elapsed(&mut self) {
        let spoken = self.session.speech_duration(Instant::now());
        if spoken >= self.config.min_speech() {
            log::debug!("capture: pause after {spoken:?} of speech, closing turn");
            self.finish();
        } else {
            log::debug!("capture: pause after only {spoken:?} of speech, still listening");
            self.session.state = CaptureState::Listening;
            if let Some(after) = self.config.stall_timeout() {
                self.stall = timer(after);
            }
            self.publish();
        }
    }

    fn schedule_restart(&mut self) {
        self.pause = None;
        self.stall = None;
        self.session.reset(CaptureState::Listening);
        self.restart = timer(self.config.restart_delay());
        self.publish();
    }

    fn clear_timers(&mut self) {
        self.pause = None;
        self.stall = None;
        self.restart = None;
    }

    // -----------------------------------------------------------------------
    // Outcomes
    // -----------------------------------------------------------------------

    /// Close the turn and emit what was said.
    fn finish(&mut self) {
        self.clear_timers();
        self.close_device(false);

        match self.session.utterance_text() {
            Some(text) => {
                self.session.reset(CaptureState::Ended);
                self.publish();
                log::info!("capture: utterance {:?}", text);
                self.emit(CaptureOutput::Utterance(text));
            }
            None => self.schedule_restart(),
        }
    }

    fn fail(&mut self, kind: CaptureErrorKind) {
        self.clear_timers();
        self.close_device(true);

        self.session.reset(CaptureState::Errored);
        self.publish();
        self.session.state = CaptureState::Idle;
        self.publish();

        match &kind {
            CaptureErrorKind::NoSpeech => log::debug!("capture: no speech detected"),
            other => log::warn!("capture: error {other:?}"),
        }
        self.emit(CaptureOutput::Error(kind));
    }

    fn publish(&self) {
        *self.shared.lock().unwrap_or_else(PoisonError::into_inner) = self.session.state;
    }

    fn emit(&self, output: CaptureOutput) {
        let _ = self.output.send(output);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::MockCapture;

    fn config() -> CaptureConfig {
        CaptureConfig::default()
    }

    fn spawn(
        mock: &Arc<MockCapture>,
        config: CaptureConfig,
    ) -> (CaptureSession, mpsc::UnboundedReceiver<CaptureOutput>) {
        CaptureSession::spawn(Arc::clone(mock) as Arc<dyn CaptureDevice>, config)
    }

    /// Let the driver process everything queued so far.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    async fn ms(n: u64) {
        tokio::time::sleep(Duration::from_millis(n)).await;
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<CaptureOutput>) -> Vec<CaptureOutput> {
        let mut out = Vec::new();
        while let Ok(o) = rx.try_recv() {
            out.push(o);
        }
        out
    }

    fn utterances(outputs: &[CaptureOutput]) -> Vec<String> {
        outputs
            .iter()
            .filter_map(|o| match o {
                CaptureOutput::Utterance(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn start_opens_device_and_announces() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());

        session.start();
        settle().await;

        assert!(mock.is_active());
        assert_eq!(session.state(), CaptureState::Listening);
        assert_eq!(drain(&mut rx), vec![CaptureOutput::Started]);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_after_enough_speech_closes_the_turn() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;

        mock.partial("I play");
        ms(1_000).await;
        mock.final_("I play football");
        ms(5_499).await;
        assert!(utterances(&drain(&mut rx)).is_empty());
        assert_eq!(session.state(), CaptureState::EndpointPending);

        ms(2).await;
        let out = drain(&mut rx);
        assert_eq!(utterances(&out), vec!["I play football".to_string()]);
        assert_eq!(session.state(), CaptureState::Ended);
        assert_eq!(mock.stops(), 1);
        assert!(!mock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn every_result_rearms_the_pause_timer() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;

        for word in ["one", "one two", "one two three", "one two three four"] {
            mock.partial(word);
            ms(5_000).await;
        }
        assert!(utterances(&drain(&mut rx)).is_empty());

        ms(600).await;
        assert_eq!(
            utterances(&drain(&mut rx)),
            vec!["one two three four".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_before_minimum_speech_keeps_listening() {
        let mock = MockCapture::new();
        let mut cfg = config();
        cfg.pause_timeout_ms = 1_000;
        cfg.min_speech_ms = 1_500;
        let (session, mut rx) = spawn(&mock, cfg);
        session.start();
        settle().await;

        mock.partial("hi");
        ms(1_100).await;
        assert_eq!(session.state(), CaptureState::Listening);
        assert!(utterances(&drain(&mut rx)).is_empty());

        // Not re-armed on its own.
        ms(5_000).await;
        assert!(utterances(&drain(&mut rx)).is_empty());

        mock.partial("hi there");
        ms(1_001).await;
        assert_eq!(utterances(&drain(&mut rx)), vec!["hi there".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_session_restarts_after_delay() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;
        drain(&mut rx);

        mock.end_session();
        ms(290).await;
        assert_eq!(mock.starts(), 1);

        ms(20).await;
        assert_eq!(mock.starts(), 2);
        assert!(mock.is_active());
        assert_eq!(session.state(), CaptureState::Listening);
        // Neither an utterance nor an error, and no second Started.
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn device_end_with_speech_emits_interim_when_nothing_final() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;

        mock.partial("see you");
        settle().await;
        mock.end_session();
        settle().await;

        assert_eq!(utterances(&drain(&mut rx)), vec!["see you".to_string()]);
        assert_eq!(session.state(), CaptureState::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_resets_to_idle_without_restart() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;
        drain(&mut rx);

        mock.partial("hello");
        settle().await;
        mock.error("not-allowed");
        settle().await;

        let out = drain(&mut rx);
        assert!(out.contains(&CaptureOutput::Error(CaptureErrorKind::PermissionDenied)));
        assert!(utterances(&out).is_empty());
        assert_eq!(session.state(), CaptureState::Idle);

        ms(10_000).await;
        assert_eq!(mock.starts(), 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn no_speech_error_is_reported() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;
        drain(&mut rx);

        mock.error("no-speech");
        settle().await;

        assert_eq!(
            drain(&mut rx),
            vec![CaptureOutput::Error(CaptureErrorKind::NoSpeech)]
        );
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_while_listening_restarts_silently() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;
        drain(&mut rx);

        mock.error("aborted");
        ms(310).await;

        assert!(drain(&mut rx).is_empty());
        assert_eq!(mock.starts(), 2);
        assert_eq!(session.state(), CaptureState::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_active_keeps_a_single_device_session() {
        let mock = MockCapture::new();
        let (session, _rx) = spawn(&mock, config());

        session.start();
        session.start();
        settle().await;

        assert_eq!(mock.starts(), 2);
        assert_eq!(mock.aborts(), 1);
        assert_eq!(mock.max_active(), 1);
        assert!(mock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn already_started_device_is_aborted_and_retried() {
        let mock = MockCapture::new();
        mock.refuse_next_start(CaptureStartError::AlreadyStarted);
        let (session, _rx) = spawn(&mock, config());

        session.start();
        settle().await;
        assert_eq!(mock.starts(), 0);
        assert_eq!(mock.aborts(), 1);

        ms(300).await;
        assert_eq!(mock.starts(), 1);
        assert!(mock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_device_reports_error() {
        let mock = MockCapture::unsupported();
        let (session, mut rx) = spawn(&mock, config());

        session.start();
        settle().await;

        assert_eq!(
            drain(&mut rx),
            vec![CaptureOutput::Error(CaptureErrorKind::Unsupported)]
        );
        assert_eq!(mock.starts(), 0);
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_pending_turn() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;
        drain(&mut rx);

        mock.final_("half a sentence");
        settle().await;
        session.stop();
        ms(10_000).await;

        let out = drain(&mut rx);
        assert!(utterances(&out).is_empty());
        assert_eq!(out.last(), Some(&CaptureOutput::Stopped));
        assert_eq!(session.state(), CaptureState::Idle);
        assert!(!mock.is_active());
        assert_eq!(mock.starts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn continuous_speech_is_never_cut_off() {
        let mock = MockCapture::new();
        let (session, mut rx) = spawn(&mock, config());
        session.start();
        settle().await;

        let mut text = String::from("la");
        for _ in 0..70 {
            mock.partial(&text);
            text.push_str(" la");
            ms(1_000).await;
        }

        assert!(utterances(&drain(&mut rx)).is_empty());
        assert_eq!(session.state(), CaptureState::EndpointPending);
        assert!(mock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_turn_closes_after_stall_timeout() {
        let mock = MockCapture::new();
        let mut cfg = config();
        cfg.pause_timeout_ms = 1_000;
        cfg.min_speech_ms = 1_500;
        cfg.stall_timeout_ms = 3_000;
        let (session, mut rx) = spawn(&mock, cfg);
        session.start();
        settle().await;

        mock.partial("hi");
        ms(1_100).await;
        assert_eq!(session.state(), CaptureState::Listening);

        ms(2_000).await;
        assert!(utterances(&drain(&mut rx)).is_empty());

        ms(1_000).await;
        assert_eq!(utterances(&drain(&mut rx)), vec!["hi".to_string()]);
        assert_eq!(session.state(), CaptureState::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn speech_after_early_pause_cancels_stall_timer() {
        let mock = MockCapture::new();
        let mut cfg = config();
        cfg.pause_timeout_ms = 1_000;
        cfg.min_speech_ms = 1_500;
        cfg.stall_timeout_ms = 3_000;
        let (session, mut rx) = spawn(&mock, cfg);
        session.start();
        settle().await;

        mock.partial("hi");
        ms(1_100).await;
        mock.partial("hi there");
        ms(1_100).await;
        assert_eq!(utterances(&drain(&mut rx)), vec!["hi there".to_string()]);

        ms(5_000).await;
        assert!(utterances(&drain(&mut rx)).is_empty());
    }
}
