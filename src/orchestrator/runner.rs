//! Turn orchestrator: alternates between listening and speaking.
//!
//! [`TurnOrchestrator`] owns the outbound queue and is the only caller of the
//! dialogue provider.  It reacts to three sources in one `select!` loop:
//!
//! ```text
//! TurnCommand (mpsc)  ──▶ ┌───────────────────┐ ──EngineEvent──▶ UI
//! CaptureOutput       ──▶ │ TurnOrchestrator  │
//! drain step          ──▶ └───────────────────┘
//!
//! Utterance(text)
//!   └─▶ dialogue.process_utterance ─▶ enqueue reply            [Replying]
//!         └─▶ capture.stop, pop ─▶ speak ─▶ settle ─▶ pop …
//!               └─▶ queue empty ─▶ capture.start              [WaitingForUser]
//!
//! Error(NoSpeech) while WaitingForUser
//!   └─▶ enqueue dialogue.fallback(current_step)                [Replying]
//! ```
//!
//! At most one reply is in flight: the drain is a single state
//! ([`DrainState`]) polled by the loop, never a spawned task per reply.

use std::future::pending;
use std::pin::Pin;
use std::sync::{Arc, PoisonError};

use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};

use crate::capture::{CaptureOutput, CaptureSession};
use crate::config::TurnConfig;
use crate::dialogue::DialogueStepProvider;
use crate::error::EngineError;
use crate::playback::{PlaybackHandle, PlaybackOutcome, PlaybackScheduler, SkipReason};

use super::events::{EngineEvent, TurnCommand};
use super::queue::OutboundQueue;
use super::state::{
    new_shared_conversation, ConversationState, SharedConversation, TurnContext, TurnState,
    TurnTrigger,
};

// ---------------------------------------------------------------------------
// Drain
// ---------------------------------------------------------------------------

enum DrainState {
    Idle,
    Speaking(PlaybackHandle),
    Settling(Pin<Box<Sleep>>),
}

enum DrainStep {
    Spoke(PlaybackOutcome),
    Settled,
}

async fn drain_step(drain: &mut DrainState) -> DrainStep {
    match drain {
        DrainState::Idle => pending().await,
        DrainState::Speaking(handle) => DrainStep::Spoke(handle.await),
        DrainState::Settling(delay) => {
            delay.as_mut().await;
            DrainStep::Settled
        }
    }
}

// ---------------------------------------------------------------------------
// TurnOrchestrator
// ---------------------------------------------------------------------------

/// Drives one conversation.
///
/// Create with [`TurnOrchestrator::new`], then spawn [`run`](Self::run).
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_turn_engine::capture::CaptureSession;
/// use voice_turn_engine::config::EngineConfig;
/// use voice_turn_engine::dialogue::GenericDialogue;
/// use voice_turn_engine::orchestrator::{TurnCommand, TurnOrchestrator};
/// use voice_turn_engine::playback::PlaybackScheduler;
/// # use voice_turn_engine::device::{CaptureDevice, SynthesisDevice};
/// # fn devices() -> (Arc<dyn CaptureDevice>, Arc<dyn SynthesisDevice>) { unimplemented!() }
///
/// # async fn example() {
/// let config = EngineConfig::default();
/// let (mic, speaker) = devices();
///
/// let (capture, capture_rx) = CaptureSession::spawn(mic, config.capture.clone());
/// let playback = PlaybackScheduler::new(speaker, config.playback.clone(), config.device.profile());
/// let (orchestrator, mut events) = TurnOrchestrator::new(
///     Box::new(GenericDialogue::new("Travel")),
///     capture,
///     capture_rx,
///     playback,
///     config.turn.clone(),
/// );
///
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// tokio::spawn(orchestrator.run(rx));
/// tx.send(TurnCommand::Begin).await.unwrap();
/// while let Some(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// # }
/// ```
pub struct TurnOrchestrator {
    dialogue: Box<dyn DialogueStepProvider>,
    capture: CaptureSession,
    capture_rx: mpsc::UnboundedReceiver<CaptureOutput>,
    playback: PlaybackScheduler,
    config: TurnConfig,
    state: SharedConversation,
    events: mpsc::UnboundedSender<EngineEvent>,
    queue: OutboundQueue,
    drain: DrainState,
    /// Open the microphone once the queue drains.
    resume_capture: bool,
    context: Option<TurnContext>,
    next_turn: u64,
}

impl TurnOrchestrator {
    pub fn new(
        dialogue: Box<dyn DialogueStepProvider>,
        capture: CaptureSession,
        capture_rx: mpsc::UnboundedReceiver<CaptureOutput>,
        playback: PlaybackScheduler,
        config: TurnConfig,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let state = new_shared_conversation();
        {
            let mut st = state.lock().unwrap_or_else(PoisonError::into_inner);
            st.step = dialogue.current_step();
            st.muted = playback.is_muted();
        }

        let orchestrator = Self {
            dialogue,
            capture,
            capture_rx,
            playback,
            config,
            state,
            events,
            queue: OutboundQueue::new(),
            drain: DrainState::Idle,
            resume_capture: false,
            context: None,
            next_turn: 1,
        };
        (orchestrator, events_rx)
    }

    /// Handle to the conversation snapshot.
    pub fn shared_state(&self) -> SharedConversation {
        Arc::clone(&self.state)
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until [`TurnCommand::End`] arrives or `commands` is closed.
    pub async fn run(mut self, mut commands: mpsc::Receiver<TurnCommand>) {
        log::info!("turn: orchestrator running");

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(TurnCommand::End) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(output) = self.capture_rx.recv() => self.handle_capture(output),
                step = drain_step(&mut self.drain) => self.advance_drain(step),
            }
        }

        self.teardown();
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn handle_command(&mut self, cmd: TurnCommand) {
        log::debug!("turn: command {cmd:?}");
        match cmd {
            TurnCommand::Begin => {
                let prompt = self.dialogue.initial_prompt();
                self.open_turn(TurnTrigger::Greeting);
                self.submit(prompt, self.config.auto_listen);
            }
            TurnCommand::EnqueueReply(text) => {
                if self.context.is_none() {
                    self.open_turn(TurnTrigger::External);
                }
                self.submit(text, self.config.auto_listen);
            }
            TurnCommand::Utterance(text) => self.handle_utterance(text),
            TurnCommand::Repeat => {
                let last = self.with_state(|st| st.last_reply.clone());
                match last {
                    Some(text) => {
                        self.open_turn(TurnTrigger::Repeat);
                        self.submit(text, self.config.auto_listen);
                    }
                    None => log::debug!("turn: nothing to repeat"),
                }
            }
            TurnCommand::StartListening => {
                self.with_state(|st| st.error = None);
                if matches!(self.drain, DrainState::Idle) {
                    self.capture.start();
                } else {
                    self.resume_capture = true;
                }
            }
            TurnCommand::StopListening => {
                self.resume_capture = false;
                self.capture.stop();
            }
            TurnCommand::ToggleMute => {
                let muted = self.playback.toggle_mute();
                self.with_state(|st| st.muted = muted);
            }
            // Handled by the run loop.
            TurnCommand::End => {}
        }
    }

    // -----------------------------------------------------------------------
    // Capture outputs
    // -----------------------------------------------------------------------

    fn handle_capture(&mut self, output: CaptureOutput) {
        match output {
            CaptureOutput::Started => {
                self.with_state(|st| st.listening = true);
                self.emit(EngineEvent::ListeningStarted);
            }
            CaptureOutput::Stopped => {
                self.with_state(|st| st.listening = false);
                self.emit(EngineEvent::ListeningStopped);
            }
            CaptureOutput::Interim {
                interim,
                final_text,
            } => self.emit(EngineEvent::InterimTranscript {
                interim,
                final_text,
            }),
            CaptureOutput::Utterance(text) => {
                self.with_state(|st| st.listening = false);
                self.emit(EngineEvent::ListeningStopped);
                self.handle_utterance(text);
            }
            CaptureOutput::Error(kind) => {
                self.with_state(|st| st.listening = false);
                self.handle_capture_error(EngineError::from(kind));
            }
        }
    }

    fn handle_utterance(&mut self, text: String) {
        log::info!("turn: learner said {:?}", text);
        self.emit(EngineEvent::UserUtterance(text.clone()));

        let reply = self.dialogue.process_utterance(&text);
        let step = self.dialogue.current_step();
        self.with_state(|st| {
            st.step = step;
            st.last_utterance = Some(text.clone());
        });

        self.open_turn(TurnTrigger::Utterance(text));
        self.submit(reply, self.config.auto_listen);
    }

    fn handle_capture_error(&mut self, error: EngineError) {
        match error {
            EngineError::NoSpeechDetected => {
                if self.turn() != TurnState::WaitingForUser {
                    log::debug!("turn: ignoring no-speech outside the learner's turn");
                    return;
                }
                let step = self.dialogue.current_step();
                let line = self.dialogue.fallback(step);
                log::info!("turn: nothing heard at step {step}, using fallback");
                self.emit(EngineEvent::ListeningStopped);
                self.open_turn(TurnTrigger::Fallback { step });
                self.submit(line, true);
            }
            e if e.is_user_visible() => {
                log::error!("turn: capture failed: {e}");
                self.resume_capture = false;
                self.with_state(|st| st.error = Some(e.clone()));
                self.emit(EngineEvent::ListeningStopped);
                self.emit(EngineEvent::error(e));
            }
            e => log::debug!("turn: recoverable capture error {e:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Outbound queue
    // -----------------------------------------------------------------------

    fn open_turn(&mut self, trigger: TurnTrigger) {
        let id = self.next_turn;
        self.next_turn += 1;
        log::debug!("turn: #{id} opened by {trigger:?}");
        self.context = Some(TurnContext::new(id, trigger));
    }

    /// Queue `text`; blank replies are dropped with a warning.
    fn submit(&mut self, text: String, resume: bool) {
        if let Err(e) = self.enqueue_reply(text) {
            log::warn!("turn: {e}");
            return;
        }
        self.resume_capture |= resume;
    }

    /// Append a reply and start draining if nothing is being spoken.
    pub fn enqueue_reply(&mut self, text: String) -> Result<(), EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::InvalidInput("reply is blank".to_string()));
        }

        self.queue.push(text);
        if matches!(self.drain, DrainState::Idle) {
            self.set_turn(TurnState::Replying);
            self.capture.stop();
            self.speak_next();
        }
        Ok(())
    }

    fn speak_next(&mut self) {
        while let Some(text) = self.queue.pop() {
            self.emit(EngineEvent::ReplyReady(text.clone()));
            self.with_state(|st| {
                st.last_reply = Some(text.clone());
                st.replies_spoken += 1;
            });
            if let Some(ctx) = self.context.as_mut() {
                ctx.replies += 1;
            }

            match self.playback.start(&text) {
                Ok(handle) => {
                    self.drain = DrainState::Speaking(handle);
                    return;
                }
                Err(e) => log::warn!("turn: reply not spoken: {e}"),
            }
        }
        self.finish_drain();
    }

    fn advance_drain(&mut self, step: DrainStep) {
        match step {
            DrainStep::Spoke(outcome) => {
                match outcome {
                    PlaybackOutcome::Completed { failed, .. } if failed > 0 => {
                        log::warn!("turn: reply finished with {failed} failed chunk(s)")
                    }
                    PlaybackOutcome::Skipped(SkipReason::Unavailable) => {
                        log::debug!("turn: {}", EngineError::SynthesisUnavailable)
                    }
                    other => log::debug!("turn: reply finished: {other:?}"),
                }
                self.drain = DrainState::Settling(Box::pin(sleep(self.config.settle_delay())));
            }
            DrainStep::Settled => {
                self.drain = DrainState::Idle;
                self.speak_next();
            }
        }
    }

    fn finish_drain(&mut self) {
        self.drain = DrainState::Idle;
        if let Some(ctx) = self.context.take() {
            log::debug!("turn: {} in {:?}", ctx.summary(), ctx.opened.elapsed());
        }
        self.set_turn(TurnState::WaitingForUser);

        if std::mem::take(&mut self.resume_capture) {
            self.capture.start();
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    fn teardown(&mut self) {
        log::info!("turn: ending conversation");
        self.capture.stop();
        self.playback.cancel();
        self.queue.clear();
        self.drain = DrainState::Idle;
        self.resume_capture = false;
        self.context = None;
        self.with_state(|st| st.listening = false);
        self.set_turn(TurnState::Ended);
        self.emit(EngineEvent::Ended);
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn with_state<R>(&self, f: impl FnOnce(&mut ConversationState) -> R) -> R {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut st)
    }

    fn turn(&self) -> TurnState {
        self.with_state(|st| st.turn)
    }

    fn set_turn(&self, turn: TurnState) {
        let changed = self.with_state(|st| std::mem::replace(&mut st.turn, turn) != turn);
        if changed {
            log::debug!("turn: state → {}", turn.label());
            self.emit(EngineEvent::StateChanged(turn));
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CaptureConfig, PlaybackConfig};
    use crate::device::mock::{MockCapture, MockSynthesis};
    use crate::device::{CaptureDevice, DeviceProfile};
    use crate::dialogue::{ScriptedDialogue, TopicScript};
    use std::time::Duration;
    use tokio::task::JoinHandle;

    const SPEAK: Duration = Duration::from_secs(1);

    const GREETING: &str = "Hi! What hobbies do you enjoy?";
    const HOBBY_FALLBACK: &str = "I didn't catch your hobbies.";

    fn dialogue() -> Box<dyn DialogueStepProvider> {
        let script = TopicScript::from_json(
            r#"{
                "name": "Free Time",
                "greeting": "Hi! What hobbies do you enjoy?",
                "questions": ["What hobbies do you enjoy?", "Do you play any sports?"],
                "steps": [
                    {
                        "rules": [{ "keywords": ["read"], "reply": "Reading is wonderful!" }],
                        "default": "That sounds great!"
                    },
                    { "default": "Nice way to stay active!" }
                ],
                "fallbacks": ["I didn't catch your hobbies.", "I didn't hear your sport."]
            }"#,
        )
        .unwrap();
        Box::new(ScriptedDialogue::new(script))
    }

    struct Harness {
        commands: mpsc::Sender<TurnCommand>,
        events: mpsc::UnboundedReceiver<EngineEvent>,
        capture: Arc<MockCapture>,
        synth: Arc<MockSynthesis>,
        state: SharedConversation,
        task: JoinHandle<()>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_synth(MockSynthesis::new(SPEAK))
        }

        fn with_synth(synth: Arc<MockSynthesis>) -> Self {
            let capture = MockCapture::new();
            let (session, capture_rx) = CaptureSession::spawn(
                Arc::clone(&capture) as Arc<dyn CaptureDevice>,
                CaptureConfig::default(),
            );
            let playback = PlaybackScheduler::new(
                synth.clone(),
                PlaybackConfig::default(),
                DeviceProfile::default(),
            );
            let (orchestrator, events) = TurnOrchestrator::new(
                dialogue(),
                session,
                capture_rx,
                playback,
                TurnConfig::default(),
            );
            let state = orchestrator.shared_state();
            let (commands, rx) = mpsc::channel(16);
            let task = tokio::spawn(orchestrator.run(rx));
            Self {
                commands,
                events,
                capture,
                synth,
                state,
                task,
            }
        }

        async fn send(&self, cmd: TurnCommand) {
            self.commands.send(cmd).await.unwrap();
        }

        fn drain_events(&mut self) -> Vec<EngineEvent> {
            let mut out = Vec::new();
            while let Ok(e) = self.events.try_recv() {
                out.push(e);
            }
            out
        }

        fn turn(&self) -> TurnState {
            self.state.lock().unwrap().turn
        }
    }

    async fn ms(n: u64) {
        tokio::time::sleep(Duration::from_millis(n)).await;
    }

    /// Greeting spoken (1 s) plus the settle delay (1 s), with some slack.
    async fn past_greeting() {
        ms(2_100).await;
    }

    #[tokio::test(start_paused = true)]
    async fn begin_speaks_greeting_then_listens() {
        let mut h = Harness::new();
        h.send(TurnCommand::Begin).await;

        ms(500).await;
        assert_eq!(h.turn(), TurnState::Replying);
        assert_eq!(h.capture.starts(), 0);

        past_greeting().await;
        assert_eq!(h.synth.finished_texts(), vec![GREETING.to_string()]);
        assert_eq!(h.capture.starts(), 1);
        assert_eq!(h.turn(), TurnState::WaitingForUser);

        let events = h.drain_events();
        assert_eq!(
            events,
            vec![
                EngineEvent::StateChanged(TurnState::Replying),
                EngineEvent::ReplyReady(GREETING.to_string()),
                EngineEvent::StateChanged(TurnState::WaitingForUser),
                EngineEvent::ListeningStarted,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn utterance_gets_a_reply_and_capture_resumes() {
        let mut h = Harness::new();
        h.send(TurnCommand::Begin).await;
        past_greeting().await;
        h.drain_events();

        h.capture.final_("I love reading");
        // Pause timeout closes the turn.
        ms(5_600).await;
        assert_eq!(h.turn(), TurnState::Replying);
        assert!(!h.capture.is_active());

        ms(2_100).await;
        let reply = "Reading is wonderful! Do you play any sports?".to_string();
        assert_eq!(h.synth.finished_texts().last(), Some(&reply));
        assert_eq!(h.capture.starts(), 2);
        assert!(h.capture.is_active());

        let events = h.drain_events();
        assert!(events.contains(&EngineEvent::UserUtterance("I love reading".into())));
        assert!(events.contains(&EngineEvent::ReplyReady(reply)));
        let st = h.state.lock().unwrap();
        assert_eq!(st.step, 1);
        assert_eq!(st.last_utterance.as_deref(), Some("I love reading"));
    }

    #[tokio::test(start_paused = true)]
    async fn no_speech_gives_exactly_one_fallback_without_advancing() {
        let mut h = Harness::new();
        h.send(TurnCommand::Begin).await;
        past_greeting().await;
        h.drain_events();

        assert!(h.capture.error("no-speech"));
        ms(10_000).await;

        assert_eq!(
            h.synth.started_texts(),
            vec![GREETING.to_string(), HOBBY_FALLBACK.to_string()]
        );
        assert_eq!(h.state.lock().unwrap().step, 0);
        // Listening again after the fallback.
        assert_eq!(h.capture.starts(), 2);
        assert!(h.capture.is_active());

        let fallbacks = h
            .drain_events()
            .into_iter()
            .filter(|e| *e == EngineEvent::ReplyReady(HOBBY_FALLBACK.to_string()))
            .count();
        assert_eq!(fallbacks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_replies_are_spoken_one_at_a_time_in_order() {
        let h = Harness::new();
        for text in ["One.", "Two.", "Three."] {
            h.send(TurnCommand::EnqueueReply(text.into())).await;
        }

        // Reply 0..1 s, settle 1..2 s, reply 2..3 s, settle, reply 4..5 s.
        ms(4_500).await;
        assert_eq!(h.synth.finished_texts(), vec!["One.", "Two."]);

        ms(1_600).await;
        assert_eq!(h.synth.finished_texts(), vec!["One.", "Two.", "Three."]);
        assert_eq!(h.synth.max_active(), 1);
        assert_eq!(h.turn(), TurnState::WaitingForUser);
        assert_eq!(h.capture.starts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_reply_is_ignored() {
        let mut h = Harness::new();
        h.send(TurnCommand::EnqueueReply("   ".into())).await;
        ms(3_000).await;

        assert!(h.synth.started_texts().is_empty());
        assert_eq!(h.turn(), TurnState::WaitingForUser);
        assert!(h.drain_events().is_empty());
        assert_eq!(h.capture.starts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn end_tears_everything_down() {
        let mut h = Harness::new();
        h.send(TurnCommand::Begin).await;
        ms(500).await;

        h.send(TurnCommand::End).await;
        (&mut h.task).await.unwrap();

        assert_eq!(h.turn(), TurnState::Ended);
        assert_eq!(h.synth.cancels(), 1);
        assert!(h.synth.finished_texts().is_empty());
        assert!(!h.capture.is_active());

        let events = h.drain_events();
        assert_eq!(events.last(), Some(&EngineEvent::Ended));
        assert!(events.contains(&EngineEvent::StateChanged(TurnState::Ended)));

        // Nothing restarts afterwards.
        ms(10_000).await;
        assert_eq!(h.capture.starts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_says_the_last_reply_again() {
        let h = Harness::new();
        h.send(TurnCommand::Begin).await;
        past_greeting().await;

        h.send(TurnCommand::Repeat).await;
        ms(100).await;
        assert!(!h.capture.is_active());

        past_greeting().await;
        assert_eq!(
            h.synth.finished_texts(),
            vec![GREETING.to_string(), GREETING.to_string()]
        );
        assert_eq!(h.capture.starts(), 2);
        assert_eq!(h.state.lock().unwrap().step, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn permission_error_is_surfaced_and_waits_for_manual_retry() {
        let mut h = Harness::new();
        h.send(TurnCommand::Begin).await;
        past_greeting().await;
        h.drain_events();

        h.capture.error("not-allowed");
        ms(10_000).await;

        let events = h.drain_events();
        assert!(events.contains(&EngineEvent::error(EngineError::PermissionDenied)));
        assert_eq!(h.capture.starts(), 1);
        assert_eq!(
            h.state.lock().unwrap().error,
            Some(EngineError::PermissionDenied)
        );
        assert!(h.synth.started_texts().len() == 1);

        h.send(TurnCommand::StartListening).await;
        ms(10).await;
        assert_eq!(h.capture.starts(), 2);
        assert!(h.state.lock().unwrap().error.is_none());
        assert!(h.drain_events().contains(&EngineEvent::ListeningStarted));
    }

    #[tokio::test(start_paused = true)]
    async fn muted_replies_are_still_announced() {
        let mut h = Harness::new();
        h.send(TurnCommand::ToggleMute).await;
        h.send(TurnCommand::Begin).await;
        ms(1_100).await;

        assert!(h.synth.started_texts().is_empty());
        assert!(h.state.lock().unwrap().muted);
        assert!(h
            .drain_events()
            .contains(&EngineEvent::ReplyReady(GREETING.to_string())));
        assert_eq!(h.capture.starts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_listening_closes_capture() {
        let mut h = Harness::new();
        h.send(TurnCommand::Begin).await;
        past_greeting().await;
        h.drain_events();

        h.send(TurnCommand::StopListening).await;
        ms(10).await;

        assert!(!h.capture.is_active());
        assert_eq!(h.drain_events(), vec![EngineEvent::ListeningStopped]);
        assert!(!h.state.lock().unwrap().listening);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_synthesis_degrades_to_text() {
        let mut h = Harness::with_synth(MockSynthesis::unavailable());
        h.send(TurnCommand::Begin).await;
        ms(1_100).await;

        assert!(h
            .drain_events()
            .contains(&EngineEvent::ReplyReady(GREETING.to_string())));
        assert_eq!(h.capture.starts(), 1);
    }
}
