//! Terminal demo: hold a typed "spoken" conversation with a topic script.
//!
//! ```text
//! voice-turn [TOPIC]
//! ```
//!
//! `TOPIC` is a path to a JSON topic script, the name of a script in the
//! topics directory (`free-time` → `free-time.json`), or any other name, which
//! starts a generic conversation about it.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`EngineConfig`] from disk (returns default on first run).
//! 3. Resolve the dialogue for the requested topic.
//! 4. Build the console devices, capture session and playback scheduler.
//! 5. Select a voice in the background.
//! 6. Spawn the turn orchestrator and send `Begin`.
//! 7. Render engine events until the conversation ends (Ctrl-C or EOF).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use voice_turn_engine::{
    capture::CaptureSession,
    config::{AppPaths, EngineConfig},
    console::{ConsoleCapture, ConsoleSynthesis},
    dialogue::{DialogueStepProvider, GenericDialogue, ScriptedDialogue, TopicScript},
    orchestrator::{EngineEvent, TurnCommand, TurnOrchestrator},
    playback::PlaybackScheduler,
    voice::VoiceCatalog,
};

const DEFAULT_TOPIC: &str = "free-time";

/// Simulated speaking time per character of reply text.
const CONSOLE_SPEECH_PER_CHAR: Duration = Duration::from_millis(15);

// ---------------------------------------------------------------------------
// Topic resolution
// ---------------------------------------------------------------------------

fn topic_candidates(topic: &str, paths: &AppPaths) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(topic)];
    if Path::new(topic).extension().is_none() {
        candidates.push(paths.topic_file(topic));
        candidates.push(Path::new("topics").join(format!("{topic}.json")));
    }
    candidates
}

fn load_dialogue(topic: &str, paths: &AppPaths) -> Result<Box<dyn DialogueStepProvider>> {
    if let Some(path) = topic_candidates(topic, paths).into_iter().find(|p| p.is_file()) {
        let script = TopicScript::load(&path)
            .with_context(|| format!("could not load topic {topic:?}"))?;
        log::info!("topic: {} ({})", script.name, path.display());
        return Ok(Box::new(ScriptedDialogue::new(script)));
    }

    log::info!("topic: no script for {topic:?}, using a generic conversation");
    Ok(Box::new(GenericDialogue::new(topic)))
}

// ---------------------------------------------------------------------------
// Event rendering
// ---------------------------------------------------------------------------

fn render(event: &EngineEvent, playback: &PlaybackScheduler) {
    match event {
        EngineEvent::ListeningStarted => log::debug!("ui: listening"),
        EngineEvent::ListeningStopped => log::debug!("ui: not listening"),
        EngineEvent::InterimTranscript { interim, final_text } => {
            log::debug!("ui: heard so far {final_text:?} + {interim:?}")
        }
        EngineEvent::UserUtterance(text) => println!("you: {text}"),
        EngineEvent::ReplyReady(text) => {
            let voice = playback
                .voice()
                .map(|v| v.name)
                .unwrap_or_else(|| "default voice".into());
            let muted = if playback.is_muted() { ", muted" } else { "" };
            println!("tutor ({voice}{muted}): {text}");
        }
        EngineEvent::StateChanged(state) => log::debug!("ui: {}", state.label()),
        EngineEvent::Error { message, .. } => eprintln!("error: {message}"),
        EngineEvent::Ended => println!("(conversation ended)"),
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-turn starting up");

    // 2. Configuration
    let config = EngineConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        EngineConfig::default()
    });
    let profile = config.device.profile();
    log::info!("device profile: {:?} / {:?}", profile.class, profile.platform);

    // 3. Dialogue
    let paths = AppPaths::new();
    let topic = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_TOPIC.into());
    let dialogue = load_dialogue(&topic, &paths)?;

    // 4. Devices
    let (mic, stdin_closed) = ConsoleCapture::spawn(config.capture.language.clone())
        .context("failed to start console input")?;
    let speaker = ConsoleSynthesis::new(CONSOLE_SPEECH_PER_CHAR);

    let (capture, capture_rx) = CaptureSession::spawn(mic, config.capture.clone());
    let playback = PlaybackScheduler::new(speaker.clone(), config.playback.clone(), profile);

    // 5. Voice selection never blocks the conversation.
    {
        let catalog = VoiceCatalog::new(speaker, config.voice.clone());
        let playback = playback.clone();
        tokio::spawn(async move {
            let voice = catalog.select_voice(profile.class).await;
            playback.set_voice(voice);
        });
    }

    // 6. Orchestrator
    let (orchestrator, mut events) = TurnOrchestrator::new(
        dialogue,
        capture,
        capture_rx,
        playback.clone(),
        config.turn.clone(),
    );
    let (command_tx, command_rx) = mpsc::channel::<TurnCommand>(16);
    let runner = tokio::spawn(orchestrator.run(command_rx));

    {
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => log::info!("interrupted"),
                _ = stdin_closed => log::info!("input closed"),
            }
            let _ = command_tx.send(TurnCommand::End).await;
        });
    }

    command_tx
        .send(TurnCommand::Begin)
        .await
        .context("orchestrator exited before the conversation began")?;

    // 7. Render until the conversation ends.
    while let Some(event) = events.recv().await {
        render(&event, &playback);
        if event == EngineEvent::Ended {
            break;
        }
    }

    runner.await.context("orchestrator task failed")?;
    log::info!("voice-turn shutting down");
    Ok(())
}
