//! Data-driven topic scripts loaded from JSON.
//!
//! ```json
//! {
//!   "name": "Free Time",
//!   "greeting": "Hi there! What hobbies do you enjoy?",
//!   "questions": ["What hobbies do you enjoy?", "Do you play any sports?"],
//!   "steps": [
//!     { "rules": [{ "keywords": ["read", "book"], "reply": "Reading is wonderful!" }],
//!       "default": "That sounds great!" },
//!     { "default": "That sounds like fun!" }
//!   ],
//!   "fallbacks": ["I didn't quite catch your hobbies."]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{contains_keywords, DialogueStepProvider};

const GENERIC_FALLBACK: &str = "I'm sorry, I didn't catch that. Could you say it again, please?";
const CLOSING: &str = "Thank you for practising with me today! Feel free to start another topic.";

// ---------------------------------------------------------------------------
// TopicScript
// ---------------------------------------------------------------------------

/// Reply chosen when any keyword appears in the utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub reply: String,
}

/// How the tutor reacts to the answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Checked in order; first match wins.
    #[serde(default)]
    pub rules: Vec<KeywordRule>,
    /// Follow-up when no rule matches.
    pub default: String,
}

impl ScriptStep {
    pub fn follow_up(&self, utterance: &str) -> &str {
        self.rules
            .iter()
            .find(|r| contains_keywords(utterance, r.keywords.as_slice()))
            .map(|r| r.reply.as_str())
            .unwrap_or(&self.default)
    }
}

fn default_generic_fallback() -> String {
    GENERIC_FALLBACK.to_string()
}

fn default_closing() -> String {
    CLOSING.to_string()
}

/// A complete topic: greeting, ordered questions and per-step reactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScript {
    pub name: String,
    pub greeting: String,
    pub questions: Vec<String>,
    /// One entry per question.
    pub steps: Vec<ScriptStep>,
    /// Per-step "didn't hear you" lines.
    #[serde(default)]
    pub fallbacks: Vec<String>,
    #[serde(default = "default_generic_fallback")]
    pub generic_fallback: String,
    /// Said to every utterance after the last step.
    #[serde(default = "default_closing")]
    pub closing: String,
}

/// Errors loading a topic script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read topic script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed topic script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid topic script: {0}")]
    Invalid(String),
}

impl TopicScript {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let script: TopicScript = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if self.questions.is_empty() {
            return Err(ScriptError::Invalid(format!(
                "topic {:?} has no questions",
                self.name
            )));
        }
        if self.steps.len() != self.questions.len() {
            return Err(ScriptError::Invalid(format!(
                "topic {:?} has {} questions but {} steps",
                self.name,
                self.questions.len(),
                self.steps.len()
            )));
        }
        if self.greeting.trim().is_empty() {
            return Err(ScriptError::Invalid(format!(
                "topic {:?} has an empty greeting",
                self.name
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedDialogue
// ---------------------------------------------------------------------------

/// Walks a [`TopicScript`] one question at a time.
#[derive(Debug, Clone)]
pub struct ScriptedDialogue {
    script: TopicScript,
    step: usize,
}

impl ScriptedDialogue {
    pub fn new(script: TopicScript) -> Self {
        Self { script, step: 0 }
    }

    pub fn script(&self) -> &TopicScript {
        &self.script
    }

    pub fn is_complete(&self) -> bool {
        self.step >= self.script.steps.len()
    }
}

impl DialogueStepProvider for ScriptedDialogue {
    fn initial_prompt(&self) -> String {
        self.script.greeting.clone()
    }

    fn process_utterance(&mut self, text: &str) -> String {
        let Some(step) = self.script.steps.get(self.step) else {
            return self.script.closing.clone();
        };

        let follow_up = step.follow_up(text).to_string();
        self.step += 1;
        log::debug!(
            "dialogue: {} step {}/{}",
            self.script.name,
            self.step,
            self.script.steps.len()
        );

        match self.script.questions.get(self.step) {
            Some(next) => format!("{follow_up} {next}"),
            None => follow_up,
        }
    }

    fn fallback(&self, step: usize) -> String {
        self.script
            .fallbacks
            .get(step)
            .cloned()
            .unwrap_or_else(|| self.script.generic_fallback.clone())
    }

    fn current_step(&self) -> usize {
        self.step
    }
}
