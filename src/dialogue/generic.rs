//! Fallback conversation for topics without a dedicated script.

use super::DialogueStepProvider;

const QUESTIONS: [&str; 4] = [
    "Can you tell me more about that?",
    "How do you feel about that?",
    "What's your experience with this topic?",
    "Would you like to learn more about this topic?",
];

/// Cycles through a fixed list of open questions.
#[derive(Debug, Clone)]
pub struct GenericDialogue {
    topic: String,
    step: usize,
}

impl GenericDialogue {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            step: 0,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl DialogueStepProvider for GenericDialogue {
    fn initial_prompt(&self) -> String {
        format!(
            "Welcome to the {} conversation! Let's practice English by discussing this topic. \
             What would you like to talk about related to {}?",
            self.topic,
            self.topic.to_lowercase()
        )
    }

    fn process_utterance(&mut self, _text: &str) -> String {
        self.step = (self.step + 1) % QUESTIONS.len();
        format!("That's interesting! {}", QUESTIONS[self.step])
    }

    fn fallback(&self, _step: usize) -> String {
        "I'm sorry, I didn't catch that. Could you please try again?".to_string()
    }

    fn current_step(&self) -> usize {
        self.step
    }
}
