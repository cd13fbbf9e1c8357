//! Composed text and the key-value interpreter.

use serde::{Deserialize, Serialize};

/// Words offered for completion when the host supplies no list of its own.
const BUILTIN_WORDS: &[&str] = &[
    "about", "afternoon", "again", "all", "always", "am", "and", "angry", "answer", "are",
    "back", "bathroom", "because", "bed", "better", "blanket", "book", "bored", "breakfast",
    "brother", "call", "can", "cannot", "chair", "change", "cold", "come", "comfortable",
    "could", "daughter", "day", "dinner", "doctor", "done", "door", "down", "drink", "eat",
    "evening", "excuse", "family", "feel", "feeling", "fine", "finished", "food", "for",
    "friend", "from", "get", "give", "go", "good", "goodbye", "great", "happy", "have",
    "headache", "hello", "help", "here", "home", "hot", "how", "hungry", "hurt", "hurts",
    "know", "later", "leave", "light", "like", "listen", "look", "love", "lunch", "maybe",
    "me", "medicine", "minute", "more", "morning", "mother", "move", "much", "music", "my",
    "need", "never", "nice", "night", "not", "now", "nurse", "okay", "open", "outside",
    "pain", "phone", "pillow", "please", "position", "question", "quiet", "ready", "really",
    "remember", "rest", "right", "sad", "see", "shower", "sick", "sister", "sleep", "slowly",
    "something", "sorry", "soon", "speak", "stay", "stop", "sure", "talk", "television",
    "tell", "thank", "thanks", "that", "there", "thirsty", "this", "time", "tired", "today",
    "together", "tomorrow", "too", "toilet", "turn", "uncomfortable", "understand", "very",
    "visit", "wait", "want", "warm", "water", "weather", "welcome", "well", "what", "when",
    "where", "which", "who", "why", "window", "with", "wonderful", "would", "yes",
    "yesterday", "you", "your",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Literal text, usually one character.
    Append(String),
    Backspace,
    Clear,
    Autocomplete,
    Speak,
}

impl Command {
    pub fn parse(value: &str) -> Self {
        match value {
            "BACKSPACE" => Self::Backspace,
            "CLEAR" => Self::Clear,
            "AUTOCOMPLETE" => Self::Autocomplete,
            "ENTER" | "SPEAK" => Self::Speak,
            other => Self::Append(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedText {
    pub text: String,
    pub suggestion: Option<String>,
}

/// Lowercase word list ordered shortest first, then alphabetically, so the
/// first prefix hit is the preferred completion.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: Vec<String>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new(BUILTIN_WORDS.iter().copied())
    }
}

impl Dictionary {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        words.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        words.dedup();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Completion for the trailing word of `text`, if any.
    pub fn suggest(&self, text: &str) -> Option<String> {
        let last = text.split_whitespace().next_back()?;
        if last.chars().count() < 2 || !last.chars().any(|c| c.is_alphabetic() || c == '_') {
            return None;
        }
        let prefix = last.to_lowercase();
        self.words
            .iter()
            .find(|w| w.len() > prefix.len() && w.starts_with(&prefix))
            .cloned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    dictionary: Dictionary,
}

impl Interpreter {
    pub fn new(dictionary: Dictionary) -> Self {
        Self { dictionary }
    }

    /// Apply one command to `state`. `Speak` leaves the text untouched; the
    /// caller routes it to the speak gate.
    pub fn apply(&self, command: &Command, state: &ComposedText) -> ComposedText {
        let text = match command {
            Command::Append(value) => format!("{}{}", state.text, value),
            Command::Backspace => {
                let mut text = state.text.clone();
                text.pop();
                text
            }
            Command::Clear => String::new(),
            Command::Autocomplete => match &state.suggestion {
                Some(suggestion) => complete(&state.text, suggestion),
                None => return state.clone(),
            },
            Command::Speak => return state.clone(),
        };

        let suggestion = self.dictionary.suggest(&text);
        ComposedText { text, suggestion }
    }
}

fn complete(text: &str, suggestion: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    match words.last_mut() {
        Some(last) => *last = suggestion,
        None => words.push(suggestion),
    }
    let mut out = words.join(" ");
    out.push(' ');
    out
}
