//! Responder registry: ordered trigger phrases and the replies they produce.
//!
//! Lookup lowercases the inbound text and returns the reply of the first
//! trigger whose phrase occurs in it. Registry order is the tie-break.

use crate::config::RespondersConfig;
use crate::format::{colour_lines, Colour};
use std::fmt;

const CONGRATULATIONS_COLOURS: [Colour; 5] = [
    Colour::Green,
    Colour::Red,
    Colour::Magenta,
    Colour::Yellow,
    Colour::Cyan,
];

/// Zero-argument reply producer. Only called when its trigger is selected.
pub type Responder = Box<dyn Fn() -> String + Send + Sync>;

/// A phrase (matched case-insensitively as a substring) and its reply producer.
pub struct Trigger {
    phrase: String,
    responder: Responder,
}

impl Trigger {
    /// Phrase is lowercased on construction.
    pub fn new<F>(phrase: impl Into<String>, responder: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            phrase: phrase.into().to_lowercase(),
            responder: Box::new(responder),
        }
    }

    /// Trigger that always replies with the same text.
    pub fn fixed(phrase: impl Into<String>, response: impl Into<String>) -> Self {
        let response = response.into();
        Self::new(phrase, move || response.clone())
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// `lowered` must already be lowercase.
    fn matches(&self, lowered: &str) -> bool {
        lowered.contains(self.phrase.as_str())
    }

    fn respond(&self) -> String {
        (self.responder)()
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("phrase", &self.phrase)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable set of triggers. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct ResponderRegistry {
    triggers: Vec<Trigger>,
}

impl ResponderRegistry {
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self { triggers }
    }

    /// The module's own triggers: "congratulations", then "no sana".
    pub fn builtin() -> Self {
        Self::new(vec![
            Trigger::new("congratulations", congratulations),
            Trigger::new("no sana", no_sana),
        ])
    }

    /// Built-in triggers followed by any fixed replies from the config file, in file order.
    pub fn from_config(config: &RespondersConfig) -> Self {
        let extra = config
            .triggers
            .iter()
            .map(|t| Trigger::fixed(t.phrase.trim(), t.response.clone()));
        Self::builtin().with_triggers(extra)
    }

    /// Append triggers after the existing ones.
    pub fn with_triggers(mut self, extra: impl IntoIterator<Item = Trigger>) -> Self {
        self.triggers.extend(extra);
        self
    }

    /// Reply of the first trigger whose phrase occurs in `text` (case-insensitive), if any.
    pub fn lookup(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        self.triggers
            .iter()
            .find(|t| t.matches(&lowered))
            .map(Trigger::respond)
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.triggers.iter().map(Trigger::phrase)
    }
}

/// Five colour-cycled "congratulations!" lines.
pub fn congratulations() -> String {
    colour_lines(&CONGRATULATIONS_COLOURS, "congratulations!")
}

pub fn no_sana() -> String {
    "no life".to_string()
}
