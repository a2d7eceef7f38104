//! Announcement sinks.
//!
//! The battle phase never prints. It publishes text, and sometimes a list of
//! numbered choices, to a `Topic`; the caller decides where that goes.

use std::io::Write;

use serde::{Deserialize, Serialize};

/// One selectable answer. Ids start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: usize,
    pub label: String,
}

/// Receives announcements from the battle phase.
pub trait Topic {
    fn publish(&mut self, text: &str);

    /// Publishes a prompt with numbered options.
    fn publish_choices(&mut self, text: &str, choices: &[Choice]);
}

/// A recorded announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Announcement {
    Plain(String),
    WithChoices { text: String, choices: Vec<Choice> },
}

impl Announcement {
    pub fn text(&self) -> &str {
        match self {
            Announcement::Plain(text) | Announcement::WithChoices { text, .. } => text,
        }
    }
}

/// Keeps every announcement in memory, in order.
#[derive(Debug, Clone, Default)]
pub struct MemoryTopic {
    pub announcements: Vec<Announcement>,
}

impl MemoryTopic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of all announcements so far.
    pub fn texts(&self) -> Vec<&str> {
        self.announcements.iter().map(|a| a.text()).collect()
    }

    /// The most recent prompt's choices, if the last announcement had any.
    pub fn last_choices(&self) -> Option<&[Choice]> {
        match self.announcements.last() {
            Some(Announcement::WithChoices { choices, .. }) => Some(choices),
            _ => None,
        }
    }

    /// Drains everything recorded so far.
    pub fn take(&mut self) -> Vec<Announcement> {
        std::mem::take(&mut self.announcements)
    }
}

impl Topic for MemoryTopic {
    fn publish(&mut self, text: &str) {
        self.announcements.push(Announcement::Plain(text.to_string()));
    }

    fn publish_choices(&mut self, text: &str, choices: &[Choice]) {
        self.announcements.push(Announcement::WithChoices {
            text: text.to_string(),
            choices: choices.to_vec(),
        });
    }
}

/// Writes announcements as protocol lines: `info <text>` followed by one
/// `choice <id> <label>` line per option.
pub struct WriterTopic<W: Write> {
    out: W,
}

impl<W: Write> WriterTopic<W> {
    pub fn new(out: W) -> Self {
        WriterTopic { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Topic for WriterTopic<W> {
    fn publish(&mut self, text: &str) {
        let _ = writeln!(self.out, "info {}", text);
    }

    fn publish_choices(&mut self, text: &str, choices: &[Choice]) {
        let _ = writeln!(self.out, "info {}", text);
        for choice in choices {
            let _ = writeln!(self.out, "choice {} {}", choice.id, choice.label);
        }
    }
}

/// Sends announcements to the tracing log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTopic;

impl Topic for TracingTopic {
    fn publish(&mut self, text: &str) {
        tracing::info!(target: "announce", "{}", text);
    }

    fn publish_choices(&mut self, text: &str, choices: &[Choice]) {
        let labels: Vec<String> = choices.iter().map(|c| format!("{}) {}", c.id, c.label)).collect();
        tracing::info!(target: "announce", choices = %labels.join("; "), "{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices() -> Vec<Choice> {
        vec![
            Choice { id: 1, label: "Arrakeen".into() },
            Choice { id: 2, label: "Carthag".into() },
        ]
    }

    #[test]
    fn memory_topic_records_in_order() {
        let mut topic = MemoryTopic::new();
        topic.publish("first");
        topic.publish_choices("pick one", &choices());
        assert_eq!(topic.texts(), vec!["first", "pick one"]);
        assert_eq!(topic.last_choices().unwrap().len(), 2);
        assert_eq!(topic.take().len(), 2);
        assert!(topic.announcements.is_empty());
    }

    #[test]
    fn writer_topic_emits_protocol_lines() {
        let mut topic = WriterTopic::new(Vec::new());
        topic.publish("battle begins");
        topic.publish_choices("pick one", &choices());
        let text = String::from_utf8(topic.into_inner()).unwrap();
        assert_eq!(
            text,
            "info battle begins\ninfo pick one\nchoice 1 Arrakeen\nchoice 2 Carthag\n"
        );
    }
}
