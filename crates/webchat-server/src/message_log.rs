use std::ops::Range;

use webchat_shared::Message;

/// Append-only chat history in arrival order.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    /// Stamp and append a message. Bodies are stored as given, empty ones
    /// included. Returns the new length.
    pub fn append(&mut self, author: impl Into<String>, body: impl Into<String>) -> usize {
        self.messages.push(Message::new(author, body));
        self.messages.len()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Install records loaded at startup. They go in front of anything
    /// already present so the log stays a single growing sequence. Returns
    /// the number of restored records.
    pub fn restore(&mut self, mut records: Vec<Message>) -> usize {
        let restored = records.len();
        records.append(&mut self.messages);
        self.messages = records;
        restored
    }

    /// Copy of the records in `range`, clamped to the current length.
    pub fn slice(&self, range: Range<usize>) -> Vec<Message> {
        let end = range.end.min(self.messages.len());
        let start = range.start.min(end);
        self.messages[start..end].to_vec()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
