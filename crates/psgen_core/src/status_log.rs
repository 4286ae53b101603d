/// Ordered, replaceable list of human-readable status messages.
///
/// Every replace is a full overwrite; nothing from earlier stages is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLog {
    entries: Vec<String>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log to exactly `messages`, in order, duplicates included.
    pub fn replace<I, S>(&mut self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries = messages.into_iter().map(Into::into).collect();
    }

    /// Reduces the log to a single message.
    pub fn collapse(&mut self, message: impl Into<String>) {
        self.entries.clear();
        self.entries.push(message.into());
    }

    /// The latest message, or `""` when the log is empty.
    pub fn current(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or("")
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
