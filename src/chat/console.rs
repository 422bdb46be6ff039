//! Console chat adapter.
//!
//! Prints outbound messages to stdout. Used by the demo binary so the
//! dispatch loop can be exercised without a platform connection.

use async_trait::async_trait;

use super::{ChannelId, ChatError, ChatPort};

/// Chat adapter that writes every message to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleChat;

impl ConsoleChat {
    /// Creates a new console adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatPort for ConsoleChat {
    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), ChatError> {
        for line in text.lines() {
            println!("[#{channel}] {line}");
        }
        Ok(())
    }
}
