//! Messaging-platform seam.
//!
//! The actual chat client (gateway connection, rate limits, wire protocol)
//! lives outside this crate. Everything the dispatch core needs from it is
//! expressed by the [`ChatPort`] trait; adapters for concrete platforms
//! implement it.

mod console;

pub use console::ConsoleChat;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Snowflake-style id of a guild (conversational grouping).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuildId(pub u64);

/// Snowflake-style id of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// Snowflake-style id of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors surfaced by a chat adapter.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to send message to channel {channel}: {reason}")]
    Send { channel: ChannelId, reason: String },
}

/// Outbound message capability of a messaging platform.
///
/// Sends are fire-and-forget from the dispatcher's point of view: no
/// acknowledgment is awaited beyond the adapter call itself, and failures are
/// logged rather than propagated into command handling.
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Sends a plain text message to a channel.
    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), ChatError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{ChannelId, ChatError, ChatPort};

    /// Chat adapter that records every outbound message.
    #[derive(Default)]
    pub struct RecordingChat {
        sent: Mutex<Vec<(ChannelId, String)>>,
    }

    impl RecordingChat {
        pub fn messages(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(_, text)| text.clone())
                .collect()
        }

        pub fn sent(&self) -> Vec<(ChannelId, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatPort for RecordingChat {
        async fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), ChatError> {
            self.sent.lock().unwrap().push((channel, text.to_owned()));
            Ok(())
        }
    }
}
