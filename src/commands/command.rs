//! Command trait and invocation context.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::chat::{ChannelId, ChatPort, GuildId, UserId};
use crate::config::BotData;

/// Errors raised inside a command's action.
///
/// These stop at the dispatch boundary: the dispatcher logs them and reports
/// a failed execution instead of letting them escape the dispatch loop.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Failed(String),
}

/// Everything a handler can see about one incoming command message.
///
/// Created per inbound message and discarded after dispatch. Carries the
/// originating guild/channel/author, the raw message text for diagnostics,
/// and references to the bot's shared state and the chat adapter.
pub struct CommandContext {
    guild: GuildId,
    channel: ChannelId,
    author: UserId,
    message: String,
    data: Arc<BotData>,
    chat: Arc<dyn ChatPort>,
}

impl CommandContext {
    /// Creates a context for one invocation.
    #[must_use]
    pub fn new(
        guild: GuildId,
        channel: ChannelId,
        author: UserId,
        message: impl Into<String>,
        data: Arc<BotData>,
        chat: Arc<dyn ChatPort>,
    ) -> Self {
        Self {
            guild,
            channel,
            author,
            message: message.into(),
            data,
            chat,
        }
    }

    /// The guild the message came from.
    #[must_use]
    pub fn guild(&self) -> GuildId {
        self.guild
    }

    /// The channel the message came from.
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// The author of the message.
    #[must_use]
    pub fn author(&self) -> UserId {
        self.author
    }

    /// The raw text of the triggering message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shared bot state (storage, telemetry, typed properties).
    #[must_use]
    pub fn data(&self) -> &BotData {
        &self.data
    }

    /// Sends a reply to the originating channel.
    ///
    /// Fire-and-forget: a send fault is logged and swallowed.
    pub async fn reply(&self, text: &str) {
        self.send_to(self.channel, text).await;
    }

    /// Sends a message to an arbitrary channel.
    ///
    /// Fire-and-forget: a send fault is logged and swallowed.
    pub async fn send_to(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self.chat.send_message(channel, text).await {
            warn!("Dropping reply: {e}");
        }
    }
}

/// One command's behavior.
///
/// Implementations are registered under one or more names in the
/// [`CommandRegistry`](crate::commands::CommandRegistry) and driven by the
/// dispatcher through the four operations below.
#[async_trait]
pub trait Command: Send + Sync {
    /// Decides whether the command may run for this invocation.
    ///
    /// May have side effects: a command that depends on unconfigured state is
    /// allowed to write a safe default while rejecting, so that checking and
    /// provisioning happen in one step.
    async fn allow_execute(&self, args: &[String], ctx: &CommandContext) -> bool {
        let _ = (args, ctx);
        true
    }

    /// Executes the command.
    async fn action(&self, args: &[String], ctx: &CommandContext) -> Result<(), CommandError>;

    /// Called after every dispatch that reached this handler, with the final
    /// success flag. The default records usage telemetry for the handler type.
    async fn executed(&self, success: bool, ctx: &CommandContext) {
        let _ = success;
        ctx.data().telemetry().record(std::any::type_name::<Self>());
    }

    /// One-line help text.
    fn help(&self) -> &str;
}
