//! Command dispatch.
//!
//! One dispatch per inbound message: look the name up, ask the handler
//! whether it may run, run it, and report the outcome back to the handler.
//! Unknown names never reach a handler; they get a nearest-name suggestion
//! instead.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{suggest, CommandContext, CommandRegistry};

/// One parsed incoming command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The invoked command name, as typed (case preserved).
    pub name: String,

    /// Ordered argument tokens.
    pub args: Vec<String>,
}

impl Invocation {
    /// Creates an invocation from a name and argument tokens.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parses a raw message into an invocation by stripping the given prefix
    /// and splitting the remainder into whitespace-separated tokens.
    ///
    /// Returns `None` if the message does not start with the prefix or has no
    /// command name after it. This is a stand-in for the platform-side parser
    /// that normally feeds the dispatcher.
    #[must_use]
    pub fn parse(text: &str, prefix: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix(prefix)?;
        let mut tokens = rest.split_whitespace();
        let name = tokens.next()?.to_owned();
        let args = tokens.map(str::to_owned).collect();
        Some(Self { name, args })
    }
}

/// Terminal state of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and reported success.
    Executed,

    /// The handler ran and failed (its fault was caught and logged).
    Failed,

    /// The handler's allow-predicate declined the invocation.
    Rejected,

    /// No handler is registered under the invoked name.
    Unknown {
        /// The closest registered name, if any.
        suggestion: Option<String>,
    },
}

/// Routes invocations to registered handlers.
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    /// Creates a dispatcher over a finished registry.
    #[must_use]
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher routes through.
    #[must_use]
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Dispatches one invocation.
    ///
    /// A fault inside the handler's action is caught here, logged together
    /// with the raw triggering message, and reported to the handler as
    /// `success = false`; it never propagates to the caller. The handler's
    /// post-execution hook runs on every path that reached a handler.
    pub async fn dispatch(&self, invocation: &Invocation, ctx: &CommandContext) -> DispatchOutcome {
        let Some(command) = self.registry.lookup(&invocation.name) else {
            return self.handle_unknown(&invocation.name, ctx).await;
        };

        let allowed = command.allow_execute(&invocation.args, ctx).await;
        let mut success = allowed;

        if allowed {
            if let Err(e) = command.action(&invocation.args, ctx).await {
                warn!(
                    "Command `{}` failed while handling message {:?}: {e}",
                    invocation.name,
                    ctx.message()
                );
                success = false;
            }
        } else {
            debug!("Command `{}` declined execution", invocation.name);
        }

        command.executed(success, ctx).await;

        if !allowed {
            DispatchOutcome::Rejected
        } else if success {
            DispatchOutcome::Executed
        } else {
            DispatchOutcome::Failed
        }
    }

    /// Replies with a nearest-name suggestion or a help pointer.
    async fn handle_unknown(&self, name: &str, ctx: &CommandContext) -> DispatchOutcome {
        let prefix = ctx.data().prefix(ctx.guild()).await;
        let suggestion = suggest::find_similar(&self.registry, name);

        let reply = match &suggestion {
            Some(similar) => format!(
                "It seems that this command does not exist. Did you mean `{prefix}{similar}`?"
            ),
            None => format!(
                "It seems that this command does not exist. Try `{prefix}help` for a list of commands."
            ),
        };
        ctx.reply(&reply).await;

        DispatchOutcome::Unknown { suggestion }
    }
}
