//! The `help` command.

use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandError, CommandRegistry};

/// Lists all registered commands, or shows help for a single one.
///
/// The registry contains this command, so the back-reference is bound after
/// registration via [`HelpCommand::bind`] and held weakly.
pub struct HelpCommand {
    registry: OnceLock<Weak<CommandRegistry>>,
}

impl HelpCommand {
    /// Creates an unbound help command.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: OnceLock::new(),
        }
    }

    /// Binds the finished registry. Later calls are ignored.
    pub fn bind(&self, registry: &Arc<CommandRegistry>) {
        let _ = self.registry.set(Arc::downgrade(registry));
    }

    fn registry(&self) -> Result<Arc<CommandRegistry>, CommandError> {
        self.registry
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| CommandError::Failed("command registry is not bound".to_owned()))
    }
}

impl Default for HelpCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for HelpCommand {
    async fn action(&self, args: &[String], ctx: &CommandContext) -> Result<(), CommandError> {
        let registry = self.registry()?;
        let prefix = ctx.data().prefix(ctx.guild()).await;

        if let Some(name) = args.first() {
            match registry.lookup(name) {
                Some(command) => {
                    ctx.reply(&format!(
                        "`{prefix}{}`: {}",
                        name.to_lowercase(),
                        command.help()
                    ))
                    .await;
                }
                None => {
                    ctx.reply(&format!("No command named `{}`.", name.to_lowercase()))
                        .await;
                }
            }
            return Ok(());
        }

        let mut names: Vec<&str> = registry.names().collect();
        names.sort_unstable();

        let mut lines = vec!["Available commands:".to_owned()];
        for name in names {
            if let Some(command) = registry.lookup(name) {
                lines.push(format!("`{prefix}{name}`: {}", command.help()));
            }
        }
        ctx.reply(&lines.join("\n")).await;
        Ok(())
    }

    fn help(&self) -> &str {
        "Shows all commands, or help for one command"
    }
}

#[cfg(test)]
mod tests {
    use crate::chat::testing::RecordingChat;
    use crate::commands::builtin::testing::{context, test_data};
    use crate::commands::builtin::default_registry;

    use super::*;

    #[tokio::test]
    async fn test_help_lists_all_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir).await;
        let chat = Arc::new(RecordingChat::default());
        let registry = default_registry();

        let help = registry.lookup("help").unwrap();
        let ctx = context(&data, &chat, "noc-help");
        help.action(&[], &ctx).await.unwrap();

        let messages = chat.messages();
        assert_eq!(messages.len(), 1);
        for name in ["help", "bugreport", "prefix", "reload", "info"] {
            assert!(messages[0].contains(&format!("noc-{name}")), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_help_for_single_command() {
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir).await;
        let chat = Arc::new(RecordingChat::default());
        let registry = default_registry();

        let help = registry.lookup("help").unwrap();
        let ctx = context(&data, &chat, "noc-help INFO");
        help.action(&["INFO".to_owned()], &ctx).await.unwrap();

        let messages = chat.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("noc-info"));
    }

    #[tokio::test]
    async fn test_unbound_help_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir).await;
        let chat = Arc::new(RecordingChat::default());

        let help = HelpCommand::new();
        let ctx = context(&data, &chat, "noc-help");
        assert!(help.action(&[], &ctx).await.is_err());
    }
}
