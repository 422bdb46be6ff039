//! The `reload` command.

use async_trait::async_trait;
use tracing::debug;

use crate::commands::{Command, CommandContext, CommandError};

/// Re-reads all properties from the active storage backend.
pub struct ReloadCommand;

#[async_trait]
impl Command for ReloadCommand {
    async fn allow_execute(&self, _args: &[String], ctx: &CommandContext) -> bool {
        let allowed = ctx.data().is_admin(ctx.author()).await;
        if !allowed {
            debug!("Reload rejected for non-admin user {}", ctx.author());
        }
        allowed
    }

    async fn action(&self, _args: &[String], ctx: &CommandContext) -> Result<(), CommandError> {
        ctx.data().reload_all().await;
        ctx.reply("All properties reloaded.").await;
        Ok(())
    }

    fn help(&self) -> &str {
        "Reloads all properties from storage (admins only)"
    }
}
