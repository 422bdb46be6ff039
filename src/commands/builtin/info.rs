//! The `info` command.

use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandError};

/// Shows bot version, activity, and usage totals.
pub struct InfoCommand;

#[async_trait]
impl Command for InfoCommand {
    async fn action(&self, _args: &[String], ctx: &CommandContext) -> Result<(), CommandError> {
        let data = ctx.data();
        let activity = data.activity().await;
        let total = data.telemetry().total();

        ctx.reply(&format!(
            "Nocturne v{}\nActivity: {activity}\nCommands handled: {total}",
            env!("CARGO_PKG_VERSION")
        ))
        .await;
        Ok(())
    }

    fn help(&self) -> &str {
        "Displays bot information"
    }
}
