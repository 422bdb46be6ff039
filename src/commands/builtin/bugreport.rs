//! The `bugreport` command.

use async_trait::async_trait;
use tracing::warn;

use crate::chat::ChannelId;
use crate::commands::{Command, CommandContext, CommandError};

const DISABLED_INVALID_CHAN: &str = "Bug report command is disabled. To enable it, \
    set a valid channel id for the bug_report_channel property.";

/// Forwards a bug description to the configured report channel.
pub struct BugReportCommand;

#[async_trait]
impl Command for BugReportCommand {
    /// Rejects while no valid report channel is configured. An unset
    /// property is initialized with the empty placeholder value in the same
    /// step.
    async fn allow_execute(&self, _args: &[String], ctx: &CommandContext) -> bool {
        let raw = ctx.data().bug_report_channel().await;
        if raw.is_empty() {
            ctx.data().set_bug_report_channel("").await;
            warn!("{DISABLED_INVALID_CHAN}");
            return false;
        }
        if raw.parse::<u64>().is_err() {
            warn!("{DISABLED_INVALID_CHAN}");
            return false;
        }
        true
    }

    async fn action(&self, args: &[String], ctx: &CommandContext) -> Result<(), CommandError> {
        if args.is_empty() {
            ctx.reply("Please describe the bug.").await;
            return Ok(());
        }

        let raw = ctx.data().bug_report_channel().await;
        let channel = raw
            .parse::<u64>()
            .map(ChannelId)
            .map_err(|_| CommandError::Failed(format!("invalid bug report channel id `{raw}`")))?;

        let id = ctx.data().bug_id().await + 1;
        ctx.data().set_bug_id(id).await;

        let description = args.join(" ");
        ctx.send_to(
            channel,
            &format!("New bug from {} with ID {id}: {description}", ctx.author()),
        )
        .await;
        ctx.reply(&format!("Sent with ID {id}")).await;
        Ok(())
    }

    fn help(&self) -> &str {
        "Files a bug report"
    }
}
