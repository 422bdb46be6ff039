//! The `prefix` command.

use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandError};

/// Shows or changes the command prefix of the invoking guild.
pub struct PrefixCommand;

#[async_trait]
impl Command for PrefixCommand {
    async fn action(&self, args: &[String], ctx: &CommandContext) -> Result<(), CommandError> {
        let data = ctx.data();
        let guild = ctx.guild();

        match args {
            [] => {
                let current = data.prefix(guild).await;
                ctx.reply(&format!("Current prefix: `{current}`")).await;
            }
            [arg] if arg == "reset" => {
                data.reset_prefix(guild).await;
                let current = data.prefix(guild).await;
                ctx.reply(&format!("Prefix reset to `{current}`.")).await;
            }
            [new_prefix] => {
                data.set_prefix(guild, new_prefix).await;
                ctx.reply(&format!("Prefix set to `{new_prefix}`.")).await;
            }
            _ => {
                ctx.reply("Usage: prefix [<new-prefix>|reset]").await;
            }
        }
        Ok(())
    }

    fn help(&self) -> &str {
        "Shows or sets this guild's command prefix"
    }
}
