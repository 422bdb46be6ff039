//! Built-in commands.
//!
//! Small handlers shipped with the bot core. Anything platform-heavy (image
//! rendering, member lookups) belongs to external command crates; these only
//! touch the storage layer and the chat port.

mod bugreport;
mod help;
mod info;
mod prefix;
mod reload;

pub use bugreport::BugReportCommand;
pub use help::HelpCommand;
pub use info::InfoCommand;
pub use prefix::PrefixCommand;
pub use reload::ReloadCommand;

use std::sync::Arc;

use super::{Command, CommandRegistry};

/// Builds a registry containing all built-in commands.
#[must_use]
pub fn default_registry() -> Arc<CommandRegistry> {
    let mut registry = CommandRegistry::new();

    let help = Arc::new(HelpCommand::new());
    registry.register("help", Arc::clone(&help) as Arc<dyn Command>);
    registry.register("bugreport", Arc::new(BugReportCommand));
    registry.register("prefix", Arc::new(PrefixCommand));
    registry.register("reload", Arc::new(ReloadCommand));
    registry.register("info", Arc::new(InfoCommand));

    let registry = Arc::new(registry);
    help.bind(&registry);
    registry
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::chat::testing::RecordingChat;
    use crate::chat::{ChannelId, ChatPort, GuildId, UserId};
    use crate::commands::CommandContext;
    use crate::config::{BotData, BotSettings};

    pub const TEST_GUILD: GuildId = GuildId(1);
    pub const TEST_CHANNEL: ChannelId = ChannelId(10);
    pub const TEST_USER: UserId = UserId(100);

    pub async fn test_data(dir: &tempfile::TempDir) -> Arc<BotData> {
        let settings = BotSettings {
            data_dir: dir.path().to_path_buf(),
            log_level: "info".to_owned(),
        };
        Arc::new(BotData::init(&settings).await.unwrap())
    }

    pub fn context(
        data: &Arc<BotData>,
        chat: &Arc<RecordingChat>,
        message: &str,
    ) -> CommandContext {
        CommandContext::new(
            TEST_GUILD,
            TEST_CHANNEL,
            TEST_USER,
            message,
            Arc::clone(data),
            Arc::clone(chat) as Arc<dyn ChatPort>,
        )
    }
}
