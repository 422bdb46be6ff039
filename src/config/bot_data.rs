//! Typed access to bot and guild configuration.
//!
//! `BotData` is the one context object constructed at process start and
//! passed into the dispatcher and handlers. It owns the bootstrap property
//! files, the backend selected from them, and the usage telemetry. Global
//! bot identity (token, admins, bug channel, database parameters) always
//! lives in the property files; guild-scoped values go through the selected
//! backend.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::chat::{ChannelId, GuildId, UserId};
use crate::commands::Telemetry;
use crate::storage::{select_backend, PropertyDefaults, PropertyStorage, Storage, StorageError};

use super::BotSettings;

const PREFIX_KEY: &str = "prefix";
const MSG_LOG_CHANNEL_KEY: &str = "msg_log_channel";

const TOKEN_KEY: &str = "token";
const ACTIVITY_KEY: &str = "activity";
const ADMINS_KEY: &str = "admins";
const BUG_ID_KEY: &str = "bug_id";
const BUG_CHANNEL_KEY: &str = "bug_report_channel";
const FIXED_BUGS_CHANNEL_KEY: &str = "fixed_bugs_channel";
const DB_URL_KEY: &str = "db_url";
const DB_USER_KEY: &str = "db_user";
const DB_PASSWORD_KEY: &str = "db_password";

/// Prefix used by guilds that never configured one.
pub const DEFAULT_PREFIX: &str = "noc-";

const DEFAULT_ACTIVITY: &str = "watching the night sky";
const TELEMETRY_FILE: &str = "telemetry.json";

/// Built-in defaults for every known property key.
#[must_use]
pub fn builtin_defaults() -> PropertyDefaults {
    let global = HashMap::from(
        [
            (TOKEN_KEY, ""),
            (ACTIVITY_KEY, DEFAULT_ACTIVITY),
            (ADMINS_KEY, ""),
            (BUG_ID_KEY, "0"),
            (BUG_CHANNEL_KEY, ""),
            (FIXED_BUGS_CHANNEL_KEY, ""),
            (DB_URL_KEY, ""),
            (DB_USER_KEY, ""),
            (DB_PASSWORD_KEY, ""),
        ]
        .map(|(key, value)| (key.to_owned(), value.to_owned())),
    );
    let guild = HashMap::from(
        [(PREFIX_KEY, DEFAULT_PREFIX), (MSG_LOG_CHANNEL_KEY, "")]
            .map(|(key, value)| (key.to_owned(), value.to_owned())),
    );
    PropertyDefaults::new(global, guild)
}

/// Shared bot state: storage, defaults, telemetry.
pub struct BotData {
    local: Arc<PropertyStorage>,
    storage: Arc<dyn Storage>,
    telemetry: Telemetry,
    data_dir: PathBuf,
}

impl BotData {
    /// Opens the property files under the settings' data directory, selects
    /// the storage backend from them, and loads the telemetry snapshot.
    ///
    /// # Errors
    ///
    /// Fails only when the bootstrap property files cannot be opened; a
    /// database failure falls back to the property files instead.
    pub async fn init(settings: &BotSettings) -> Result<Self, StorageError> {
        let defaults = Arc::new(builtin_defaults());
        let local = Arc::new(PropertyStorage::open(
            &settings.data_dir,
            Arc::clone(&defaults),
        )?);

        let url = local.get_global(DB_URL_KEY).await;
        let user = local.get_global(DB_USER_KEY).await;
        let password = local.get_global(DB_PASSWORD_KEY).await;
        let storage = select_backend(&url, &user, &password, Arc::clone(&local), defaults).await;

        let telemetry = Telemetry::load(settings.data_dir.join(TELEMETRY_FILE));

        Ok(Self {
            local,
            storage,
            telemetry,
            data_dir: settings.data_dir.clone(),
        })
    }

    /// The active storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Usage telemetry counters.
    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Saves the telemetry snapshot into the data directory.
    pub fn save_telemetry(&self) -> io::Result<()> {
        self.telemetry.save(self.data_dir.join(TELEMETRY_FILE))
    }

    /// The prefix for guilds without a configured one.
    pub async fn default_prefix(&self) -> String {
        self.storage.get_guild_default(PREFIX_KEY).await
    }

    /// Sets the prefix for guilds without a configured one. An empty prefix
    /// restores the built-in default.
    pub async fn set_default_prefix(&self, prefix: &str) {
        let prefix = if prefix.is_empty() {
            DEFAULT_PREFIX
        } else {
            prefix
        };
        self.storage.set_guild_default(PREFIX_KEY, prefix).await;
    }

    /// The command prefix of a guild.
    pub async fn prefix(&self, guild: GuildId) -> String {
        self.storage.get_for_guild(guild, PREFIX_KEY).await
    }

    /// Sets the command prefix of a guild.
    pub async fn set_prefix(&self, guild: GuildId, prefix: &str) {
        self.storage.set_for_guild(guild, PREFIX_KEY, prefix).await;
    }

    /// Resets a guild's prefix to the default one.
    pub async fn reset_prefix(&self, guild: GuildId) {
        let prefix = self.default_prefix().await;
        self.set_prefix(guild, &prefix).await;
    }

    /// The channel receiving message logs for a guild, if configured.
    pub async fn msg_log_channel(&self, guild: GuildId) -> Option<ChannelId> {
        self.storage
            .get_for_guild(guild, MSG_LOG_CHANNEL_KEY)
            .await
            .parse()
            .ok()
            .map(ChannelId)
    }

    /// Sets the channel receiving message logs for a guild.
    pub async fn set_msg_log_channel(&self, guild: GuildId, channel: ChannelId) {
        self.storage
            .set_for_guild(guild, MSG_LOG_CHANNEL_KEY, &channel.to_string())
            .await;
    }

    /// Unsets the message log channel for a guild.
    pub async fn reset_msg_log_channel(&self, guild: GuildId) {
        self.storage
            .set_for_guild(guild, MSG_LOG_CHANNEL_KEY, "")
            .await;
    }

    /// The instance owners.
    pub async fn admin_ids(&self) -> Vec<UserId> {
        self.local
            .get_global(ADMINS_KEY)
            .await
            .split_whitespace()
            .filter_map(|token| token.parse().ok())
            .map(UserId)
            .collect()
    }

    /// Replaces the instance owners.
    pub async fn set_admin_ids(&self, admins: &[UserId]) {
        let joined = admins
            .iter()
            .map(UserId::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        self.local.set_global(ADMINS_KEY, &joined).await;
    }

    /// Whether a user is an instance owner.
    pub async fn is_admin(&self, user: UserId) -> bool {
        self.admin_ids().await.contains(&user)
    }

    /// The bot's presence/activity text.
    pub async fn activity(&self) -> String {
        self.local.get_global(ACTIVITY_KEY).await
    }

    /// Sets the bot's presence/activity text.
    pub async fn set_activity(&self, activity: &str) {
        self.local.set_global(ACTIVITY_KEY, activity).await;
    }

    /// The platform token.
    pub async fn token(&self) -> String {
        self.local.get_global(TOKEN_KEY).await
    }

    /// The bug report channel id, raw. Empty means unconfigured.
    pub async fn bug_report_channel(&self) -> String {
        self.local.get_global(BUG_CHANNEL_KEY).await
    }

    /// Sets the bug report channel id.
    pub async fn set_bug_report_channel(&self, channel: &str) {
        self.local.set_global(BUG_CHANNEL_KEY, channel).await;
    }

    /// The channel announcing fixed bugs, raw. Empty means unconfigured.
    pub async fn fixed_bugs_channel(&self) -> String {
        self.local.get_global(FIXED_BUGS_CHANNEL_KEY).await
    }

    /// Sets the channel announcing fixed bugs.
    pub async fn set_fixed_bugs_channel(&self, channel: &str) {
        self.local.set_global(FIXED_BUGS_CHANNEL_KEY, channel).await;
    }

    /// The current bug id counter.
    pub async fn bug_id(&self) -> u64 {
        let raw = self.local.get_global(BUG_ID_KEY).await;
        raw.parse().unwrap_or_else(|_| {
            warn!("Unparsable {BUG_ID_KEY} value {raw:?}; treating as 0");
            0
        })
    }

    /// Sets the bug id counter.
    pub async fn set_bug_id(&self, id: u64) {
        self.local.set_global(BUG_ID_KEY, &id.to_string()).await;
    }

    /// The configured database URL.
    pub async fn db_url(&self) -> String {
        self.local.get_global(DB_URL_KEY).await
    }

    /// The configured database user.
    pub async fn db_user(&self) -> String {
        self.local.get_global(DB_USER_KEY).await
    }

    /// The configured database password.
    pub async fn db_password(&self) -> String {
        self.local.get_global(DB_PASSWORD_KEY).await
    }

    /// Reloads all properties from the bootstrap files and the backend.
    pub async fn reload_all(&self) {
        self.local.reload().await;
        self.storage.reload().await;
    }

    /// Reloads the properties of one guild.
    pub async fn reload_guild(&self, guild: GuildId) {
        self.storage.reload_guild(guild).await;
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn settings(dir: &tempfile::TempDir) -> BotSettings {
        BotSettings {
            data_dir: dir.path().to_path_buf(),
            log_level: "info".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_empty_db_url_selects_property_files() {
        let dir = tempfile::tempdir().unwrap();
        let data = BotData::init(&settings(&dir)).await.unwrap();

        let guild = GuildId(12);
        data.set_prefix(guild, "!!").await;

        // The write landed in a guild property file, so the active backend
        // is the file-backed one.
        assert!(dir.path().join("guilds").join("12.properties").exists());
        assert_eq!(data.prefix(guild).await, "!!");
    }

    #[tokio::test]
    async fn test_unreachable_db_url_falls_back_to_property_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("global.properties"),
            "db_url=sqlite:///no-such-directory/nested/bot.db\n",
        )
        .unwrap();

        let data = BotData::init(&settings(&dir)).await.unwrap();
        let guild = GuildId(5);
        data.set_prefix(guild, "??").await;

        assert!(dir.path().join("guilds").join("5.properties").exists());
        assert_eq!(data.prefix(guild).await, "??");
    }

    #[tokio::test]
    async fn test_valid_db_url_selects_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("bot.db");
        fs::write(
            dir.path().join("global.properties"),
            format!("db_url=sqlite://{}\n", db_path.display()),
        )
        .unwrap();

        let data = BotData::init(&settings(&dir)).await.unwrap();
        let guild = GuildId(5);
        data.set_prefix(guild, "db!").await;

        assert!(db_path.exists());
        assert!(!dir.path().join("guilds").join("5.properties").exists());
        assert_eq!(data.prefix(guild).await, "db!");
    }

    #[tokio::test]
    async fn test_prefix_defaults_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let data = BotData::init(&settings(&dir)).await.unwrap();
        let guild = GuildId(7);

        assert_eq!(data.prefix(guild).await, DEFAULT_PREFIX);

        data.set_default_prefix("dd-").await;
        assert_eq!(data.prefix(guild).await, "dd-");

        data.set_prefix(guild, "!").await;
        assert_eq!(data.prefix(guild).await, "!");

        data.reset_prefix(guild).await;
        assert_eq!(data.prefix(guild).await, "dd-");

        // Empty default restores the built-in prefix.
        data.set_default_prefix("").await;
        assert_eq!(data.default_prefix().await, DEFAULT_PREFIX);
    }

    #[tokio::test]
    async fn test_admin_ids_ignore_garbage_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let data = BotData::init(&settings(&dir)).await.unwrap();

        assert!(data.admin_ids().await.is_empty());

        data.set_admin_ids(&[UserId(1), UserId(2)]).await;
        assert_eq!(data.admin_ids().await, vec![UserId(1), UserId(2)]);
        assert!(data.is_admin(UserId(2)).await);
        assert!(!data.is_admin(UserId(3)).await);

        data.local.set_global(ADMINS_KEY, "4 nope 5").await;
        assert_eq!(data.admin_ids().await, vec![UserId(4), UserId(5)]);
    }

    #[tokio::test]
    async fn test_bug_id_round_trip_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let data = BotData::init(&settings(&dir)).await.unwrap();

        assert_eq!(data.bug_id().await, 0);
        data.set_bug_id(41).await;
        assert_eq!(data.bug_id().await, 41);

        data.local.set_global(BUG_ID_KEY, "not-a-number").await;
        assert_eq!(data.bug_id().await, 0);
    }

    #[tokio::test]
    async fn test_msg_log_channel_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let data = BotData::init(&settings(&dir)).await.unwrap();
        let guild = GuildId(8);

        assert_eq!(data.msg_log_channel(guild).await, None);
        data.set_msg_log_channel(guild, ChannelId(77)).await;
        assert_eq!(data.msg_log_channel(guild).await, Some(ChannelId(77)));
        data.reset_msg_log_channel(guild).await;
        assert_eq!(data.msg_log_channel(guild).await, None);
    }

    #[tokio::test]
    async fn test_telemetry_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let data = BotData::init(&settings(&dir)).await.unwrap();
            data.telemetry().record("help");
            data.save_telemetry().unwrap();
        }

        let data = BotData::init(&settings(&dir)).await.unwrap();
        assert_eq!(data.telemetry().count("help"), 1);
    }

    #[tokio::test]
    async fn test_reload_all_without_writes_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let data = BotData::init(&settings(&dir)).await.unwrap();
        let guild = GuildId(2);

        data.set_activity("testing").await;
        data.set_prefix(guild, "r!").await;

        let before = (data.activity().await, data.prefix(guild).await);
        data.reload_all().await;
        let after = (data.activity().await, data.prefix(guild).await);
        assert_eq!(before, after);
    }
}
