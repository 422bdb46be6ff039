//! SQL storage backend.
//!
//! Persists the same logical key/value scopes as the property files in three
//! database tables. Reads go to the database first; every successful read or
//! write shadows its value in a concurrent cache so a later read fault can
//! serve the last known value instead of propagating.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Row;
use tracing::{debug, warn};

use crate::chat::GuildId;

use super::{PropertyDefaults, Storage, StorageError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS global_properties (\
        key TEXT PRIMARY KEY, \
        value TEXT NOT NULL)",
    "CREATE TABLE IF NOT EXISTS guild_defaults (\
        key TEXT PRIMARY KEY, \
        value TEXT NOT NULL)",
    "CREATE TABLE IF NOT EXISTS guild_properties (\
        guild_id TEXT NOT NULL, \
        key TEXT NOT NULL, \
        value TEXT NOT NULL, \
        PRIMARY KEY (guild_id, key))",
];

/// Database-backed property storage.
pub struct SqlStorage {
    pool: SqlitePool,
    defaults: Arc<PropertyDefaults>,
    global_cache: DashMap<String, String>,
    guild_default_cache: DashMap<String, String>,
    guild_cache: DashMap<(u64, String), String>,
}

impl SqlStorage {
    /// Connects to the database at `url` and creates the property tables.
    ///
    /// Any failure here is a configuration fault; the caller is expected to
    /// fall back to property-file storage.
    pub async fn connect(
        url: &str,
        user: &str,
        password: &str,
        defaults: Arc<PropertyDefaults>,
    ) -> Result<Self, StorageError> {
        if !user.is_empty() || !password.is_empty() {
            debug!("SQLite storage ignores the configured database credentials");
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self {
            pool,
            defaults,
            global_cache: DashMap::new(),
            guild_default_cache: DashMap::new(),
            guild_cache: DashMap::new(),
        })
    }

    async fn fetch_value(
        &self,
        query: &str,
        binds: &[&str],
    ) -> Result<Option<String>, sqlx::Error> {
        let mut q = sqlx::query(query);
        for bind in binds {
            q = q.bind(*bind);
        }
        let row = q.fetch_optional(&self.pool).await?;
        Ok(row.and_then(|r| r.try_get::<String, _>("value").ok()))
    }
}

#[async_trait]
impl Storage for SqlStorage {
    async fn get_global(&self, key: &str) -> String {
        match self
            .fetch_value("SELECT value FROM global_properties WHERE key = ?", &[key])
            .await
        {
            Ok(Some(value)) => {
                self.global_cache.insert(key.to_owned(), value.clone());
                value
            }
            Ok(None) => self.defaults.global(key),
            Err(e) => {
                warn!("Failed to read global property `{key}`: {e}; serving last known value");
                match self.global_cache.get(key) {
                    Some(value) => value.clone(),
                    None => self.defaults.global(key),
                }
            }
        }
    }

    async fn set_global(&self, key: &str, value: &str) {
        let result = sqlx::query(
            "INSERT INTO global_properties (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                self.global_cache.insert(key.to_owned(), value.to_owned());
            }
            Err(e) => warn!("Failed to write global property `{key}`: {e}"),
        }
    }

    async fn get_for_guild(&self, guild: GuildId, key: &str) -> String {
        let guild_id = guild.to_string();
        match self
            .fetch_value(
                "SELECT value FROM guild_properties WHERE guild_id = ? AND key = ?",
                &[&guild_id, key],
            )
            .await
        {
            Ok(Some(value)) => {
                self.guild_cache
                    .insert((guild.0, key.to_owned()), value.clone());
                value
            }
            Ok(None) => self.get_guild_default(key).await,
            Err(e) => {
                warn!(
                    "Failed to read property `{key}` for guild {guild}: {e}; serving last known value"
                );
                match self.guild_cache.get(&(guild.0, key.to_owned())) {
                    Some(value) => value.clone(),
                    None => self.get_guild_default(key).await,
                }
            }
        }
    }

    async fn set_for_guild(&self, guild: GuildId, key: &str, value: &str) {
        let result = sqlx::query(
            "INSERT INTO guild_properties (guild_id, key, value) VALUES (?, ?, ?) \
             ON CONFLICT(guild_id, key) DO UPDATE SET value = excluded.value",
        )
        .bind(guild.to_string())
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                self.guild_cache
                    .insert((guild.0, key.to_owned()), value.to_owned());
            }
            Err(e) => warn!("Failed to write property `{key}` for guild {guild}: {e}"),
        }
    }

    async fn get_guild_default(&self, key: &str) -> String {
        match self
            .fetch_value("SELECT value FROM guild_defaults WHERE key = ?", &[key])
            .await
        {
            Ok(Some(value)) => {
                self.guild_default_cache
                    .insert(key.to_owned(), value.clone());
                value
            }
            Ok(None) => self.defaults.guild(key),
            Err(e) => {
                warn!("Failed to read guild default `{key}`: {e}; serving last known value");
                match self.guild_default_cache.get(key) {
                    Some(value) => value.clone(),
                    None => self.defaults.guild(key),
                }
            }
        }
    }

    async fn set_guild_default(&self, key: &str, value: &str) {
        let result = sqlx::query(
            "INSERT INTO guild_defaults (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                self.guild_default_cache
                    .insert(key.to_owned(), value.to_owned());
            }
            Err(e) => warn!("Failed to write guild default `{key}`: {e}"),
        }
    }

    async fn reload(&self) {
        self.global_cache.clear();
        self.guild_default_cache.clear();
        self.guild_cache.clear();
    }

    async fn reload_guild(&self, guild: GuildId) {
        self.guild_cache.retain(|(id, _), _| *id != guild.0);
    }
}
