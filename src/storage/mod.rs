//! Persistent configuration storage.
//!
//! Bot and guild configuration is a flat set of string properties in two
//! scopes: process-global and per-guild. Two backends implement the same
//! [`Storage`] contract: plain property files on disk ([`PropertyStorage`])
//! and a SQL database ([`SqlStorage`]). The backend is selected once at
//! startup by [`select_backend`] and never swapped afterwards.

mod properties;
mod sql;

pub use properties::PropertyStorage;
pub use sql::SqlStorage;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chat::GuildId;

/// Errors raised while opening or connecting a storage backend.
///
/// Backend faults are only fatal at construction time. After a backend is up,
/// read faults fall back to cached or default values and write faults are
/// logged without retry.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create data directory {dir}: {source}")]
    DataDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read property file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Built-in default values for every known property key.
///
/// Both backends fall back to these maps when no explicit value is stored.
/// The key set is closed: asking either scope for a key that has no
/// registered default is a programming error and panics.
#[derive(Debug, Clone, Default)]
pub struct PropertyDefaults {
    global: HashMap<String, String>,
    guild: HashMap<String, String>,
}

impl PropertyDefaults {
    /// Creates a defaults registry from explicit maps.
    #[must_use]
    pub fn new(global: HashMap<String, String>, guild: HashMap<String, String>) -> Self {
        Self { global, guild }
    }

    /// Returns the default for a global-scope key.
    ///
    /// # Panics
    ///
    /// Panics if no default is registered for `key`.
    #[must_use]
    pub fn global(&self, key: &str) -> String {
        match self.global.get(key) {
            Some(value) => value.clone(),
            None => panic!("no default registered for global property key `{key}`"),
        }
    }

    /// Returns the default for a guild-scope key.
    ///
    /// # Panics
    ///
    /// Panics if no default is registered for `key`.
    #[must_use]
    pub fn guild(&self, key: &str) -> String {
        match self.guild.get(key) {
            Some(value) => value.clone(),
            None => panic!("no default registered for guild property key `{key}`"),
        }
    }
}

/// Contract shared by all storage backends.
///
/// Guild reads resolve through a chain: explicit per-guild value, then the
/// persisted guild default, then the built-in default map. Global reads
/// resolve through the explicit value and the built-in map. Every getter
/// returns a value; a key without a built-in default panics (see
/// [`PropertyDefaults`]).
///
/// Writes persist immediately. Post-startup faults never propagate out of
/// this trait: reads log and return the stale or default value, writes log
/// and give up.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads a global-scope property.
    async fn get_global(&self, key: &str) -> String;

    /// Writes a global-scope property.
    async fn set_global(&self, key: &str, value: &str);

    /// Reads a property for one guild, falling back to the guild default.
    async fn get_for_guild(&self, guild: GuildId, key: &str) -> String;

    /// Writes a property for one guild.
    async fn set_for_guild(&self, guild: GuildId, key: &str, value: &str);

    /// Reads the default applied to guilds without an explicit value.
    async fn get_guild_default(&self, key: &str) -> String;

    /// Writes the default applied to guilds without an explicit value.
    async fn set_guild_default(&self, key: &str, value: &str);

    /// Discards cached state and re-reads everything from the backend.
    async fn reload(&self);

    /// Discards cached state for a single guild.
    async fn reload_guild(&self, guild: GuildId);
}

/// Selects the storage backend for the lifetime of the process.
///
/// An empty database URL selects the property-file store. A non-empty URL is
/// tried once; any connection failure logs the URL and the error and falls
/// back to the property files, so small deployments run without a database
/// while misconfiguration stays visible in the log. No error escapes
/// selection.
pub async fn select_backend(
    url: &str,
    user: &str,
    password: &str,
    fallback: Arc<PropertyStorage>,
    defaults: Arc<PropertyDefaults>,
) -> Arc<dyn Storage> {
    if url.trim().is_empty() {
        debug!("Storage backend: property files");
        return fallback;
    }

    match SqlStorage::connect(url, user, password, defaults).await {
        Ok(sql) => {
            debug!("Storage backend: database at {url}");
            Arc::new(sql)
        }
        Err(e) => {
            warn!(
                "Database connection to `{url}` failed ({e}); falling back to property-file storage"
            );
            fallback
        }
    }
}
