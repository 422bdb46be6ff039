//! Property-file storage backend.
//!
//! Each scope is one `key=value` file under the data directory: global
//! properties in `global.properties`, persisted guild defaults in
//! `guild_defaults.properties`, and one `guilds/<id>.properties` per guild.
//! Guild files are loaded lazily on first access. Writes update the in-memory
//! map and rewrite the touched file immediately.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::chat::GuildId;

use super::{PropertyDefaults, Storage, StorageError};

const GLOBAL_FILE: &str = "global.properties";
const GUILD_DEFAULTS_FILE: &str = "guild_defaults.properties";
const GUILDS_DIR: &str = "guilds";

/// File-backed property storage.
pub struct PropertyStorage {
    data_dir: PathBuf,
    defaults: Arc<PropertyDefaults>,
    global: RwLock<HashMap<String, String>>,
    guild_defaults: RwLock<HashMap<String, String>>,
    guilds: RwLock<HashMap<GuildId, HashMap<String, String>>>,
}

impl PropertyStorage {
    /// Opens the property files under `data_dir`, creating the directory
    /// layout if needed.
    ///
    /// Missing files are treated as empty scopes. An unreadable existing file
    /// is a fatal configuration error.
    pub fn open(
        data_dir: impl Into<PathBuf>,
        defaults: Arc<PropertyDefaults>,
    ) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        let guilds_dir = data_dir.join(GUILDS_DIR);
        fs::create_dir_all(&guilds_dir).map_err(|source| StorageError::DataDir {
            dir: guilds_dir.clone(),
            source,
        })?;

        let global = read_properties(&data_dir.join(GLOBAL_FILE))
            .map_err(|source| StorageError::ReadFile {
                path: data_dir.join(GLOBAL_FILE),
                source,
            })?;
        let guild_defaults = read_properties(&data_dir.join(GUILD_DEFAULTS_FILE)).map_err(
            |source| StorageError::ReadFile {
                path: data_dir.join(GUILD_DEFAULTS_FILE),
                source,
            },
        )?;

        Ok(Self {
            data_dir,
            defaults,
            global: RwLock::new(global),
            guild_defaults: RwLock::new(guild_defaults),
            guilds: RwLock::new(HashMap::new()),
        })
    }

    fn global_path(&self) -> PathBuf {
        self.data_dir.join(GLOBAL_FILE)
    }

    fn guild_defaults_path(&self) -> PathBuf {
        self.data_dir.join(GUILD_DEFAULTS_FILE)
    }

    fn guild_path(&self, guild: GuildId) -> PathBuf {
        self.data_dir
            .join(GUILDS_DIR)
            .join(format!("{guild}.properties"))
    }

    /// Loads a guild's property file into the cache if it is not there yet.
    async fn ensure_guild_loaded(&self, guild: GuildId) {
        {
            let guilds = self.guilds.read().await;
            if guilds.contains_key(&guild) {
                return;
            }
        }

        let path = self.guild_path(guild);
        let map = match read_properties(&path) {
            Ok(map) => map,
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                HashMap::new()
            }
        };

        self.guilds.write().await.entry(guild).or_insert(map);
    }

    fn persist(&self, path: &Path, map: &HashMap<String, String>) {
        if let Err(e) = write_properties(path, map) {
            error!("Failed to persist {}: {e}", path.display());
        }
    }
}

#[async_trait]
impl Storage for PropertyStorage {
    async fn get_global(&self, key: &str) -> String {
        match self.global.read().await.get(key) {
            Some(value) => value.clone(),
            None => self.defaults.global(key),
        }
    }

    async fn set_global(&self, key: &str, value: &str) {
        let mut global = self.global.write().await;
        global.insert(key.to_owned(), value.to_owned());
        self.persist(&self.global_path(), &global);
    }

    async fn get_for_guild(&self, guild: GuildId, key: &str) -> String {
        self.ensure_guild_loaded(guild).await;
        let value = self
            .guilds
            .read()
            .await
            .get(&guild)
            .and_then(|map| map.get(key).cloned());
        match value {
            Some(value) => value,
            None => self.get_guild_default(key).await,
        }
    }

    async fn set_for_guild(&self, guild: GuildId, key: &str, value: &str) {
        self.ensure_guild_loaded(guild).await;
        let mut guilds = self.guilds.write().await;
        let map = guilds.entry(guild).or_default();
        map.insert(key.to_owned(), value.to_owned());
        self.persist(&self.guild_path(guild), map);
    }

    async fn get_guild_default(&self, key: &str) -> String {
        match self.guild_defaults.read().await.get(key) {
            Some(value) => value.clone(),
            None => self.defaults.guild(key),
        }
    }

    async fn set_guild_default(&self, key: &str, value: &str) {
        let mut guild_defaults = self.guild_defaults.write().await;
        guild_defaults.insert(key.to_owned(), value.to_owned());
        self.persist(&self.guild_defaults_path(), &guild_defaults);
    }

    async fn reload(&self) {
        match read_properties(&self.global_path()) {
            Ok(map) => *self.global.write().await = map,
            Err(e) => warn!(
                "Failed to reload {}: {e}; keeping current values",
                self.global_path().display()
            ),
        }
        match read_properties(&self.guild_defaults_path()) {
            Ok(map) => *self.guild_defaults.write().await = map,
            Err(e) => warn!(
                "Failed to reload {}: {e}; keeping current values",
                self.guild_defaults_path().display()
            ),
        }
        self.guilds.write().await.clear();
    }

    async fn reload_guild(&self, guild: GuildId) {
        self.guilds.write().await.remove(&guild);
    }
}

/// Parses a property file: `key=value` lines, `#` comments, blank lines
/// ignored. A missing file is an empty map.
fn read_properties(path: &Path) -> io::Result<HashMap<String, String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e),
    };

    let mut map = HashMap::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_owned(), value.trim().to_owned());
    }
    Ok(map)
}

/// Writes a property map with keys in sorted order.
fn write_properties(path: &Path, map: &HashMap<String, String>) -> io::Result<()> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(key, _)| key.as_str());

    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    fs::write(path, out)
}
