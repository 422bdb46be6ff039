//! Configuration module.
//!
//! Process settings resolved from the environment, and the typed
//! [`BotData`] context over the property storage layer.

mod bot_data;
mod settings;

pub use bot_data::{builtin_defaults, BotData, DEFAULT_PREFIX};
pub use settings::BotSettings;
