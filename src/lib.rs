//! Nocturne Bot Library
//!
//! Core of a guild chat bot, built around command dispatch:
//! - Registering command handlers under case-insensitive names
//! - Authorizing, executing, and reporting telemetry per invocation
//! - Suggesting the nearest command name when an unknown one is typed
//! - Persisting bot and guild configuration in property files or a database

pub mod chat;
pub mod commands;
pub mod config;
pub mod storage;
