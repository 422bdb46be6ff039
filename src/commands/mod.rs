//! Command handling module.
//!
//! Maps incoming command names to handlers, authorizes and runs them, and
//! suggests the nearest registered name when an unknown command is typed.

pub mod builtin;

mod command;
mod dispatcher;
mod registry;
mod suggest;
mod telemetry;

pub use command::{Command, CommandContext, CommandError};
pub use dispatcher::{CommandDispatcher, DispatchOutcome, Invocation};
pub use registry::CommandRegistry;
pub use suggest::{find_similar, levenshtein};
pub use telemetry::{Telemetry, TelemetrySnapshot};
