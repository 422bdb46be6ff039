//! Command name registry.

use std::collections::HashMap;
use std::sync::Arc;

use super::Command;

/// Mapping from lowercase command name to handler.
///
/// Populated once at startup and shared read-only afterwards; there is no
/// removal. Names are case-folded at registration and lookup, so matching is
/// case-insensitive. Registering a name twice silently replaces the earlier
/// handler (last registration wins).
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a name.
    pub fn register(&mut self, name: &str, command: Arc<dyn Command>) {
        self.commands.insert(name.to_lowercase(), command);
    }

    /// Looks up a handler by name, case-insensitively.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&name.to_lowercase()).cloned()
    }

    /// Iterates over the registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::commands::{CommandContext, CommandError};

    use super::*;

    struct Dummy;

    #[async_trait]
    impl Command for Dummy {
        async fn action(&self, _args: &[String], _ctx: &CommandContext) -> Result<(), CommandError> {
            Ok(())
        }

        fn help(&self) -> &str {
            "does nothing"
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut registry = CommandRegistry::new();
        registry.register("Avatar", Arc::new(Dummy));

        assert!(registry.lookup("avatar").is_some());
        assert!(registry.lookup("AVATAR").is_some());
        assert!(registry.lookup("aVaTaR").is_some());
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        struct Other;

        #[async_trait]
        impl Command for Other {
            async fn action(
                &self,
                _args: &[String],
                _ctx: &CommandContext,
            ) -> Result<(), CommandError> {
                Ok(())
            }

            fn help(&self) -> &str {
                "other"
            }
        }

        let mut registry = CommandRegistry::new();
        registry.register("ping", Arc::new(Dummy));
        registry.register("PING", Arc::new(Other));

        assert_eq!(registry.len(), 1);
        let handler = registry.lookup("ping").unwrap();
        assert_eq!(handler.help(), "other");
    }
}
