//! Nearest-command suggestion for unknown command names.

use dashmap::DashMap;
use rayon::prelude::*;

use super::CommandRegistry;

/// Finds the registered command name closest to `input` by edit distance.
///
/// Candidates are scored in parallel with a shared memo cache so duplicate
/// candidate strings are only computed once. A candidate that equals the
/// input case-insensitively is skipped (lookup already failed, so none
/// should; the exclusion is defensive). Ties are broken lexicographically so
/// the result does not depend on map iteration order. Returns `None` when
/// the registry is empty.
#[must_use]
pub fn find_similar(registry: &CommandRegistry, input: &str) -> Option<String> {
    let names: Vec<&str> = registry.names().collect();
    let cache: DashMap<&str, usize> = DashMap::new();

    names
        .par_iter()
        .map(|name| name.trim())
        .filter(|name| !name.eq_ignore_ascii_case(input))
        .map(|name| {
            let distance = *cache
                .entry(name)
                .or_insert_with(|| levenshtein(input, name));
            (distance, name)
        })
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, name)| name.to_owned())
}

/// Levenshtein edit distance between two strings, computed over chars.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::commands::{Command, CommandContext, CommandError};

    use super::*;

    struct Dummy;

    #[async_trait]
    impl Command for Dummy {
        async fn action(&self, _args: &[String], _ctx: &CommandContext) -> Result<(), CommandError> {
            Ok(())
        }

        fn help(&self) -> &str {
            "dummy"
        }
    }

    fn registry_with(names: &[&str]) -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        for name in names {
            registry.register(name, Arc::new(Dummy));
        }
        registry
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("avatr", "avatar"), 1);
    }

    #[test]
    fn test_suggests_closest_name() {
        let registry = registry_with(&["avatar", "help", "info"]);
        assert_eq!(find_similar(&registry, "avatr"), Some("avatar".to_owned()));
    }

    #[test]
    fn test_empty_registry_suggests_nothing() {
        let registry = CommandRegistry::new();
        assert_eq!(find_similar(&registry, "anything"), None);
    }

    #[test]
    fn test_tie_breaks_lexicographically() {
        // "pind" is distance 1 from both "ping" and "pins".
        let registry = registry_with(&["pins", "ping"]);
        assert_eq!(find_similar(&registry, "pind"), Some("ping".to_owned()));
    }

    #[test]
    fn test_excludes_case_insensitive_match() {
        let registry = registry_with(&["ping", "pong"]);
        // Defensive: an exact (case-folded) match must not suggest itself.
        assert_eq!(find_similar(&registry, "PING"), Some("pong".to_owned()));
    }
}
