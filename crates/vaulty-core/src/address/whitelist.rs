//! Sender whitelist matching.

use serde::{Deserialize, Serialize};

/// Sender patterns accepted for an address.
///
/// A pattern is either a full address (`alice@example.com`) or a domain
/// wildcard (`@example.com` or `*@example.com`). Matching ignores case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist(Vec<String>);

impl Whitelist {
    /// Creates a whitelist from patterns, normalizing each to lowercase.
    ///
    /// Blank patterns are dropped.
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }

    /// Returns the stored patterns.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    /// Returns true if there are no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds a pattern if not already present.
    pub fn add(&mut self, pattern: &str) {
        let pattern = pattern.trim().to_lowercase();
        if !pattern.is_empty() && !self.0.contains(&pattern) {
            self.0.push(pattern);
        }
    }

    /// Removes a pattern. Returns true if it was present.
    pub fn remove(&mut self, pattern: &str) -> bool {
        let pattern = pattern.trim().to_lowercase();
        let before = self.0.len();
        self.0.retain(|p| *p != pattern);
        self.0.len() != before
    }

    /// Checks whether a sender matches any pattern.
    #[must_use]
    pub fn matches(&self, sender: &str) -> bool {
        let sender = sender.trim().to_lowercase();
        let Some((_, sender_domain)) = sender.rsplit_once('@') else {
            return false;
        };

        self.0.iter().any(|pattern| {
            if let Some(domain) = pattern
                .strip_prefix("*@")
                .or_else(|| pattern.strip_prefix('@'))
            {
                domain == sender_domain
            } else {
                *pattern == sender
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let list = Whitelist::new(["alice@example.com"]);
        assert!(list.matches("alice@example.com"));
        assert!(list.matches("ALICE@Example.com"));
        assert!(!list.matches("bob@example.com"));
    }

    #[test]
    fn test_domain_wildcards() {
        let list = Whitelist::new(["@corp.example", "*@partner.example"]);
        assert!(list.matches("anyone@corp.example"));
        assert!(list.matches("someone@partner.example"));
        assert!(!list.matches("someone@sub.partner.example"));
        assert!(!list.matches("corp.example@evil.example"));
    }

    #[test]
    fn test_sender_without_at_never_matches() {
        let list = Whitelist::new(["@example.com"]);
        assert!(!list.matches("example.com"));
    }

    #[test]
    fn test_empty_matches_nothing() {
        let list = Whitelist::default();
        assert!(!list.matches("alice@example.com"));
    }

    #[test]
    fn test_add_and_remove() {
        let mut list = Whitelist::new(["  ", "A@Example.com"]);
        assert_eq!(list.patterns(), ["a@example.com"]);

        list.add("a@example.com");
        list.add("@other.example");
        assert_eq!(list.patterns().len(), 2);

        assert!(list.remove("A@EXAMPLE.COM"));
        assert!(!list.remove("missing@example.com"));
        assert_eq!(list.patterns(), ["@other.example"]);
    }
}
