use serde::{Deserialize, Serialize};

/// A participant, keyed by the identity provider's stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Normalized identity key (lowercased email). Immutable once created.
    pub email: String,
    pub name: String,
    pub created_at_us: i64,
}

/// Normalize an identity key for lookup and storage.
///
/// Returns `None` when nothing remains after trimming.
#[must_use]
pub fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() { None } else { Some(key) }
}

#[cfg(test)]
mod tests {
    use super::normalize_key;

    #[test]
    fn keys_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_key("  Ada@Example.ORG "),
            Some("ada@example.org".to_string())
        );
        assert_eq!(normalize_key("   "), None);
    }
}
