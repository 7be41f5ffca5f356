//! Identity resolution for CLI commands.
//!
//! The resolution chain: `--user` flag > `ECO_USER` env > `default_user` in
//! the user config file. Commands that read or move a user's points need an
//! identity; catalog administration and ledger-wide reports do not.

use std::env;

/// Errors from identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolutionError {
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for IdentityResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IdentityResolutionError {}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

/// Real environment reader.
struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

fn resolve_identity_with(
    cli_flag: Option<&str>,
    default_user: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    if let Some(user) = cli_flag.map(str::trim).filter(|u| !u.is_empty()) {
        return Some(user.to_string());
    }

    if let Some(val) = env.get("ECO_USER") {
        return Some(val.trim().to_string());
    }

    default_user
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Resolve the acting user's identity key.
///
/// 1. `--user` CLI flag
/// 2. `ECO_USER` environment variable
/// 3. `default_user` from the user config
pub fn resolve_identity(cli_flag: Option<&str>, default_user: Option<&str>) -> Option<String> {
    resolve_identity_with(cli_flag, default_user, &RealEnv)
}

/// Resolve the identity key, returning an error if none is configured.
pub fn require_identity(
    cli_flag: Option<&str>,
    default_user: Option<&str>,
) -> Result<String, IdentityResolutionError> {
    resolve_identity(cli_flag, default_user).ok_or_else(|| IdentityResolutionError {
        message: "User identity required for this command. \
                  Set --user, ECO_USER, or default_user in the user config."
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockEnv {
        vars: HashMap<String, String>,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
            }
        }

        fn var(mut self, key: &str, val: &str) -> Self {
            self.vars.insert(key.to_string(), val.to_string());
            self
        }
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).filter(|v| !v.trim().is_empty()).cloned()
        }
    }

    #[test]
    fn cli_flag_takes_priority() {
        let env = MockEnv::new().var("ECO_USER", "env@example.org");
        let result = resolve_identity_with(Some("flag@example.org"), Some("cfg@example.org"), &env);
        assert_eq!(result.as_deref(), Some("flag@example.org"));
    }

    #[test]
    fn env_beats_user_config() {
        let env = MockEnv::new().var("ECO_USER", "env@example.org");
        let result = resolve_identity_with(None, Some("cfg@example.org"), &env);
        assert_eq!(result.as_deref(), Some("env@example.org"));
    }

    #[test]
    fn user_config_is_last_resort() {
        let env = MockEnv::new();
        let result = resolve_identity_with(None, Some(" cfg@example.org "), &env);
        assert_eq!(result.as_deref(), Some("cfg@example.org"));
    }

    #[test]
    fn blank_values_are_skipped() {
        let env = MockEnv::new().var("ECO_USER", "   ");
        let result = resolve_identity_with(Some(""), Some("cfg@example.org"), &env);
        assert_eq!(result.as_deref(), Some("cfg@example.org"));
    }

    #[test]
    fn nothing_configured_resolves_to_none() {
        let env = MockEnv::new();
        assert!(resolve_identity_with(None, None, &env).is_none());
        assert!(resolve_identity_with(None, Some("  "), &env).is_none());
    }
}
