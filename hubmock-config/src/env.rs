// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Environment variable loader
///
/// Keys are returned lower-cased, with the prefix (and the `_` after it)
/// stripped when one is set.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load a `.env` file into the process environment
    ///
    /// With no path, `.env` in the working directory is loaded if present and
    /// silently skipped otherwise. An explicit path must exist. Variables
    /// already set in the environment win.
    pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => dotenvy::from_path(path)
                .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e))),
            None => {
                dotenvy::dotenv().ok();
                Ok(())
            }
        }
    }

    /// Load all matching environment variables
    pub fn load(&self) -> HashMap<String, String> {
        self.filter(env::vars())
    }

    /// Apply prefix filtering and key folding to a set of variables
    pub fn filter<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| match &self.prefix {
                Some(prefix) => key
                    .strip_prefix(prefix.as_str())
                    .map(|rest| (rest.trim_start_matches('_').to_lowercase(), value)),
                None => Some((key.to_lowercase(), value)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_without_prefix() {
        let loader = EnvLoader::new(None);
        let map = loader.filter(vars(&[("WEBHOOKS_SECRET", "s"), ("PATH", "/bin")]));

        assert_eq!(map.get("webhooks_secret").map(String::as_str), Some("s"));
        assert_eq!(map.get("path").map(String::as_str), Some("/bin"));
    }

    #[test]
    fn test_filter_with_prefix() {
        let loader = EnvLoader::new(Some("HUBMOCK".to_string()));
        let map = loader.filter(vars(&[("HUBMOCK_LOG_LEVEL", "debug"), ("OTHER", "x")]));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("log_level").map(String::as_str), Some("debug"));
    }

    #[test]
    fn test_missing_explicit_dotenv_file() {
        let result = EnvLoader::load_dotenv(Some(Path::new("/nonexistent/hubmock.env")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
