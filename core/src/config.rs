//! Runtime diagnostics mode.
//!
//! Development mode enables advisory warnings (for example unexpected keys in
//! combined state). Production mode skips them. The default follows the build
//! profile and can be overridden through the `HOLDFAST_ENV` variable.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable read by [`Diagnostics::from_env`].
pub const ENV_VAR: &str = "HOLDFAST_ENV";

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The environment name is not recognised.
    #[error("unknown environment `{0}`, expected `development` or `production`")]
    InvalidEnvironment(String),
}

/// Whether advisory development checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diagnostics {
    /// Emit advisory warnings.
    Development,
    /// Skip advisory warnings.
    Production,
}

impl Default for Diagnostics {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

impl Diagnostics {
    /// Read the mode from `HOLDFAST_ENV`, falling back to the build default
    /// when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironment`] if the variable holds an
    /// unrecognised value.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(ENV_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Whether advisory warnings are enabled.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Diagnostics {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(value.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("dev".parse::<Diagnostics>().unwrap(), Diagnostics::Development);
        assert_eq!(
            " Production ".parse::<Diagnostics>().unwrap(),
            Diagnostics::Production
        );
        assert_eq!(
            "staging".parse::<Diagnostics>(),
            Err(ConfigError::InvalidEnvironment("staging".to_string()))
        );
    }

    #[test]
    fn test_default_follows_build_profile() {
        assert_eq!(
            Diagnostics::default().is_development(),
            cfg!(debug_assertions)
        );
    }

    #[test]
    fn test_deserialize_lowercase() {
        let mode: Diagnostics = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(mode, Diagnostics::Production);
    }
}
