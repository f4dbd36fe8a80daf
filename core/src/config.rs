//! Client configuration loaded from the environment.
//!
//! The only recognized option is the base URL every endpoint path is joined
//! onto. A `.env` file in the working directory is honoured for local
//! development, but skipped under test so tests stay hermetic.

pub const BASE_URL_VAR: &str = "TUTOR_API_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        match lookup(BASE_URL_VAR) {
            Some(raw) if !raw.trim().is_empty() => Self::with_base_url(raw.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Validates and normalizes an explicit base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                BASE_URL_VAR.to_string(),
                format!("'{base_url}' must start with http:// or https://"),
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_uses_default() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/api/v1");
    }

    #[test]
    fn variable_overrides_default_and_drops_trailing_slash() {
        let config = Config::from_lookup(|key| {
            (key == BASE_URL_VAR).then(|| "https://tutor.example.com/api/v1/".to_string())
        })
        .unwrap();
        assert_eq!(config.base_url, "https://tutor.example.com/api/v1");
    }

    #[test]
    fn blank_variable_is_treated_as_unset() {
        let config = Config::from_lookup(|_| Some("  ".to_string())).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn non_http_url_is_rejected() {
        let err = Config::from_lookup(|_| Some("localhost:8000".to_string())).unwrap_err();
        assert!(err.to_string().contains(BASE_URL_VAR));
    }
}
