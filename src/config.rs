use crate::error::{Result, ShellError};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

pub const ENV_API_URL: &str = "TSH_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "TSH_TIMEOUT_SECS";

/// Where the task service lives and how long to wait for it.
///
/// Resolution order: command-line flag, then environment:
///   TSH_API_URL      : base URL of the task service, defaults to http://127.0.0.1:8000
///   TSH_TIMEOUT_SECS : request timeout in seconds, unset or 0 disables it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub api_url: Url,
    pub timeout: Option<Duration>,
}

impl ShellConfig {
    pub fn resolve(api_url: Option<&str>, timeout_secs: Option<u64>) -> Result<Self> {
        let api_url = match api_url {
            Some(url) => parse_api_url(url, "--api-url")?,
            None => match non_empty_env(ENV_API_URL) {
                Some(url) => parse_api_url(&url, ENV_API_URL)?,
                None => parse_api_url(DEFAULT_API_URL, "default")?,
            },
        };

        let timeout_secs = match timeout_secs {
            Some(secs) => Some(secs),
            None => match non_empty_env(ENV_TIMEOUT_SECS) {
                Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                    ShellError::InvalidConfig(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        ENV_TIMEOUT_SECS, raw
                    ))
                })?),
                None => None,
            },
        };

        Ok(Self {
            api_url,
            timeout: timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None)
    }

    pub fn with_api_url(api_url: &str) -> Result<Self> {
        Ok(Self {
            api_url: parse_api_url(api_url, "api url")?,
            timeout: None,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_api_url(raw: &str, source: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ShellError::InvalidConfig(format!("{}: '{}' ({})", source, raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ShellError::InvalidConfig(format!(
            "{}: '{}' must use http or https",
            source, raw
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_TIMEOUT_SECS);
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ShellConfig::from_env().unwrap();
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.timeout, None);
    }

    #[test]
    #[serial]
    fn test_env_values() {
        clear_env();
        std::env::set_var(ENV_API_URL, "https://tasks.example.com/api");
        std::env::set_var(ENV_TIMEOUT_SECS, "15");
        let config = ShellConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.api_url.as_str(), "https://tasks.example.com/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    #[serial]
    fn test_flags_override_env() {
        clear_env();
        std::env::set_var(ENV_API_URL, "https://tasks.example.com");
        std::env::set_var(ENV_TIMEOUT_SECS, "15");
        let config = ShellConfig::resolve(Some("http://localhost:9000"), Some(3)).unwrap();
        clear_env();

        assert_eq!(config.api_url.as_str(), "http://localhost:9000/");
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    #[serial]
    fn test_zero_timeout_disables_it() {
        clear_env();
        let config = ShellConfig::resolve(None, Some(0)).unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_env() {
        clear_env();
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");
        let result = ShellConfig::from_env();
        clear_env();

        let err = result.unwrap_err();
        assert_eq!(err.to_error_code(), "INVALID_CONFIG");
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));
    }

    #[test]
    #[serial]
    fn test_invalid_url_names_source() {
        clear_env();
        std::env::set_var(ENV_API_URL, "not a url");
        let result = ShellConfig::from_env();
        clear_env();

        assert!(result.unwrap_err().to_string().contains(ENV_API_URL));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = ShellConfig::with_api_url("ftp://example.com").unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }
}
