//! Relay endpoint configuration and secret handling.

use std::fmt::Formatter;

use crate::RelayError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// API key wrapper that never leaks through `Debug` and is zeroed on drop.
#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn scrub(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.scrub();
    }
}

/// Upstream endpoint and credentials for one relay instance.
#[derive(Debug)]
pub struct RelayConfig {
    base_url: String,
    api_key: SecretString,
}

impl RelayConfig {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Reads `AI_API_KEY` (required) and `AI_BASE_URL` (optional) from the
    /// environment.
    pub fn from_env() -> Result<Self, RelayError> {
        let api_key = std::env::var("AI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RelayError::authentication("AI_API_KEY is not configured"))?;

        let base_url =
            std::env::var("AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self::new(base_url, SecretString::new(api_key)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// Label recorded as the `provider` of every usage report.
    pub fn provider_label(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_string_debug_is_redacted() {
        let secret = SecretString::new("sk-live-123");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.expose(), "sk-live-123");
    }

    #[test]
    fn scrub_zeroes_the_secret_in_place() {
        let mut secret = SecretString::new("sk-live-123");
        secret.scrub();
        assert!(secret.expose().bytes().all(|byte| byte == 0));
        assert_eq!(secret.expose().len(), "sk-live-123".len());
    }

    #[test]
    fn config_trims_trailing_slash() {
        let config = RelayConfig::new("https://relay.goftar.app/v1/", SecretString::new("k"));
        assert_eq!(config.base_url(), "https://relay.goftar.app/v1");
        assert_eq!(config.provider_label(), "https://relay.goftar.app/v1");
    }
}
