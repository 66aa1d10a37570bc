use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;

use super::parser::{BOT_TOKEN_ENV, Config, LISTENER_WEBHOOK_URL_ENV, WEBHOOK_URL_ENV};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.auth.bot_token {
            Some(token) if !token.expose_secret().trim().is_empty() => {}
            _ => return Err(ConfigError::Missing(BOT_TOKEN_ENV)),
        }

        ensure_http_scheme(WEBHOOK_URL_ENV, self.ask_webhook_url()?)?;
        if let Some(url) = &self.webhook.listener_url {
            ensure_http_scheme(LISTENER_WEBHOOK_URL_ENV, url)?;
        }

        if self.web.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "web.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.web.bind_address.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "web.bind_address cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Destination for `ask` payloads. Always present on a validated config.
    pub fn ask_webhook_url(&self) -> Result<&Url, ConfigError> {
        self.webhook
            .url
            .as_ref()
            .ok_or(ConfigError::Missing(WEBHOOK_URL_ENV))
    }
}

pub(super) fn parse_webhook_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::InvalidConfig(format!("{name} is not a valid URL: {err}")))?;
    ensure_http_scheme(name, &url)?;
    Ok(url)
}

fn ensure_http_scheme(name: &str, url: &Url) -> Result<(), ConfigError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidConfig(format!(
            "{name} must use http or https, got {other}"
        ))),
    }
}
