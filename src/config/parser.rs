use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use super::ConfigError;
use super::validator::parse_webhook_url;
use crate::gate::AllowList;

pub(super) const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
pub(super) const WEBHOOK_URL_ENV: &str = "N8N_WEBHOOK_URL";
pub(super) const LISTENER_WEBHOOK_URL_ENV: &str = "N8N_LISTENER_WEBHOOK_URL";
pub(super) const PORT_ENV: &str = "PORT";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(skip, default = "AllowList::compiled_in")]
    pub allow_list: AllowList,
}

#[derive(Debug, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub bot_token: Option<SecretString>,
    #[serde(default)]
    pub use_privileged_intents: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebhookConfig {
    /// Receives `/ask` payloads.
    #[serde(default)]
    pub url: Option<Url>,
    /// Receives passively observed channel messages. The listener is disabled without it.
    #[serde(default)]
    pub listener_url: Option<Url>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            webhook: WebhookConfig::default(),
            web: WebConfig::default(),
            allow_list: AllowList::compiled_in(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Config {
    /// Reads the optional YAML file, then lets the environment override it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub(super) fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(BOT_TOKEN_ENV) {
            self.auth.bot_token = Some(SecretString::from(value));
        }
        if let Some(value) = lookup(WEBHOOK_URL_ENV) {
            self.webhook.url = Some(parse_webhook_url(WEBHOOK_URL_ENV, &value)?);
        }
        if let Some(value) = lookup(LISTENER_WEBHOOK_URL_ENV) {
            self.webhook.listener_url = Some(parse_webhook_url(LISTENER_WEBHOOK_URL_ENV, &value)?);
        }
        if let Some(value) = lookup(PORT_ENV) {
            self.web.port = value.trim().parse().map_err(|_| {
                ConfigError::InvalidConfig(format!("{PORT_ENV} must be a port number, got {value:?}"))
            })?;
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::gate::ALLOWED_GUILD_IDS;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn from_env(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = env(pairs);
        let mut config = Config::from_yaml("")?;
        config.apply_overrides(|key| vars.get(key).cloned())?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn environment_only_config_uses_defaults() {
        let config = from_env(&[
            ("BOT_TOKEN", "token"),
            ("N8N_WEBHOOK_URL", "https://n8n.example.com/webhook/ask"),
        ])
        .unwrap();

        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.bind_address, "0.0.0.0");
        assert!(config.webhook.listener_url.is_none());
        assert_eq!(
            config.ask_webhook_url().unwrap().as_str(),
            "https://n8n.example.com/webhook/ask"
        );
        for id in ALLOWED_GUILD_IDS {
            assert!(config.allow_list.contains(id));
        }
    }

    #[test]
    fn missing_bot_token_is_fatal() {
        let err = from_env(&[("N8N_WEBHOOK_URL", "https://n8n.example.com/a")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BOT_TOKEN")));
    }

    #[test]
    fn blank_bot_token_counts_as_missing() {
        let err = from_env(&[
            ("BOT_TOKEN", "  "),
            ("N8N_WEBHOOK_URL", "https://n8n.example.com/a"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BOT_TOKEN")));
    }

    #[test]
    fn missing_webhook_url_is_fatal() {
        let err = from_env(&[("BOT_TOKEN", "token")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("N8N_WEBHOOK_URL")));
        assert_eq!(err.to_string(), "N8N_WEBHOOK_URL environment variable not set");
    }

    #[test]
    fn listener_url_enables_listener() {
        let config = from_env(&[
            ("BOT_TOKEN", "token"),
            ("N8N_WEBHOOK_URL", "https://n8n.example.com/a"),
            ("N8N_LISTENER_WEBHOOK_URL", "https://n8n.example.com/b"),
        ])
        .unwrap();
        assert!(config.webhook.listener_url.is_some());
    }

    #[test]
    fn invalid_url_and_port_are_rejected() {
        let err = from_env(&[("BOT_TOKEN", "t"), ("N8N_WEBHOOK_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));

        let err = from_env(&[("BOT_TOKEN", "t"), ("N8N_WEBHOOK_URL", "ftp://n8n.example.com")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));

        let err = from_env(&[
            ("BOT_TOKEN", "t"),
            ("N8N_WEBHOOK_URL", "https://n8n.example.com/a"),
            ("PORT", "http"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));

        let err = from_env(&[
            ("BOT_TOKEN", "t"),
            ("N8N_WEBHOOK_URL", "https://n8n.example.com/a"),
            ("PORT", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
auth:
  bot_token: from-file
webhook:
  url: https://file.example.com/ask
web:
  port: 9000
"#
        )
        .unwrap();

        let vars = env(&[("BOT_TOKEN", "from-env"), ("PORT", "3000")]);
        let mut config = Config::from_file(file.path()).unwrap();
        config.apply_overrides(|key| vars.get(key).cloned()).unwrap();
        config.validate().unwrap();

        assert_eq!(
            config.auth.bot_token.as_ref().unwrap().expose_secret(),
            "from-env"
        );
        assert_eq!(config.web.port, 3000);
        assert_eq!(
            config.ask_webhook_url().unwrap().as_str(),
            "https://file.example.com/ask"
        );
        assert!(!config.allow_list.is_empty());
    }

    #[test]
    fn file_with_bad_scheme_fails_validation() {
        let mut config = Config::from_yaml(
            "auth:\n  bot_token: t\nwebhook:\n  url: ftp://file.example.com/ask\n",
        )
        .unwrap();
        config.apply_overrides(|_| None).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unreadable_file_reports_io_error() {
        let err = Config::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn bot_token_is_redacted_in_debug_output() {
        let config = from_env(&[
            ("BOT_TOKEN", "super-secret-token"),
            ("N8N_WEBHOOK_URL", "https://n8n.example.com/a"),
        ])
        .unwrap();
        assert!(!format!("{config:?}").contains("super-secret-token"));
    }
}
