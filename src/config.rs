use std::{env, net::SocketAddr, path::PathBuf};

use thiserror::Error;

use crate::domain::context::{BookingBackend, Contacts, DEFAULT_PHONE_NEVADA, DEFAULT_PHONE_UTAH};

pub const DEFAULT_CHAT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Stdio,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub transport: Transport,
    pub contacts: Contacts,
    pub widget_base_url: Option<String>,
    pub backend: BookingBackend,
    pub service_areas_path: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub chat_api_base_url: String,
    pub chat_default_model: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("MCP_TRANSPORT must be 'http' or 'stdio'")]
    InvalidTransport,
    #[error("WIDGET_BASE_URL must be an http or https URL")]
    InvalidWidgetBaseUrl,
    #[error("USE_MOCK_API must be 'true' or 'false'")]
    InvalidMockFlag,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = var("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let transport = match var("MCP_TRANSPORT").map(|value| value.to_ascii_lowercase()) {
            None => Transport::Http,
            Some(value) if value == "http" => Transport::Http,
            Some(value) if value == "stdio" => Transport::Stdio,
            Some(_) => return Err(ConfigError::InvalidTransport),
        };

        let widget_base_url = var("WIDGET_BASE_URL")
            .map(|url| {
                if url.starts_with("http://") || url.starts_with("https://") {
                    Ok(url.trim_end_matches('/').to_string())
                } else {
                    Err(ConfigError::InvalidWidgetBaseUrl)
                }
            })
            .transpose()?;

        let backend = match var("USE_MOCK_API").map(|value| value.to_ascii_lowercase()) {
            None => BookingBackend::Mock,
            Some(value) if value == "true" => BookingBackend::Mock,
            Some(value) if value == "false" => BookingBackend::Unconfigured,
            Some(_) => return Err(ConfigError::InvalidMockFlag),
        };

        let config = Self {
            bind_addr,
            bind_port,
            transport,
            contacts: Contacts {
                phone_nevada: var("PHONE_NEVADA").unwrap_or_else(|| DEFAULT_PHONE_NEVADA.to_string()),
                phone_utah: var("PHONE_UTAH").unwrap_or_else(|| DEFAULT_PHONE_UTAH.to_string()),
            },
            widget_base_url,
            backend,
            service_areas_path: var("SERVICE_AREAS_PATH").map(PathBuf::from),
            openai_api_key: var("OPENAI_API_KEY"),
            chat_api_base_url: var("CHAT_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CHAT_API_BASE_URL.to_string()),
            chat_default_model: var("CHAT_DEFAULT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        };

        if config.transport == Transport::Http {
            let _ = config.bind_socket()?;
        }
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parse_defaults() {
        let config = config_from(&[]).expect("config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.backend, BookingBackend::Mock);
        assert_eq!(config.contacts, Contacts::default());
        assert_eq!(config.widget_base_url, None);
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.chat_api_base_url, DEFAULT_CHAT_API_BASE_URL);
        assert_eq!(config.chat_default_model, "gpt-3.5-turbo");
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("BIND_PORT", "9000"),
            ("MCP_TRANSPORT", "STDIO"),
            ("PHONE_UTAH", "(801) 555-0000"),
            ("WIDGET_BASE_URL", "https://cdn.example.com/widgets/"),
            ("USE_MOCK_API", "false"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .expect("config should parse");

        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.contacts.phone_utah, "(801) 555-0000");
        assert_eq!(config.contacts.phone_nevada, DEFAULT_PHONE_NEVADA);
        assert_eq!(
            config.widget_base_url.as_deref(),
            Some("https://cdn.example.com/widgets")
        );
        assert_eq!(config.backend, BookingBackend::Unconfigured);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("OPENAI_API_KEY", "   "), ("BIND_PORT", "")])
            .expect("config should parse");
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.bind_port, 8080);
    }

    #[test]
    fn invalid_port_fails() {
        let err = config_from(&[("BIND_PORT", "http")]).expect_err("expected invalid port");
        assert!(matches!(err, ConfigError::InvalidPort));
    }

    #[test]
    fn invalid_transport_fails() {
        let err = config_from(&[("MCP_TRANSPORT", "sse")]).expect_err("expected invalid transport");
        assert!(matches!(err, ConfigError::InvalidTransport));
    }

    #[test]
    fn widget_base_url_must_be_http() {
        let err = config_from(&[("WIDGET_BASE_URL", "ftp://widgets")])
            .expect_err("expected invalid url");
        assert!(matches!(err, ConfigError::InvalidWidgetBaseUrl));
    }

    #[test]
    fn invalid_bind_address_fails() {
        let err = config_from(&[("BIND_ADDR", "not an address")]).expect_err("expected bad socket");
        assert!(matches!(err, ConfigError::InvalidSocket));
    }
}
