//! Configuration for the sonance input layer
//!
//! Constant tables live in nested modules; per-session settings are carried
//! by [`TransportConfig`], which callers pass explicitly into `stream::open`.

use serde::Deserialize;

use crate::error::{InputError, Result};

/// Stream buffer configuration
pub mod buffer {
    /// Capacity of the per-session byte buffer
    pub const CAPACITY: usize = 128 * 1024;

    /// Bytes that must be buffered before delivery resumes after running dry
    pub const PREBUFFER_THRESHOLD: usize = CAPACITY / 4;
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("Sonance/", env!("CARGO_PKG_VERSION"));

    /// Port used when the URL names none
    pub const DEFAULT_HTTP_PORT: u16 = 80;

    /// Maximum number of 301/302 redirects followed per session
    pub const MAX_REDIRECTS: u32 = 10;
}

/// ICY (Shoutcast/Icecast) metadata configuration
pub mod icy {
    /// The metadata length byte counts units of this many bytes
    pub const LENGTH_UNIT: usize = 16;
}

/// Blocking reader configuration (decoder side)
pub mod reader {
    /// Sleep between pumps while a stream has nothing to deliver (milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 10;

    /// Time without receiving any data before a blocking read gives up (seconds)
    pub const STALL_TIMEOUT_SECS: u64 = 30;
}

/// HTTP proxy settings.
///
/// Validated for consistency at open time. Routing requests through the proxy
/// is not implemented.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: Option<i64>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Settings for one input stream session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub buffer_capacity: usize,
    pub prebuffer_threshold: usize,
    pub max_redirects: u32,
    pub user_agent: String,
    pub proxy: Option<ProxyConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: buffer::CAPACITY,
            prebuffer_threshold: buffer::PREBUFFER_THRESHOLD,
            max_redirects: network::MAX_REDIRECTS,
            user_agent: network::USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

impl TransportConfig {
    /// Check the settings for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(InputError::Config(
                "buffer_capacity must be greater than zero".to_string(),
            ));
        }
        if self.prebuffer_threshold >= self.buffer_capacity {
            return Err(InputError::Config(format!(
                "prebuffer_threshold ({}) must be below buffer_capacity ({})",
                self.prebuffer_threshold, self.buffer_capacity
            )));
        }
        if let Some(proxy) = &self.proxy {
            proxy.validate()?;
        }
        Ok(())
    }
}

impl ProxyConfig {
    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(InputError::Config("proxy host is empty".to_string()));
        }
        match self.port {
            None => {
                return Err(InputError::Config(
                    "proxy host specified but not the proxy port".to_string(),
                ))
            }
            Some(port) if port <= 0 || port > i64::from(u16::MAX) => {
                return Err(InputError::Config(format!(
                    "proxy port \"{port}\" is not a positive integer"
                )))
            }
            Some(_) => {}
        }
        match (&self.user, &self.password) {
            (Some(_), None) => Err(InputError::Config(
                "proxy user specified, but not proxy password".to_string(),
            )),
            (None, Some(_)) => Err(InputError::Config(
                "proxy password specified, but not proxy user".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(port: Option<i64>, user: Option<&str>, password: Option<&str>) -> ProxyConfig {
        ProxyConfig {
            host: "proxy.local".to_string(),
            port,
            user: user.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    // --- constants ---

    #[test]
    fn prebuffer_is_quarter_of_capacity() {
        assert_eq!(buffer::CAPACITY, 131072);
        assert_eq!(buffer::PREBUFFER_THRESHOLD, 32768);
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(network::USER_AGENT.starts_with("Sonance/"));
        assert!(network::USER_AGENT.len() > "Sonance/".len());
    }

    // --- TransportConfig ---

    #[test]
    fn default_config_is_valid() {
        let config = TransportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_redirects, 10);
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = TransportConfig {
            buffer_capacity: 0,
            prebuffer_threshold: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(InputError::Config(_))));
    }

    #[test]
    fn prebuffer_not_below_capacity_rejected() {
        let config = TransportConfig {
            buffer_capacity: 64,
            prebuffer_threshold: 64,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(InputError::Config(_))));
    }

    #[test]
    fn deserialize_partial_config() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"buffer_capacity": 4096, "prebuffer_threshold": 1024}"#)
                .unwrap();
        assert_eq!(config.buffer_capacity, 4096);
        assert_eq!(config.prebuffer_threshold, 1024);
        assert_eq!(config.max_redirects, network::MAX_REDIRECTS);
        assert!(config.proxy.is_none());
    }

    // --- ProxyConfig ---

    #[test]
    fn proxy_complete_is_valid() {
        assert!(proxy(Some(3128), Some("me"), Some("secret")).validate().is_ok());
        assert!(proxy(Some(3128), None, None).validate().is_ok());
    }

    #[test]
    fn proxy_without_port_rejected() {
        let err = proxy(None, None, None).validate().unwrap_err();
        assert!(err.to_string().contains("proxy port"));
    }

    #[test]
    fn proxy_non_positive_port_rejected() {
        assert!(proxy(Some(0), None, None).validate().is_err());
        assert!(proxy(Some(-8080), None, None).validate().is_err());
        assert!(proxy(Some(70000), None, None).validate().is_err());
    }

    #[test]
    fn proxy_user_without_password_rejected() {
        let err = proxy(Some(3128), Some("me"), None).validate().unwrap_err();
        assert!(err.to_string().contains("proxy password"));
    }

    #[test]
    fn proxy_password_without_user_rejected() {
        let err = proxy(Some(3128), None, Some("secret")).validate().unwrap_err();
        assert!(err.to_string().contains("proxy user"));
    }

    #[test]
    fn invalid_proxy_fails_transport_validation() {
        let config = TransportConfig {
            proxy: Some(proxy(None, None, None)),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
