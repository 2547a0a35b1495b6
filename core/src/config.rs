//! Connection credentials for the remote API.

use std::env;
use std::fmt;

use url::Url;

/// Host, account, and TLS policy for one client.
///
/// Immutable once built; the client borrows it for every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    host: String,
    username: String,
    password: String,
    insecure: bool,
}

impl Credential {
    /// Validate `host` and build a credential with certificate verification on.
    pub fn new(
        host: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let host = host.trim_end_matches('/');
        Url::parse(host).map_err(|e| ConfigError::InvalidHost {
            host: host.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            host: host.to_string(),
            username: username.into(),
            password: password.into(),
            insecure: false,
        })
    }

    /// Disable certificate verification when `insecure` is true.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Load from `VERGEIO_HOST`, `VERGEIO_USERNAME`, `VERGEIO_PASSWORD` and
    /// the optional `VERGEIO_INSECURE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let host = required("VERGEIO_HOST")?;
        let username = required("VERGEIO_USERNAME")?;
        let password = required("VERGEIO_PASSWORD")?;
        let insecure = lookup("VERGEIO_INSECURE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self::new(&host, username, password)?.insecure(insecure))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("invalid host {host}: {message}")]
    InvalidHost { host: String, message: String },
}
