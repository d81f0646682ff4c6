//! Resolver configuration.
//!
//! [`ResolverConfig`] is the filled-in settings struct the resolver consumes.
//! It can be built in code, deserialized with serde as part of a larger host
//! configuration, or loaded from the process environment and container secret
//! files with [`ConfigLoader`].
//!
//! # Environment
//!
//! With prefix `APP`, the loader reads:
//!
//! | key | field |
//! |-----|-------|
//! | `APP_RESOLVER` | [`ResolverConfig::upstream`] |
//! | `APP_BOOTSTRAP_RESOLVER` | [`ResolverConfig::bootstrap_address`] |
//! | `APP_STARTUP` | [`ResolverConfig::startup_window`] |
//! | `APP_INSECURE_HTTP` | [`ResolverConfig::insecure_tls`] |
//! | `APP_VERBOSE` | [`ResolverConfig::verbose`] |
//!
//! Files in the secrets directory (default `/run/secrets`) whose name starts
//! with the prefix are read as well; the upper-cased file name is the key and
//! the trimmed content the value. Secrets take precedence over the environment.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Standard DNS port, filled in when an address omits one.
pub const DNS_PORT: u16 = 53;

/// The embedded resolver of Docker user-defined networks.
pub const DEFAULT_BOOTSTRAP_RESOLVER: &str = "127.0.0.11:53";

pub const DEFAULT_STARTUP_WINDOW: Duration = Duration::from_secs(5);

/// Startup windows shorter than this are raised to it.
pub const MIN_STARTUP_WINDOW: Duration = Duration::from_secs(3);

pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

/// Settings for a [`PreResolver`](crate::dns::PreResolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Literal IP or hostname of the DNS server to use after bootstrap.
    #[serde(alias = "resolver")]
    pub upstream: String,
    /// DNS server used only to resolve `upstream` when it is a hostname.
    #[serde(alias = "bootstrapResolver")]
    pub bootstrap_address: String,
    /// Total time budget for bootstrap retries.
    #[serde(alias = "startup", with = "duration_str")]
    pub startup_window: Duration,
    /// Skip certificate verification on derived HTTP clients.
    #[serde(alias = "insecureHttp", alias = "insecure_http")]
    pub insecure_tls: bool,
    /// Emit diagnostic events for bootstrap and lookups.
    pub verbose: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            upstream: String::new(),
            bootstrap_address: DEFAULT_BOOTSTRAP_RESOLVER.to_string(),
            startup_window: DEFAULT_STARTUP_WINDOW,
            insecure_tls: false,
            verbose: false,
        }
    }
}

impl ResolverConfig {
    /// Create a config for the given upstream with every other field defaulted.
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
            ..Self::default()
        }
    }

    pub fn with_bootstrap_address(mut self, address: impl Into<String>) -> Self {
        self.bootstrap_address = address.into();
        self
    }

    pub fn with_startup_window(mut self, window: Duration) -> Self {
        self.startup_window = window;
        self
    }

    pub fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The startup window with the minimum floor applied.
    pub fn effective_startup_window(&self) -> Duration {
        self.startup_window.max(MIN_STARTUP_WINDOW)
    }

    /// Number of bootstrap attempts: whole seconds of the effective window.
    pub fn bootstrap_attempts(&self) -> u64 {
        self.effective_startup_window().as_secs()
    }

    /// Load from `PREFIX_*` environment variables and `/run/secrets`.
    pub fn from_env(prefix: &str) -> Result<Self, NetError> {
        ConfigLoader::new(prefix).load()
    }
}

/// A normalized network address: always carries an explicit port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// A literal IP address; no resolution needed.
    Addr(SocketAddr),
    /// A hostname that must be resolved before use.
    Host { host: String, port: u16 },
}

impl Endpoint {
    /// Parse an address, filling in [`DNS_PORT`] when the port is omitted.
    ///
    /// Accepts `10.0.0.5`, `10.0.0.5:5353`, `::1`, `[::1]:5353`,
    /// `dns.internal` and `dns.internal:5353`.
    pub fn parse(input: &str) -> Result<Self, NetError> {
        Self::parse_with_default_port(input, DNS_PORT)
    }

    pub fn parse_with_default_port(input: &str, default_port: u16) -> Result<Self, NetError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(NetError::InvalidAddress("empty address".into()));
        }

        if let Ok(addr) = input.parse::<SocketAddr>() {
            return Ok(Endpoint::Addr(addr));
        }
        if let Ok(ip) = input.parse::<IpAddr>() {
            return Ok(Endpoint::Addr(SocketAddr::new(ip, default_port)));
        }
        if input.starts_with('[') {
            // Bracketed but not a valid `[v6]:port`
            let inner = input.trim_start_matches('[').trim_end_matches(']');
            return inner
                .parse::<IpAddr>()
                .map(|ip| Endpoint::Addr(SocketAddr::new(ip, default_port)))
                .map_err(|_| NetError::InvalidAddress(input.to_string()));
        }

        let (host, port) = match input.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| NetError::InvalidAddress(input.to_string()))?;
                (host, port)
            }
            None => (input, default_port),
        };

        if !is_valid_hostname(host) {
            return Err(NetError::InvalidAddress(input.to_string()));
        }

        Ok(Endpoint::Host {
            host: host.trim_end_matches('.').to_ascii_lowercase(),
            port,
        })
    }

    pub fn port(&self) -> u16 {
        match self {
            Endpoint::Addr(addr) => addr.port(),
            Endpoint::Host { port, .. } => *port,
        }
    }

    /// The literal address, if this endpoint needs no resolution.
    pub fn as_socket_addr(&self) -> Option<SocketAddr> {
        match self {
            Endpoint::Addr(addr) => Some(*addr),
            Endpoint::Host { .. } => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Addr(addr) => fmt::Display::fmt(addr, f),
            Endpoint::Host { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}

/// Loads a [`ResolverConfig`] from defaults, environment and secret files.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    prefix: String,
    secrets_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given prefix. A trailing `_` is added if missing.
    pub fn new(prefix: &str) -> Self {
        let mut prefix = prefix.to_ascii_uppercase();
        if !prefix.ends_with('_') {
            prefix.push('_');
        }
        Self {
            prefix,
            secrets_dir: PathBuf::from(DEFAULT_SECRETS_DIR),
        }
    }

    /// Override the secrets directory.
    pub fn secrets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.secrets_dir = dir.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Load from the process environment and the secrets directory.
    ///
    /// Variables outside the prefix are never inspected, so non-UTF-8
    /// entries elsewhere in the environment are harmless.
    pub fn load(&self) -> Result<ResolverConfig, NetError> {
        let mut vars = HashMap::new();
        for (key, value) in std::env::vars_os() {
            let Ok(key) = key.into_string() else {
                continue;
            };
            if !key.starts_with(&self.prefix) {
                continue;
            }
            let value = value
                .into_string()
                .map_err(|_| NetError::invalid_config(&key, "value is not valid UTF-8"))?;
            vars.insert(key, value);
        }
        vars.extend(self.read_secrets()?);
        self.from_vars(vars)
    }

    /// Build a config from an explicit set of variables.
    pub fn from_vars<I, K, V>(&self, vars: I) -> Result<ResolverConfig, NetError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = ResolverConfig::default();

        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(self.prefix.as_str()) else {
                continue;
            };
            let value: String = value.into();
            match field {
                "RESOLVER" | "UPSTREAM" => config.upstream = value.trim().to_string(),
                "BOOTSTRAP_RESOLVER" | "BOOTSTRAPRESOLVER" => {
                    config.bootstrap_address = value.trim().to_string()
                }
                "STARTUP" => {
                    config.startup_window = parse_duration(&value)
                        .map_err(|reason| NetError::invalid_config(key.as_ref(), reason))?
                }
                "INSECURE_HTTP" => {
                    config.insecure_tls = parse_bool(&value)
                        .ok_or_else(|| NetError::invalid_config(key.as_ref(), "not a boolean"))?
                }
                "VERBOSE" => {
                    config.verbose = parse_bool(&value)
                        .ok_or_else(|| NetError::invalid_config(key.as_ref(), "not a boolean"))?
                }
                _ => tracing::trace!(key = key.as_ref(), "ignoring unknown config key"),
            }
        }

        Ok(config)
    }

    /// Read prefixed secret files into `(KEY, value)` pairs.
    ///
    /// A missing directory is not an error; unreadable matching files are.
    pub fn read_secrets(&self) -> Result<HashMap<String, String>, NetError> {
        let mut secrets = HashMap::new();
        let entries = match std::fs::read_dir(&self.secrets_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::trace!(dir = %self.secrets_dir.display(), error = %e, "no secrets directory");
                return Ok(secrets);
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_ascii_uppercase();
            if !name.starts_with(self.prefix.as_str()) {
                continue;
            }
            let path = entry.path();
            let metadata = std::fs::metadata(&path).secret_context(&path)?;
            if metadata.is_dir() || metadata.len() == 0 {
                continue;
            }
            let value = read_secret(&path)?;
            tracing::debug!(key = %name, "loaded secret");
            secrets.insert(name, value);
        }

        Ok(secrets)
    }
}

fn read_secret(path: &Path) -> Result<String, NetError> {
    let raw = std::fs::read_to_string(path).secret_context(path)?;
    Ok(raw.trim().to_string())
}

/// Parse a boolean the way Go's `strconv.ParseBool` does.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a duration string (e.g. "5s", "1500ms", "2m", "1h").
///
/// A bare number is taken as whole seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration {:?}", value))?;

    match unit {
        "" | "s" => Ok(Duration::from_secs(amount)),
        "ms" => Ok(Duration::from_millis(amount)),
        "m" => scaled_secs(amount, 60, value),
        "h" => scaled_secs(amount, 3600, value),
        _ => Err(format!("unknown duration unit {:?}", unit)),
    }
}

fn scaled_secs(amount: u64, scale: u64, value: &str) -> Result<Duration, String> {
    amount
        .checked_mul(scale)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration {:?} out of range", value))
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Serde codec for durations written as "5s" / "1500ms".
mod duration_str {
    use super::{format_duration, parse_duration};
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Secs(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => parse_duration(&text).map_err(de::Error::custom),
        }
    }
}
