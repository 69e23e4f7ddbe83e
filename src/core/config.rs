//! Process configuration.
//!
//! Everything the bot needs from the environment is read once at startup into
//! an immutable [`Config`] and shared as `Arc<Config>`. Fixed tuning constants
//! live in the nested modules below.

use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default Streamtape API endpoint.
pub const DEFAULT_RESOLVER_URL: &str = "https://api.streamtape.com";

/// Default port of the static file endpoint.
pub const DEFAULT_STATIC_PORT: u16 = 3000;

/// Default log file path.
pub const DEFAULT_LOG_FILE: &str = "tapebot.log";

/// Validation configuration
pub mod validation {
    /// Maximum URL length accepted from chat messages
    pub const MAX_URL_LENGTH: usize = 2048;

    /// Bot API attachment ceiling (50 MiB). Artifacts strictly below this are sent inline.
    pub const INLINE_LIMIT_BYTES: u64 = 50 * 1024 * 1024;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    /// Generous because inline video uploads go through the same client
    pub const REQUEST_TIMEOUT_SECS: u64 = 900; // 15 minutes

    /// Connect timeout for the media host (in seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;

    /// Upper bound on a whole media download (in seconds)
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600; // 10 minutes

    /// Longest silence tolerated from the media host, headers or body (in seconds)
    pub const READ_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }

    pub fn download_timeout() -> Duration {
        Duration::from_secs(DOWNLOAD_TIMEOUT_SECS)
    }

    pub fn read_timeout() -> Duration {
        Duration::from_secs(READ_TIMEOUT_SECS)
    }
}

/// Resolver (Streamtape API) configuration
pub mod resolver {
    use super::Duration;

    /// Upper bound on the `wait_time` the API may ask for between ticket and link
    pub const MAX_TICKET_WAIT_SECS: u64 = 30;

    /// Timeout for a single API call
    pub const REQUEST_TIMEOUT_SECS: u64 = 20;

    pub fn ticket_wait_cap() -> Duration {
        Duration::from_secs(MAX_TICKET_WAIT_SECS)
    }

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Streamtape account used to exchange links for direct URLs.
#[derive(Debug, Clone)]
pub struct ResolverCredentials {
    pub base_url: Url,
    pub username: String,
    pub password: SecretString,
}

/// Secondary MTProto session used for files above the inline limit.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_id: i32,
    pub api_hash: SecretString,
    pub session_file: PathBuf,
    /// Destination channel, Bot API form (`-100…`) or bare id
    pub channel_id: i64,
}

/// Static file endpoint used when no relay session is configured.
#[derive(Debug, Clone)]
pub struct StaticLinkConfig {
    pub port: u16,
    pub public_url: String,
    pub publish_dir: PathBuf,
}

/// Which fallback the delivery router uses for oversized artifacts.
#[derive(Debug, Clone)]
pub enum FallbackPolicy {
    Relay(RelayConfig),
    StaticLink(StaticLinkConfig),
}

/// Immutable process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: SecretString,
    pub bot_api_url: Option<Url>,
    pub resolver: ResolverCredentials,
    pub admin_ids: Vec<i64>,
    pub fallback: FallbackPolicy,
    pub download_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let bot_api_url = get("BOT_API_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|_| ConfigError::Invalid {
                    var: "BOT_API_URL",
                    value: raw,
                })
            })
            .transpose()?;

        let resolver_url = get("RESOLVER_API_URL").unwrap_or_else(|| DEFAULT_RESOLVER_URL.to_string());
        let resolver = ResolverCredentials {
            base_url: Url::parse(&resolver_url).map_err(|_| ConfigError::Invalid {
                var: "RESOLVER_API_URL",
                value: resolver_url.clone(),
            })?,
            username: get("API_USER").ok_or(ConfigError::Missing("API_USER"))?,
            password: SecretString::from(get("API_PASS").ok_or(ConfigError::Missing("API_PASS"))?),
        };

        let admin_ids = get("BOT_ADMIN").map(|raw| parse_admin_ids(&raw)).unwrap_or_default();

        let download_dir = get("DOWNLOAD_DIR")
            .map(|raw| PathBuf::from(shellexpand::tilde(&raw).to_string()))
            .unwrap_or_else(env::temp_dir);

        let log_file = get("LOG_FILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        let fallback = match (get("API_ID"), get("API_HASH")) {
            (Some(api_id), Some(api_hash)) => {
                let api_id = parse_var::<i32>("API_ID", &api_id)?;
                let channel = get("RELAY_CHANNEL_ID").ok_or(ConfigError::Missing("RELAY_CHANNEL_ID"))?;
                FallbackPolicy::Relay(RelayConfig {
                    api_id,
                    api_hash: SecretString::from(api_hash),
                    session_file: get("SESSION_FILE")
                        .map(|raw| PathBuf::from(shellexpand::tilde(&raw).to_string()))
                        .unwrap_or_else(|| PathBuf::from("relay.session")),
                    channel_id: parse_var::<i64>("RELAY_CHANNEL_ID", &channel)?,
                })
            }
            _ => {
                let port = match get("STATIC_PORT") {
                    Some(raw) => parse_var::<u16>("STATIC_PORT", &raw)?,
                    None => DEFAULT_STATIC_PORT,
                };
                let public_url = get("STATIC_PUBLIC_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| format!("http://localhost:{}", port));
                FallbackPolicy::StaticLink(StaticLinkConfig {
                    port,
                    public_url,
                    publish_dir: download_dir.join("published"),
                })
            }
        };

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            bot_api_url,
            resolver,
            admin_ids,
            fallback,
            download_dir,
            log_file,
        })
    }

    /// Returns true if the chat belongs to a configured administrator.
    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.admin_ids.contains(&chat_id)
    }

    /// First configured administrator, the recipient of message copies.
    pub fn primary_admin(&self) -> Option<i64> {
        self.admin_ids.first().copied()
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.to_string(),
    })
}

fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split([',', ' ', '\n', '\t'])
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    const BASE: &[(&str, &str)] = &[("BOT_TOKEN", "123:abc"), ("API_USER", "user"), ("API_PASS", "pass")];

    #[test]
    fn test_minimal_env_selects_static_link() {
        let config = Config::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "123:abc");
        assert_eq!(config.resolver.base_url.as_str(), "https://api.streamtape.com/");
        assert!(config.admin_ids.is_empty());
        match config.fallback {
            FallbackPolicy::StaticLink(ref s) => {
                assert_eq!(s.port, 3000);
                assert_eq!(s.public_url, "http://localhost:3000");
            }
            FallbackPolicy::Relay(_) => panic!("expected static link policy"),
        }
    }

    #[test]
    fn test_relay_policy_when_credentials_present() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("API_ID", "12345"),
            ("API_HASH", "deadbeef"),
            ("RELAY_CHANNEL_ID", "-1001234567890"),
            ("SESSION_FILE", "/var/lib/tapebot/relay.session"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        match config.fallback {
            FallbackPolicy::Relay(ref r) => {
                assert_eq!(r.api_id, 12345);
                assert_eq!(r.channel_id, -1001234567890);
                assert_eq!(r.session_file, PathBuf::from("/var/lib/tapebot/relay.session"));
            }
            FallbackPolicy::StaticLink(_) => panic!("expected relay policy"),
        }
    }

    #[test]
    fn test_relay_requires_channel() {
        let mut pairs = BASE.to_vec();
        pairs.extend([("API_ID", "12345"), ("API_HASH", "deadbeef")]);
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RELAY_CHANNEL_ID")));
    }

    #[test]
    fn test_missing_credentials() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("API_USER")));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = BASE.to_vec();
        pairs.push(("STATIC_PORT", "http"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "STATIC_PORT", .. }));
    }

    #[test]
    fn test_admin_ids() {
        let mut pairs = BASE.to_vec();
        pairs.push(("BOT_ADMIN", "111, 222,abc 333"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.admin_ids, vec![111, 222, 333]);
        assert!(config.is_admin(222));
        assert!(!config.is_admin(444));
        assert_eq!(config.primary_admin(), Some(111));
    }
}
