//! Configuration management for likefollow
//!
//! Secrets come from the environment only. Run tunables are layered:
//! built-in defaults, then an optional TOML file, then environment variables.
//! Binaries may apply CLI overrides on top of the result.
//!
//! ```toml
//! [run]
//! tweets_to_scan = 20
//! follow_cap = 15
//! pages_per_post = 1
//! sleep_min = 2.0
//! sleep_max = 4.0
//! state_file = "~/.local/share/likefollow/processed_likers.json"
//! ```

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::pacing::SleepWindow;

pub const DEFAULT_TWEETS_TO_SCAN: usize = 20;
pub const DEFAULT_FOLLOW_CAP: usize = 15;
pub const DEFAULT_PAGES_PER_POST: usize = 1;
pub const DEFAULT_STATE_FILE: &str = "processed_likers.json";

/// Environment keys that must be present before any network call
pub const REQUIRED_VARS: [&str; 6] = [
    "API_KEY",
    "API_SECRET",
    "ACCESS_TOKEN",
    "ACCESS_TOKEN_SECRET",
    "TELEGRAM_TOKEN",
    "TELEGRAM_CHAT_ID",
];

/// OAuth 1.0a user-context credentials for the social platform
#[derive(Debug)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: SecretString,
    pub access_token: String,
    pub access_token_secret: SecretString,
}

/// Bot token and destination chat for notifications
#[derive(Debug)]
pub struct TelegramCredentials {
    pub bot_token: SecretString,
    pub chat_id: String,
}

impl TelegramCredentials {
    /// Build from optional values, naming every missing one by its env key
    pub fn from_options(bot_token: Option<String>, chat_id: Option<String>) -> Result<Self> {
        let present = |v: Option<String>| v.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        match (present(bot_token), present(chat_id)) {
            (Some(bot_token), Some(chat_id)) => Ok(Self {
                bot_token: SecretString::from(bot_token),
                chat_id,
            }),
            (token, chat) => {
                let mut missing = Vec::new();
                if token.is_none() {
                    missing.push("TELEGRAM_TOKEN".to_string());
                }
                if chat.is_none() {
                    missing.push("TELEGRAM_CHAT_ID".to_string());
                }
                Err(ConfigError::MissingVars(missing).into())
            }
        }
    }
}

/// Tunables for one follow pass, fixed for the whole run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// How many of the newest posts to scan
    pub tweets_to_scan: usize,
    /// Maximum follows per run
    pub follow_cap: usize,
    /// Liker pages fetched per post (up to 100 likers each)
    pub pages_per_post: usize,
    pub sleep: SleepWindow,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            tweets_to_scan: DEFAULT_TWEETS_TO_SCAN,
            follow_cap: DEFAULT_FOLLOW_CAP,
            pages_per_post: DEFAULT_PAGES_PER_POST,
            sleep: SleepWindow::default(),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub twitter: TwitterCredentials,
    pub telegram: TelegramCredentials,
    pub run: RunSettings,
    pub state_file: PathBuf,
}

/// Optional on-disk configuration (tunables only, never secrets)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub run: RunFileConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunFileConfig {
    pub tweets_to_scan: Option<usize>,
    pub follow_cap: Option<usize>,
    pub pages_per_post: Option<usize>,
    pub sleep_min: Option<f64>,
    pub sleep_max: Option<f64>,
    pub state_file: Option<String>,
}

impl FileConfig {
    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: FileConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }
}

impl Config {
    /// Load configuration from the process environment and the optional config file
    pub fn load() -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let missing = missing_required(&env);
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing).into());
        }

        let file = match resolve_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config file {}", path.display());
                Some(FileConfig::load_from_path(&path)?)
            }
            Some(path) if std::env::var_os("LIKEFOLLOW_CONFIG").is_some() => {
                return Err(ConfigError::ReadError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                ))
                .into());
            }
            _ => None,
        };

        Self::from_lookup(env, file.as_ref())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Every missing secret is reported at once so the operator can fix them
    /// in a single pass.
    pub fn from_lookup<F>(lookup: F, file: Option<&FileConfig>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(&lookup, key);

        let missing = missing_required(&lookup);
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing).into());
        }

        let required =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingVars(vec![key.to_string()]));

        let twitter = TwitterCredentials {
            api_key: required("API_KEY")?,
            api_secret: SecretString::from(required("API_SECRET")?),
            access_token: required("ACCESS_TOKEN")?,
            access_token_secret: SecretString::from(required("ACCESS_TOKEN_SECRET")?),
        };
        let telegram = TelegramCredentials {
            bot_token: SecretString::from(required("TELEGRAM_TOKEN")?),
            chat_id: required("TELEGRAM_CHAT_ID")?,
        };

        let from_file = file.map(|f| f.run.clone()).unwrap_or_default();
        let defaults = RunSettings::default();

        let tweets_to_scan = parse_var(&get, "NUM_TWEETS")?
            .or(from_file.tweets_to_scan)
            .unwrap_or(defaults.tweets_to_scan);
        let follow_cap = parse_var(&get, "FOLLOW_CAP")?
            .or(from_file.follow_cap)
            .unwrap_or(defaults.follow_cap);
        let pages_per_post = parse_var(&get, "PAGE_LIMIT")?
            .or(from_file.pages_per_post)
            .unwrap_or(defaults.pages_per_post);
        let sleep_min = parse_var(&get, "SLEEP_MIN")?
            .or(from_file.sleep_min)
            .unwrap_or(defaults.sleep.min());
        let sleep_max = parse_var(&get, "SLEEP_MAX")?
            .or(from_file.sleep_max)
            .unwrap_or(defaults.sleep.max());

        let state_file = get("STATE_FILE")
            .or(from_file.state_file)
            .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());

        Ok(Self {
            twitter,
            telegram,
            run: RunSettings {
                tweets_to_scan,
                follow_cap,
                pages_per_post,
                sleep: SleepWindow::new(sleep_min, sleep_max)?,
            },
            state_file: expand_path(&state_file),
        })
    }
}

fn non_blank<G: Fn(&str) -> Option<String>>(lookup: &G, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Required secrets that are unset or blank, in declaration order
fn missing_required<G: Fn(&str) -> Option<String>>(lookup: &G) -> Vec<String> {
    REQUIRED_VARS
        .iter()
        .filter(|key| non_blank(lookup, key).is_none())
        .map(|key| key.to_string())
        .collect()
}

fn parse_var<T, G>(get: &G, key: &str) -> std::result::Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
            reason: format!("expected {}", std::any::type_name::<T>()),
        }),
    }
}

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("LIKEFOLLOW_CONFIG") {
        return Some(expand_path(&path));
    }

    dirs::config_dir().map(|dir| dir.join("likefollow").join("config.toml"))
}
