//! Error types for likefollow

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FollowError>;

#[derive(Error, Debug)]
pub enum FollowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not resolve own user ID; check API keys/permissions: {0}")]
    Identity(PlatformError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl FollowError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FollowError::Config(_) => 2,
            FollowError::Identity(_) => 1,
            FollowError::Platform(_) => 1,
            FollowError::Notify(_) => 1,
            FollowError::State(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing env vars: {}", .0.join(", "))]
    MissingVars(Vec<String>),

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Transport(String),

    #[error("Notification rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config_error() {
        let error = FollowError::Config(ConfigError::MissingVars(vec!["API_KEY".to_string()]));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_identity_error() {
        let error = FollowError::Identity(PlatformError::Authentication("bad keys".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_is_never_zero() {
        let errors = vec![
            FollowError::Config(ConfigError::MissingVars(vec!["API_KEY".to_string()])),
            FollowError::Identity(PlatformError::Network("down".to_string())),
            FollowError::Platform(PlatformError::RateLimit("429".to_string())),
            FollowError::Notify(NotifyError::Transport("timeout".to_string())),
            FollowError::State(StateError::Write {
                path: "state.json".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            }),
        ];
        for error in errors {
            assert_ne!(error.exit_code(), 0, "{} should exit non-zero", error);
        }
    }

    #[test]
    fn test_missing_vars_formatting() {
        let error = ConfigError::MissingVars(vec![
            "API_KEY".to_string(),
            "TELEGRAM_CHAT_ID".to_string(),
        ]);
        assert_eq!(error.to_string(), "Missing env vars: API_KEY, TELEGRAM_CHAT_ID");
    }

    #[test]
    fn test_invalid_value_formatting() {
        let error = ConfigError::InvalidValue {
            key: "FOLLOW_CAP".to_string(),
            value: "lots".to_string(),
            reason: "expected a non-negative integer".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("FOLLOW_CAP"));
        assert!(message.contains("'lots'"));
    }

    #[test]
    fn test_platform_error_variants() {
        let auth = PlatformError::Authentication("test auth".to_string());
        assert_eq!(format!("{}", auth), "Authentication failed: test auth");

        let api = PlatformError::Api {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(format!("{}", api), "API error (403): Forbidden");

        let network = PlatformError::Network("test network".to_string());
        assert_eq!(format!("{}", network), "Network error: test network");
    }

    #[test]
    fn test_error_chain_preserves_context() {
        let platform_error = PlatformError::Api {
            status: 500,
            message: "Internal error on liking_users".to_string(),
        };
        let error: FollowError = platform_error.into();
        let message = error.to_string();
        assert!(message.starts_with("Platform error:"));
        assert!(message.contains("liking_users"));
    }

    #[test]
    fn test_platform_error_clone() {
        let original = PlatformError::Network("Connection failed".to_string());
        let cloned = original.clone();
        assert_eq!(format!("{}", original), format!("{}", cloned));
    }
}
