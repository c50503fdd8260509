//! Likefollow - follow the people who like your posts
//!
//! This library provides the follow run used by `lf-follow`: it scans the
//! account's recent posts, follows new likers up to a per-run cap, remembers
//! every account it has decided on, and reports the outcome over Telegram.

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod orchestrator;
pub mod pacing;
pub mod platforms;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::{Config, RunSettings};
pub use error::{FollowError, Result};
pub use notify::Notifier;
pub use orchestrator::{FollowOrchestrator, RunReport};
pub use platforms::SocialPlatform;
pub use state::{JsonFileStore, VisitedStore};
pub use types::{Decision, Identity, Liker, UserId, VisitedSet};
