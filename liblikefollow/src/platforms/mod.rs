//! Platform abstraction and implementations
//!
//! The orchestrator only talks to a platform through the [`SocialPlatform`]
//! trait. Operations whose failure the orchestrator must branch on
//! (relationship lookups and follows) return explicit outcome values instead
//! of errors; everything else returns `Result`.
//!
//! # Examples
//!
//! ```no_run
//! use liblikefollow::platforms::{SocialPlatform, mock::MockPlatform};
//! use liblikefollow::types::Liker;
//!
//! # async fn example() -> liblikefollow::error::Result<()> {
//! let platform = MockPlatform::builder("100", "me")
//!     .post("1", vec![vec![Liker::public("7", "alice")]])
//!     .build();
//!
//! let me = platform.resolve_identity().await?;
//! for post in platform.recent_posts(&me.id, 20).await? {
//!     let page = platform.likers_page(&post, None).await?;
//!     println!("{}: {} liker(s)", post, page.likers.len());
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::{PlatformError, Result};
use crate::types::{Identity, LikerPage, PageCursor, PostId, UserId};

pub mod oauth;
pub mod twitter;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Most results the platform will return for a recent-posts request
pub const MAX_POSTS_PER_REQUEST: usize = 100;

/// Fewest results the platform accepts for a recent-posts request
pub const MIN_POSTS_PER_REQUEST: usize = 5;

/// Likers returned per page
pub const LIKERS_PER_PAGE: usize = 100;

/// Result of asking whether `source` follows `target`
#[derive(Debug, Clone)]
pub enum RelationshipCheck {
    Following,
    NotFollowing,
    /// The lookup failed; callers treat this as not following
    Unknown(PlatformError),
}

impl RelationshipCheck {
    pub fn is_following(&self) -> bool {
        matches!(self, RelationshipCheck::Following)
    }
}

/// Result of a follow request
#[derive(Debug, Clone)]
pub enum FollowOutcome {
    /// Follow accepted; `pending` when the target must approve the request
    Followed { pending: bool },
    Failed(PlatformError),
}

impl FollowOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, FollowOutcome::Followed { .. })
    }
}

/// Social platform operations used by a follow run
///
/// Implementations are expected to wait out the platform's own rate limits
/// internally, so any call may block for a while before returning.
#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// Lowercase platform identifier (e.g. "twitter")
    fn name(&self) -> &str;

    /// Resolve the account the credentials act as
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Authentication` when the credentials are
    /// rejected, or another `PlatformError` when the lookup fails.
    async fn resolve_identity(&self) -> Result<Identity>;

    /// Newest-first IDs of `owner`'s most recent original posts
    ///
    /// Replies and reposts are excluded. At most `limit` IDs are returned.
    async fn recent_posts(&self, owner: &UserId, limit: usize) -> Result<Vec<PostId>>;

    /// One page of accounts that liked `post`
    ///
    /// Pass the cursor from the previous page to continue; `None` starts at
    /// the first page.
    async fn likers_page(&self, post: &PostId, cursor: Option<&PageCursor>)
        -> Result<LikerPage>;

    /// Whether `source` already follows `target`
    async fn relationship(&self, source: &UserId, target: &UserId) -> RelationshipCheck;

    /// Make `source` follow `target`. Idempotent if already following.
    async fn follow(&self, source: &UserId, target: &UserId) -> FollowOutcome;
}

/// Clamp a requested post count to what one request may ask for
pub fn posts_request_size(limit: usize) -> usize {
    limit.clamp(MIN_POSTS_PER_REQUEST, MAX_POSTS_PER_REQUEST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posts_request_size_clamps() {
        assert_eq!(posts_request_size(0), 5);
        assert_eq!(posts_request_size(3), 5);
        assert_eq!(posts_request_size(20), 20);
        assert_eq!(posts_request_size(100), 100);
        assert_eq!(posts_request_size(500), 100);
    }

    #[test]
    fn test_relationship_unknown_is_not_following() {
        let check = RelationshipCheck::Unknown(PlatformError::Network("timeout".to_string()));
        assert!(!check.is_following());
        assert!(RelationshipCheck::Following.is_following());
        assert!(!RelationshipCheck::NotFollowing.is_following());
    }

    #[test]
    fn test_follow_outcome_success() {
        assert!(FollowOutcome::Followed { pending: false }.succeeded());
        assert!(FollowOutcome::Followed { pending: true }.succeeded());
        assert!(!FollowOutcome::Failed(PlatformError::RateLimit("429".to_string())).succeeded());
    }
}
