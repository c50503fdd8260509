//! Core types for likefollow

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque identifier of a platform account
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of one of the caller's own posts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque pagination token handed back by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The account the run is acting as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub handle: String,
}

/// An account that liked one of the caller's posts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Liker {
    pub id: UserId,
    pub handle: String,
    pub protected: bool,
    pub verified: bool,
}

impl Liker {
    /// Convenience constructor for a public, unverified account
    pub fn public(id: &str, handle: &str) -> Self {
        Self {
            id: UserId::new(id),
            handle: handle.to_string(),
            protected: false,
            verified: false,
        }
    }

    /// Convenience constructor for a protected account
    pub fn protected(id: &str, handle: &str) -> Self {
        Self {
            protected: true,
            ..Self::public(id, handle)
        }
    }
}

/// One page of likers and the cursor for the next page, if any
#[derive(Debug, Clone, Default)]
pub struct LikerPage {
    pub likers: Vec<Liker>,
    pub next: Option<PageCursor>,
}

/// Accounts that already received a final follow/skip decision
///
/// The set only grows; there is no removal operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitedSet(BTreeSet<UserId>);

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.0.contains(id)
    }

    /// Record a decision. Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: UserId) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }
}

impl<I: Into<UserId>> FromIterator<I> for VisitedSet {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Outcome of deciding a single liker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Already decided in this or an earlier run
    AlreadyVisited,
    /// The liker is the caller's own account
    Own,
    /// Protected accounts are never followed
    Protected,
    /// The caller already follows this account
    AlreadyFollowing,
    /// A follow was issued (or a follow request is pending)
    Followed,
    /// The follow attempt was rejected; not retried this run
    FollowFailed,
}

impl Decision {
    /// Whether this decision adds the liker to the visited set
    pub fn records_visit(self) -> bool {
        !matches!(self, Decision::AlreadyVisited)
    }

    /// Whether a follow request was sent to the platform
    pub fn attempted_follow(self) -> bool {
        matches!(self, Decision::Followed | Decision::FollowFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visited_set_serializes_as_plain_array() {
        let set: VisitedSet = ["42", "7"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["42","7"]"#);
    }

    #[test]
    fn test_visited_set_deduplicates_on_read() {
        let set: VisitedSet = serde_json::from_str(r#"["1","2","1"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&UserId::new("1")));
    }

    #[test]
    fn test_visited_set_insert_reports_novelty() {
        let mut set = VisitedSet::new();
        assert!(set.insert(UserId::new("a")));
        assert!(!set.insert(UserId::new("a")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_decision_flags() {
        assert!(!Decision::AlreadyVisited.records_visit());
        assert!(Decision::Own.records_visit());
        assert!(Decision::FollowFailed.records_visit());

        assert!(Decision::Followed.attempted_follow());
        assert!(Decision::FollowFailed.attempted_follow());
        assert!(!Decision::Protected.attempted_follow());
        assert!(!Decision::AlreadyFollowing.attempted_follow());
    }

    #[test]
    fn test_liker_constructors() {
        let liker = Liker::protected("9", "quiet");
        assert!(liker.protected);
        assert!(!liker.verified);
        assert_eq!(liker.id.as_str(), "9");
    }
}
