//! Mock platform implementation for testing
//!
//! This module provides a configurable in-memory platform that can simulate
//! identity failures, paginated likers, existing follow relationships and
//! failing follow requests. Every call is recorded so tests can assert on
//! exactly what the orchestrator asked the platform to do.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::{FollowOutcome, RelationshipCheck, SocialPlatform};
use crate::types::{Identity, Liker, LikerPage, PageCursor, PostId, UserId};

/// Calls made against a [`MockPlatform`], in order
#[derive(Debug, Default, Clone)]
pub struct MockCalls {
    pub identity: usize,
    pub recent_posts: Vec<(UserId, usize)>,
    pub likers_pages: Vec<(PostId, Option<String>)>,
    pub relationships: Vec<(UserId, UserId)>,
    pub follows: Vec<(UserId, UserId)>,
}

#[derive(Debug, Default)]
struct MockState {
    identity: Option<Identity>,
    identity_error: Option<String>,
    posts: Vec<(PostId, Vec<Vec<Liker>>)>,
    posts_error: Option<String>,
    failing_pages: HashSet<(String, usize)>,
    following: HashSet<UserId>,
    failing_follows: HashSet<UserId>,
    pending_follows: HashSet<UserId>,
    failing_relationships: HashSet<UserId>,
    calls: MockCalls,
}

/// In-memory platform for tests
///
/// Clones share state, so one instance can be handed to several runs.
#[derive(Debug, Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

/// Builder for [`MockPlatform`]
#[derive(Debug, Default)]
pub struct MockPlatformBuilder {
    state: MockState,
}

impl MockPlatformBuilder {
    /// Add a post (newest first, in call order) with its pages of likers
    pub fn post(mut self, id: &str, pages: Vec<Vec<Liker>>) -> Self {
        self.state.posts.push((PostId::new(id), pages));
        self
    }

    /// Make identity resolution fail
    pub fn identity_failure(mut self, error: &str) -> Self {
        self.state.identity = None;
        self.state.identity_error = Some(error.to_string());
        self
    }

    /// Make the recent-posts request fail
    pub fn posts_failure(mut self, error: &str) -> Self {
        self.state.posts_error = Some(error.to_string());
        self
    }

    /// Make fetching page `page` (zero-based) of `post` fail
    pub fn page_failure(mut self, post: &str, page: usize) -> Self {
        self.state.failing_pages.insert((post.to_string(), page));
        self
    }

    /// Accounts the caller already follows
    pub fn already_following(mut self, ids: &[&str]) -> Self {
        self.state.following.extend(ids.iter().map(|id| UserId::new(*id)));
        self
    }

    /// Accounts whose follow request is rejected
    pub fn failing_follows(mut self, ids: &[&str]) -> Self {
        self.state
            .failing_follows
            .extend(ids.iter().map(|id| UserId::new(*id)));
        self
    }

    /// Accounts whose follow request needs approval
    pub fn pending_follows(mut self, ids: &[&str]) -> Self {
        self.state
            .pending_follows
            .extend(ids.iter().map(|id| UserId::new(*id)));
        self
    }

    /// Accounts whose relationship lookup fails
    pub fn failing_relationships(mut self, ids: &[&str]) -> Self {
        self.state
            .failing_relationships
            .extend(ids.iter().map(|id| UserId::new(*id)));
        self
    }

    pub fn build(self) -> MockPlatform {
        MockPlatform {
            state: Arc::new(Mutex::new(self.state)),
        }
    }
}

impl MockPlatform {
    /// Start building a platform acting as `id` / `handle`
    pub fn builder(id: &str, handle: &str) -> MockPlatformBuilder {
        MockPlatformBuilder {
            state: MockState {
                identity: Some(Identity {
                    id: UserId::new(id),
                    handle: handle.to_string(),
                }),
                ..Default::default()
            },
        }
    }

    /// Snapshot of every call made so far
    pub fn calls(&self) -> MockCalls {
        self.state.lock().unwrap().calls.clone()
    }

    /// Targets of every follow request, in order
    pub fn followed(&self) -> Vec<UserId> {
        self.calls().follows.into_iter().map(|(_, target)| target).collect()
    }

    /// Whether the caller currently follows `id`
    pub fn is_following(&self, id: &str) -> bool {
        self.state.lock().unwrap().following.contains(&UserId::new(id))
    }
}

fn page_cursor(index: usize) -> PageCursor {
    PageCursor::new(format!("page-{}", index))
}

fn page_index(cursor: Option<&PageCursor>) -> Result<usize> {
    match cursor {
        None => Ok(0),
        Some(cursor) => cursor
            .as_str()
            .strip_prefix("page-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| {
                PlatformError::Api {
                    status: 400,
                    message: format!("Invalid pagination token: {}", cursor.as_str()),
                }
                .into()
            }),
    }
}

#[async_trait]
impl SocialPlatform for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve_identity(&self) -> Result<Identity> {
        let mut state = self.state.lock().unwrap();
        state.calls.identity += 1;

        match &state.identity {
            Some(identity) => Ok(identity.clone()),
            None => Err(PlatformError::Authentication(
                state
                    .identity_error
                    .clone()
                    .unwrap_or_else(|| "Mock authentication failed".to_string()),
            )
            .into()),
        }
    }

    async fn recent_posts(&self, owner: &UserId, limit: usize) -> Result<Vec<PostId>> {
        let mut state = self.state.lock().unwrap();
        state.calls.recent_posts.push((owner.clone(), limit));

        if let Some(error) = &state.posts_error {
            return Err(PlatformError::Network(error.clone()).into());
        }

        Ok(state
            .posts
            .iter()
            .take(limit)
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn likers_page(
        &self,
        post: &PostId,
        cursor: Option<&PageCursor>,
    ) -> Result<LikerPage> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .likers_pages
            .push((post.clone(), cursor.map(|c| c.as_str().to_string())));

        let index = page_index(cursor)?;
        if state
            .failing_pages
            .contains(&(post.as_str().to_string(), index))
        {
            return Err(PlatformError::Network(format!(
                "Mock page {} of post {} failed",
                index, post
            ))
            .into());
        }

        let pages = state
            .posts
            .iter()
            .find(|(id, _)| id == post)
            .map(|(_, pages)| pages.as_slice())
            .unwrap_or_default();

        let likers = pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < pages.len()).then(|| page_cursor(index + 1));

        Ok(LikerPage { likers, next })
    }

    async fn relationship(&self, source: &UserId, target: &UserId) -> RelationshipCheck {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .relationships
            .push((source.clone(), target.clone()));

        if state.failing_relationships.contains(target) {
            return RelationshipCheck::Unknown(PlatformError::Network(format!(
                "Mock relationship lookup for {} failed",
                target
            )));
        }

        if state.following.contains(target) {
            RelationshipCheck::Following
        } else {
            RelationshipCheck::NotFollowing
        }
    }

    async fn follow(&self, source: &UserId, target: &UserId) -> FollowOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.follows.push((source.clone(), target.clone()));

        if state.failing_follows.contains(target) {
            return FollowOutcome::Failed(PlatformError::Api {
                status: 403,
                message: format!("Mock follow of {} rejected", target),
            });
        }

        let pending = state.pending_follows.contains(target);
        if !pending {
            state.following.insert(target.clone());
        }
        FollowOutcome::Followed { pending }
    }
}
