//! The follow run: scan recent posts, collect likers, follow the new ones
//!
//! One run walks the caller's newest posts in order, pages through each
//! post's likers, and decides every liker exactly once across runs:
//!
//! 1. already in the visited set: skip, nothing recorded
//! 2. the caller's own account: record, skip
//! 3. protected account: record, skip
//! 4. already followed: record, skip
//! 5. otherwise follow; success or failure is recorded either way
//!
//! The visited set is saved after every decision that changes it, and a
//! randomized pause follows every follow attempt. Both loops stop as soon as
//! the follow cap is reached; likers not yet decided stay eligible for the
//! next run.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::RunSettings;
use crate::error::{FollowError, Result};
use crate::notify::{summary_message, Notifier, AUTH_FAILURE_MESSAGE};
use crate::pacing::Pacer;
use crate::platforms::{FollowOutcome, RelationshipCheck, SocialPlatform};
use crate::state::VisitedStore;
use crate::types::{Decision, Identity, Liker, PageCursor, PostId, VisitedSet};

/// What a completed run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub follows_done: usize,
    pub follows_failed: usize,
    pub posts_scanned: usize,
    pub likers_seen: usize,
    pub skipped_visited: usize,
    pub skipped_own: usize,
    pub skipped_protected: usize,
    pub skipped_following: usize,
    /// The run stopped because the follow cap was reached
    pub cap_reached: bool,
    /// Size of the visited set when the run ended
    pub visited_total: usize,
    /// Whether the summary notification was delivered
    pub notified: bool,
}

impl RunReport {
    fn count(&mut self, decision: Decision) {
        match decision {
            Decision::AlreadyVisited => self.skipped_visited += 1,
            Decision::Own => self.skipped_own += 1,
            Decision::Protected => self.skipped_protected += 1,
            Decision::AlreadyFollowing => self.skipped_following += 1,
            Decision::Followed => self.follows_done += 1,
            Decision::FollowFailed => self.follows_failed += 1,
        }
    }

    pub fn summary(&self) -> String {
        summary_message(self.follows_done)
    }
}

/// Drives one follow run against the given collaborators
pub struct FollowOrchestrator<'a> {
    platform: &'a dyn SocialPlatform,
    notifier: &'a dyn Notifier,
    store: &'a dyn VisitedStore,
    pacer: &'a dyn Pacer,
    settings: RunSettings,
}

impl<'a> FollowOrchestrator<'a> {
    pub fn new(
        platform: &'a dyn SocialPlatform,
        notifier: &'a dyn Notifier,
        store: &'a dyn VisitedStore,
        pacer: &'a dyn Pacer,
        settings: RunSettings,
    ) -> Self {
        Self {
            platform,
            notifier,
            store,
            pacer,
            settings,
        }
    }

    /// Execute the run
    ///
    /// # Errors
    ///
    /// Returns `FollowError::Identity` if the caller's own account cannot be
    /// resolved. A failure notice is sent before returning. Every other
    /// platform, storage, or notification failure is logged and absorbed.
    pub async fn run(&self) -> Result<RunReport> {
        let mut visited = self.store.load();
        info!("Loaded {} previously processed user(s)", visited.len());

        let me = match self.platform.resolve_identity().await {
            Ok(identity) => identity,
            Err(e) => {
                error!("Could not resolve own identity: {}", e);
                self.notify(AUTH_FAILURE_MESSAGE).await;
                return Err(match e {
                    FollowError::Platform(platform_error) => FollowError::Identity(platform_error),
                    other => other,
                });
            }
        };
        info!("Running as @{} ({})", me.handle, me.id);

        let mut report = RunReport::default();
        let posts = self.scan_posts(&me).await;
        info!("Found {} recent post(s) to scan", posts.len());

        'posts: for post in &posts {
            if self.cap_reached(&report) {
                break;
            }
            report.posts_scanned += 1;

            let likers = self.collect_likers(post).await;
            info!("Post {}: {} liker(s) fetched", post, likers.len());

            for liker in &likers {
                if self.cap_reached(&report) {
                    break 'posts;
                }
                report.likers_seen += 1;

                let decision = self.decide(&me, liker, &mut visited).await;
                report.count(decision);

                if decision.records_visit() {
                    if let Err(e) = self.store.save(&visited) {
                        warn!("Could not save state: {}", e);
                    }
                }

                if decision.attempted_follow() {
                    let delay = self.settings.sleep.sample();
                    self.pacer.pause(delay).await;
                }
            }
        }

        report.cap_reached = self.cap_reached(&report);
        report.visited_total = visited.len();

        let summary = report.summary();
        info!(
            "Run finished: {} (failed: {}, cap reached: {})",
            summary, report.follows_failed, report.cap_reached
        );
        report.notified = self.notify(&summary).await;

        Ok(report)
    }

    fn cap_reached(&self, report: &RunReport) -> bool {
        report.follows_done >= self.settings.follow_cap
    }

    async fn scan_posts(&self, me: &Identity) -> Vec<PostId> {
        match self
            .platform
            .recent_posts(&me.id, self.settings.tweets_to_scan)
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Could not list recent posts: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch up to `pages_per_post` pages of likers, in arrival order
    async fn collect_likers(&self, post: &PostId) -> Vec<Liker> {
        let mut likers = Vec::new();
        let mut cursor: Option<PageCursor> = None;

        for page_number in 0..self.settings.pages_per_post {
            let page = match self.platform.likers_page(post, cursor.as_ref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        "Could not fetch likers page {} for post {}: {}",
                        page_number + 1,
                        post,
                        e
                    );
                    break;
                }
            };

            likers.extend(page.likers);
            cursor = page.next;
            if cursor.is_none() {
                break;
            }
        }

        likers
    }

    /// Decide one liker and record the decision in `visited`
    async fn decide(&self, me: &Identity, liker: &Liker, visited: &mut VisitedSet) -> Decision {
        let decision = self.classify(me, liker, visited).await;
        if decision.records_visit() {
            visited.insert(liker.id.clone());
        }
        decision
    }

    async fn classify(&self, me: &Identity, liker: &Liker, visited: &VisitedSet) -> Decision {
        if visited.contains(&liker.id) {
            return Decision::AlreadyVisited;
        }

        if liker.id == me.id {
            return Decision::Own;
        }

        if liker.protected {
            debug!("Skipping protected @{}", liker.handle);
            return Decision::Protected;
        }

        match self.platform.relationship(&me.id, &liker.id).await {
            RelationshipCheck::Following => {
                info!("Already following @{}", liker.handle);
                return Decision::AlreadyFollowing;
            }
            RelationshipCheck::NotFollowing => {}
            RelationshipCheck::Unknown(e) => {
                warn!("Follow check failed for {}: {}", liker.id, e);
            }
        }

        match self.platform.follow(&me.id, &liker.id).await {
            FollowOutcome::Followed { pending } => {
                if pending {
                    info!("Follow request pending for @{} ({})", liker.handle, liker.id);
                } else {
                    info!("Followed @{} ({})", liker.handle, liker.id);
                }
                Decision::Followed
            }
            FollowOutcome::Failed(e) => {
                warn!("Failed to follow {}: {}", liker.id, e);
                Decision::FollowFailed
            }
        }
    }

    async fn notify(&self, message: &str) -> bool {
        match self.notifier.send_text(message).await {
            Ok(()) => true,
            Err(e) => {
                error!("{} notification failed: {}", self.notifier.name(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::mock::MockNotifier;
    use crate::pacing::{RecordingPacer, SleepWindow};
    use crate::platforms::mock::MockPlatform;
    use crate::state::JsonFileStore;
    use crate::types::UserId;
    use tempfile::TempDir;

    fn settings(follow_cap: usize) -> RunSettings {
        RunSettings {
            tweets_to_scan: 20,
            follow_cap,
            pages_per_post: 1,
            sleep: SleepWindow::new(2.0, 4.0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_pause_only_after_follow_attempts() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let platform = MockPlatform::builder("100", "me")
            .post(
                "1",
                vec![vec![
                    Liker::protected("a", "a"),
                    Liker::public("b", "b"),
                    Liker::public("100", "me"),
                    Liker::public("c", "c"),
                ]],
            )
            .failing_follows(&["c"])
            .build();
        let notifier = MockNotifier::new();
        let pacer = RecordingPacer::new();

        let report = FollowOrchestrator::new(&platform, &notifier, &store, &pacer, settings(15))
            .run()
            .await
            .unwrap();

        assert_eq!(report.follows_done, 1);
        assert_eq!(report.follows_failed, 1);
        assert_eq!(report.skipped_protected, 1);
        assert_eq!(report.skipped_own, 1);
        // One pause for b (followed) and one for c (failed)
        let pauses = pacer.pauses();
        assert_eq!(pauses.len(), 2);
        for pause in pauses {
            let secs = pause.as_secs_f64();
            assert!((2.0..=4.0).contains(&secs), "Pause {} outside window", secs);
        }
    }

    #[tokio::test]
    async fn test_already_visited_not_saved_again() {
        struct CountingStore {
            initial: VisitedSet,
            saves: std::sync::Mutex<usize>,
        }

        impl VisitedStore for CountingStore {
            fn load(&self) -> VisitedSet {
                self.initial.clone()
            }

            fn save(&self, _set: &VisitedSet) -> std::result::Result<(), crate::error::StateError> {
                *self.saves.lock().unwrap() += 1;
                Ok(())
            }
        }

        let store = CountingStore {
            initial: ["a", "b"].into_iter().collect(),
            saves: std::sync::Mutex::new(0),
        };
        let platform = MockPlatform::builder("100", "me")
            .post(
                "1",
                vec![vec![Liker::public("a", "a"), Liker::public("b", "b")]],
            )
            .build();
        let notifier = MockNotifier::new();
        let pacer = RecordingPacer::new();

        let report = FollowOrchestrator::new(&platform, &notifier, &store, &pacer, settings(15))
            .run()
            .await
            .unwrap();

        assert_eq!(report.skipped_visited, 2);
        assert_eq!(*store.saves.lock().unwrap(), 0);
        assert!(platform.calls().relationships.is_empty());
        assert_eq!(pacer.pause_count(), 0);
    }

    #[tokio::test]
    async fn test_relationship_failure_treated_as_not_following() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let platform = MockPlatform::builder("100", "me")
            .post("1", vec![vec![Liker::public("x", "x")]])
            .failing_relationships(&["x"])
            .build();
        let notifier = MockNotifier::new();
        let pacer = RecordingPacer::new();

        let report = FollowOrchestrator::new(&platform, &notifier, &store, &pacer, settings(15))
            .run()
            .await
            .unwrap();

        assert_eq!(report.follows_done, 1);
        assert_eq!(platform.followed(), vec![UserId::new("x")]);
    }

    #[tokio::test]
    async fn test_identity_passed_explicitly_to_platform() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let platform = MockPlatform::builder("100", "me")
            .post("1", vec![vec![Liker::public("x", "x")]])
            .build();
        let notifier = MockNotifier::new();
        let pacer = RecordingPacer::new();

        FollowOrchestrator::new(&platform, &notifier, &store, &pacer, settings(15))
            .run()
            .await
            .unwrap();

        let calls = platform.calls();
        let me = UserId::new("100");
        assert_eq!(calls.recent_posts, vec![(me.clone(), 20)]);
        assert_eq!(calls.relationships, vec![(me.clone(), UserId::new("x"))]);
        assert_eq!(calls.follows, vec![(me, UserId::new("x"))]);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_run() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let platform = MockPlatform::builder("100", "me").build();
        let notifier = MockNotifier::failing();
        let pacer = RecordingPacer::new();

        let report = FollowOrchestrator::new(&platform, &notifier, &store, &pacer, settings(15))
            .run()
            .await
            .unwrap();

        assert!(!report.notified);
        assert_eq!(notifier.messages(), vec!["Followed 0 new users"]);
    }

    #[test]
    fn test_report_counts() {
        let mut report = RunReport::default();
        for decision in [
            Decision::AlreadyVisited,
            Decision::Own,
            Decision::Protected,
            Decision::AlreadyFollowing,
            Decision::Followed,
            Decision::Followed,
            Decision::FollowFailed,
        ] {
            report.count(decision);
        }

        assert_eq!(report.skipped_visited, 1);
        assert_eq!(report.skipped_own, 1);
        assert_eq!(report.skipped_protected, 1);
        assert_eq!(report.skipped_following, 1);
        assert_eq!(report.follows_done, 2);
        assert_eq!(report.follows_failed, 1);
        assert_eq!(report.summary(), "Followed 2 new users");
    }
}
