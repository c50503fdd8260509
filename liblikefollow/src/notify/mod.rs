//! Notification delivery
//!
//! A [`Notifier`] sends a plain text message to one fixed destination. The
//! follow run uses it for exactly two messages: the end-of-run summary and the
//! failure notice sent when the account identity cannot be resolved.

use async_trait::async_trait;

use crate::error::NotifyError;

pub mod mock;
pub mod telegram;

/// Sends text messages to a preconfigured destination
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Lowercase notifier identifier (e.g. "telegram")
    fn name(&self) -> &str;

    /// Deliver `text`
    async fn send_text(&self, text: &str) -> Result<(), NotifyError>;
}

/// Message sent at the end of every completed run
pub fn summary_message(follows_done: usize) -> String {
    format!("Followed {} new users", follows_done)
}

/// Message sent when the run cannot resolve its own identity
pub const AUTH_FAILURE_MESSAGE: &str = "Followed 0 new users (auth error)";
