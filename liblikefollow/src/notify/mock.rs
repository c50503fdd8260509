//! Recording notifier for tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::NotifyError;
use crate::notify::Notifier;

/// Records every message; optionally fails delivery
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries are all rejected (messages are still recorded)
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(text.to_string());

        if self.fail {
            return Err(NotifyError::Rejected {
                status: 500,
                body: "Mock delivery failed".to_string(),
            });
        }
        Ok(())
    }
}
