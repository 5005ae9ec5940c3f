//! Test doubles shared by the unit tests.

use crate::client::{ChatModel, ChatRequest};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Replays canned answers and records the requests it saw.
pub(crate) struct CannedModel {
    answers: Mutex<Vec<String>>,
    seen: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl CannedModel {
    pub(crate) fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().rev().map(|a| a.to_string()).collect()),
            seen: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep this long before each answer.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn seen(&self) -> Vec<ChatRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for CannedModel {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        self.seen.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answers
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| AgentError::Http("no more answers".to_string()))
    }
}
