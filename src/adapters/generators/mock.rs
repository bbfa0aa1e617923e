//! Mock text generator for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::ProviderError;
use crate::domain::ports::TextGenerator;

/// Scripted outcome for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail(ProviderError),
    /// Panic inside `generate`, like a generator with a bug.
    Panic(String),
}

impl MockReply {
    pub fn json(value: &serde_json::Value) -> Self {
        Self::Text(value.to_string())
    }
}

/// Replays scripted replies in order, then repeats the default reply.
#[derive(Debug)]
pub struct MockTextGenerator {
    script: Mutex<VecDeque<MockReply>>,
    default_reply: MockReply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new(default_reply: MockReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockReply::Text(text.into()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(MockReply::Fail(error))
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue replies served before the default.
    pub fn with_script(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(replies);
        self
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::replying("{}")
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        let reply = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(error) => Err(error),
            MockReply::Panic(message) => panic!("{message}"),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_default() {
        let generator = MockTextGenerator::replying("default").with_script([
            MockReply::Text("first".into()),
            MockReply::Fail(ProviderError::Network("reset".into())),
        ]);

        assert_eq!(generator.generate("a").await.unwrap(), "first");
        assert!(generator.generate("b").await.is_err());
        assert_eq!(generator.generate("c").await.unwrap(), "default");
        assert_eq!(generator.call_count(), 3);
        assert_eq!(generator.prompts(), vec!["a", "b", "c"]);
    }
}
