//! Scripted completion service for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use triage_llm::{Completer, CompletionParams, LlmError};

/// Replays canned replies in order; `None` entries fail like an unavailable
/// service. Records every prompt and its parameters.
pub struct ScriptedCompleter {
    replies: Mutex<VecDeque<Option<String>>>,
    calls: Mutex<Vec<(String, CompletionParams)>>,
}

impl ScriptedCompleter {
    pub fn new(replies: &[Option<&str>]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(&[Some(reply)])
    }

    pub fn failing() -> Self {
        Self::new(&[None])
    }

    pub fn calls(&self) -> Vec<(String, CompletionParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push((prompt.to_string(), params));
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            _ => Err(LlmError::Server {
                status: 503,
                body: "service unavailable".into(),
            }),
        }
    }
}
