//! Test-only helpers: a scripted model client and sample payloads.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::io::model::{ModelClient, ModelRequest};

/// Smallest JPEG header; enough for type sniffing.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// A `data:` URL wrapping [`JPEG_BYTES`].
pub fn jpeg_data_url() -> String {
    crate::core::image::encode_data_url(JPEG_BYTES)
}

/// Model output for the `4x - 2 = 2` worked example.
pub const LINEAR_SOLUTION: &str = r#"{"steps":[
    {"desc":"Solve for x when $$~~a~~x - ~~b~~ = ~~c~~$$","code":"d['a'] = 4; d['b'] = 2; d['c'] = 2;"},
    {"desc":"Add ~~b~~ to both sides: $$~~a~~x = ~~e~~$$","code":"d['e'] = d['c'] + d['b'];"},
    {"desc":"Divide by ~~a~~: $$x = ~~x~~$$","code":"d['x'] = d['e'] / d['a'];"}
]}"#;

enum Reply {
    Content(Option<String>),
    Fail(String),
}

/// Model client that replays canned replies in order and counts calls.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw output text.
    pub fn reply(self, content: &str) -> Self {
        self.push(Reply::Content(Some(content.to_string())))
    }

    /// Queue an answer without content (empty message or refusal).
    pub fn reply_empty(self) -> Self {
        self.push(Reply::Content(None))
    }

    /// Queue a transport failure.
    pub fn fail(self, message: &str) -> Self {
        self.push(Reply::Fail(message.to_string()))
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ModelRequest> {
        lock(&self.requests).last().cloned()
    }

    fn push(self, reply: Reply) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ModelRequest) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = lock(&self.replies).pop_front();
        match reply {
            Some(Reply::Content(content)) => Ok(content),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}
