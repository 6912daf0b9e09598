//! Scriptable in-memory transport.
//!
//! Scripts are matched by substring against the prompt, so a test can target one
//! chunk of a batch by a phrase that only appears in that chunk.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{TransportError, TransportResult};
use super::{Transport, TransportResponse};

#[derive(Debug)]
struct Script {
    needle: String,
    failures: VecDeque<TransportError>,
    persistent_failure: Option<TransportError>,
    response: Option<TransportResponse>,
    panic_message: Option<String>,
    calls: usize,
}

impl Script {
    fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_string(),
            failures: VecDeque::new(),
            persistent_failure: None,
            response: None,
            panic_message: None,
            calls: 0,
        }
    }
}

/// Mock [`Transport`] with per-prompt scripts and call counting.
#[derive(Debug)]
pub struct MockTransport {
    model: String,
    default_response: TransportResponse,
    scripts: Mutex<Vec<Script>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Creates a mock whose unscripted calls return `Score: 50`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            default_response: TransportResponse::new(
                "Score: 50\nSummary: Default mock assessment.",
                100,
                10,
            ),
            scripts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Replaces the response returned to unscripted prompts.
    pub fn with_default_response(mut self, response: TransportResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Sleeps for `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts containing `needle` succeed with `response` (after any scripted failures).
    pub fn respond(self, needle: &str, response: TransportResponse) -> Self {
        self.edit_script(needle, |s| s.response = Some(response));
        self
    }

    /// Prompts containing `needle` fail with `errors`, in order, before succeeding.
    pub fn fail_first(self, needle: &str, errors: Vec<TransportError>) -> Self {
        self.edit_script(needle, |s| s.failures.extend(errors));
        self
    }

    /// Prompts containing `needle` always fail with `error`.
    pub fn always_fail(self, needle: &str, error: TransportError) -> Self {
        self.edit_script(needle, |s| s.persistent_failure = Some(error));
        self
    }

    /// Prompts containing `needle` panic inside `send`.
    pub fn panic_on(self, needle: &str, message: &str) -> Self {
        self.edit_script(needle, |s| s.panic_message = Some(message.to_string()));
        self
    }

    /// Total number of `send` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `send` calls whose prompt matched `needle`'s script.
    pub fn calls_for(&self, needle: &str) -> usize {
        self.scripts
            .lock()
            .iter()
            .find(|s| s.needle == needle)
            .map(|s| s.calls)
            .unwrap_or(0)
    }

    fn edit_script(&self, needle: &str, edit: impl FnOnce(&mut Script)) {
        let mut scripts = self.scripts.lock();
        match scripts.iter_mut().find(|s| s.needle == needle) {
            Some(script) => edit(script),
            None => {
                let mut script = Script::new(needle);
                edit(&mut script);
                scripts.push(script);
            }
        }
    }

    fn next_outcome(&self, prompt: &str) -> TransportResult<TransportResponse> {
        let mut scripts = self.scripts.lock();
        let Some(script) = scripts.iter_mut().find(|s| prompt.contains(&s.needle)) else {
            return Ok(self.default_response.clone());
        };
        script.calls += 1;

        if let Some(message) = script.panic_message.clone() {
            drop(scripts);
            panic!("{}", message);
        }
        if let Some(error) = script.failures.pop_front() {
            return Err(error);
        }
        if let Some(error) = &script.persistent_failure {
            return Err(error.clone());
        }
        Ok(script
            .response
            .clone()
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, prompt: &str) -> TransportResult<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_outcome(prompt)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
