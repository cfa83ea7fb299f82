use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::domain::{DomainError, Generation, SessionConfig};
use crate::ports::{EventEmitter, RecognitionProvider, Recognizer};

/// Calls made against scripted recognizers, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerCall {
    Create,
    Start(Generation),
    Stop,
    Abort,
}

/// How scripted recognizers react to calls on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Nothing is emitted unless the caller does it through an emitter.
    Manual,
    /// Behaves like a typical host engine: `Started` after start, `Ended`
    /// after stop, `Error("aborted")` then `Ended` after abort.
    Echo,
}

#[derive(Default)]
struct Script {
    calls: Vec<RecognizerCall>,
    emitters: Vec<EventEmitter>,
    configs: Vec<SessionConfig>,
    fail_create: Option<String>,
    fail_start: Option<String>,
    fail_stop: Option<String>,
}

/// In-process recognition capability driven by the caller.
///
/// Hosts without a native engine can feed recognized text through the
/// emitters it hands out; tests use it to inject events for any generation,
/// including stale ones. Clones share the same script.
#[derive(Clone)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
    lifecycle: Lifecycle,
    recreate: bool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::with_lifecycle(Lifecycle::Manual)
    }

    pub fn echoing() -> Self {
        Self::with_lifecycle(Lifecycle::Echo)
    }

    pub fn with_lifecycle(lifecycle: Lifecycle) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            lifecycle,
            recreate: false,
        }
    }

    /// Ask the session to build a fresh recognizer for every start.
    #[must_use]
    pub fn recreating(mut self) -> Self {
        self.recreate = true;
        self
    }

    pub fn fail_next_create(&self, code: impl Into<String>) {
        self.script.lock().fail_create = Some(code.into());
    }

    pub fn fail_next_start(&self, code: impl Into<String>) {
        self.script.lock().fail_start = Some(code.into());
    }

    pub fn fail_next_stop(&self, code: impl Into<String>) {
        self.script.lock().fail_stop = Some(code.into());
    }

    pub fn calls(&self) -> Vec<RecognizerCall> {
        self.script.lock().calls.clone()
    }

    pub fn count(&self, call: &RecognizerCall) -> usize {
        self.script.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn instances_created(&self) -> usize {
        self.count(&RecognizerCall::Create)
    }

    pub fn starts(&self) -> usize {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RecognizerCall::Start(_)))
            .count()
    }

    /// Emitter handed to the most recent start.
    pub fn latest(&self) -> Option<EventEmitter> {
        self.script.lock().emitters.last().cloned()
    }

    /// Emitter handed to the start for `generation`.
    pub fn emitter(&self, generation: Generation) -> Option<EventEmitter> {
        self.script
            .lock()
            .emitters
            .iter()
            .find(|e| e.generation() == generation)
            .cloned()
    }

    pub fn last_config(&self) -> Option<SessionConfig> {
        self.script.lock().configs.last().cloned()
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RecognitionProvider for ScriptedProvider {
    fn is_supported(&self) -> bool {
        true
    }

    fn recreate_per_session(&self) -> bool {
        self.recreate
    }

    fn create(&self, config: &SessionConfig) -> Result<Box<dyn Recognizer>, DomainError> {
        let mut script = self.script.lock();
        if let Some(code) = script.fail_create.take() {
            return Err(DomainError::recognizer(code));
        }
        script.calls.push(RecognizerCall::Create);
        script.configs.push(config.clone());

        Ok(Box::new(ScriptedRecognizer {
            script: Arc::clone(&self.script),
            lifecycle: self.lifecycle,
            events: None,
        }))
    }
}

struct ScriptedRecognizer {
    script: Arc<Mutex<Script>>,
    lifecycle: Lifecycle,
    events: Option<EventEmitter>,
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn start(&mut self, events: EventEmitter) -> Result<(), DomainError> {
        {
            let mut script = self.script.lock();
            if let Some(code) = script.fail_start.take() {
                return Err(DomainError::recognizer(code));
            }
            script.calls.push(RecognizerCall::Start(events.generation()));
            script.emitters.push(events.clone());
        }

        debug!(generation = %events.generation(), "Scripted recognizer started");
        if self.lifecycle == Lifecycle::Echo {
            events.started();
        }
        self.events = Some(events);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DomainError> {
        {
            let mut script = self.script.lock();
            if let Some(code) = script.fail_stop.take() {
                return Err(DomainError::recognizer(code));
            }
            script.calls.push(RecognizerCall::Stop);
        }

        if self.lifecycle == Lifecycle::Echo {
            if let Some(events) = &self.events {
                events.ended();
            }
        }
        Ok(())
    }

    async fn abort(&mut self) -> Result<(), DomainError> {
        self.script.lock().calls.push(RecognizerCall::Abort);

        if self.lifecycle == Lifecycle::Echo {
            if let Some(events) = &self.events {
                events.error("aborted");
                events.ended();
            }
        }
        Ok(())
    }
}
