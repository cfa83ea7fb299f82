use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    DomainError, Generation, RecognitionEvent, RecognitionSegment, SessionConfig, TaggedEvent,
};

type EventSink = Arc<dyn Fn(TaggedEvent) + Send + Sync>;

/// Handle a recognizer uses to report events back to its session.
///
/// Every emitter is stamped with the generation of the start attempt it was
/// handed to, so events from a superseded attempt can be told apart. Emitting
/// after the session is gone is a silent no-op.
#[derive(Clone)]
pub struct EventEmitter {
    generation: Generation,
    sink: EventSink,
}

impl EventEmitter {
    pub fn new(generation: Generation, sink: impl Fn(TaggedEvent) + Send + Sync + 'static) -> Self {
        Self {
            generation,
            sink: Arc::new(sink),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn emit(&self, event: RecognitionEvent) {
        (self.sink)(TaggedEvent {
            generation: self.generation,
            event,
        });
    }

    pub fn started(&self) {
        self.emit(RecognitionEvent::Started);
    }

    pub fn result(&self, segments: Vec<RecognitionSegment>) {
        self.emit(RecognitionEvent::Result { segments });
    }

    pub fn error(&self, code: impl Into<String>) {
        self.emit(RecognitionEvent::Error { code: code.into() });
    }

    pub fn ended(&self) {
        self.emit(RecognitionEvent::Ended);
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Port for one continuous speech recognition instance.
///
/// Implementations wrap the host's recognition engine. Calls return quickly;
/// progress is reported asynchronously through the [`EventEmitter`] passed
/// to `start`. An `Err` from any call is a synchronous failure and is
/// classified by its raw code.
#[async_trait]
pub trait Recognizer: Send {
    /// Begin recognizing. The emitter replaces any emitter from an earlier
    /// start.
    async fn start(&mut self, events: EventEmitter) -> Result<(), DomainError>;

    /// Ask the recognizer to finish the current utterance and end.
    /// `Ended` is expected afterwards.
    async fn stop(&mut self) -> Result<(), DomainError>;

    /// End immediately, discarding pending results.
    async fn abort(&mut self) -> Result<(), DomainError>;
}

/// Port for the host's recognition capability.
pub trait RecognitionProvider: Send + Sync {
    /// Whether the host can recognize speech at all. Expected to be constant.
    fn is_supported(&self) -> bool;

    /// Whether a fresh instance must be created for every start attempt.
    fn recreate_per_session(&self) -> bool {
        false
    }

    /// Create a recognizer configured for `config`.
    fn create(&self, config: &SessionConfig) -> Result<Box<dyn Recognizer>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_emitter_stamps_generation() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let emitter = EventEmitter::new(Generation::from(7), move |event| sink.lock().push(event));

        emitter.started();
        emitter.result(vec![RecognitionSegment::final_text("hello")]);
        emitter.error("no-speech");
        emitter.ended();

        let received = received.lock();
        assert_eq!(received.len(), 4);
        assert!(received.iter().all(|e| e.generation == Generation::from(7)));
        assert_eq!(received[0].event, RecognitionEvent::Started);
        assert_eq!(
            received[2].event,
            RecognitionEvent::Error {
                code: "no-speech".to_string()
            }
        );
        assert_eq!(received[3].event, RecognitionEvent::Ended);
    }
}
