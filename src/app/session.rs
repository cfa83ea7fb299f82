use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use crate::app::listeners::{Listeners, Publisher, Subscription};
use crate::domain::{
    classify_with, DomainError, ErrorRecord, ErrorSeverity, Generation, MessageCatalog,
    RecognitionEvent, SessionConfig, SessionSnapshot, SessionState, TaggedEvent, TimingConfig,
    TranscriptBuffer,
};
use crate::ports::{EventEmitter, RecognitionProvider, Recognizer};

/// Raw code a recognizer reports when it was aborted.
const ABORTED_CODE: &str = "aborted";

#[derive(Debug)]
enum Command {
    Start,
    Stop,
    Abort,
    Reset,
    Dispose,
}

/// Everything the session loop reacts to, in arrival order.
enum Message {
    Command(Command),
    Event(TaggedEvent),
    Flush(oneshot::Sender<()>),
}

/// What woke the session loop.
enum Wake {
    Message(Option<Message>),
    StartDue,
    ErrorClearDue,
}

/// A cancelable deferred action, tagged with the generation that armed it.
#[derive(Debug, Default)]
struct TimerSlot {
    armed: Option<(Instant, Generation)>,
}

impl TimerSlot {
    /// Arm (or re-arm) the timer. A previous deadline is discarded.
    fn arm(&mut self, delay: Duration, generation: Generation) {
        self.armed = Some((Instant::now() + delay, generation));
    }

    fn cancel(&mut self) {
        self.armed = None;
    }

    fn deadline(&self) -> Option<Instant> {
        self.armed.map(|(deadline, _)| deadline)
    }

    /// Disarm and return the generation the timer was armed for.
    fn take(&mut self) -> Option<Generation> {
        self.armed.take().map(|(_, generation)| generation)
    }
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Handle to a transcription session.
///
/// All commands return immediately and never fail; their effects show up in
/// the snapshots delivered through [`subscribe`](Self::subscribe),
/// [`watch`](Self::watch) and [`snapshot`](Self::snapshot). The session runs
/// as a task on the current Tokio runtime, which serializes commands,
/// recognizer events and timers. Dropping the handle disposes the session.
pub struct SessionController {
    messages: mpsc::UnboundedSender<Message>,
    snapshot: watch::Receiver<SessionSnapshot>,
    listeners: Listeners,
    generation: Arc<AtomicU64>,
    disposed: AtomicBool,
    supported: bool,
}

impl SessionController {
    /// Spawn a session on the current Tokio runtime. Error messages use the
    /// built-in catalog for the configured language.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(
        provider: Arc<dyn RecognitionProvider>,
        config: SessionConfig,
        timing: TimingConfig,
    ) -> Self {
        let catalog = MessageCatalog::for_language(&config.language).clone();
        Self::spawn_with_catalog(provider, config, timing, catalog)
    }

    pub fn spawn_with_catalog(
        provider: Arc<dyn RecognitionProvider>,
        config: SessionConfig,
        timing: TimingConfig,
        catalog: MessageCatalog,
    ) -> Self {
        let supported = provider.is_supported();
        let (messages, inbox) = mpsc::unbounded_channel();
        let listeners = Listeners::new();
        let (publisher, snapshot) =
            Publisher::new(SessionSnapshot::initial(supported), listeners.clone());
        let generation = Arc::new(AtomicU64::new(Generation::INITIAL.value()));

        let session = SessionLoop {
            config,
            timing,
            catalog,
            provider,
            supported,
            recognizer: None,
            recognizer_live: false,
            state: SessionState::Idle,
            generation: Generation::INITIAL,
            buffer: TranscriptBuffer::new(),
            error: None,
            start_timer: TimerSlot::default(),
            error_timer: TimerSlot::default(),
            inbox,
            outbox: messages.clone(),
            publisher,
            shared_generation: Arc::clone(&generation),
        };
        tokio::spawn(session.run());

        Self {
            messages,
            snapshot,
            listeners,
            generation,
            disposed: AtomicBool::new(false),
            supported,
        }
    }

    /// Begin a new listening attempt after the debounce delay.
    /// Ignored while a recognizer is already starting or listening.
    pub fn start(&self) {
        self.send(Command::Start);
    }

    /// Ask the recognizer to finish gracefully. Only meaningful while
    /// listening; the session becomes Idle when the recognizer ends.
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Cancel everything in flight and return to Idle immediately.
    pub fn abort(&self) {
        self.send(Command::Abort);
    }

    /// Clear the transcript, interim text and error. The state is unchanged.
    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    /// Abort and shut the session down for good. Later commands are ignored.
    pub fn dispose(&self) {
        self.send(Command::Dispose);
        self.disposed.store(true, Ordering::Release);
    }

    /// Wait until every command and event queued before this call has been
    /// processed.
    pub async fn flush(&self) {
        let (reply, done) = oneshot::channel();
        if self.messages.send(Message::Flush(reply)).is_ok() {
            let _ = done.await;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Register a listener called with every new snapshot.
    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.listeners.subscribe(listener)
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire) || self.messages.is_closed()
    }

    /// Generation of the current start attempt.
    pub fn generation(&self) -> Generation {
        Generation::from(self.generation.load(Ordering::Acquire))
    }

    fn send(&self, command: Command) {
        if self.disposed.load(Ordering::Acquire) {
            trace!(?command, "Session disposed, command ignored");
            return;
        }
        if self.messages.send(Message::Command(command)).is_err() {
            trace!("Session loop gone, command ignored");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            let _ = self.messages.send(Message::Command(Command::Dispose));
        }
    }
}

/// Owns the session state. Runs as a single task.
struct SessionLoop {
    config: SessionConfig,
    timing: TimingConfig,
    catalog: MessageCatalog,
    provider: Arc<dyn RecognitionProvider>,
    supported: bool,
    recognizer: Option<Box<dyn Recognizer>>,
    /// A recognizer start succeeded and its `Ended` has not arrived yet.
    recognizer_live: bool,
    state: SessionState,
    generation: Generation,
    buffer: TranscriptBuffer,
    error: Option<ErrorRecord>,
    start_timer: TimerSlot,
    error_timer: TimerSlot,
    inbox: mpsc::UnboundedReceiver<Message>,
    outbox: mpsc::UnboundedSender<Message>,
    publisher: Publisher,
    shared_generation: Arc<AtomicU64>,
}

impl SessionLoop {
    async fn run(mut self) {
        info!(
            language = %self.config.language,
            continuous = self.config.continuous,
            supported = self.supported,
            "Session controller started"
        );

        loop {
            // Queued messages win over due timers so a pending abort always
            // cancels a start that is about to fire.
            let wake = tokio::select! {
                biased;
                message = self.inbox.recv() => Wake::Message(message),
                () = deadline_reached(self.start_timer.deadline()) => Wake::StartDue,
                () = deadline_reached(self.error_timer.deadline()) => Wake::ErrorClearDue,
            };

            let keep_running = match wake {
                Wake::Message(Some(message)) => self.handle(message).await,
                Wake::Message(None) => {
                    self.dispose().await;
                    false
                }
                Wake::StartDue => {
                    self.start_due().await;
                    true
                }
                Wake::ErrorClearDue => {
                    self.error_clear_due();
                    true
                }
            };

            self.publish();
            if !keep_running {
                break;
            }
        }

        debug!(generation = %self.generation, "Session loop exiting");
    }

    async fn handle(&mut self, message: Message) -> bool {
        match message {
            Message::Command(Command::Dispose) => {
                self.dispose().await;
                return false;
            }
            Message::Command(command) if !self.supported => {
                debug!(?command, "Speech recognition unsupported, command ignored");
            }
            Message::Command(Command::Start) => self.start(),
            Message::Command(Command::Stop) => self.stop().await,
            Message::Command(Command::Abort) => self.abort().await,
            Message::Command(Command::Reset) => self.reset(),
            Message::Event(event) => self.on_event(event),
            Message::Flush(reply) => {
                let _ = reply.send(());
            }
        }
        true
    }

    fn start(&mut self) {
        if !self.state.can_start() {
            debug!(state = ?self.state, generation = %self.generation, "Start ignored");
            return;
        }

        self.generation = self.generation.next();
        self.error_timer.cancel();
        self.error = None;
        self.buffer.clear_interim();
        self.state = SessionState::Starting;
        self.start_timer.arm(self.timing.start_debounce(), self.generation);

        info!(generation = %self.generation, "Session starting");
    }

    async fn start_due(&mut self) {
        let Some(generation) = self.start_timer.take() else {
            return;
        };
        if generation != self.generation || self.state != SessionState::Starting {
            trace!(timer_generation = %generation, current = %self.generation, "Stale start timer");
            return;
        }

        let launched = self.launch(generation).await;
        if let Err(e) = launched {
            warn!(generation = %generation, error = %e, "Recognizer failed to start");
            self.fail(e.raw_code(), generation);
        }
    }

    async fn launch(&mut self, generation: Generation) -> Result<(), DomainError> {
        if self.recognizer_live {
            debug!(generation = %generation, "Aborting previous recognizer before restart");
            self.abort_recognizer().await;
        }

        if self.recognizer.is_none() || self.provider.recreate_per_session() {
            debug!(generation = %generation, "Creating recognizer");
            self.recognizer = None;
            self.recognizer = Some(self.provider.create(&self.config)?);
        }

        let emitter = self.emitter(generation);
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.start(emitter).await?;
            self.recognizer_live = true;
            debug!(generation = %generation, "Recognizer start requested");
        }
        Ok(())
    }

    async fn stop(&mut self) {
        if !self.state.can_stop() {
            debug!(state = ?self.state, "Stop ignored");
            return;
        }

        self.buffer.clear_interim();
        let generation = self.generation;
        let Some(recognizer) = self.recognizer.as_mut() else {
            return;
        };

        info!(generation = %generation, "Stopping session");
        let stopped = recognizer.stop().await;
        if let Err(e) = stopped {
            warn!(generation = %generation, error = %e, "Recognizer failed to stop");
            self.fail(e.raw_code(), generation);
        }
    }

    async fn abort(&mut self) {
        self.start_timer.cancel();
        self.error_timer.cancel();
        self.generation = self.generation.next();
        if self.recognizer_live {
            self.abort_recognizer().await;
        }
        self.error = None;
        self.enter_idle();

        info!(generation = %self.generation, "Session aborted");
    }

    async fn abort_recognizer(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            if let Err(e) = recognizer.abort().await {
                debug!(error = %e, "Recognizer abort failed");
            }
        }
        self.recognizer_live = false;
    }

    fn reset(&mut self) {
        self.buffer.clear();
        // A pending error-clear timer stays armed so an Error state still
        // resolves to Idle.
        self.error = None;
        debug!(state = ?self.state, "Transcript reset");
    }

    async fn dispose(&mut self) {
        self.abort().await;
        // Dropping the recognizer drops its emitter; later events go nowhere.
        self.recognizer = None;
        info!("Session disposed");
    }

    fn error_clear_due(&mut self) {
        let Some(generation) = self.error_timer.take() else {
            return;
        };
        if generation != self.generation {
            return;
        }

        if self.error.as_ref().is_some_and(|e| e.recoverable) {
            self.error = None;
        }
        if self.state == SessionState::Error(ErrorSeverity::Recoverable) {
            self.enter_idle();
        }
        debug!(generation = %generation, "Recoverable error cleared");
    }

    fn on_event(&mut self, tagged: TaggedEvent) {
        let TaggedEvent { generation, event } = tagged;

        if generation != self.generation {
            match &event {
                RecognitionEvent::Error { code } if code == ABORTED_CODE => {
                    trace!(event_generation = %generation, "Ignoring abort residue");
                }
                _ => {
                    debug!(
                        event = event.name(),
                        event_generation = %generation,
                        current = %self.generation,
                        "Discarding stale event"
                    );
                }
            }
            return;
        }

        match event {
            RecognitionEvent::Started => {
                if self.state == SessionState::Starting {
                    self.state = SessionState::Listening;
                    info!(generation = %generation, "Listening");
                } else {
                    debug!(state = ?self.state, "Started event ignored");
                }
            }
            RecognitionEvent::Result { segments } => {
                if self.state == SessionState::Idle {
                    debug!(generation = %generation, "Result after session ended, discarded");
                    return;
                }
                if self.buffer.apply(&segments, self.config.interim_results) {
                    trace!(
                        generation = %generation,
                        segments = segments.len(),
                        transcript_len = self.buffer.transcript().len(),
                        "Transcript updated"
                    );
                }
            }
            RecognitionEvent::Error { code } => self.fail(&code, generation),
            RecognitionEvent::Ended => {
                self.recognizer_live = false;
                self.enter_idle();
                info!(generation = %generation, "Session ended");
            }
        }
    }

    fn fail(&mut self, raw_code: &str, generation: Generation) {
        let record = ErrorRecord::new(classify_with(raw_code, &self.catalog), generation);

        if record.recoverable {
            self.error_timer.arm(self.timing.error_clear(), generation);
            info!(generation = %generation, code = %raw_code, category = ?record.category, "Recoverable recognition error");
        } else {
            self.error_timer.cancel();
            warn!(generation = %generation, code = %raw_code, category = ?record.category, "Recognition error");
        }

        self.state = SessionState::Error(record.severity());
        self.error = Some(record);
    }

    fn enter_idle(&mut self) {
        self.state = SessionState::Idle;
        self.buffer.clear_interim();
    }

    fn emitter(&self, generation: Generation) -> EventEmitter {
        let outbox = self.outbox.clone();
        EventEmitter::new(generation, move |event| {
            let _ = outbox.send(Message::Event(event));
        })
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            is_listening: self.state.is_active(),
            transcript: self.buffer.transcript().to_string(),
            interim_transcript: self.buffer.interim().to_string(),
            error: self.error.clone(),
            is_supported: self.supported,
        }
    }

    fn publish(&self) {
        self.shared_generation
            .store(self.generation.value(), Ordering::Release);
        self.publisher.publish(self.snapshot());
    }
}
