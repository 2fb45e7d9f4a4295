//! Session event loop
//!
//! One task owns the [`SessionController`]. Clock ticks, stream chunks,
//! backend acknowledgements and user intents are taken one at a time and
//! applied to completion; the effects each produces are carried out here,
//! with backend calls spawned so their results come back as inputs.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use podium_client::{BackendError, ByteStream, DebateBackend};
use podium_core::{
    DebateConfig, Effect, Input, Notice, NoticeLevel, Phase, SessionController, Snapshot,
    StreamId,
};
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::RuntimeError;
use crate::session::{Intent, RuntimeOptions};

/// Results delivered back to the loop by spawned work
enum Event {
    Input(Input),
    StreamOpened { stream: StreamId, body: ByteStream },
}

struct OpenStream {
    id: StreamId,
    body: ByteStream,
}

pub(crate) struct Driver {
    controller: SessionController,
    backend: Arc<dyn DebateBackend>,
    options: RuntimeOptions,
    stream: Option<OpenStream>,
    timer: Option<Interval>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    snapshots: watch::Sender<Snapshot>,
    notices: mpsc::Sender<Notice>,
    last_error: Option<String>,
}

impl Driver {
    pub(crate) fn new(
        backend: Arc<dyn DebateBackend>,
        options: RuntimeOptions,
        snapshots: watch::Sender<Snapshot>,
        notices: mpsc::Sender<Notice>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller: SessionController::new(),
            backend,
            options,
            stream: None,
            timer: None,
            events_tx,
            events_rx,
            snapshots,
            notices,
            last_error: None,
        }
    }

    pub(crate) async fn run(
        mut self,
        config: DebateConfig,
        mut intents: mpsc::Receiver<Intent>,
    ) -> Result<Snapshot, RuntimeError> {
        info!(backend = self.backend.name(), "Session task started");
        let effects = self.controller.start_session(config)?;
        self.subscribe_dictation();
        self.perform_all(effects);
        self.publish();

        loop {
            self.sync_timer();

            tokio::select! {
                _ = next_tick(&mut self.timer), if self.timer.is_some() => {
                    self.dispatch(Input::Tick);
                }
                (stream, item) = next_chunk(&mut self.stream), if self.stream.is_some() => {
                    self.on_stream_item(stream, item);
                }
                Some(event) = self.events_rx.recv() => {
                    self.on_event(event);
                }
                intent = intents.recv() => match intent {
                    Some(Intent::Leave) | None => break,
                    Some(intent) => self.on_intent(intent),
                },
            }

            if self.is_aborted() {
                let reason = self
                    .last_error
                    .take()
                    .unwrap_or_else(|| "session aborted".to_string());
                self.teardown();
                return Err(RuntimeError::InitiationFailed(reason));
            }
        }

        Ok(self.teardown())
    }

    fn dispatch(&mut self, input: Input) {
        let effects = self.controller.apply(input);
        self.perform_all(effects);
        self.publish();
    }

    fn on_stream_item(&mut self, stream: StreamId, item: Option<Result<Vec<u8>, BackendError>>) {
        match item {
            Some(Ok(bytes)) => self.dispatch(Input::StreamChunk { stream, bytes }),
            Some(Err(e)) => {
                self.stream = None;
                self.dispatch(Input::StreamFailed {
                    stream,
                    error: e.to_string(),
                });
            }
            None => {
                self.stream = None;
                self.dispatch(Input::StreamClosed { stream });
            }
        }
    }

    fn on_event(&mut self, event: Event) {
        match event {
            Event::Input(input) => self.dispatch(input),
            Event::StreamOpened { stream, body } => {
                if self.controller.current_stream() == Some(stream) {
                    debug!(stream, "Response stream opened");
                    self.stream = Some(OpenStream { id: stream, body });
                } else {
                    debug!(stream, "Discarding stream opened after it was abandoned");
                }
            }
        }
    }

    fn on_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Submit(text) => self.dispatch(Input::Submit(text)),
            Intent::Draft(text) => self.dispatch(Input::Draft(text)),
            Intent::ToggleRunning => self.dispatch(Input::ToggleRunning),
            Intent::RetryResults => self.dispatch(Input::RetryResults),
            Intent::RetryResponse => self.dispatch(Input::RetryResponse),
            Intent::StartDictation => {
                if let Err(e) = self.options.speech_input.start() {
                    self.notify(Notice::warning(e.to_string(), false));
                }
            }
            Intent::StopDictation => self.options.speech_input.stop(),
            Intent::Finish => {
                match self.controller.complete_session() {
                    Ok(effects) => self.perform_all(effects),
                    Err(e) => self.notify(Notice::warning(e.to_string(), false)),
                }
                self.publish();
            }
            Intent::Leave => {}
        }
    }

    fn perform_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.perform(effect);
        }
        // A finished stream is retired by the controller without a cancel effect
        if let Some(open) = &self.stream {
            if self.controller.current_stream() != Some(open.id) {
                self.stream = None;
            }
        }
    }

    fn perform(&mut self, effect: Effect) {
        debug!(?effect, "Performing effect");
        match effect {
            Effect::Initiate { stream, config } => {
                let backend = self.backend.clone();
                self.spawn_call(async move {
                    match backend.initiate(&config).await {
                        Ok(body) => Event::StreamOpened { stream, body },
                        Err(e) => Event::Input(Input::StreamFailed {
                            stream,
                            error: e.to_string(),
                        }),
                    }
                });
            }
            Effect::RequestResponse {
                stream,
                debate_id,
                content,
            } => {
                let backend = self.backend.clone();
                self.spawn_call(async move {
                    match backend.respond(&debate_id, &content).await {
                        Ok(body) => Event::StreamOpened { stream, body },
                        Err(e) => Event::Input(Input::StreamFailed {
                            stream,
                            error: e.to_string(),
                        }),
                    }
                });
            }
            Effect::CancelStream(stream) => {
                if self.stream.as_ref().is_some_and(|s| s.id == stream) {
                    debug!(stream, "Dropping response stream");
                    self.stream = None;
                }
            }
            Effect::SubmitArgument { debate_id, content } => {
                let backend = self.backend.clone();
                self.spawn_call(async move {
                    Event::Input(match backend.submit_argument(&debate_id, &content).await {
                        Ok(()) => Input::ArgumentAccepted,
                        Err(e) => Input::ArgumentRejected(e.to_string()),
                    })
                });
            }
            Effect::SaveAiArgument {
                debate_id,
                content,
                kind,
            } => {
                let backend = self.backend.clone();
                self.spawn_call(async move {
                    Event::Input(
                        match backend.save_ai_argument(&debate_id, &content, kind).await {
                            Ok(()) => Input::AiTurnSaved,
                            Err(e) => Input::AiTurnSaveFailed(e.to_string()),
                        },
                    )
                });
            }
            Effect::Complete { debate_id } => {
                let backend = self.backend.clone();
                self.spawn_call(async move {
                    Event::Input(match backend.complete(&debate_id).await {
                        Ok(()) => Input::Completed,
                        Err(e) => Input::CompletionFailed(e.to_string()),
                    })
                });
            }
            Effect::FetchScores { debate_id } => {
                let backend = self.backend.clone();
                self.spawn_call(async move {
                    Event::Input(match backend.get_scores(&debate_id).await {
                        Ok(scores) => Input::ScoresLoaded(scores),
                        Err(e) => Input::ScoresFailed(e.to_string()),
                    })
                });
            }
            Effect::Speak(text) => {
                if let Err(e) = self.options.speech_output.speak(&text) {
                    warn!(error = %e, "Failed to read response aloud");
                }
            }
            Effect::StopSpeaking => self.options.speech_output.cancel(),
            Effect::Notify(notice) => self.notify(notice),
        }
    }

    fn spawn_call<F>(&self, call: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            // The loop may already be gone
            let _ = events.send(call.await);
        });
    }

    fn notify(&mut self, notice: Notice) {
        if notice.level == NoticeLevel::Error {
            self.last_error = Some(notice.message.clone());
        }
        match self.notices.try_send(notice) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(notice)) => {
                warn!(message = %notice.message, "Notice queue full, dropping notice");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn subscribe_dictation(&self) {
        let events = self.events_tx.clone();
        self.options
            .speech_input
            .subscribe(Box::new(move |transcript| {
                let _ = events.send(Event::Input(Input::Dictation(transcript)));
            }));
    }

    /// Arm the clock while the session is counting down, disarm it otherwise
    fn sync_timer(&mut self) {
        if !self.controller.is_ticking() {
            self.timer = None;
            return;
        }
        if self.timer.is_none() {
            let period = self.options.tick_interval;
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.timer = Some(interval);
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }

    fn is_aborted(&self) -> bool {
        self.controller
            .session()
            .is_some_and(|s| s.phase() == Phase::Aborted)
    }

    /// Drop the stream and the clock, silence speech, and return the last state
    fn teardown(&mut self) -> Snapshot {
        let snapshot = self.controller.snapshot();
        self.options.speech_input.stop();
        let effects = self.controller.end_session();
        self.perform_all(effects);
        self.stream = None;
        self.timer = None;
        info!(phase = ?snapshot.phase, messages = snapshot.messages.len(), "Session task finished");
        snapshot
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => futures::future::pending::<()>().await,
    }
}

async fn next_chunk(
    stream: &mut Option<OpenStream>,
) -> (StreamId, Option<Result<Vec<u8>, BackendError>>) {
    match stream {
        Some(open) => (open.id, open.body.next().await),
        None => futures::future::pending().await,
    }
}
