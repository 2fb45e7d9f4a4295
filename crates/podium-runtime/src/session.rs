//! Session handle and options

use std::sync::Arc;
use std::time::Duration;

use podium_client::DebateBackend;
use podium_core::{DebateConfig, Notice, Silent, Snapshot, SpeechInput, SpeechOutput};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::driver::Driver;
use crate::error::RuntimeError;

/// What the presentation layer can ask of a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Submit(String),
    /// Replace the unsent draft
    Draft(String),
    ToggleRunning,
    RetryResults,
    /// Ask again for an AI reply whose stream failed
    RetryResponse,
    StartDictation,
    StopDictation,
    /// End the debate now and request scores
    Finish,
    Leave,
}

/// Tunables for a session task
#[derive(Clone)]
pub struct RuntimeOptions {
    /// Clock resolution; every tick removes one second
    pub tick_interval: Duration,
    pub intent_capacity: usize,
    pub notice_capacity: usize,
    pub speech_output: Arc<dyn SpeechOutput>,
    pub speech_input: Arc<dyn SpeechInput>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            intent_capacity: 32,
            notice_capacity: 64,
            speech_output: Arc::new(Silent),
            speech_input: Arc::new(Silent),
        }
    }
}

impl RuntimeOptions {
    pub fn with_speech(
        mut self,
        input: Arc<dyn SpeechInput>,
        output: Arc<dyn SpeechOutput>,
    ) -> Self {
        self.speech_input = input;
        self.speech_output = output;
        self
    }
}

impl std::fmt::Debug for RuntimeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeOptions")
            .field("tick_interval", &self.tick_interval)
            .field("intent_capacity", &self.intent_capacity)
            .field("notice_capacity", &self.notice_capacity)
            .finish_non_exhaustive()
    }
}

/// A running debate session
///
/// Dropping every clone of `intents` ends the session the same way
/// [`Intent::Leave`] does.
#[derive(Debug)]
pub struct SessionHandle {
    pub intents: mpsc::Sender<Intent>,
    pub snapshots: watch::Receiver<Snapshot>,
    pub notices: mpsc::Receiver<Notice>,
    pub task: JoinHandle<Result<Snapshot, RuntimeError>>,
}

impl SessionHandle {
    pub async fn send(&self, intent: Intent) -> Result<(), RuntimeError> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| RuntimeError::Closed)
    }

    /// Latest published state
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait until the published state satisfies `condition`
    pub async fn wait_for(
        &mut self,
        condition: impl FnMut(&Snapshot) -> bool,
    ) -> Result<Snapshot, RuntimeError> {
        self.snapshots
            .wait_for(condition)
            .await
            .map(|s| s.clone())
            .map_err(|_| RuntimeError::Closed)
    }

    /// Leave the session and wait for the task to wind down
    pub async fn leave(self) -> Result<Snapshot, RuntimeError> {
        let _ = self.intents.send(Intent::Leave).await;
        join(self.task).await
    }
}

/// Wait for a session task and flatten its outcome
pub async fn join(
    task: JoinHandle<Result<Snapshot, RuntimeError>>,
) -> Result<Snapshot, RuntimeError> {
    match task.await {
        Ok(result) => result,
        Err(e) => Err(RuntimeError::Panicked(e.to_string())),
    }
}

/// Start a debate session on its own task
pub fn spawn_session(
    backend: Arc<dyn DebateBackend>,
    config: DebateConfig,
    options: RuntimeOptions,
) -> SessionHandle {
    let (intent_tx, intent_rx) = mpsc::channel(options.intent_capacity.max(1));
    let (notice_tx, notice_rx) = mpsc::channel(options.notice_capacity.max(1));
    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

    let driver = Driver::new(backend, options, snapshot_tx, notice_tx);
    let task = tokio::spawn(driver.run(config, intent_rx));

    SessionHandle {
        intents: intent_tx,
        snapshots: snapshot_rx,
        notices: notice_rx,
        task,
    }
}
