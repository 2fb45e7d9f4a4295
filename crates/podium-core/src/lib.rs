//! # Podium Core
//!
//! The turn session controller behind Podium's debate practice:
//! - [`SessionController`]: single-writer reducer over one debate session
//! - [`TurnState`]: speaker and clock bookkeeping with fixed-cost handoffs
//! - [`LineDecoder`]: incremental decoding of the backend's `data:` event stream
//! - [`SetupDraft`]: topic catalog and duration presets of the setup wizard
//! - [`SpeechInput`] / [`SpeechOutput`]: injected dictation and read-aloud
//!
//! ```rust
//! use podium_core::{DebateConfig, Effect, Input, SessionController};
//!
//! let mut controller = SessionController::new();
//! let config = DebateConfig::new("Practice", "AI Ethics", "against", 1800, 300);
//! let effects = controller.start_session(config).unwrap();
//! assert!(matches!(effects[0], Effect::Initiate { .. }));
//!
//! controller.apply(Input::Tick);
//! assert_eq!(controller.snapshot().remaining_turn_secs, 299);
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod message;
pub mod score;
pub mod setup;
pub mod speech;
pub mod stream;
pub mod turn;

pub use config::DebateConfig;
pub use controller::{
    Effect, Input, Notice, NoticeLevel, Phase, Session, SessionController, Snapshot, StreamId,
    TIMEOUT_PLACEHOLDER,
};
pub use error::SessionError;
pub use message::{ArgumentKind, Message, Speaker};
pub use score::ScoreResult;
pub use setup::{
    catalog, find_topic, search_topics, DurationPreset, SetupDraft, SetupError, Topic, TurnOption,
};
pub use speech::{ScriptedSpeech, Silent, SpeechError, SpeechInput, SpeechOutput, TranscriptSink};
pub use stream::{decode_line, LineDecoder, StreamEvent, DONE_SENTINEL};
pub use turn::{HandoffOutcome, TickOutcome, TurnState};
