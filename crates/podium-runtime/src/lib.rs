//! # Podium Runtime
//!
//! Drives a [`podium_core::SessionController`] on a tokio task: a one-second
//! clock, the open AI response stream, backend acknowledgements and user
//! intents are serialized into the controller, and every resulting state is
//! published on a `watch` channel.
//!
//! ```rust
//! use std::sync::Arc;
//! use podium_client::MockBackend;
//! use podium_core::{DebateConfig, Phase};
//! use podium_runtime::{spawn_session, RuntimeOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(MockBackend::constant("I disagree."));
//!     let config = DebateConfig::new("Practice", "AI Ethics", "against", 1200, 120);
//!
//!     let mut session = spawn_session(backend, config, RuntimeOptions::default());
//!     let ready = session
//!         .wait_for(|s| s.phase == Phase::AwaitingUser)
//!         .await
//!         .unwrap();
//!     assert_eq!(ready.messages[0].content, "I disagree.");
//!
//!     session.leave().await.unwrap();
//! }
//! ```

mod driver;
pub mod error;
pub mod session;

pub use error::RuntimeError;
pub use session::{join, spawn_session, Intent, RuntimeOptions, SessionHandle};
