//! # Podium Client
//!
//! Access to the debate backend.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`HttpBackend`] | The hosted debate service (`PODIUM_API_URL`) |
//! | [`MockBackend`] | Tests and offline practice |
//!
//! ## Quick Start
//!
//! ```rust
//! use futures::StreamExt;
//! use podium_client::{DebateBackend, MockBackend};
//! use podium_core::{DebateConfig, LineDecoder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MockBackend::constant("I disagree.");
//!     let config = DebateConfig::new("Practice", "AI Ethics", "against", 1800, 300);
//!
//!     let mut stream = backend.initiate(&config).await.unwrap();
//!     let mut decoder = LineDecoder::new();
//!     while let Some(Ok(chunk)) = stream.next().await {
//!         for event in decoder.push(&chunk) {
//!             println!("{:?}", event);
//!         }
//!     }
//! }
//! ```
//!
//! ## Against a running service
//!
//! ```rust,ignore
//! use podium_client::{ClientConfig, HttpBackend};
//!
//! let backend = HttpBackend::new(&ClientConfig::from_env()?)?;
//! let stats = backend.get_user_stats().await?;
//! ```

pub mod backend;
pub mod config;
pub mod http;
pub mod mock;

pub use backend::{
    ArgumentRecord, BackendError, ByteStream, DebateBackend, DebateRecord, Feedback,
    FeedbackScores, UserStats,
};
pub use config::{ClientConfig, ConfigError, DEFAULT_API_URL};
pub use http::HttpBackend;
pub use mock::{BackendCall, MockBackend, Operation};
