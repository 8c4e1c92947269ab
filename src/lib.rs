//! Cadmium - a terminal chat client
//!
//! This library provides the core of the client:
//! - A REST backend plus channel listing helpers (`api`)
//! - The chat view: message cache, layout, selection and rendering (`chat`)
//! - The frame-driven event loop (`app`)
//! - Configuration, key bindings and link handling
//!
//! # Example
//!
//! ```no_run
//! use cadmium::api::{ChatBackend, HttpBackend};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = HttpBackend::new("https://discordapp.com/api/v9", "token", Duration::from_secs(30))?;
//!     let messages = backend.fetch_messages(&"1234".to_string(), 50).await?;
//!     for message in &messages {
//!         println!("{}: {}", message.author_name(), message.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod event;
pub mod links;
pub mod utils;

// Re-export commonly used types
pub use api::{ChatBackend, HttpBackend};
pub use app::App;
pub use chat::{ChatSession, Flow, MessageCache};
pub use config::Config;
pub use event::{UserEvent, init_user_event};
pub use links::{LinkHandler, SystemLinks};
