// crates/core/src/lib.rs
//! Domain types and collaborator clients for the dah job queue.
//!
//! - [`types`]: the `Job` record and its status machine
//! - [`prompt`]: turns fetched pages + a request into a chat transcript
//! - [`content`]: page-content resolver (trait + HTTP fetcher)
//! - [`llm`]: chat completion provider (trait + Ollama client)

pub mod content;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod types;

pub use content::{ContentResolver, DocmostFetcher, PageContent};
pub use error::*;
pub use llm::{ChatMessage, ChatProvider, ChatRole, LlmError, OllamaProvider};
pub use prompt::build_messages;
pub use types::*;
