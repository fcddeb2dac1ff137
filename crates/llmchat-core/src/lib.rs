pub mod attachments;
pub mod client;
pub mod config;
pub mod intent;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use attachments::{Attachments, PendingFile};
pub use client::{ClientError, LlmClient, LlmReply, LlmRequest};
pub use config::{Config, ConfigError, BASE_URL_ENV};
pub use intent::{classify, Intent};
pub use session::{ChatSession, Completion, Dispatch};
pub use state::{ChatMessage, ChatRole, Transcript};
