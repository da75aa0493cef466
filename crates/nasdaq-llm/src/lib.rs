//! Text completion client for the NASDAQ stock agent
//!
//! The recommendation engine only ever sends one text prompt and reads one
//! text reply, so this crate keeps the provider surface small:
//!
//! - [`Message`] and [`ContentBlock`] for text conversations
//! - [`CompletionRequest`] / [`CompletionResponse`]
//! - the [`LLMProvider`] trait that the engine is written against
//! - [`providers::AnthropicProvider`], the production implementation

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
