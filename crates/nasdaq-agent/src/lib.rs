//! NASDAQ stock analysis agent
//!
//! Turns free-text stock questions into Buy/Hold/Sell recommendations:
//!
//! - `resolver`: company names, misspellings and tickers to a ticker symbol
//! - `market`: quotes and price history with timeout, retry and caching
//! - `engine`: one LLM call per analysis and a strict reply parser
//! - `orchestrator`: the pipeline that ties the three together and audits it
//! - `a2a`: slash commands and per-conversation history for agent messaging
//!
//! # Example
//!
//! ```rust,ignore
//! use nasdaq_agent::{
//!     AgentConfig, AnalysisOrchestrator, JsonlAuditSink, MarketDataGateway, Query,
//!     RecommendationEngine, TickerResolver, YahooQuoteProvider,
//! };
//! use nasdaq_llm::AnthropicProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AgentConfig::from_env()?;
//!     let llm = AnthropicProvider::from_env(config.llm_timeout)?;
//!     let orchestrator = AnalysisOrchestrator::new(
//!         TickerResolver::nasdaq(),
//!         MarketDataGateway::new(Arc::new(YahooQuoteProvider::new(config.rate_limit_per_minute)), &config),
//!         RecommendationEngine::new(Arc::new(llm), &config)?,
//!         Arc::new(JsonlAuditSink::from_config(&config).await?),
//!     );
//!
//!     let result = orchestrator.run(Query::new("Should I buy Apple?")).await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod a2a;
pub mod audit;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod market;
pub mod model;
pub mod orchestrator;
pub mod resolver;
pub mod result;

#[cfg(test)]
mod testing;

pub use a2a::{A2aHandler, A2aMessage, ConversationStore};
pub use audit::{AuditRecord, AuditSink, ErrorRecord, JsonlAuditSink, MemoryAuditSink};
pub use config::{AgentConfig, AgentConfigBuilder, AgentIdentity, DEFAULT_MODEL};
pub use descriptor::AgentDescriptor;
pub use engine::{AnalysisFailure, AnalysisFailureReason, RecommendationEngine};
pub use error::{AgentError, Result};
pub use market::{
    DataUnavailable, DataUnavailableReason, MarketDataGateway, ProviderError, QuoteProvider,
    YahooQuoteProvider,
};
pub use model::{Action, MarketSnapshot, PricePoint, Query, Recommendation};
pub use orchestrator::{AnalysisOrchestrator, StatsSnapshot};
pub use resolver::{ResolutionFailure, ResolutionMethod, ResolvedSymbol, Ticker, TickerResolver};
pub use result::{AnalysisResult, FailureReason, Stage, TerminalState};
