//! Shared server state

use nasdaq_agent::{
    A2aHandler, AgentConfig, AgentDescriptor, AgentIdentity, AnalysisOrchestrator,
    ConversationStore, JsonlAuditSink, MarketDataGateway, RecommendationEngine, TickerResolver,
    YahooQuoteProvider,
};
use nasdaq_llm::providers::AnthropicProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub a2a: Arc<A2aHandler>,
    pub identity: AgentIdentity,
    /// Externally reachable base URL advertised in the descriptor
    pub public_url: String,
    started: Instant,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        conversations: Arc<ConversationStore>,
        identity: AgentIdentity,
        public_url: impl Into<String>,
    ) -> Self {
        let a2a = Arc::new(A2aHandler::new(
            Arc::clone(&orchestrator),
            conversations,
            identity.clone(),
        ));
        Self {
            orchestrator,
            a2a,
            identity,
            public_url: public_url.into(),
            started: Instant::now(),
        }
    }

    /// Wire the production pipeline: Yahoo Finance, Anthropic and JSONL audit logs
    pub async fn from_config(config: &AgentConfig, public_url: impl Into<String>) -> anyhow::Result<Self> {
        let llm = match &config.anthropic_api_key {
            Some(key) => AnthropicProvider::new(key.clone(), config.llm_timeout)?,
            None => AnthropicProvider::from_env(config.llm_timeout)?,
        };
        let market = YahooQuoteProvider::new(config.rate_limit_per_minute);
        let audit = JsonlAuditSink::from_config(config).await?;
        info!(path = %audit.analyses_path().display(), model = %config.model, "Pipeline ready");

        let orchestrator = AnalysisOrchestrator::new(
            TickerResolver::nasdaq(),
            MarketDataGateway::new(Arc::new(market), config),
            RecommendationEngine::new(Arc::new(llm), config)?,
            Arc::new(audit),
        );
        let conversations = ConversationStore::new(config.max_conversations, config.max_turns);

        Ok(Self::new(
            Arc::new(orchestrator),
            Arc::new(conversations),
            config.identity.clone(),
            public_url,
        ))
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new(&self.identity, &self.public_url)
    }
}
