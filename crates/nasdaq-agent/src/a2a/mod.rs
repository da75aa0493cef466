//! Agent-to-agent message handling
//!
//! Inbound envelopes are dispatched as slash commands or stock queries and
//! answered with a reply envelope on the same conversation.

mod commands;
mod conversation;
mod envelope;
mod format;

pub use commands::Command;
pub use conversation::{ConversationSlot, ConversationStore, History, Turn};
pub use envelope::{A2aMessage, Content, Role};

use crate::config::AgentIdentity;
use crate::model::Query;
use crate::orchestrator::AnalysisOrchestrator;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, error, info, instrument, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct A2aHandler {
    orchestrator: Arc<AnalysisOrchestrator>,
    conversations: Arc<ConversationStore>,
    identity: AgentIdentity,
    started: Instant,
}

impl A2aHandler {
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        conversations: Arc<ConversationStore>,
        identity: AgentIdentity,
    ) -> Self {
        Self {
            orchestrator,
            conversations,
            identity,
            started: Instant::now(),
        }
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Answer one inbound message.
    ///
    /// The turn runs on its own task, so the reply is appended to the
    /// history and the audit record written even if the caller goes away.
    /// The conversation's history stays locked for the whole turn, so replies
    /// on one conversation come back in the order the messages arrived.
    #[instrument(skip_all, fields(conversation_id = tracing::field::Empty))]
    pub async fn handle(&self, message: A2aMessage) -> A2aMessage {
        let conversation_id = message
            .conversation_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("conversation_id", conversation_id.as_str());

        let Some(text) = message.text().map(|text| text.trim().to_string()) else {
            warn!("Received non-text message");
            return message.reply(&self.identity.id, conversation_id, format::NON_TEXT_REPLY);
        };

        let handler = self.clone();
        let id = conversation_id.clone();
        let turn = tokio::spawn(async move { handler.turn(text, id).await }.in_current_span());

        let reply = match turn.await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Conversation turn aborted");
                ABORTED_REPLY.to_string()
            }
        };

        message.reply(&self.identity.id, conversation_id, &reply)
    }

    async fn turn(&self, text: String, conversation_id: String) -> String {
        let slot = self.conversations.checkout(&conversation_id);
        let mut history = slot.lock().await;
        history.push(Role::User, text.as_str());

        let reply = match Command::parse(&text) {
            Command::Help => format::help(&self.identity),
            Command::Ping => format::ping(&self.identity),
            Command::Status => format::status(
                &self.identity,
                self.uptime(),
                self.conversations.len(),
                self.orchestrator.stats(),
            ),
            Command::Unknown(command) => {
                info!(%command, "Unknown command");
                format::unknown_command(&command)
            }
            Command::Query(query) => {
                let query = Query::new(query).with_conversation_id(conversation_id.as_str());
                format::analysis(&self.orchestrator.run(query).await)
            }
        };

        history.push(Role::Agent, reply.as_str());
        reply
    }
}

const ABORTED_REPLY: &str =
    "Sorry, I encountered an error analyzing that stock. Please try again later.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::config::AgentConfig;
    use crate::engine::RecommendationEngine;
    use crate::market::{MarketDataGateway, MockQuoteProvider};
    use crate::resolver::TickerResolver;
    use crate::testing::{self, StubLlm};
    use futures::future::join_all;

    struct Fixture {
        handler: A2aHandler,
        llm: Arc<StubLlm>,
        audit: Arc<MemoryAuditSink>,
    }

    fn fixture(market: MockQuoteProvider) -> Fixture {
        fixture_with_llm(market, StubLlm::replying(&testing::reply("BUY", 80)))
    }

    fn fixture_with_llm(market: MockQuoteProvider, llm: StubLlm) -> Fixture {
        let config = AgentConfig::builder()
            .market_timeout(Duration::from_millis(200))
            .llm_timeout(Duration::from_secs(2))
            .retry_backoff(Duration::ZERO)
            .build()
            .unwrap();
        let llm = Arc::new(llm);
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = AnalysisOrchestrator::new(
            TickerResolver::nasdaq(),
            MarketDataGateway::new(Arc::new(market), &config),
            RecommendationEngine::new(llm.clone(), &config).unwrap(),
            audit.clone(),
        );
        let handler = A2aHandler::new(
            Arc::new(orchestrator),
            Arc::new(ConversationStore::new(config.max_conversations, config.max_turns)),
            config.identity.clone(),
        );
        Fixture {
            handler,
            llm,
            audit,
        }
    }

    fn idle_market() -> MockQuoteProvider {
        let mut market = MockQuoteProvider::new();
        market.expect_latest_quote().never();
        market.expect_history().never();
        market
    }

    fn healthy_market() -> MockQuoteProvider {
        let mut market = MockQuoteProvider::new();
        market
            .expect_latest_quote()
            .returning(|_| Ok(testing::bar(0, 150.0)));
        market
            .expect_history()
            .returning(|_, _, _| Ok(testing::daily_bars(120, 145.0)));
        market
    }

    fn reply_text(reply: &A2aMessage) -> &str {
        reply.text().unwrap()
    }

    #[tokio::test]
    async fn test_help_is_canned_and_recorded() {
        let f = fixture(idle_market());

        let reply = f
            .handler
            .handle(A2aMessage::user("/help").with_conversation_id("conv-1"))
            .await;

        assert!(reply_text(&reply).starts_with("[nasdaq-stock-agent] NASDAQ Stock Agent - Available Commands"));
        assert_eq!(f.llm.calls(), 0);
        assert!(f.audit.analyses().is_empty());

        let history = f.handler.conversations().history("conv-1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "/help");
        assert_eq!(history[1].role, Role::Agent);
    }

    #[tokio::test]
    async fn test_ping_always_pongs() {
        let f = fixture(idle_market());

        for _ in 0..3 {
            let reply = f
                .handler
                .handle(A2aMessage::user("/PING").with_conversation_id("conv-1"))
                .await;
            assert!(reply_text(&reply).contains("Pong"));
        }
        assert_eq!(f.handler.conversations().history("conv-1").await.len(), 6);
    }

    #[tokio::test]
    async fn test_status_reports_counters() {
        let f = fixture(idle_market());

        let reply = f.handler.handle(A2aMessage::user("/status")).await;

        let text = reply_text(&reply);
        assert!(text.contains("Agent ID: nasdaq-stock-agent"));
        assert!(text.contains("Uptime: 0m"));
        assert!(text.contains("Active conversations: 1"));
        assert!(text.contains("Analyses: 0 total"));
    }

    #[tokio::test]
    async fn test_unknown_slash_command() {
        let f = fixture(idle_market());

        let reply = f.handler.handle(A2aMessage::user("/AAPL")).await;

        assert_eq!(
            reply_text(&reply),
            "[nasdaq-stock-agent] Unknown command: /AAPL\nUse /help to see available commands."
        );
        assert_eq!(f.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_is_analysed() {
        let f = fixture(healthy_market());
        let inbound = A2aMessage::user("What about Apple?").with_conversation_id("conv-2");

        let reply = f.handler.handle(inbound.clone()).await;

        let text = reply_text(&reply);
        assert!(text.starts_with("[nasdaq-stock-agent] Apple Inc. (AAPL) Analysis"));
        assert!(text.contains("Recommendation: BUY"));
        assert_eq!(reply.conversation_id.as_deref(), Some("conv-2"));
        assert_eq!(reply.parent_message_id, inbound.message_id);
        assert_eq!(f.llm.calls(), 1);

        let records = f.audit.analyses();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resolved_ticker.as_deref(), Some("AAPL"));
    }

    #[tokio::test]
    async fn test_dropped_caller_still_completes_turn() {
        let llm =
            StubLlm::replying(&testing::reply("BUY", 80)).with_delay(Duration::from_millis(300));
        let f = fixture_with_llm(healthy_market(), llm);

        let inbound = A2aMessage::user("AAPL").with_conversation_id("conv-gone");
        let outcome =
            tokio::time::timeout(Duration::from_millis(50), f.handler.handle(inbound)).await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;

        let history = f.handler.conversations().history("conv-gone").await;
        let roles: Vec<Role> = history.iter().map(|turn| turn.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Agent]);
        assert!(history[1].text.contains("Recommendation: BUY"));
        assert_eq!(f.audit.analyses().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_query_apologises() {
        let f = fixture(idle_market());

        let reply = f.handler.handle(A2aMessage::user("XYZNOTREAL")).await;

        assert!(reply_text(&reply).contains("I couldn't find a NASDAQ stock matching"));
        assert_eq!(f.audit.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_non_text_content() {
        let f = fixture(idle_market());
        let inbound = A2aMessage {
            content: Content::Unsupported,
            ..A2aMessage::user("")
        };

        let reply = f.handler.handle(inbound).await;

        assert_eq!(
            reply_text(&reply),
            "[nasdaq-stock-agent] Sorry, I only support text messages."
        );
        assert!(reply.conversation_id.is_some());
    }

    #[tokio::test]
    async fn test_missing_conversation_id_is_generated() {
        let f = fixture(idle_market());

        let reply = f.handler.handle(A2aMessage::user("/ping")).await;

        let id = reply.conversation_id.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert!(f.handler.conversations().contains(&id));
    }

    #[tokio::test]
    async fn test_concurrent_messages_keep_order() {
        let f = fixture(idle_market());

        let messages = (0..20).map(|i| {
            let message = if i % 2 == 0 { "/ping" } else { "/help" };
            f.handler
                .handle(A2aMessage::user(message).with_conversation_id("shared"))
        });
        let replies = join_all(messages).await;
        assert_eq!(replies.len(), 20);

        let history = f.handler.conversations().history("shared").await;
        assert_eq!(history.len(), 40);
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(
            history
                .chunks(2)
                .all(|pair| pair[0].role == Role::User && pair[1].role == Role::Agent)
        );
    }
}
