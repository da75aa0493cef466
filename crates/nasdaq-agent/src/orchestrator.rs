//! Analysis pipeline
//!
//! Drives one query through resolution, market data and reasoning. Every
//! stage failure is folded into the returned [`AnalysisResult`]; the
//! orchestrator itself never errors.

use crate::audit::{AuditRecord, AuditSink, ErrorRecord};
use crate::engine::RecommendationEngine;
use crate::market::MarketDataGateway;
use crate::model::Query;
use crate::resolver::TickerResolver;
use crate::result::{AnalysisResult, FailureReason, Stage, TerminalState};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Running counters across all analyses
#[derive(Debug, Default)]
pub struct OrchestratorStats {
    total: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    degraded: AtomicU64,
}

/// Point-in-time copy of [`OrchestratorStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    /// Completed without market data
    pub degraded: u64,
}

impl OrchestratorStats {
    fn record(&self, result: &AnalysisResult) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if result.is_completed() {
            self.completed.fetch_add(1, Ordering::Relaxed);
            if result.snapshot.is_none() {
                self.degraded.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }
}

pub struct AnalysisOrchestrator {
    resolver: TickerResolver,
    gateway: MarketDataGateway,
    engine: RecommendationEngine,
    audit: Arc<dyn AuditSink>,
    stats: OrchestratorStats,
}

impl AnalysisOrchestrator {
    pub fn new(
        resolver: TickerResolver,
        gateway: MarketDataGateway,
        engine: RecommendationEngine,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            resolver,
            gateway,
            engine,
            audit,
            stats: OrchestratorStats::default(),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Model used for reasoning
    pub fn model(&self) -> &str {
        self.engine.model()
    }

    pub fn resolver(&self) -> &TickerResolver {
        &self.resolver
    }

    /// Run the full pipeline for `query`.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty))]
    pub async fn run(&self, query: Query) -> AnalysisResult {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));
        debug!(stage = ?Stage::Received, query = %query.text);

        let mut result = AnalysisResult {
            request_id,
            query: query.text.clone(),
            conversation_id: query.conversation_id.clone(),
            symbol: None,
            snapshot: None,
            market_data_issue: None,
            recommendation: None,
            suggestions: Vec::new(),
            latency_ms: 0,
            completed_at: Utc::now(),
            terminal_state: TerminalState::Completed,
        };

        let terminal_state = self.execute(&query, &mut result).await;
        result.terminal_state = terminal_state;
        result.latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result.completed_at = Utc::now();

        self.stats.record(&result);
        self.write_audit(&result).await;

        match &result.terminal_state {
            TerminalState::Completed => info!(
                ticker = result.ticker().unwrap_or_default(),
                action = ?result.action(),
                confidence = ?result.confidence(),
                degraded = result.snapshot.is_none(),
                latency_ms = result.latency_ms,
                "Analysis completed"
            ),
            TerminalState::Failed { stage, reason, .. } => info!(
                ?stage,
                ?reason,
                latency_ms = result.latency_ms,
                "Analysis failed"
            ),
        }

        result
    }

    async fn execute(&self, query: &Query, result: &mut AnalysisResult) -> TerminalState {
        debug!(stage = ?Stage::Resolving);
        let symbol = match self.resolver.resolve(&query.text) {
            Ok(symbol) => symbol,
            Err(failure) => {
                result.suggestions = failure.suggestions;
                return TerminalState::Failed {
                    stage: Stage::Resolving,
                    reason: FailureReason::NoMatch,
                    detail: format!("no ticker symbol found in {:?}", query.text.trim()),
                };
            }
        };

        debug!(stage = ?Stage::Fetching, ticker = %symbol.ticker);
        match self.gateway.fetch(symbol.ticker.as_str()).await {
            Ok(snapshot) => result.snapshot = Some(snapshot),
            Err(issue) => {
                warn!(ticker = %symbol.ticker, reason = ?issue.reason, "Continuing without market data");
                result.market_data_issue = Some(issue);
            }
        }

        debug!(stage = ?Stage::Reasoning);
        let outcome = self
            .engine
            .analyze(&symbol, result.snapshot.as_ref(), &query.text)
            .await;
        result.symbol = Some(symbol);

        match outcome {
            Ok(recommendation) => {
                result.recommendation = Some(recommendation);
                TerminalState::Completed
            }
            Err(failure) => TerminalState::Failed {
                stage: Stage::Reasoning,
                reason: failure.reason.into(),
                detail: failure.detail,
            },
        }
    }

    async fn write_audit(&self, result: &AnalysisResult) {
        if let Err(e) = self.audit.record_analysis(&AuditRecord::from(result)).await {
            warn!(error = %e, "Failed to write audit record");
        }
        if let Some(record) = ErrorRecord::from_result(result) {
            if let Err(e) = self.audit.record_error(&record).await {
                warn!(error = %e, "Failed to write error record");
            }
        }
    }
}
