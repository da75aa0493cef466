//! Static capability descriptor served at the agent info endpoint

use crate::config::AgentIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedOperation {
    pub operation: String,
    pub description: String,
    pub examples: Vec<String>,
}

impl SupportedOperation {
    fn new(operation: &str, description: &str, examples: &[&str]) -> Self {
        Self {
            operation: operation.to_string(),
            description: description.to_string(),
            examples: examples.iter().map(|e| (*e).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub agent_id: String,
    pub agent_name: String,
    pub agent_domain: String,
    pub agent_specialization: String,
    pub agent_description: String,
    pub agent_capabilities: Vec<String>,
    pub supported_operations: Vec<SupportedOperation>,
    pub rest_endpoint: String,
    pub a2a_endpoint: String,
    pub version: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentDescriptor {
    /// Descriptor for an agent reachable at `base_url`, e.g. `http://localhost:8000`
    pub fn new(identity: &AgentIdentity, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            agent_id: identity.id.clone(),
            agent_name: identity.name.clone(),
            agent_domain: identity.domain.clone(),
            agent_specialization: identity.specialization.clone(),
            agent_description: identity.description.clone(),
            agent_capabilities: [
                "stock analysis",
                "ticker resolution",
                "investment recommendations",
                "market data",
                "technical analysis",
            ]
            .iter()
            .map(|c| (*c).to_string())
            .collect(),
            supported_operations: vec![
                SupportedOperation::new(
                    "stock_analysis",
                    "Analyze a stock and provide an investment recommendation",
                    &["AAPL", "What about Tesla stock?", "Should I buy Microsoft?"],
                ),
                SupportedOperation::new(
                    "ticker_resolution",
                    "Resolve a company name to its ticker symbol",
                    &["Apple", "Microsoft Corporation", "Tesla Inc"],
                ),
                SupportedOperation::new(
                    "investment_recommendation",
                    "Buy/Hold/Sell recommendation with a confidence score",
                    &["Recommend AAPL", "Investment advice for TSLA"],
                ),
            ],
            rest_endpoint: format!("{base_url}/api/v1"),
            a2a_endpoint: format!("{base_url}/a2a"),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "active".to_string(),
            timestamp: Utc::now(),
        }
    }
}
