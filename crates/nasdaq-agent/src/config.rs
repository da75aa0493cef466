//! Configuration for the analysis pipeline and the A2A handler

use crate::error::{AgentError, Result};
use nasdaq_utils::{env_or, env_string};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default Anthropic model used for recommendations
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Identity the agent advertises on the A2A bus and in its info descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Stable identifier, also used as the reply prefix
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Broad domain of expertise
    pub domain: String,
    /// Narrow specialization
    pub specialization: String,
    /// One paragraph description
    pub description: String,
}

impl Default for AgentIdentity {
    fn default() -> Self {
        Self {
            id: "nasdaq-stock-agent".to_string(),
            name: "NASDAQ Stock Agent".to_string(),
            domain: "financial analysis".to_string(),
            specialization: "NASDAQ stock analysis and investment recommendations".to_string(),
            description: "AI-powered agent that resolves company names to NASDAQ tickers, \
                          pulls real-time market data and returns Buy/Hold/Sell \
                          recommendations with confidence scores"
                .to_string(),
        }
    }
}

/// Configuration for the NASDAQ stock agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Anthropic model identifier
    pub model: String,

    /// Anthropic API key
    #[serde(skip_serializing, default)]
    pub anthropic_api_key: Option<String>,

    /// Upper bound on one reasoning call
    pub llm_timeout: Duration,

    /// Maximum tokens the model may generate
    pub llm_max_tokens: usize,

    /// Sampling temperature for recommendations
    pub llm_temperature: f32,

    /// Upper bound on one market data attempt
    pub market_timeout: Duration,

    /// Pause before the single market data retry
    pub retry_backoff: Duration,

    /// How long a fetched snapshot stays cached
    pub cache_ttl: Duration,

    /// Days of price history kept in a snapshot
    pub history_window_days: u32,

    /// Upper bound on price points kept in a snapshot
    pub max_history_points: usize,

    /// Requests per minute allowed against the quote provider
    pub rate_limit_per_minute: u32,

    /// Live A2A conversations kept before LRU eviction
    pub max_conversations: usize,

    /// Turns kept per A2A conversation
    pub max_turns: usize,

    /// Advertised identity
    pub identity: AgentIdentity,

    /// Directory for `analyses.jsonl` and `errors.jsonl`
    pub logs_dir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            anthropic_api_key: None,
            llm_timeout: Duration::from_secs(30),
            llm_max_tokens: 4000,
            llm_temperature: 0.3,
            market_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(250),
            cache_ttl: Duration::from_secs(300), // 5 minutes
            history_window_days: 183,            // ~6 months
            max_history_points: 200,
            rate_limit_per_minute: 100,
            max_conversations: 1000,
            max_turns: 50,
            identity: AgentIdentity::default(),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl AgentConfig {
    /// Create a new configuration builder
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Load configuration from the environment on top of the defaults
    ///
    /// Reads `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL`, `LLM_TIMEOUT_SECS`,
    /// `MARKET_DATA_TIMEOUT_SECS`, `CACHE_TTL_SECS`, `RATE_LIMIT_PER_MINUTE`,
    /// `AGENT_ID`, `AGENT_NAME` and `LOGS_DIR`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            model: env_string("ANTHROPIC_MODEL").unwrap_or(defaults.model),
            anthropic_api_key: env_string("ANTHROPIC_API_KEY"),
            llm_timeout: Duration::from_secs(env_or(
                "LLM_TIMEOUT_SECS",
                defaults.llm_timeout.as_secs(),
            )?),
            market_timeout: Duration::from_secs(env_or(
                "MARKET_DATA_TIMEOUT_SECS",
                defaults.market_timeout.as_secs(),
            )?),
            cache_ttl: Duration::from_secs(env_or("CACHE_TTL_SECS", defaults.cache_ttl.as_secs())?),
            rate_limit_per_minute: env_or("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute)?,
            identity: AgentIdentity {
                id: env_string("AGENT_ID").unwrap_or(defaults.identity.id),
                name: env_string("AGENT_NAME").unwrap_or(defaults.identity.name),
                ..defaults.identity
            },
            logs_dir: env_string("LOGS_DIR").map_or(defaults.logs_dir, PathBuf::from),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AgentError::ConfigError("model must not be empty".to_string()));
        }

        if self.llm_timeout.is_zero() || self.market_timeout.is_zero() {
            return Err(AgentError::ConfigError(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.llm_temperature) {
            return Err(AgentError::ConfigError(
                "llm_temperature must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.history_window_days == 0 || self.max_history_points == 0 {
            return Err(AgentError::ConfigError(
                "history window and max_history_points must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(AgentError::ConfigError(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.max_conversations == 0 || self.max_turns == 0 {
            return Err(AgentError::ConfigError(
                "max_conversations and max_turns must be greater than 0".to_string(),
            ));
        }

        if self.identity.id.trim().is_empty() {
            return Err(AgentError::ConfigError("agent id must not be empty".to_string()));
        }

        Ok(())
    }

    /// Path of the analyses audit log
    pub fn analyses_log_path(&self) -> PathBuf {
        self.logs_dir.join("analyses.jsonl")
    }

    /// Path of the errors log
    pub fn errors_log_path(&self) -> PathBuf {
        self.logs_dir.join("errors.jsonl")
    }
}

/// Builder for AgentConfig
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    model: Option<String>,
    anthropic_api_key: Option<String>,
    llm_timeout: Option<Duration>,
    market_timeout: Option<Duration>,
    retry_backoff: Option<Duration>,
    cache_ttl: Option<Duration>,
    history_window_days: Option<u32>,
    max_history_points: Option<usize>,
    rate_limit_per_minute: Option<u32>,
    max_conversations: Option<usize>,
    max_turns: Option<usize>,
    identity: Option<AgentIdentity>,
    logs_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the Anthropic API key
    pub fn anthropic_api_key(mut self, key: impl Into<String>) -> Self {
        self.anthropic_api_key = Some(key.into());
        self
    }

    /// Set the reasoning call timeout
    pub fn llm_timeout(mut self, duration: Duration) -> Self {
        self.llm_timeout = Some(duration);
        self
    }

    /// Set the market data attempt timeout
    pub fn market_timeout(mut self, duration: Duration) -> Self {
        self.market_timeout = Some(duration);
        self
    }

    /// Set the pause before the market data retry
    pub fn retry_backoff(mut self, duration: Duration) -> Self {
        self.retry_backoff = Some(duration);
        self
    }

    /// Set the snapshot cache TTL
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Set the history window in days
    pub fn history_window_days(mut self, days: u32) -> Self {
        self.history_window_days = Some(days);
        self
    }

    /// Set the maximum number of history points
    pub fn max_history_points(mut self, points: usize) -> Self {
        self.max_history_points = Some(points);
        self
    }

    /// Set the provider rate limit
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Set the conversation cap
    pub fn max_conversations(mut self, cap: usize) -> Self {
        self.max_conversations = Some(cap);
        self
    }

    /// Set the turns kept per conversation
    pub fn max_turns(mut self, turns: usize) -> Self {
        self.max_turns = Some(turns);
        self
    }

    /// Set the advertised identity
    pub fn identity(mut self, identity: AgentIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the audit log directory
    pub fn logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AgentConfig> {
        let defaults = AgentConfig::default();

        let config = AgentConfig {
            model: self.model.unwrap_or(defaults.model),
            anthropic_api_key: self.anthropic_api_key,
            llm_timeout: self.llm_timeout.unwrap_or(defaults.llm_timeout),
            llm_max_tokens: defaults.llm_max_tokens,
            llm_temperature: defaults.llm_temperature,
            market_timeout: self.market_timeout.unwrap_or(defaults.market_timeout),
            retry_backoff: self.retry_backoff.unwrap_or(defaults.retry_backoff),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            history_window_days: self
                .history_window_days
                .unwrap_or(defaults.history_window_days),
            max_history_points: self.max_history_points.unwrap_or(defaults.max_history_points),
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
            max_conversations: self.max_conversations.unwrap_or(defaults.max_conversations),
            max_turns: self.max_turns.unwrap_or(defaults.max_turns),
            identity: self.identity.unwrap_or(defaults.identity),
            logs_dir: self.logs_dir.unwrap_or(defaults.logs_dir),
        };

        config.validate()?;
        Ok(config)
    }
}
