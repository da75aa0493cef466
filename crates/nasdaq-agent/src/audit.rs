//! Append-only audit trail of analysis runs

use crate::config::AgentConfig;
use crate::error::Result;
use crate::model::Action;
use crate::result::{AnalysisResult, FailureReason, Stage, TerminalState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// One line of the analyses log, written for every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
    pub query: String,
    pub resolved_ticker: Option<String>,
    pub action: Option<Action>,
    pub confidence: Option<u8>,
    pub latency_ms: u64,
    pub terminal_state: TerminalState,
}

impl From<&AnalysisResult> for AuditRecord {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            timestamp: result.completed_at,
            request_id: result.request_id,
            query: result.query.clone(),
            resolved_ticker: result.ticker().map(str::to_string),
            action: result.action(),
            confidence: result.confidence(),
            latency_ms: result.latency_ms,
            terminal_state: result.terminal_state.clone(),
        }
    }
}

/// One line of the errors log, written only for failed runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
    pub failure_reason: FailureReason,
    pub stage: Stage,
    pub detail: String,
}

impl ErrorRecord {
    pub fn from_result(result: &AnalysisResult) -> Option<Self> {
        match &result.terminal_state {
            TerminalState::Completed => None,
            TerminalState::Failed {
                stage,
                reason,
                detail,
            } => Some(Self {
                timestamp: result.completed_at,
                request_id: result.request_id,
                failure_reason: *reason,
                stage: *stage,
                detail: detail.clone(),
            }),
        }
    }
}

/// Destination for audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_analysis(&self, record: &AuditRecord) -> Result<()>;

    async fn record_error(&self, record: &ErrorRecord) -> Result<()>;
}

/// Writes records as JSON lines to two files
///
/// Each file sits behind its own lock so concurrent runs never interleave
/// partial lines.
pub struct JsonlAuditSink {
    analyses_path: PathBuf,
    analyses: Mutex<File>,
    errors: Mutex<File>,
}

impl JsonlAuditSink {
    pub async fn open(analyses_path: impl AsRef<Path>, errors_path: impl AsRef<Path>) -> Result<Self> {
        let analyses_path = analyses_path.as_ref().to_path_buf();
        let analyses = open_append(&analyses_path).await?;
        let errors = open_append(errors_path.as_ref()).await?;

        debug!(path = %analyses_path.display(), "Audit log opened");

        Ok(Self {
            analyses_path,
            analyses: Mutex::new(analyses),
            errors: Mutex::new(errors),
        })
    }

    pub async fn from_config(config: &AgentConfig) -> Result<Self> {
        Self::open(config.analyses_log_path(), config.errors_log_path()).await
    }

    pub fn analyses_path(&self) -> &Path {
        &self.analyses_path
    }
}

async fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    Ok(file)
}

async fn append_line<T: Serialize>(file: &Mutex<File>, record: &T) -> Result<()> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = file.lock().await;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record_analysis(&self, record: &AuditRecord) -> Result<()> {
        append_line(&self.analyses, record).await
    }

    async fn record_error(&self, record: &ErrorRecord) -> Result<()> {
        append_line(&self.errors, record).await
    }
}

/// Keeps records in memory
#[derive(Default)]
pub struct MemoryAuditSink {
    analyses: StdMutex<Vec<AuditRecord>>,
    errors: StdMutex<Vec<ErrorRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyses(&self) -> Vec<AuditRecord> {
        self.analyses
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.errors
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record_analysis(&self, record: &AuditRecord) -> Result<()> {
        if let Ok(mut records) = self.analyses.lock() {
            records.push(record.clone());
        }
        Ok(())
    }

    async fn record_error(&self, record: &ErrorRecord) -> Result<()> {
        if let Ok(mut records) = self.errors.lock() {
            records.push(record.clone());
        }
        Ok(())
    }
}
