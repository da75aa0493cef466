//! Human-readable replies for the A2A channel

use crate::config::AgentIdentity;
use crate::orchestrator::StatsSnapshot;
use crate::result::{AnalysisResult, FailureReason, TerminalState};
use std::time::Duration;

const REASONING_LIMIT: usize = 500;
const RISKS_LIMIT: usize = 300;
const MAX_KEY_FACTORS: usize = 5;

pub const NON_TEXT_REPLY: &str = "Sorry, I only support text messages.";

pub fn ping(identity: &AgentIdentity) -> String {
    format!("Pong! {} is online and ready to analyze stocks.", identity.name)
}

pub fn help(identity: &AgentIdentity) -> String {
    format!(
        "{} - Available Commands:\n\
         \n\
         Stock Analysis:\n\
         \x20  Send a ticker symbol or company name:\n\
         \x20  - \"AAPL\" or \"Apple\"\n\
         \x20  - \"What about Tesla?\"\n\
         \x20  - \"Should I buy Microsoft?\"\n\
         \n\
         Commands:\n\
         \x20  /help - Show this help message\n\
         \x20  /ping - Test agent responsiveness\n\
         \x20  /status - Show agent status\n\
         \n\
         I provide:\n\
         \x20  - Current price and market data\n\
         \x20  - Technical indicators (RSI, moving averages, volatility)\n\
         \x20  - Buy/Hold/Sell recommendations with a 0-100 confidence score\n\
         \x20  - Key factors, risk assessment and reasoning",
        identity.name
    )
}

pub fn status(
    identity: &AgentIdentity,
    uptime: Duration,
    conversations: usize,
    stats: StatsSnapshot,
) -> String {
    format!(
        "{} Status:\n\
         Status: online\n\
         Agent ID: {}\n\
         Domain: {}\n\
         Specialization: {}\n\
         Uptime: {}\n\
         Active conversations: {conversations}\n\
         Analyses: {} total, {} completed, {} failed, {} without market data",
        identity.name,
        identity.id,
        identity.domain,
        identity.specialization,
        format_uptime(uptime),
        stats.total,
        stats.completed,
        stats.failed,
        stats.degraded,
    )
}

pub fn unknown_command(command: &str) -> String {
    format!("Unknown command: {command}\nUse /help to see available commands.")
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, hours, minutes, seconds) =
        (secs / 86_400, (secs % 86_400) / 3600, (secs % 3600) / 60, secs % 60);
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// Cut `text` to at most `limit` characters, marking the cut with "..."
fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Render a finished analysis as a chat reply
pub fn analysis(result: &AnalysisResult) -> String {
    match &result.terminal_state {
        TerminalState::Completed => completed(result),
        TerminalState::Failed { reason, .. } => failed(result, *reason),
    }
}

fn subject(result: &AnalysisResult) -> String {
    match &result.symbol {
        Some(symbol) => match &symbol.company_name {
            Some(name) => format!("{name} ({})", symbol.ticker),
            None => symbol.ticker.to_string(),
        },
        None => format!("\"{}\"", result.query),
    }
}

fn completed(result: &AnalysisResult) -> String {
    let mut out = format!("{} Analysis\n\n", subject(result));

    match &result.snapshot {
        Some(snapshot) => {
            out.push_str(&format!("Current Price: ${:.2}", snapshot.price));
            if let Some(change) = snapshot.change_percent() {
                out.push_str(&format!(" ({change:+.2}%)"));
            }
            out.push('\n');
        }
        None => out.push_str("Market data unavailable; recommendation is based on reasoning alone.\n"),
    }

    if let Some(rec) = &result.recommendation {
        out.push_str(&format!(
            "\nRecommendation: {}\nConfidence: {}%\n",
            rec.action, rec.confidence
        ));

        if !rec.reasoning.is_empty() {
            out.push_str(&format!(
                "\nAnalysis:\n{}\n",
                truncate(&rec.reasoning, REASONING_LIMIT)
            ));
        }

        if !rec.key_factors.is_empty() {
            out.push_str("\nKey Factors:\n");
            for (i, factor) in rec.key_factors.iter().take(MAX_KEY_FACTORS).enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, factor.trim()));
            }
        }

        if !rec.risks.is_empty() {
            out.push_str(&format!(
                "\nRisk Assessment:\n{}\n",
                truncate(&rec.risks.join("; "), RISKS_LIMIT)
            ));
        }
    }

    out.push_str(&format!("\nAnalysis completed in {}ms", result.latency_ms));
    out
}

fn failed(result: &AnalysisResult, reason: FailureReason) -> String {
    match reason {
        FailureReason::NoMatch => {
            let mut out = format!(
                "I couldn't find a NASDAQ stock matching \"{}\".\n\n\
                 Please try:\n\
                 - Using the ticker symbol (e.g., \"AAPL\" for Apple)\n\
                 - Using the full company name (e.g., \"Apple Inc.\")\n\
                 - Checking the spelling",
                result.query.trim()
            );
            if !result.suggestions.is_empty() {
                out.push_str("\n\nDid you mean:");
                for suggestion in &result.suggestions {
                    out.push_str(&format!(
                        "\n- {} ({})",
                        suggestion.company_name, suggestion.ticker
                    ));
                }
            }
            out
        }
        FailureReason::Timeout => format!(
            "Sorry, the analysis of {} took too long. Please try again later.",
            subject(result)
        ),
        FailureReason::ParseError | FailureReason::ServiceError => format!(
            "Sorry, I couldn't analyze {} at this time. Please try again later.",
            subject(result)
        ),
    }
}
