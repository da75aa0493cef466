//! Ticker resolution: free text → canonical ticker symbol
//!
//! Resolution is a pure function of the query and the [`AliasTable`]. Three
//! strategies run in order and the first hit wins:
//!
//! 1. the text itself looks like a ticker (`AAPL`, `$nvda`)
//! 2. the text names a company in the alias table, exactly, as a phrase or
//!    by a close misspelling
//! 3. the text contains a capitalised ticker-like token (`is PLTR a buy?`)

mod aliases;
mod similarity;

pub use aliases::{AliasTable, CompanyEntry, clean_text};
pub use similarity::{edit_distance, similarity};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Minimum similarity for a misspelt company name to count as a match
const FUZZY_THRESHOLD: f64 = 0.8;
/// Minimum similarity for a "did you mean" suggestion
const SUGGESTION_THRESHOLD: f64 = 0.4;
const MAX_SUGGESTIONS: usize = 3;
/// Floor for phrase matches inside a longer query
const PARTIAL_MATCH_FLOOR: f64 = 0.6;
/// Slack for float comparisons against the thresholds above
const SCORE_EPSILON: f64 = 1e-9;

/// Conversational words that never identify a company on their own
const FILLER_WORDS: &[&str] = &[
    "about", "analysis", "analyze", "buy", "buying", "does", "doing", "from", "good", "hold",
    "invest", "investing", "like", "look", "looking", "market", "news", "now", "opinion",
    "outlook", "price", "recommend", "recommendation", "sell", "selling", "share", "shares",
    "should", "stock", "stocks", "tell", "that", "think", "this", "today", "what", "with",
    "worth",
];

/// Upper-case words that look like tickers but almost never are
const COMMON_UPPERCASE: &[&str] = &[
    "A", "AI", "AM", "AN", "AND", "API", "AT", "ATH", "BE", "BUY", "BY", "CEO", "CFO", "DO",
    "EPS", "ETF", "EU", "FOR", "GDP", "HOLD", "I", "IF", "IN", "IPO", "IS", "IT", "ME", "MY",
    "NO", "NYSE", "OF", "OK", "ON", "OR", "PE", "PM", "SEC", "SELL", "SO", "THE", "TO", "TV",
    "UK", "UP", "US", "USA", "USD", "WE", "WHAT", "YTD",
];

/// Canonical ticker: 1-5 upper-case ASCII letters or digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

/// Rejected ticker text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ticker symbol: {0:?}")]
pub struct InvalidTicker(pub String);

impl Ticker {
    /// Accept `s` only if it already is a well-formed ticker
    pub fn parse(s: &str) -> Result<Self, InvalidTicker> {
        let valid = (1..=5).contains(&s.len())
            && s.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            && s.chars().any(|c| c.is_ascii_uppercase());
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidTicker(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = InvalidTicker;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a ticker was derived from the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// The query was a ticker present in the table
    Exact,
    /// A company alias matched
    Alias,
    /// A misspelt company name matched
    Fuzzy,
    /// A ticker-shaped token was taken at face value
    Passthrough,
}

/// Successful resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub ticker: Ticker,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub method: ResolutionMethod,
    /// Confidence of the match itself, 0.0-1.0
    pub confidence: f64,
}

impl ResolvedSymbol {
    pub fn new(ticker: Ticker, method: ResolutionMethod, confidence: f64) -> Self {
        Self {
            ticker,
            company_name: None,
            method,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn with_company(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    fn from_entry(entry: &CompanyEntry, method: ResolutionMethod, confidence: f64) -> Option<Self> {
        Ticker::parse(&entry.ticker)
            .ok()
            .map(|t| Self::new(t, method, confidence).with_company(entry.name.clone()))
    }
}

/// A "did you mean" candidate offered when resolution fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub ticker: String,
    pub company_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionFailureReason {
    NoMatch,
}

/// Resolution failed; carries near misses, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    pub reason: ResolutionFailureReason,
    pub suggestions: Vec<Suggestion>,
}

impl ResolutionFailure {
    fn no_match(suggestions: Vec<Suggestion>) -> Self {
        Self {
            reason: ResolutionFailureReason::NoMatch,
            suggestions,
        }
    }
}

/// Maps free text to a ticker using an owned alias table
#[derive(Debug, Clone)]
pub struct TickerResolver {
    table: Arc<AliasTable>,
}

impl TickerResolver {
    pub fn new(table: Arc<AliasTable>) -> Self {
        Self { table }
    }

    /// Resolver over the built-in NASDAQ company list
    pub fn nasdaq() -> Self {
        Self::new(Arc::new(AliasTable::nasdaq()))
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    /// Resolve `text` to a ticker.
    pub fn resolve(&self, text: &str) -> Result<ResolvedSymbol, ResolutionFailure> {
        let stripped = text.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if stripped.is_empty() {
            return Err(ResolutionFailure::no_match(Vec::new()));
        }

        if let Some(symbol) = self.match_ticker(stripped) {
            debug!(ticker = %symbol.ticker, "Resolved as ticker");
            return Ok(symbol);
        }

        let cleaned = clean_text(text);
        if let Some(symbol) = self.match_alias(&cleaned) {
            debug!(ticker = %symbol.ticker, method = ?symbol.method, "Resolved via alias table");
            return Ok(symbol);
        }

        if let Some(symbol) = self.match_salient_token(text) {
            debug!(ticker = %symbol.ticker, "Resolved from capitalised token");
            return Ok(symbol);
        }

        Err(ResolutionFailure::no_match(self.suggestions(&cleaned)))
    }

    /// Step 1: the whole query is ticker-shaped and plausible
    fn match_ticker(&self, stripped: &str) -> Option<ResolvedSymbol> {
        if !(1..=5).contains(&stripped.len()) || !stripped.chars().all(|c| c.is_ascii_alphabetic())
        {
            return None;
        }

        let upper = stripped.to_ascii_uppercase();
        if let Some(entry) = self.table.by_ticker(&upper) {
            return ResolvedSymbol::from_entry(entry, ResolutionMethod::Exact, 1.0);
        }

        // An unknown ticker is only trusted if the user typed it in capitals
        let typed_upper = stripped == upper;
        if typed_upper && !COMMON_UPPERCASE.contains(&upper.as_str()) {
            return Ticker::parse(&upper)
                .ok()
                .map(|t| ResolvedSymbol::new(t, ResolutionMethod::Passthrough, 0.6));
        }

        None
    }

    /// Step 2: exact alias, phrase inside the query, then misspelling
    fn match_alias(&self, cleaned: &str) -> Option<ResolvedSymbol> {
        if cleaned.is_empty() {
            return None;
        }

        if let Some(entry) = self.table.by_alias(cleaned) {
            return ResolvedSymbol::from_entry(entry, ResolutionMethod::Alias, 1.0);
        }

        let tokens: Vec<&str> = cleaned.split_whitespace().collect();

        let mut best: Option<(&str, &CompanyEntry)> = None;
        for (alias, entry) in self.table.aliases() {
            if phrase_matches(alias, &tokens) && best.is_none_or(|(b, _)| alias.len() > b.len()) {
                best = Some((alias, entry));
            }
        }
        if let Some((alias, entry)) = best {
            let score = (alias.len() as f64 / cleaned.len() as f64).clamp(PARTIAL_MATCH_FLOOR, 1.0);
            return ResolvedSymbol::from_entry(entry, ResolutionMethod::Alias, score);
        }

        let candidates = content_candidates(cleaned, &tokens, 4);
        let mut best: Option<(f64, &CompanyEntry)> = None;
        for (alias, entry) in self.table.aliases() {
            if alias.len() < 4 {
                continue;
            }
            for candidate in candidates.iter().filter(|c| plausible_misspelling(c, alias)) {
                let score = similarity(candidate, alias);
                if score + SCORE_EPSILON >= FUZZY_THRESHOLD && best.is_none_or(|(b, _)| score > b) {
                    best = Some((score, entry));
                }
            }
        }
        best.and_then(|(score, entry)| {
            ResolvedSymbol::from_entry(entry, ResolutionMethod::Fuzzy, score)
        })
    }

    /// Step 3: first capitalised ticker-like token in the original text
    fn match_salient_token(&self, text: &str) -> Option<ResolvedSymbol> {
        let token = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
            .find(|w| {
                (1..=5).contains(&w.len())
                    && w.chars().all(|c| c.is_ascii_uppercase())
                    && !COMMON_UPPERCASE.contains(w)
            })?;

        match self.table.by_ticker(token) {
            Some(entry) => ResolvedSymbol::from_entry(entry, ResolutionMethod::Exact, 0.9),
            None => Ticker::parse(token)
                .ok()
                .map(|t| ResolvedSymbol::new(t, ResolutionMethod::Passthrough, 0.5)),
        }
    }

    fn suggestions(&self, cleaned: &str) -> Vec<Suggestion> {
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        let candidates = content_candidates(cleaned, &tokens, 3);
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<Suggestion> = self
            .table
            .entries()
            .iter()
            .filter_map(|entry| {
                let score = entry
                    .aliases
                    .iter()
                    .flat_map(|alias| candidates.iter().map(move |c| similarity(c, alias)))
                    .fold(0.0_f64, f64::max);
                (score + SCORE_EPSILON >= SUGGESTION_THRESHOLD).then(|| Suggestion {
                    ticker: entry.ticker.clone(),
                    company_name: entry.name.clone(),
                    score: (score * 100.0).round() / 100.0,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(MAX_SUGGESTIONS);
        scored
    }
}

const PLURAL_SUFFIXES: [&str; 2] = ["s", "es"];

/// Does `alias` appear as a run of whole tokens in the query?
///
/// Aliases of four or more characters also match their plural, so "teslas"
/// and "apples" still hit. A possessive arrives here as "tesla s" after
/// cleaning and matches outright.
fn phrase_matches(alias: &str, tokens: &[&str]) -> bool {
    let alias_tokens: Vec<&str> = alias.split_whitespace().collect();
    if alias_tokens.is_empty() || alias_tokens.len() > tokens.len() {
        return false;
    }

    tokens.windows(alias_tokens.len()).any(|window| {
        window.iter().zip(&alias_tokens).all(|(token, part)| {
            *token == *part
                || (part.len() >= 4
                    && token
                        .strip_prefix(part)
                        .is_some_and(|suffix| PLURAL_SUFFIXES.contains(&suffix)))
        })
    })
}

/// Typos keep the first letter, and a longer word built on the alias ("metal"
/// for "meta") is a different word unless it is the plural.
fn plausible_misspelling(candidate: &str, alias: &str) -> bool {
    if candidate.chars().next() != alias.chars().next() {
        return false;
    }
    candidate
        .strip_prefix(alias)
        .is_none_or(|suffix| suffix.is_empty() || PLURAL_SUFFIXES.contains(&suffix))
}

/// Tokens worth comparing against company names, plus the whole query
fn content_candidates<'a>(cleaned: &'a str, tokens: &[&'a str], min_len: usize) -> Vec<&'a str> {
    let mut candidates: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| t.len() >= min_len && !FILLER_WORDS.contains(t))
        .collect();
    if tokens.len() > 1 {
        candidates.push(cleaned);
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TickerResolver {
        TickerResolver::nasdaq()
    }

    #[test]
    fn test_known_ticker_is_exact() {
        let symbol = resolver().resolve("AAPL").unwrap();
        assert_eq!(symbol.ticker.as_str(), "AAPL");
        assert_eq!(symbol.method, ResolutionMethod::Exact);
        assert_eq!(symbol.company_name.as_deref(), Some("Apple Inc."));
        assert!((symbol.confidence - 1.0).abs() < f64::EPSILON);

        // punctuation and case around a known ticker
        let symbol = resolver().resolve(" $nvda ").unwrap();
        assert_eq!(symbol.ticker.as_str(), "NVDA");
        assert_eq!(symbol.method, ResolutionMethod::Exact);
    }

    #[test]
    fn test_unknown_uppercase_ticker_passes_through() {
        let symbol = resolver().resolve("ZZZZ").unwrap();
        assert_eq!(symbol.ticker.as_str(), "ZZZZ");
        assert_eq!(symbol.method, ResolutionMethod::Passthrough);
        assert!(symbol.company_name.is_none());
    }

    #[test]
    fn test_company_name_via_alias() {
        let symbol = resolver().resolve("Apple stock").unwrap();
        assert_eq!(symbol.ticker.as_str(), "AAPL");
        assert_eq!(symbol.method, ResolutionMethod::Alias);

        let symbol = resolver().resolve("apple").unwrap();
        assert_eq!(symbol.ticker.as_str(), "AAPL");
        assert_eq!(symbol.method, ResolutionMethod::Alias);
        assert!((symbol.confidence - 1.0).abs() < f64::EPSILON);

        let symbol = resolver().resolve("What do you think about Facebook?").unwrap();
        assert_eq!(symbol.ticker.as_str(), "META");
    }

    #[test]
    fn test_longest_alias_wins() {
        let table = AliasTable::new()
            .with_company("ZM", "Zoom Video Communications Inc.", &["zoom"])
            .with_company("VID", "Video Corp", &["video"]);
        let resolver = TickerResolver::new(Arc::new(table));
        let symbol = resolver.resolve("thoughts on zoom video communications").unwrap();
        assert_eq!(symbol.ticker.as_str(), "ZM");
    }

    #[test]
    fn test_alias_extension_is_plural_only() {
        let symbol = resolver().resolve("are teslas overpriced").unwrap();
        assert_eq!(symbol.ticker.as_str(), "TSLA");
        assert_eq!(symbol.method, ResolutionMethod::Alias);

        let symbol = resolver().resolve("what about tesla's margins").unwrap();
        assert_eq!(symbol.ticker.as_str(), "TSLA");

        for text in ["Is gold metal a safe investment?", "what about metals"] {
            let resolved = resolver().resolve(text).ok().map(|s| s.ticker.to_string());
            assert_ne!(resolved.as_deref(), Some("META"), "{text}");
        }
    }

    #[test]
    fn test_real_words_are_not_misspellings() {
        let resolved = resolver().resolve("disco stocks").ok().map(|s| s.ticker.to_string());
        assert_ne!(resolved.as_deref(), Some("CSCO"));

        assert!(plausible_misspelling("appel", "apple"));
        assert!(plausible_misspelling("teslas", "tesla"));
        assert!(!plausible_misspelling("metal", "meta"));
        assert!(!plausible_misspelling("disco", "cisco"));
    }

    #[test]
    fn test_misspelling_is_fuzzy() {
        let symbol = resolver().resolve("should I invest in microsft").unwrap();
        assert_eq!(symbol.ticker.as_str(), "MSFT");
        assert_eq!(symbol.method, ResolutionMethod::Fuzzy);
        assert!(symbol.confidence >= FUZZY_THRESHOLD);

        let symbol = resolver().resolve("appel").unwrap();
        assert_eq!(symbol.ticker.as_str(), "AAPL");
    }

    #[test]
    fn test_salient_token_in_sentence() {
        let symbol = resolver().resolve("Is PLTR a buy right now?").unwrap();
        assert_eq!(symbol.ticker.as_str(), "PLTR");
        assert_eq!(symbol.method, ResolutionMethod::Exact);

        let symbol = resolver().resolve("what about RIVN today").unwrap();
        assert_eq!(symbol.ticker.as_str(), "RIVN");
        assert_eq!(symbol.method, ResolutionMethod::Passthrough);
    }

    #[test]
    fn test_common_words_are_not_tickers() {
        let failure = resolver().resolve("I").unwrap_err();
        assert_eq!(failure.reason, ResolutionFailureReason::NoMatch);

        let failure = resolver().resolve("what is the CEO saying").unwrap_err();
        assert_eq!(failure.reason, ResolutionFailureReason::NoMatch);
    }

    #[test]
    fn test_no_match() {
        let failure = resolver().resolve("XYZNOTREAL").unwrap_err();
        assert_eq!(failure.reason, ResolutionFailureReason::NoMatch);

        let failure = resolver().resolve("   ").unwrap_err();
        assert!(failure.suggestions.is_empty());
    }

    #[test]
    fn test_no_match_offers_suggestions() {
        let failure = resolver().resolve("tezzla").unwrap_err();
        assert!(!failure.suggestions.is_empty());
        assert!(failure.suggestions.len() <= MAX_SUGGESTIONS);
        assert_eq!(failure.suggestions[0].ticker, "TSLA");
        assert!(
            failure
                .suggestions
                .windows(2)
                .all(|w| w[0].score >= w[1].score)
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let resolver = resolver();
        for query in ["AAPL", "Apple stock", "microsft", "Is PLTR a buy?", "XYZNOTREAL"] {
            assert_eq!(resolver.resolve(query), resolver.resolve(query));
        }
    }

    #[test]
    fn test_ticker_validation() {
        assert!(Ticker::parse("AAPL").is_ok());
        assert!(Ticker::parse("BRK1").is_ok());
        assert!(Ticker::parse("aapl").is_err());
        assert!(Ticker::parse("TOOLONG").is_err());
        assert!(Ticker::parse("").is_err());
        assert!(Ticker::parse("123").is_err());

        let json = serde_json::to_string(&Ticker::parse("MSFT").unwrap()).unwrap();
        assert_eq!(json, "\"MSFT\"");
        assert!(serde_json::from_str::<Ticker>("\"bad ticker\"").is_err());
    }
}
