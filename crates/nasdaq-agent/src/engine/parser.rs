//! Strict parser for the model's structured reply
//!
//! The reply is expected to contain `HEADER: value` sections. Headers are
//! matched case-insensitively and may carry markdown decoration
//! (`**RECOMMENDATION:** BUY`, `## Confidence: 80`). A section runs until the
//! next recognised header.

use crate::model::Action;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_KEY_FACTORS: usize = 5;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s>#*_-]*(recommendation|action|confidence(?:[ _]score)?|reasoning|key[ _]factors|risk[ _]assessment|risks|summary)[\s*_]*:[\s*_]*(.*)$",
    )
    .expect("header pattern is valid")
});

static CONFIDENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s*_\[(]*(-?\d+(?:\.\d+)?)\s*(?:%|/\s*100)?").expect("confidence pattern is valid")
});

/// Action phrases, longest first so "strong buy" wins over "buy"
const ACTION_SYNONYMS: &[(&str, Action)] = &[
    ("market perform", Action::Hold),
    ("equal weight", Action::Hold),
    ("underperform", Action::Sell),
    ("outperform", Action::Buy),
    ("underweight", Action::Sell),
    ("strong sell", Action::Sell),
    ("accumulate", Action::Buy),
    ("overweight", Action::Buy),
    ("strong buy", Action::Buy),
    ("neutral", Action::Hold),
    ("reduce", Action::Sell),
    ("hold", Action::Hold),
    ("sell", Action::Sell),
    ("buy", Action::Buy),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Action,
    Confidence,
    Reasoning,
    KeyFactors,
    Risks,
    Summary,
}

impl Section {
    fn from_header(header: &str) -> Self {
        let header = header.to_lowercase().replace(' ', "_");
        match header.as_str() {
            "recommendation" | "action" => Self::Action,
            "reasoning" => Self::Reasoning,
            "key_factors" => Self::KeyFactors,
            "risks" | "risk_assessment" => Self::Risks,
            "summary" => Self::Summary,
            _ => Self::Confidence,
        }
    }
}

/// Why a reply was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("reply is empty")]
    Empty,

    #[error("reply has no {0} field")]
    MissingField(&'static str),

    #[error("unrecognised action: {0:?}")]
    UnknownAction(String),

    #[error("confidence must be an integer from 0 to 100, got {0:?}")]
    InvalidConfidence(String),
}

/// Validated fields extracted from a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub action: Action,
    pub confidence: u8,
    pub reasoning: String,
    pub key_factors: Vec<String>,
    pub risks: Vec<String>,
    pub summary: Option<String>,
}

/// Parse a model reply. Missing or malformed action or confidence is an
/// error; there is no fallback recommendation.
pub fn parse_reply(text: &str) -> Result<ParsedReply, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let sections = split_sections(text);

    let action_text = sections
        .get(&Section::Action)
        .filter(|v| !v.is_empty())
        .ok_or(ParseError::MissingField("recommendation"))?;
    let action = parse_action(action_text)?;

    let confidence_text = sections
        .get(&Section::Confidence)
        .filter(|v| !v.is_empty())
        .ok_or(ParseError::MissingField("confidence"))?;
    let confidence = parse_confidence(confidence_text)?;

    let key_factors = sections
        .get(&Section::KeyFactors)
        .map(|v| split_list(v, &[',', ';']))
        .unwrap_or_default()
        .into_iter()
        .take(MAX_KEY_FACTORS)
        .collect();

    let risks = sections
        .get(&Section::Risks)
        .map(|v| split_list(v, &[';']))
        .unwrap_or_default();

    Ok(ParsedReply {
        action,
        confidence,
        reasoning: sections.get(&Section::Reasoning).cloned().unwrap_or_default(),
        key_factors,
        risks,
        summary: sections.get(&Section::Summary).filter(|s| !s.is_empty()).cloned(),
    })
}

/// Group lines under the most recent header; the first occurrence of a
/// header wins.
fn split_sections(text: &str) -> HashMap<Section, String> {
    let mut sections: HashMap<Section, String> = HashMap::new();
    let mut current: Option<(Section, Vec<String>)> = None;

    let mut flush = |current: Option<(Section, Vec<String>)>| {
        if let Some((section, lines)) = current {
            let value = lines.join("\n").trim().to_string();
            sections.entry(section).or_insert(value);
        }
    };

    for line in text.lines() {
        if let Some(caps) = HEADER.captures(line) {
            flush(current.take());
            let section = Section::from_header(&caps[1]);
            current = Some((section, vec![caps[2].trim().to_string()]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line.trim().to_string());
        }
    }
    flush(current);

    sections
}

fn parse_action(value: &str) -> Result<Action, ParseError> {
    let normalized = value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    ACTION_SYNONYMS
        .iter()
        .find(|(phrase, _)| {
            normalized == *phrase
                || normalized
                    .strip_prefix(phrase)
                    .is_some_and(|rest| rest.starts_with(' '))
        })
        .map(|(_, action)| *action)
        .ok_or_else(|| ParseError::UnknownAction(value.to_string()))
}

fn parse_confidence(value: &str) -> Result<u8, ParseError> {
    let invalid = || ParseError::InvalidConfidence(value.to_string());

    let number = CONFIDENCE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(invalid)?;

    if number.contains('.') || number.starts_with('-') {
        return Err(invalid());
    }

    number
        .parse::<u8>()
        .ok()
        .filter(|n| *n <= 100)
        .ok_or_else(invalid)
}

/// Split a list field on bullet lines, or on `separators` when the value is
/// a single line.
fn split_list(value: &str, separators: &[char]) -> Vec<String> {
    let lines: Vec<&str> = value.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let items: Vec<&str> = if lines.len() > 1 {
        lines
    } else {
        value.split(separators).collect()
    };

    items
        .into_iter()
        .map(strip_bullet)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(item: &str) -> &str {
    let item = item.trim().trim_start_matches(['-', '*', '•']).trim_start();
    // numbered items: "1." or "2)"
    let digits = item.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && item[digits..].starts_with(['.', ')']) {
        item[digits + 1..].trim()
    } else {
        item.trim()
    }
}
