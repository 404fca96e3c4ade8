//! JSON recovery from raw model output.
//!
//! Models are not guaranteed to honor "JSON only" instructions: responses may
//! wrap the object in commentary, markdown code fences, or leading chatter.
//! `extract` tries an ordered cascade of recovery strategies and returns the
//! first one that yields parseable JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Matches a fenced code block, optionally tagged `json`.
static FENCED_BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("Invalid fenced block regex")
});

/// Matches a brace expression allowing one level of nested braces.
/// The most error-prone strategy (it can match non-JSON brace text), so it
/// runs last.
static BRACE_EXPR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(?:[^{}]|\{[^{}]*\})*\}").expect("Invalid brace expression regex")
});

/// No strategy produced parseable JSON. Carries the parse errors from the
/// two cheapest strategies for diagnostics.
#[derive(Debug, Error)]
#[error("no JSON found in model output (whole text: {direct_error}; outer braces: {substring_error})")]
pub struct ExtractionError {
    pub direct_error: String,
    pub substring_error: String,
}

/// Recovery strategies, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    WholeText,
    OuterBraces,
    FencedBlock,
    BraceScan,
}

/// Result of attempting a single extraction strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionAttempt {
    pub strategy: ExtractionStrategy,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Extraction result along with which strategy succeeded and what was tried.
#[derive(Debug, Clone)]
pub struct ExtractOutput {
    pub value: Value,
    pub strategy_used: ExtractionStrategy,
    pub all_attempts: Vec<ExtractionAttempt>,
}

/// Extract a JSON value from raw model output.
pub fn extract(raw_text: &str) -> Result<Value, ExtractionError> {
    extract_with_stats(raw_text).map(|output| output.value)
}

/// Extract a JSON value, reporting which strategies were tried.
pub fn extract_with_stats(raw_text: &str) -> Result<ExtractOutput, ExtractionError> {
    let strategies: [(
        ExtractionStrategy,
        fn(&str) -> Result<Value, String>,
    ); 4] = [
        (ExtractionStrategy::WholeText, parse_whole_text),
        (ExtractionStrategy::OuterBraces, parse_outer_braces),
        (ExtractionStrategy::FencedBlock, parse_fenced_block),
        (ExtractionStrategy::BraceScan, parse_brace_scan),
    ];

    let mut attempts = Vec::new();
    for (strategy, parse) in strategies {
        match parse(raw_text) {
            Ok(value) => {
                attempts.push(ExtractionAttempt {
                    strategy,
                    success: true,
                    error: None,
                });
                return Ok(ExtractOutput {
                    value,
                    strategy_used: strategy,
                    all_attempts: attempts,
                });
            }
            Err(error) => attempts.push(ExtractionAttempt {
                strategy,
                success: false,
                error: Some(error),
            }),
        }
    }

    let error_for = |strategy: ExtractionStrategy| {
        attempts
            .iter()
            .find(|a| a.strategy == strategy)
            .and_then(|a| a.error.clone())
            .unwrap_or_default()
    };
    Err(ExtractionError {
        direct_error: error_for(ExtractionStrategy::WholeText),
        substring_error: error_for(ExtractionStrategy::OuterBraces),
    })
}

/// Strategy 1: parse the entire trimmed text as JSON.
fn parse_whole_text(raw_text: &str) -> Result<Value, String> {
    serde_json::from_str(raw_text.trim()).map_err(|e| e.to_string())
}

/// Strategy 2: parse the substring between the first `{` and the last `}`,
/// inclusive. Recovers objects wrapped in commentary.
fn parse_outer_braces(raw_text: &str) -> Result<Value, String> {
    let start = raw_text
        .find('{')
        .ok_or_else(|| "no opening brace in text".to_string())?;
    let end = raw_text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| "no closing brace after opening brace".to_string())?;
    serde_json::from_str(&raw_text[start..=end]).map_err(|e| e.to_string())
}

/// Strategy 3: parse the contents of the first fenced code block.
fn parse_fenced_block(raw_text: &str) -> Result<Value, String> {
    let cap = FENCED_BLOCK_REGEX
        .captures(raw_text)
        .ok_or_else(|| "no fenced code block in text".to_string())?;
    let body = cap
        .get(1)
        .ok_or_else(|| "empty fenced code block".to_string())?;
    serde_json::from_str(body.as_str().trim()).map_err(|e| e.to_string())
}

/// Strategy 4: greedy regex scan for the first balanced-looking brace
/// expression (one level of nesting).
fn parse_brace_scan(raw_text: &str) -> Result<Value, String> {
    let m = BRACE_EXPR_REGEX
        .find(raw_text)
        .ok_or_else(|| "no brace expression in text".to_string())?;
    serde_json::from_str(m.as_str()).map_err(|e| e.to_string())
}
