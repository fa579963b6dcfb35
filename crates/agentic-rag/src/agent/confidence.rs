//! Confidence scoring of quality assessments

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Score used when an assessment carries no usable signal
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// How an evaluation text is mapped to a confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidencePolicy {
    /// First keyword match wins: "confidence" 0.9, "good" 0.8, "adequate" 0.6
    #[default]
    Keyword,
    /// Parse the "Overall score: N/10" figure
    Numeric,
}

impl ConfidencePolicy {
    /// Score an assessment text
    pub fn score(&self, assessment: &str) -> f32 {
        match self {
            Self::Keyword => keyword_score(assessment),
            Self::Numeric => numeric_score(assessment).unwrap_or(DEFAULT_CONFIDENCE),
        }
    }
}

fn keyword_score(assessment: &str) -> f32 {
    let lower = assessment.to_lowercase();
    if lower.contains("confidence") {
        0.9
    } else if lower.contains("good") {
        0.8
    } else if lower.contains("adequate") {
        0.6
    } else {
        DEFAULT_CONFIDENCE
    }
}

fn overall_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)overall\s+score\s*[:=]?\s*(\d+(?:\.\d+)?)\s*/\s*10")
            .expect("Invalid regex")
    })
}

fn fraction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)\s*/\s*10\b")
            .expect("Invalid regex")
    })
}

/// `N/10` from the "Overall score" line, else the last `N/10` in the text
fn numeric_score(assessment: &str) -> Option<f32> {
    let captured = overall_pattern()
        .captures(assessment)
        .or_else(|| fraction_pattern().captures_iter(assessment).last())?;

    let value: f32 = captured.get(1)?.as_str().parse().ok()?;
    Some((value / 10.0).clamp(0.0, 1.0))
}
