//! Normalization of the model's reply into a `SkillAssessment`.
//!
//! Strict/permissive split: transport and JSON-parse failures are fatal and
//! handled before this point. Once the reply is valid JSON, every field
//! shape mismatch falls back to a default instead of failing the call.

use serde_json::Value;

use crate::assessment::models::{Answers, SkillAssessment};

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Builds the assessment from the parsed reply. `answers` is the caller's
/// validated input and is never taken from the model.
pub fn normalize_assessment(parsed: &Value, answers: Answers) -> SkillAssessment {
    SkillAssessment {
        score: clamp_score(coerce_number(parsed.get("score"))),
        detected_skills: string_list(parsed.get("detectedSkills")),
        missing_skills: string_list(parsed.get("missingSkills")),
        strength_areas: string_list(parsed.get("strengthAreas")),
        summary: parsed
            .get("shortSummary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        answers,
    }
}

/// Numeric coercion for the score, following the questionnaire client's
/// `Number(x) || 0` rule: numbers as-is, booleans as 1/0, null as 0, strings
/// by the decimal/hex/octal/binary literal grammar, single-element arrays by
/// their element. Anything else, and NaN, becomes 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    value
        .map_or(Some(0.0), to_number)
        .filter(|n| !n.is_nan())
        .unwrap_or(0.0)
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_str(s),
        // An array converts through its joined text, so only `[]`, `[null]`
        // and a single numeric-looking element survive.
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [Value::Bool(_)] | [Value::Object(_)] => None,
            [item] => to_number(item),
            _ => None,
        },
        Value::Object(_) => None,
    }
}

fn parse_numeric_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            if digits.is_empty() {
                return None;
            }
            return digits.chars().try_fold(0.0_f64, |acc, c| {
                c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
            });
        }
    }

    let unsigned = s.strip_prefix(&['+', '-'][..]).unwrap_or(s);
    if unsigned == "Infinity" {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    // Rust's float grammar also takes "inf", "nan" and friends; only plain
    // decimal literals are numbers here.
    let decimal = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !decimal {
        return None;
    }
    s.parse::<f64>().ok()
}

fn clamp_score(raw: f64) -> u32 {
    raw.clamp(SCORE_MIN, SCORE_MAX).round() as u32
}

/// Arrays only; strings kept as-is, other elements rendered as JSON text.
/// Order is preserved and duplicates are kept.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}
