use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{AppError, AppResult};

/// Attributes used when the model leaves out the pattern profile.
const FALLBACK_PROFILE: [&str; 5] = ["Heritage", "Structure", "Formality", "Ornamentation", "Spirituality"];
const FALLBACK_SCORE: u8 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct CulturalShifts {
    pub summary: String,
    pub revival_cycles: Vec<Value>,
    pub synthesis: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternAttribute {
    pub name: String,
    pub score: u8,
}

/// Which required fields had to be synthesized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backfilled {
    pub cultural_shifts: bool,
    pub pattern_profile: bool,
}

#[derive(Debug, Clone)]
pub struct RepairedAnalysis {
    pub document: Value,
    pub backfilled: Backfilled,
}

impl RepairedAnalysis {
    pub fn pattern_name(&self) -> Option<&str> {
        self.document.get("pattern_name").and_then(Value::as_str)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.document
            .as_object()
            .map(|doc| doc.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    match rest.strip_suffix("```") {
        Some(body) => body.strip_suffix('\n').unwrap_or(body),
        None => rest,
    }
}

pub fn parse_analysis(text: &str) -> AppResult<Map<String, Value>> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AppError::MalformedAnalysis(format!("response is not valid JSON: {}", e)))?;

    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(AppError::MalformedAnalysis(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Guarantee `cultural_shifts` and `pattern_profile` exist, deriving them
/// from sibling sections when the model skipped them.
pub fn backfill(doc: &mut Map<String, Value>) -> Backfilled {
    let mut backfilled = Backfilled::default();

    if !doc.get("cultural_shifts").is_some_and(Value::is_object) {
        let shifts = fallback_cultural_shifts(doc);
        doc.insert("cultural_shifts".to_string(), to_json(&shifts));
        backfilled.cultural_shifts = true;
    }

    let has_profile = doc
        .get("pattern_profile")
        .and_then(Value::as_array)
        .is_some_and(|entries| !entries.is_empty());
    if !has_profile {
        let profile: Vec<PatternAttribute> = FALLBACK_PROFILE
            .iter()
            .map(|name| PatternAttribute {
                name: name.to_string(),
                score: FALLBACK_SCORE,
            })
            .collect();
        doc.insert("pattern_profile".to_string(), to_json(&profile));
        backfilled.pattern_profile = true;
    }

    backfilled
}

/// Parse the model's text and backfill required fields.
pub fn repair_analysis(text: &str) -> AppResult<RepairedAnalysis> {
    let mut doc = parse_analysis(text)?;
    let backfilled = backfill(&mut doc);
    Ok(RepairedAnalysis {
        document: Value::Object(doc),
        backfilled,
    })
}

fn fallback_cultural_shifts(doc: &Map<String, Value>) -> CulturalShifts {
    let summary = non_empty_str(doc, "contemporary_relevance", "summary")
        .or_else(|| non_empty_str(doc, "history_and_origins", "summary"))
        .unwrap_or_default();

    let revival_cycles = doc
        .get("history_and_origins")
        .and_then(|section| section.get("revival_moments"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let synthesis = non_empty_str(doc, "contemporary_relevance", "why_it_resonates_now").unwrap_or_default();

    CulturalShifts {
        summary,
        revival_cycles,
        synthesis,
    }
}

fn non_empty_str(doc: &Map<String, Value>, section: &str, field: &str) -> Option<String> {
    doc.get(section)
        .and_then(|s| s.get(field))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn to_json<T: Serialize>(value: &T) -> Value {
    // Plain structs of strings and numbers always serialize
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
        // Unterminated fence still loses its opener
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = parse_analysis("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, AppError::MalformedAnalysis(_)));
        assert!(err.to_string().contains("an array"));

        assert!(matches!(
            parse_analysis("The pattern is a Herati.").unwrap_err(),
            AppError::MalformedAnalysis(_)
        ));
    }

    #[test]
    fn test_complete_document_is_untouched() {
        let text = json!({
            "pattern_name": "Tartan",
            "cultural_shifts": {"summary": "s", "revival_cycles": ["Punk"], "synthesis": "x"},
            "pattern_profile": [{"name": "Rebellion", "score": 5}],
            "extra": {"kept": true}
        })
        .to_string();

        let repaired = repair_analysis(&text).unwrap();
        assert_eq!(repaired.backfilled, Backfilled::default());
        assert_eq!(repaired.pattern_name(), Some("Tartan"));
        assert_eq!(repaired.document["pattern_profile"][0]["name"], "Rebellion");
        assert_eq!(repaired.document["extra"]["kept"], true);
    }

    #[test]
    fn test_backfills_from_sibling_sections() {
        let text = json!({
            "pattern_name": "Paisley",
            "history_and_origins": {
                "summary": "Born in Persia.",
                "revival_moments": ["Victorian shawls", "1960s psychedelia"]
            },
            "contemporary_relevance": {
                "summary": "",
                "why_it_resonates_now": "It reads as eclectic."
            }
        })
        .to_string();

        let repaired = repair_analysis(&format!("```json\n{}\n```", text)).unwrap();
        assert!(repaired.backfilled.cultural_shifts);
        assert!(repaired.backfilled.pattern_profile);

        let shifts = &repaired.document["cultural_shifts"];
        // Empty contemporary summary falls through to the history summary
        assert_eq!(shifts["summary"], "Born in Persia.");
        assert_eq!(shifts["revival_cycles"], json!(["Victorian shawls", "1960s psychedelia"]));
        assert_eq!(shifts["synthesis"], "It reads as eclectic.");

        let profile = repaired.document["pattern_profile"].as_array().unwrap();
        assert_eq!(profile.len(), 5);
        assert!(profile.iter().all(|entry| entry["score"] == 3));
        assert_eq!(profile[0]["name"], "Heritage");
    }

    #[test]
    fn test_model_key_order_is_kept() {
        let text = r#"{"pattern_origin": "Kyoto", "pattern_name": "Seigaiha", "visual_analysis": {}}"#;

        let repaired = repair_analysis(text).unwrap();
        assert_eq!(
            repaired.keys(),
            vec!["pattern_origin", "pattern_name", "visual_analysis", "cultural_shifts", "pattern_profile"]
        );
    }

    #[test]
    fn test_backfill_with_nothing_to_borrow() {
        let repaired = repair_analysis("{}").unwrap();
        assert_eq!(
            repaired.document["cultural_shifts"],
            json!({"summary": "", "revival_cycles": [], "synthesis": ""})
        );
        assert_eq!(repaired.document["pattern_profile"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_empty_or_wrong_typed_fields_are_replaced() {
        let repaired = repair_analysis(r#"{"cultural_shifts": null, "pattern_profile": []}"#).unwrap();
        assert!(repaired.backfilled.cultural_shifts);
        assert!(repaired.backfilled.pattern_profile);

        let repaired = repair_analysis(r#"{"cultural_shifts": "text", "pattern_profile": {"a": 1}}"#).unwrap();
        assert!(repaired.document["cultural_shifts"].is_object());
        assert!(repaired.document["pattern_profile"].is_array());
    }
}
