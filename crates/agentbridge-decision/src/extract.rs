use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Top-level keys that mark a JSON object as a plausible decision response,
/// used by strategy 4's balanced-brace scan to pick the right candidate out
/// of several balanced `{...}` spans in the same piece of text.
const EXPECTED_KEYS: [&str; 3] = ["selected_actions", "observations", "potential_actions"];

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());
static OBSERVATIONS_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"observations"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());
static REASONING_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"reasoning"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());
static SELECTED_ACTIONS_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"selected_actions"\s*:\s*(\[.*?\])"#).unwrap());

/// Robust JSON extraction from a raw LLM response (spec §4.7/§8). Tries, in
/// order: direct parse, fenced code block, brace-repair, balanced-brace
/// scan keyed on `EXPECTED_KEYS`, marker-based fallback, and a last-resort
/// regex reconstruction of `observations`/`selected_actions`/`reasoning`.
/// Returns `None` only if every strategy fails, matching
/// `_extract_json_from_response`'s exhaustion behavior.
pub fn extract_json(response: &str) -> Option<Value> {
    let trimmed = response.trim();

    // Strategy 1: pure JSON.
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
            return Some(v);
        }
    }

    // Strategy 2: fenced code blocks.
    for caps in FENCED_BLOCK.captures_iter(response) {
        if let Some(block) = caps.get(1) {
            if let Ok(v) = serde_json::from_str::<Value>(block.as_str().trim()) {
                return Some(v);
            }
        }
    }

    // Strategy 3: brace repair (missing opening/closing braces).
    let mut repaired = trimmed.to_string();
    if !repaired.starts_with('{')
        && (repaired.contains("observations") || repaired.contains("selected_actions"))
    {
        repaired = format!("{{{repaired}");
    }
    if repaired.starts_with('{') && !repaired.ends_with('}') {
        let open = repaired.matches('{').count();
        let close = repaired.matches('}').count();
        if open > close {
            repaired.push_str(&"}".repeat(open - close));
        }
    }
    if repaired != trimmed {
        if let Ok(v) = serde_json::from_str::<Value>(&repaired) {
            return Some(v);
        }
    }

    // Strategy 4: balanced-brace scan, keeping the largest candidate whose
    // top-level keys include one of EXPECTED_KEYS.
    if let Some(v) = find_largest_balanced_object(response) {
        return Some(v);
    }

    // Strategy 5: marker-based fallback (fenced json, fenced bare, bare braces).
    for pattern in [r"(?s)```json\s*(.*?)\s*```", r"(?s)```\s*(.*?)\s*```", r"(?s)(\{.*?\})"] {
        let re = Regex::new(pattern).ok()?;
        for caps in re.captures_iter(response) {
            if let Some(m) = caps.get(1) {
                let candidate = m.as_str().trim();
                if candidate.starts_with('{') && candidate.ends_with('}') {
                    if let Ok(v) = serde_json::from_str::<Value>(candidate) {
                        return Some(v);
                    }
                }
            }
        }
    }

    // Strategy 6: last-resort regex reconstruction.
    if EXPECTED_KEYS.iter().any(|k| response.contains(k)) {
        warn!("decision response: attempting last-resort JSON reconstruction");
        return Some(reconstruct(response));
    }

    debug!(preview = %response.chars().take(200).collect::<String>(), "decision response: no JSON could be extracted");
    None
}

fn find_largest_balanced_object(text: &str) -> Option<Value> {
    let bytes: Vec<char> = text.chars().collect();
    let mut candidates: Vec<(usize, Value)> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '{' {
            let start = i;
            let mut depth = 1;
            let mut j = i + 1;
            while j < bytes.len() && depth > 0 {
                match bytes[j] {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
                j += 1;
            }
            if depth == 0 {
                let candidate: String = bytes[start..j].iter().collect();
                if let Ok(parsed) = serde_json::from_str::<Value>(&candidate) {
                    if parsed.is_object()
                        && EXPECTED_KEYS.iter().any(|k| parsed.get(k).is_some())
                    {
                        candidates.push((candidate.len(), parsed));
                    }
                }
            }
        }
        i += 1;
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates.into_iter().next().map(|(_, v)| v)
}

fn reconstruct(response: &str) -> Value {
    let mut obj = serde_json::Map::new();
    if let Some(caps) = OBSERVATIONS_FIELD.captures(response) {
        obj.insert(
            "observations".to_string(),
            Value::String(caps[1].to_string()),
        );
    }
    if let Some(caps) = SELECTED_ACTIONS_FIELD.captures(response) {
        let actions = serde_json::from_str::<Value>(&caps[1]).unwrap_or(Value::Array(Vec::new()));
        obj.insert("selected_actions".to_string(), actions);
    } else {
        obj.insert("selected_actions".to_string(), Value::Array(Vec::new()));
    }
    if let Some(caps) = REASONING_FIELD.captures(response) {
        obj.insert("reasoning".to_string(), Value::String(caps[1].to_string()));
    } else {
        obj.insert(
            "reasoning".to_string(),
            Value::String("Unable to extract reasoning from malformed response".to_string()),
        );
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pure_json() {
        let v = extract_json(r#"{"observations":"hi","selected_actions":[],"reasoning":"ok"}"#)
            .unwrap();
        assert_eq!(v["observations"], "hi");
    }

    #[test]
    fn parses_fenced_code_block() {
        let text = "Here you go:\n```json\n{\"observations\":\"x\",\"selected_actions\":[]}\n```\nThanks.";
        let v = extract_json(text).unwrap();
        assert_eq!(v["observations"], "x");
    }

    #[test]
    fn repairs_missing_closing_brace() {
        let text = r#"{"observations":"x","selected_actions":[]"#;
        let v = extract_json(text).unwrap();
        assert_eq!(v["observations"], "x");
    }

    #[test]
    fn scans_balanced_braces_amid_prose() {
        let text = "Sure, I think {\"not\": \"this one\"} but here: {\"observations\":\"y\",\"selected_actions\":[],\"extra\":{\"nested\":1}} is the real one.";
        let v = extract_json(text).unwrap();
        assert_eq!(v["observations"], "y");
    }

    #[test]
    fn reconstructs_from_fragments_as_last_resort() {
        let text = r#"observations": "partial", selected_actions broken here, "reasoning": "because""#;
        let v = extract_json(text).unwrap();
        assert_eq!(v["reasoning"], "because");
        assert_eq!(v["selected_actions"], Value::Array(Vec::new()));
    }

    #[test]
    fn gives_up_on_unrelated_text() {
        assert!(extract_json("I have nothing useful to say.").is_none());
    }
}
