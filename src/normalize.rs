use serde_json::{Map, Value};

use crate::agent::AgentEnvelope;
use crate::research::{AcademicPaper, ResearchResponse, WebFinding};

/// Pull a `ResearchResponse` out of whatever the agent sent back.
///
/// The upstream agent is inconsistent about stringifying its result, so this
/// tries the nested result, then the result parsed as JSON, then the raw
/// response. Nothing here fails: anything unusable turns into empty fields.
pub fn normalize(envelope: &AgentEnvelope) -> ResearchResponse {
    let candidate = extract_candidate(envelope);
    coerce(&candidate)
}

fn extract_candidate(envelope: &AgentEnvelope) -> Value {
    let result = envelope
        .response
        .as_ref()
        .map(|r| r.result.clone())
        .unwrap_or(Value::Null);

    let text = match result.as_str() {
        Some(s) => s.to_string(),
        None => return result,
    };

    if let Ok(parsed) = serde_json::from_str::<Value>(&text) {
        return parsed;
    }

    tracing::debug!("[Normalize] result is not JSON, trying raw_response");

    if let Some(raw) = &envelope.raw_response {
        match serde_json::from_str::<Value>(raw) {
            Ok(raw_parsed) => {
                let nested = raw_parsed
                    .get("response")
                    .and_then(|r| r.get("result"))
                    .filter(|v| is_present(v))
                    .cloned();
                return nested.unwrap_or(raw_parsed);
            }
            Err(e) => tracing::debug!("[Normalize] raw_response is not JSON either: {}", e),
        }
    }

    result
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        _ => true,
    }
}

fn coerce(candidate: &Value) -> ResearchResponse {
    let obj = match candidate.as_object() {
        Some(obj) => obj,
        None => return ResearchResponse::default(),
    };

    ResearchResponse {
        summary: obj
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        web_findings: array_field(obj, "web_findings")
            .map(|items| items.iter().map(web_finding).collect())
            .unwrap_or_default(),
        academic_papers: array_field(obj, "academic_papers")
            .map(|items| items.iter().map(academic_paper).collect())
            .unwrap_or_default(),
        key_takeaways: array_field(obj, "key_takeaways")
            .map(|items| items.iter().filter_map(scalar_text).collect())
            .unwrap_or_default(),
    }
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    obj.get(key).and_then(Value::as_array)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(scalar_text)
}

fn web_finding(item: &Value) -> WebFinding {
    WebFinding {
        title: text(item, "title"),
        url: text(item, "url"),
        summary: text(item, "summary"),
        source_type: text(item, "source_type"),
    }
}

fn academic_paper(item: &Value) -> AcademicPaper {
    AcademicPaper {
        title: text(item, "title"),
        authors: text(item, "authors"),
        abstract_text: text(item, "abstract"),
        arxiv_id: text(item, "arxiv_id"),
        arxiv_url: text(item, "arxiv_url"),
        published_date: text(item, "published_date"),
        relevance_summary: text(item, "relevance_summary"),
    }
}
