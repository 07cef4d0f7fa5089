//! Validation of raw generation backend output into an [`ArticleRecord`].

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{ArticleRecord, REQUIRED_FIELDS};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("generation response is not valid JSON: {0}")]
    Parse(String),
    #[error("generation response is missing required fields: {}", missing.join(", "))]
    MissingFields { missing: Vec<String> },
}

/// Parses backend output, tolerating markdown code fences around the JSON.
pub fn parse_article_response(raw: &str) -> Result<ArticleRecord, ResponseError> {
    let body = strip_code_fences(raw.trim());
    let value: Value =
        serde_json::from_str(body).map_err(|error| ResponseError::Parse(error.to_string()))?;

    let Value::Object(object) = value else {
        return Err(ResponseError::MissingFields {
            missing: REQUIRED_FIELDS.iter().map(|field| (*field).to_string()).collect(),
        });
    };

    let missing = REQUIRED_FIELDS
        .iter()
        .filter(|field| object.get(**field).map_or(true, Value::is_null))
        .map(|field| (*field).to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ResponseError::MissingFields { missing });
    }

    Ok(ArticleRecord {
        title: field_text(&object, "title"),
        slug: field_text(&object, "slug"),
        meta_description: field_text(&object, "meta_description"),
        keywords: field_text(&object, "keywords"),
        html_content: field_text(&object, "html_content"),
    })
}

/// Removes an optional leading ```` ``` ```` / ```` ```json ```` marker and an
/// optional trailing ```` ``` ```` marker.
fn strip_code_fences(text: &str) -> &str {
    let mut body = text;

    if let Some(rest) = body.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        body = rest.trim_start();
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest.trim_end();
    }

    body
}

// Values are used as-is: strings verbatim, anything else as its JSON text.
fn field_text(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
