//! The transport response envelope.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Status code, header map, and a UTF-8 JSON string body. Serialization
/// goes through `serde_json`'s `Display`, which leaves non-ASCII characters
/// unescaped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// JSON response with the CORS headers merged in.
    pub fn json(status_code: u16, body: &Value, cors: &BTreeMap<String, String>) -> Self {
        let mut headers = cors.clone();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    /// Preflight short-circuit: 204 with an empty-string body and CORS
    /// headers only.
    pub fn no_content(cors: &BTreeMap<String, String>) -> Self {
        Self {
            status_code: 204,
            headers: cors.clone(),
            body: String::new(),
        }
    }
}
