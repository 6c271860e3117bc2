//! The transport request envelope and its normalizer accessors.
//!
//! The envelope mirrors the gateway event shape: the HTTP method may arrive
//! nested under `requestContext.http.method` or flat as `httpMethod`, the
//! path as `rawPath` or `path`, and the body may be base64-encoded. Optional
//! fields are explicit options, never empty-string sentinels.

use std::collections::HashMap;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use learnia_core::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpEvent {
    pub http_method: Option<String>,
    pub path: Option<String>,
    pub raw_path: Option<String>,
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
    pub request_context: Option<EventContext>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventContext {
    pub http: Option<HttpDescriptor>,
    pub authorizer: Option<Authorizer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpDescriptor {
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorizer {
    pub claims: Option<HashMap<String, Value>>,
}

impl HttpEvent {
    /// Upper-cased HTTP method: the nested context field wins, the flat
    /// field is the fallback, absent means empty.
    pub fn method(&self) -> String {
        self.request_context
            .as_ref()
            .and_then(|ctx| ctx.http.as_ref())
            .and_then(|http| http.method.clone())
            .filter(|m| !m.is_empty())
            .or_else(|| self.http_method.clone().filter(|m| !m.is_empty()))
            .unwrap_or_default()
            .to_uppercase()
    }

    /// Request path with a single trailing slash stripped, unless the path
    /// is exactly root.
    pub fn path(&self) -> String {
        let raw = self
            .raw_path
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| self.path.clone().filter(|p| !p.is_empty()))
            .unwrap_or_default();
        if raw == "/" {
            return raw;
        }
        match raw.strip_suffix('/') {
            Some(stripped) => stripped.to_string(),
            None => raw,
        }
    }

    /// One named query parameter parsed as an integer. Absent yields the
    /// caller's default; present but non-numeric is a 400.
    pub fn query_i64(&self, name: &str, default: i64) -> Result<i64> {
        let Some(value) = self
            .query_string_parameters
            .as_ref()
            .and_then(|params| params.get(name))
        else {
            return Ok(default);
        };
        value.trim().parse::<i64>().map_err(|_| {
            Error::InvalidParameter(format!("the '{name}' parameter must be numeric"))
        })
    }

    /// The JSON body. Absent and empty bodies yield `default` (an empty
    /// object when no default is given); base64-flagged bodies are decoded
    /// first; malformed content is a 400.
    pub fn json_body(&self, default: Option<Value>) -> Result<Value> {
        let fallback =
            || default.clone().unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        let Some(body) = self.body.as_deref().filter(|b| !b.is_empty()) else {
            return Ok(fallback());
        };

        let decoded = if self.is_base64_encoded {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(body.trim())
                .map_err(|e| Error::InvalidBody(format!("body is not valid base64: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|_| Error::InvalidBody("body is not valid UTF-8".to_string()))?
        } else {
            body.to_string()
        };

        serde_json::from_str(&decoded)
            .map_err(|_| Error::InvalidBody("request body must be valid JSON".to_string()))
    }

    /// Caller identity: the authorizer `sub` claim when present, else the
    /// `user-id` / `x-user-id` headers, case-insensitively.
    pub fn user_id(&self) -> Option<String> {
        self.request_context
            .as_ref()
            .and_then(|ctx| ctx.authorizer.as_ref())
            .and_then(|auth| auth.claims.as_ref())
            .and_then(|claims| claims.get("sub"))
            .and_then(|sub| sub.as_str())
            .map(str::to_string)
            .or_else(|| self.header("user-id").map(str::to_string))
            .or_else(|| self.header("x-user-id").map(str::to_string))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn origin(&self) -> Option<&str> {
        self.header("origin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_from(value: Value) -> HttpEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_method_prefers_nested_context() {
        let event = event_from(json!({
            "httpMethod": "get",
            "requestContext": {"http": {"method": "post"}}
        }));
        assert_eq!(event.method(), "POST");
    }

    #[test]
    fn test_method_falls_back_to_flat_field() {
        let event = event_from(json!({"httpMethod": "delete"}));
        assert_eq!(event.method(), "DELETE");
        assert_eq!(HttpEvent::default().method(), "");
    }

    #[test]
    fn test_path_strips_one_trailing_slash() {
        let event = event_from(json!({"rawPath": "/api/search/"}));
        assert_eq!(event.path(), "/api/search");

        let root = event_from(json!({"rawPath": "/"}));
        assert_eq!(root.path(), "/");
    }

    #[test]
    fn test_path_prefers_raw_path() {
        let event = event_from(json!({"rawPath": "/a", "path": "/b"}));
        assert_eq!(event.path(), "/a");
        let event = event_from(json!({"path": "/b"}));
        assert_eq!(event.path(), "/b");
    }

    #[test]
    fn test_query_i64_default_and_parse() {
        let event = event_from(json!({"queryStringParameters": {"limit": "25"}}));
        assert_eq!(event.query_i64("limit", 12).unwrap(), 25);
        assert_eq!(event.query_i64("offset", 7).unwrap(), 7);
    }

    #[test]
    fn test_query_i64_rejects_non_numeric() {
        let event = event_from(json!({"queryStringParameters": {"limit": "many"}}));
        let err = event.query_i64("limit", 12).unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.public_message().contains("limit"));
    }

    #[test]
    fn test_json_body_defaults_to_empty_object() {
        assert_eq!(
            HttpEvent::default().json_body(None).unwrap(),
            json!({})
        );
        let event = event_from(json!({"body": ""}));
        assert_eq!(event.json_body(Some(json!({"a": 1}))).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_json_body_decodes_base64() {
        // {"query": "rust"}
        let event = event_from(json!({
            "body": "eyJxdWVyeSI6ICJydXN0In0=",
            "isBase64Encoded": true
        }));
        assert_eq!(event.json_body(None).unwrap(), json!({"query": "rust"}));
    }

    #[test]
    fn test_json_body_rejects_malformed_base64() {
        let event = event_from(json!({"body": "%%%", "isBase64Encoded": true}));
        assert_eq!(event.json_body(None).unwrap_err().status(), 400);
    }

    #[test]
    fn test_json_body_rejects_malformed_json() {
        let event = event_from(json!({"body": "{not json"}));
        assert_eq!(event.json_body(None).unwrap_err().status(), 400);
    }

    #[test]
    fn test_user_id_prefers_claims_over_headers() {
        let event = event_from(json!({
            "headers": {"x-user-id": "header-user"},
            "requestContext": {"authorizer": {"claims": {"sub": "claim-user"}}}
        }));
        assert_eq!(event.user_id().as_deref(), Some("claim-user"));
    }

    #[test]
    fn test_user_id_header_lookup_is_case_insensitive() {
        let event = event_from(json!({"headers": {"X-User-Id": "u42"}}));
        assert_eq!(event.user_id().as_deref(), Some("u42"));
        let event = event_from(json!({"headers": {"User-Id": "u43"}}));
        assert_eq!(event.user_id().as_deref(), Some("u43"));
        assert_eq!(HttpEvent::default().user_id(), None);
    }
}
