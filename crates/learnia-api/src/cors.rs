//! Origin policy: computes the CORS response headers from the configured
//! allowed origins and the request's `Origin` header. Pure functions of
//! configuration plus one header value; no tower layer is involved because
//! the fallback-to-first-configured-origin resolution cannot be expressed
//! by one.

use std::collections::BTreeMap;

const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type,Authorization,X-Requested-With,Accept,Origin,X-User-Id";
const WILDCARD: &str = "*";

/// Ordered set of normalized allowed origins; empty means wildcard.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// Build from a comma-separated origin list. Blank entries are dropped;
    /// an empty list allows every origin.
    pub fn from_list(raw: &str) -> Self {
        let allowed = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(normalize_origin)
            .collect();
        Self { allowed }
    }

    pub fn is_wildcard(&self) -> bool {
        self.allowed.is_empty()
    }

    /// A request without an Origin header is always allowed (non-browser
    /// clients).
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(o) => self.is_wildcard() || self.allowed.contains(&normalize_origin(o)),
        }
    }

    /// The `Access-Control-Allow-Origin` value: wildcard when configured so;
    /// else the normalized request origin when allowed; else the first
    /// configured origin.
    pub fn resolve(&self, origin: Option<&str>) -> String {
        if self.is_wildcard() {
            return WILDCARD.to_string();
        }
        if let Some(o) = origin {
            let normalized = normalize_origin(o);
            if self.allowed.contains(&normalized) {
                return normalized;
            }
        }
        self.allowed
            .first()
            .cloned()
            .unwrap_or_else(|| WILDCARD.to_string())
    }

    /// The full CORS header set for a request origin.
    pub fn headers(&self, origin: Option<&str>) -> BTreeMap<String, String> {
        let resolved = self.resolve(origin);
        let mut headers = BTreeMap::new();
        headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            ALLOW_METHODS.to_string(),
        );
        headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            ALLOW_HEADERS.to_string(),
        );
        let credentials = if resolved == WILDCARD { "false" } else { "true" };
        headers.insert(
            "Access-Control-Allow-Credentials".to_string(),
            credentials.to_string(),
        );
        if resolved != WILDCARD {
            headers.insert("Vary".to_string(), "Origin".to_string());
        }
        headers.insert("Access-Control-Allow-Origin".to_string(), resolved);
        headers
    }
}

/// Normalize an origin string: trim whitespace, default to `https://` when
/// no scheme is given, lower-case scheme and host, preserve an explicit
/// port, drop the trailing slash.
pub fn normalize_origin(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let (scheme, authority) = match trimmed.split_once("://") {
        Some((scheme, authority)) => (scheme.to_lowercase(), authority),
        None => ("https".to_string(), trimmed),
    };
    format!("{scheme}://{}", authority.to_lowercase())
}
