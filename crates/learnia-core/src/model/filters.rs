use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::course::Course;

/// Optional post-retrieval search filters. Absent fields never exclude a
/// course, and a course missing the filtered field is never excluded either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub level: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    /// Inclusive upper price bound. Accepts numbers and numeric strings;
    /// anything else is ignored rather than rejected.
    #[serde(deserialize_with = "lenient_f64")]
    pub max_price: Option<f64>,
}

impl SearchFilters {
    pub fn matches(&self, course: &Course) -> bool {
        if excludes(self.level.as_deref(), course.level.as_deref()) {
            return false;
        }
        if excludes(self.category.as_deref(), course.category.as_deref()) {
            return false;
        }
        if excludes(self.language.as_deref(), course.language.as_deref()) {
            return false;
        }
        if let Some(max_price) = self.max_price {
            // A course without a price is treated as free.
            if course.price.unwrap_or(0.0) > max_price {
                return false;
            }
        }
        true
    }
}

/// A filter excludes a course only when both sides are non-empty and differ
/// case-insensitively.
fn excludes(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (wanted, actual) {
        (Some(w), Some(a)) if !w.is_empty() && !a.is_empty() => {
            w.to_lowercase() != a.to_lowercase()
        }
        _ => false,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}
