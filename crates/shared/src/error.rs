use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Error payload the backend attaches to failed responses. FastAPI style
/// errors use `detail`, handler-level failures use `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "detail_text"
    )]
    pub detail: Option<String>,
}

impl ApiErrorBody {
    /// `detail`, then `message`, then the generic fallback.
    pub fn reason(&self) -> &str {
        non_empty(self.detail.as_deref())
            .or_else(|| non_empty(self.message.as_deref()))
            .unwrap_or(UNKNOWN_ERROR)
    }
}

/// Reason for an error response whose body may be missing or unparseable.
pub fn failure_reason(body: Option<&ApiErrorBody>) -> &str {
    body.map(ApiErrorBody::reason).unwrap_or(UNKNOWN_ERROR)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Accepts `detail` as a string or as any other JSON value. Validation
/// errors arrive as a list of `{loc, msg, type}` objects; their `msg` texts
/// are joined, anything else keeps its JSON form.
pub(crate) fn detail_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Option<Vec<&str>>>()
                .filter(|messages| !messages.is_empty())
                .map(|messages| messages.join("; "));
            Some(joined.unwrap_or_else(|| Value::Array(items).to_string()))
        }
        Some(other) => Some(other.to_string()),
    };
    Ok(text)
}
