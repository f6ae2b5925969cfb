use serde::Serialize;

use crate::player::{Outcome, SessionError};

/// JSON body shared by the REST routes and the event channel:
/// `{kind, detail?, message?, unit?}`.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
}

impl Reply {
    /// Reply carrying `detail` as JSON. A detail that cannot be represented
    /// is logged and left out.
    pub fn detail(kind: &'static str, detail: impl Serialize) -> Self {
        let detail = match serde_json::to_value(detail) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Dropping {} detail that is not valid JSON: {}", kind, e);
                None
            }
        };
        Self {
            kind,
            detail,
            message: None,
            unit: None,
        }
    }

    pub fn failure(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            detail: None,
            message: Some(message.into()),
            unit: None,
        }
    }

    pub fn disk(available: String) -> Self {
        Self {
            unit: Some("GB"),
            ..Self::detail("disk", available)
        }
    }
}

impl From<&Outcome> for Reply {
    fn from(outcome: &Outcome) -> Self {
        Self {
            kind: outcome.kind().as_str(),
            detail: outcome.detail().map(|d| serde_json::Value::String(d.to_string())),
            message: Some(outcome.message()),
            unit: None,
        }
    }
}

impl From<&SessionError> for Reply {
    fn from(error: &SessionError) -> Self {
        let kind = match error {
            SessionError::Catalog { .. } | SessionError::Process(_) => "filesystem_error",
            SessionError::Closed => "unavailable",
        };
        Self::failure(kind, error.to_string())
    }
}
