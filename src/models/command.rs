use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorKind {
    Unrecognized,
    ValidationError,
    CrmRejected,
    CrmUnavailable,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unrecognized => "Unrecognized",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::CrmRejected => "CrmRejected",
            ErrorKind::CrmUnavailable => "CrmUnavailable",
            ErrorKind::Timeout => "Timeout",
        }
    }
}

/// The only value handed back to the caller of the interpreter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl CommandResult {
    pub fn ok(lead_id: Option<String>, message: String) -> Self {
        Self {
            success: true,
            lead_id,
            message,
            error_kind: None,
        }
    }

    pub fn failed(error_kind: ErrorKind, message: String) -> Self {
        Self {
            success: false,
            lead_id: None,
            message,
            error_kind: Some(error_kind),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotRequest {
    pub transcript: String,
    #[serde(default)]
    pub metadata: Option<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_omits_error_kind() {
        let result = CommandResult::ok(Some("L1".to_string()), "done".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["leadId"], "L1");
        assert!(json.get("errorKind").is_none());
    }

    #[test]
    fn test_failure_omits_lead_id() {
        let result = CommandResult::failed(ErrorKind::CrmUnavailable, "later".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errorKind"], "CrmUnavailable");
        assert!(json.get("leadId").is_none());
    }
}
