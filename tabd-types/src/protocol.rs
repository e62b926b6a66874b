use crate::suggestion::Suggestion;
use serde::{Deserialize, Serialize};

/// Request kinds accepted by the daemon socket.
///
/// Unrecognized values deserialize to `Unknown` so a bad `type` produces an
/// error response on that line instead of tearing down the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Complete,
    Health,
    Shutdown,
    #[serde(other, skip_serializing)]
    Unknown,
}

/// Shell dialect the request originates from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    #[default]
    Zsh,
    Bash,
    Fish,
}

/// One request line on the socket. Everything except `type` is optional so
/// that control requests (`health`, `shutdown`) can be sent bare.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    #[serde(default)]
    pub command_line: String,
    #[serde(default)]
    pub cursor_position: usize,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub shell: Shell,
}

impl CompleteRequest {
    pub fn complete(
        command_line: impl Into<String>,
        cursor_position: usize,
        cwd: impl Into<String>,
        shell: Shell,
    ) -> Self {
        CompleteRequest {
            kind: RequestKind::Complete,
            command_line: command_line.into(),
            cursor_position,
            cwd: cwd.into(),
            shell,
        }
    }

    pub fn control(kind: RequestKind) -> Self {
        CompleteRequest {
            kind,
            command_line: String::new(),
            cursor_position: 0,
            cwd: String::new(),
            shell: Shell::default(),
        }
    }
}

/// One response line on the socket. Zero suggestions with `success: true`
/// is the normal "nothing matched" answer; `error` is reserved for protocol
/// and input-validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteResponse {
    pub success: bool,
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompleteResponse {
    pub fn ok(suggestions: Vec<Suggestion>) -> Self {
        CompleteResponse {
            success: true,
            suggestions,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        CompleteResponse {
            success: false,
            suggestions: Vec::new(),
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_request_roundtrip() {
        let json = r#"{"type":"complete","commandLine":"git c","cursorPosition":5,"cwd":"/tmp","shell":"zsh"}"#;
        let req: CompleteRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.kind, RequestKind::Complete);
        assert_eq!(req.command_line, "git c");
        assert_eq!(req.cursor_position, 5);
        assert_eq!(req.shell, Shell::Zsh);
    }

    #[test]
    fn test_bare_control_request() {
        let req: CompleteRequest = serde_json::from_str(r#"{"type":"shutdown"}"#).unwrap();
        assert_eq!(req.kind, RequestKind::Shutdown);
        assert_eq!(req.command_line, "");
        assert_eq!(req.shell, Shell::Zsh);
    }

    #[test]
    fn test_unknown_request_kind() {
        let req: CompleteRequest = serde_json::from_str(r#"{"type":"reload"}"#).unwrap();
        assert_eq!(req.kind, RequestKind::Unknown);
    }

    #[test]
    fn test_error_response_shape() {
        let resp = CompleteResponse::err("bad request");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"bad request\""));
        let ok = serde_json::to_string(&CompleteResponse::ok(Vec::new())).unwrap();
        assert!(!ok.contains("error"));
    }
}
