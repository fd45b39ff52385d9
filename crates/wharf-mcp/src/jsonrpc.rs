//! JSON-RPC 2.0 types for MCP communication.

use serde::{Deserialize, Serialize};

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request.
    pub fn new(id: u64, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC notification.
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response, correlated by `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub id: u64,
    pub result: Option<serde_json::Value>,
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// A request initiated by the server. Not supported; logged and dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcServerRequest {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// A notification sent by the server (fire-and-forget from its side).
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcServerNotification {
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// Any message a server may emit on stdout, classified at the parse boundary.
///
/// Variant order matters for untagged deserialization: a server request
/// carries both `id` and `method`, a response carries `id`, a notification
/// carries only `method`. Anything that fits none of these is rejected by the
/// parser and dropped by the reader.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcIncoming {
    Request(JsonRpcServerRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcServerNotification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_request_with_params() {
        let req = JsonRpcRequest::new(
            1,
            "tools/call",
            Some(serde_json::json!({"name": "read", "arguments": {}})),
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 1);
        assert_eq!(json["method"], "tools/call");
        assert!(json["params"].is_object());
    }

    #[test]
    fn serialize_request_without_params() {
        let req = JsonRpcRequest::new(2, "tools/list", None);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["method"], "tools/list");
        assert!(json.get("params").is_none());
    }

    #[test]
    fn serialize_notification() {
        let notif =
            JsonRpcNotification::new("notifications/initialized", Some(serde_json::json!({})));
        let json = serde_json::to_value(&notif).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "notifications/initialized");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn serialize_notification_without_params() {
        let notif = JsonRpcNotification::new("notifications/initialized", None);
        let json = serde_json::to_value(&notif).unwrap();
        assert!(json.get("params").is_none());
    }

    #[test]
    fn deserialize_response_with_result() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#;
        let resp: JsonRpcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id, 1);
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn deserialize_response_with_error() {
        let json =
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#;
        let resp: JsonRpcResponse = serde_json::from_str(json).unwrap();
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
        assert!(err.data.is_none());
    }

    #[test]
    fn incoming_classifies_response() {
        let json = r#"{"jsonrpc":"2.0","id":7,"result":{"ok":true}}"#;
        let msg: JsonRpcIncoming = serde_json::from_str(json).unwrap();
        match msg {
            JsonRpcIncoming::Response(resp) => {
                assert_eq!(resp.id, 7);
                assert_eq!(resp.result.unwrap()["ok"], true);
            }
            other => panic!("Expected Response, got: {other:?}"),
        }
    }

    #[test]
    fn incoming_classifies_error_response() {
        let json = r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32000,"message":"boom"}}"#;
        let msg: JsonRpcIncoming = serde_json::from_str(json).unwrap();
        match msg {
            JsonRpcIncoming::Response(resp) => {
                assert_eq!(resp.id, 3);
                assert_eq!(resp.error.unwrap().message, "boom");
            }
            other => panic!("Expected Response, got: {other:?}"),
        }
    }

    #[test]
    fn incoming_classifies_notification() {
        let json = r#"{"jsonrpc":"2.0","method":"notifications/progress","params":{"p":50}}"#;
        let msg: JsonRpcIncoming = serde_json::from_str(json).unwrap();
        match msg {
            JsonRpcIncoming::Notification(note) => {
                assert_eq!(note.method, "notifications/progress");
            }
            other => panic!("Expected Notification, got: {other:?}"),
        }
    }

    #[test]
    fn incoming_classifies_server_request() {
        let json = r#"{"jsonrpc":"2.0","id":9,"method":"sampling/createMessage","params":{}}"#;
        let msg: JsonRpcIncoming = serde_json::from_str(json).unwrap();
        match msg {
            JsonRpcIncoming::Request(req) => {
                assert_eq!(req.id, 9);
                assert_eq!(req.method, "sampling/createMessage");
            }
            other => panic!("Expected Request, got: {other:?}"),
        }
    }

    #[test]
    fn incoming_rejects_unrecognized_shape() {
        let json = r#"{"jsonrpc":"2.0","something":"else"}"#;
        assert!(serde_json::from_str::<JsonRpcIncoming>(json).is_err());
    }
}
