use crate::error::{SoftoneError, SoftoneResult};
use serde_json::Value;

/// The single content type the gateway is contracted to answer with.
pub const GATEWAY_CONTENT_TYPE: &str = "application/json; charset=windows-1253";

/// A gateway response after normalization: declared content type verified,
/// body decoded from windows-1253 and parsed as JSON.
///
/// Only `status`, `content_type` and the presence of `data` are structural.
/// Everything inside `data` is service-specific payload (reqID, totalcount,
/// rows, id, ...) and is deliberately left untyped.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// HTTP status code of the response
    pub status: u16,
    /// Declared `Content-Type` header value
    pub content_type: String,
    /// Parsed response document
    pub data: Value,
}

impl GatewayResponse {
    /// Whether the HTTP status was 200
    pub fn is_http_ok(&self) -> bool {
        self.status == 200
    }

    /// The gateway's `success` flag, `false` when absent or not a boolean
    pub fn success(&self) -> bool {
        self.data["success"].as_bool().unwrap_or(false)
    }

    /// The session token issued by a login/authenticate call, if any
    pub fn client_id(&self) -> Option<&str> {
        self.data["clientID"].as_str()
    }

    /// The gateway-reported error text, if any
    pub fn error(&self) -> Option<&str> {
        self.data["error"].as_str()
    }

    /// Tenant objects returned by a bare login
    pub fn objs(&self) -> Option<&Vec<Value>> {
        self.data["objs"].as_array()
    }

    /// Arbitrary top-level field of the payload
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Normalize a raw gateway response.
///
/// The declared content type must equal [`GATEWAY_CONTENT_TYPE`] exactly;
/// anything else fails with [`SoftoneError::Protocol`] and the body is never
/// decoded. On a match the body bytes are decoded as windows-1253 and parsed
/// as a JSON document. Runs on every response, login and authenticate
/// included.
pub(crate) fn normalize(
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> SoftoneResult<GatewayResponse> {
    let found = content_type.unwrap_or("<none>");
    if found != GATEWAY_CONTENT_TYPE {
        return Err(SoftoneError::Protocol {
            found: found.to_string(),
            expected: GATEWAY_CONTENT_TYPE.to_string(),
        });
    }

    let (text, _, _) = encoding_rs::WINDOWS_1253.decode(body);
    let data: Value = serde_json::from_str(&text)?;

    Ok(GatewayResponse {
        status,
        content_type: found.to_string(),
        data,
    })
}
