/// Cross-window message protocol between the widget and its parent page
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WidgetError};

pub const MOUSE_MOVE: &str = "MOUSE_MOVE";
pub const CHANGE_SCENE: &str = "CHANGE_SCENE";
pub const IFRAME_INIT: &str = "IFRAME_INIT";
pub const WHEEL_IFRAME_READY: &str = "WHEEL_IFRAME_READY";
pub const APP_INITIALIZED: &str = "APP_INITIALIZED";

/// Parent → widget
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    MouseMove {
        #[serde(rename = "normalizedX")]
        normalized_x: f64,
        #[serde(rename = "normalizedY")]
        normalized_y: f64,
    },
    ChangeScene {
        url: String,
    },
}

/// Widget → parent. Sent without waiting for any acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    IframeInit {
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    WheelIframeReady {
        #[serde(rename = "modelName", skip_serializing_if = "Option::is_none")]
        model_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<f64>,
    },
    AppInitialized {
        status: String,
        scene: String,
    },
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IframeInit { .. } => IFRAME_INIT,
            Self::WheelIframeReady { .. } => WHEEL_IFRAME_READY,
            Self::AppInitialized { .. } => APP_INITIALIZED,
        }
    }
}

/// Decode a message received from the parent.
///
/// `Ok(None)` means the message is not addressed to us: not an object, no
/// string `type`, or a type we do not know. A known type with missing or
/// mistyped fields is an error.
pub fn decode_inbound(data: Value) -> Result<Option<InboundMessage>> {
    let known = match data.get("type").and_then(Value::as_str) {
        Some(kind) => kind == MOUSE_MOVE || kind == CHANGE_SCENE,
        None => false,
    };
    if !known {
        return Ok(None);
    }
    serde_json::from_value(data)
        .map(Some)
        .map_err(|e| WidgetError::MalformedMessage(e.to_string()))
}

/// Decode a message from its JSON text
pub fn decode_inbound_str(text: &str) -> Result<Option<InboundMessage>> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => decode_inbound(value),
        // Non-JSON payloads come from other scripts on the page
        Err(_) => Ok(None),
    }
}

pub fn encode_outbound(message: &OutboundMessage) -> Result<String> {
    serde_json::to_string(message).map_err(|e| WidgetError::Host(e.to_string()))
}
