/// `postMessage` plumbing between the iframe and its parent
use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, Window};
use wheelframe_core::error::Result;
use wheelframe_core::protocol::{self, InboundMessage, OutboundMessage};

/// Decode the payload of a `message` event. Any sender is accepted.
pub fn read_message(event: &MessageEvent) -> Result<Option<InboundMessage>> {
    let data = event.data();
    if !data.is_object() {
        return Ok(None);
    }
    let Some(text) = js_sys::JSON::stringify(&data).ok().and_then(|s| s.as_string()) else {
        return Ok(None);
    };
    protocol::decode_inbound_str(&text)
}

/// Post to the embedding page, or to ourselves when not framed
pub fn post_to_parent(window: &Window, message: &OutboundMessage, origin: &str) -> std::result::Result<(), JsValue> {
    let text = protocol::encode_outbound(message).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let payload = js_sys::JSON::parse(&text)?;
    let target = window.parent()?.unwrap_or_else(|| window.clone());
    target.post_message(&payload, origin)?;
    log::debug!("posted {}", message.kind());
    Ok(())
}
