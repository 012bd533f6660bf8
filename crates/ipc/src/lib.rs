//! IPC message protocol for the configurator
//!
//! Defines all message types exchanged between the configurator core and the
//! UI layer. Messages are JSON with a `type`/`data` envelope.

mod error;
mod messages;
mod types;

pub use error::IpcError;
pub use messages::{CoreToUi, UiToCore};
pub use types::*;

/// Serialize a core message for the UI.
pub fn encode_core_message(msg: &CoreToUi) -> Result<String, IpcError> {
    Ok(serde_json::to_string(msg)?)
}

/// Parse a message sent by the UI.
pub fn decode_ui_message(json: &str) -> Result<UiToCore, IpcError> {
    serde_json::from_str(json).map_err(|e| IpcError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_message_envelope() {
        let msg = decode_ui_message(
            r##"{"type":"ApplyColor","data":{"target":{"slot":"body"},"color":"#ff0000"}}"##,
        )
        .unwrap();

        match msg {
            UiToCore::ApplyColor { target, color } => {
                assert_eq!(target.slot.as_deref(), Some("body"));
                assert!(target.fragment.is_none());
                assert!(!target.whole_surface);
                assert_eq!(color, "#ff0000");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_core_message_envelope() {
        let json = encode_core_message(&CoreToUi::AssetReady(AssetInfo {
            generation: 3,
            reference: "blob:abc".into(),
            missing_resources: vec!["wheel.png".into()],
        }))
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "AssetReady");
        assert_eq!(value["data"]["generation"], 3);
        assert_eq!(value["data"]["missing_resources"][0], "wheel.png");
    }

    #[test]
    fn test_malformed_ui_message() {
        let err = decode_ui_message(r#"{"type":"Nope"}"#).unwrap_err();
        assert!(matches!(err, IpcError::Decode(_)));
    }
}
