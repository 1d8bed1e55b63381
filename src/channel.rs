//! Demultiplexing of the single session transport.
//!
//! Inbound frames are either structured control messages or raw keystrokes;
//! the only discriminator is whether the frame parses as a JSON object.
//! Outbound, process output travels as binary frames and replies as text.

use axum::extract::ws::{CloseFrame, Message, close_code};
use bytes::Bytes;
use log::{debug, warn};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::protocol::{ClientMessage, ServerMessage};

#[derive(Debug)]
pub enum Inbound {
    Control(ClientMessage),
    Raw(Bytes),
    Unrecognized(ProtocolError),
}

/// Sorts one client frame into its logical stream.
pub fn classify(frame: Bytes) -> Inbound {
    let object = match serde_json::from_slice::<Value>(&frame) {
        Ok(Value::Object(object)) => object,
        _ => return Inbound::Raw(frame),
    };

    let tag = describe_tag(&object);
    match serde_json::from_value::<ClientMessage>(Value::Object(object)) {
        Ok(msg) => Inbound::Control(msg),
        Err(e) => {
            debug!("structured frame {} did not match a known kind: {}", tag, e);
            Inbound::Unrecognized(ProtocolError::Unrecognized(tag))
        }
    }
}

fn describe_tag(object: &serde_json::Map<String, Value>) -> String {
    let field = |name: &str| object.get(name).and_then(Value::as_str).unwrap_or("?");
    match object.get("action") {
        Some(_) => format!("{}.{}", field("type"), field("action")),
        None => field("type").to_string(),
    }
}

/// Everything the session worker may put on the wire.
#[derive(Debug)]
pub enum Outbound {
    Raw(Bytes),
    Reply(ServerMessage),
    Close,
}

impl Outbound {
    pub fn into_message(self) -> Option<Message> {
        match self {
            Outbound::Raw(data) => Some(Message::Binary(data.to_vec())),
            Outbound::Reply(reply) => match reply.to_json() {
                Ok(json) => Some(Message::Text(json)),
                Err(e) => {
                    warn!("Failed to encode reply: {}", e);
                    None
                }
            },
            Outbound::Close => Some(Message::Close(Some(CloseFrame {
                code: close_code::NORMAL,
                reason: "process exited".into(),
            }))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FileSystemRequest;

    #[test]
    fn keystrokes_are_raw() {
        match classify(Bytes::from_static(b"ls -la\r")) {
            Inbound::Raw(data) => assert_eq!(&data[..], b"ls -la\r"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn json_scalars_are_keystrokes() {
        for frame in ["1", "true", "\"q\"", "[1,2]"] {
            assert!(matches!(
                classify(Bytes::from(frame.to_string())),
                Inbound::Raw(_)
            ));
        }
    }

    #[test]
    fn broken_json_is_raw() {
        assert!(matches!(
            classify(Bytes::from_static(b"{\"type\": \"resize\"")),
            Inbound::Raw(_)
        ));
    }

    #[test]
    fn control_frame_is_parsed() {
        let frame = Bytes::from_static(br#"{"type":"file_system","action":"get_contents"}"#);
        match classify(frame) {
            Inbound::Control(ClientMessage::FileSystem(FileSystemRequest::GetContents)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_reported() {
        let frame = Bytes::from_static(br#"{"type":"file_system","action":"format_disk"}"#);
        match classify(frame) {
            Inbound::Unrecognized(ProtocolError::Unrecognized(tag)) => {
                assert_eq!(tag, "file_system.format_disk")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn replies_are_text_and_output_is_binary() {
        let msg = Outbound::Reply(ServerMessage::Error {
            message: "nope".into(),
        })
        .into_message();
        assert!(matches!(msg, Some(Message::Text(t)) if t.contains("\"type\":\"error\"")));

        let msg = Outbound::Raw(Bytes::from_static(b"\x1b[0m")).into_message();
        assert!(matches!(msg, Some(Message::Binary(b)) if b == b"\x1b[0m"));
    }
}
