//! Gowon message envelope: inbound decode and outbound encode.
//!
//! Inbound payloads are JSON objects with at least `msg` (string) and `dest`
//! (any value, `null` included). `dest` is routing data owned by the sender
//! and is echoed back unchanged; numbers keep their exact digits.

use serde::Serialize;
use serde_json::{Map, Value};

/// Why an inbound payload could not be turned into an [`InboundMessage`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("message couldn't be parsed as message json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message json is not an object")]
    NotAnObject,
    #[error("message body does not contain any message content")]
    MissingText,
    #[error("message field `{0}` must be a string")]
    NotAString(&'static str),
    #[error("message body does not contain a destination")]
    MissingDestination,
}

/// Decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub text: String,
    pub destination: Value,
    /// Sender nick, when the gateway supplies one.
    pub nick: Option<String>,
    /// Module that produced the message, when set.
    pub module: Option<String>,
}

impl InboundMessage {
    /// Decode a raw bus payload. `msg` and `dest` keys are required.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(raw)?;
        let Value::Object(mut fields) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let text = match fields.remove("msg") {
            None => return Err(DecodeError::MissingText),
            Some(Value::String(s)) => s,
            Some(_) => return Err(DecodeError::NotAString("msg")),
        };
        let destination = match fields.remove("dest") {
            None => return Err(DecodeError::MissingDestination),
            Some(v) => v,
        };

        Ok(Self {
            text,
            destination,
            nick: optional_string(&mut fields, "nick"),
            module: optional_string(&mut fields, "module"),
        })
    }
}

/// Informational fields are best-effort: non-string values are ignored.
fn optional_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Reply published on the output topic: `{ "module", "msg", "dest" }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub module: String,
    pub msg: String,
    pub dest: Value,
}

impl OutboundMessage {
    /// Reply to `inbound`, carrying its destination through untouched.
    pub fn reply_to(module: impl Into<String>, msg: impl Into<String>, inbound: &InboundMessage) -> Self {
        Self {
            module: module.into(),
            msg: msg.into(),
            dest: inbound.destination.clone(),
        }
    }

    /// JSON bytes for publishing.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_reads_msg_dest_and_extras() {
        let m = InboundMessage::decode(
            br##"{"module":"gowon","msg":"hi","nick":"alice","dest":"#chan","command":"","args":"hi"}"##,
        )
        .unwrap();
        assert_eq!(m.text, "hi");
        assert_eq!(m.destination, json!("#chan"));
        assert_eq!(m.nick.as_deref(), Some("alice"));
        assert_eq!(m.module.as_deref(), Some("gowon"));
    }

    #[test]
    fn decode_allows_empty_text() {
        let m = InboundMessage::decode(br#"{"msg":"","dest":"x"}"#).unwrap();
        assert_eq!(m.text, "");
    }

    #[test]
    fn decode_keeps_structured_destination() {
        let m = InboundMessage::decode(br#"{"msg":"a","dest":{"room":42,"thread":[1,2]}}"#).unwrap();
        assert_eq!(m.destination, json!({"room": 42, "thread": [1, 2]}));
        assert_eq!(m.module, None);
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = InboundMessage::decode(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
        let err = InboundMessage::decode(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn decode_rejects_non_objects() {
        let cases: [&[u8]; 4] = [br#"["hi","x"]"#, b"\"hi\"", b"42", b"null"];
        for raw in cases {
            let err = InboundMessage::decode(raw).unwrap_err();
            assert!(matches!(err, DecodeError::NotAnObject), "{:?}", err);
        }
    }

    #[test]
    fn decode_requires_msg_and_dest() {
        let err = InboundMessage::decode(br#"{"dest":"x"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingText));
        let err = InboundMessage::decode(br#"{"msg":"hi"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingDestination));
    }

    #[test]
    fn decode_forwards_null_destination() {
        let m = InboundMessage::decode(br#"{"msg":"no sana","dest":null}"#).unwrap();
        assert_eq!(m.destination, Value::Null);
        let out = OutboundMessage::reply_to("module2", "no life", &m);
        let payload = String::from_utf8(out.to_payload().unwrap()).unwrap();
        assert_eq!(payload, r#"{"module":"module2","msg":"no life","dest":null}"#);
    }

    #[test]
    fn outbound_keeps_exact_number_digits() {
        for dest in ["12345678901234567890123", "18446744073709551616"] {
            let raw = format!(r#"{{"msg":"a","dest":{}}}"#, dest);
            let inbound = InboundMessage::decode(raw.as_bytes()).unwrap();
            let out = OutboundMessage::reply_to("m", "r", &inbound);
            let payload = String::from_utf8(out.to_payload().unwrap()).unwrap();
            assert_eq!(payload, format!(r#"{{"module":"m","msg":"r","dest":{}}}"#, dest));
        }
    }

    #[test]
    fn decode_rejects_non_string_msg() {
        let err = InboundMessage::decode(br#"{"msg":5,"dest":"x"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::NotAString("msg")));
    }

    #[test]
    fn outbound_serializes_in_envelope_order() {
        let inbound = InboundMessage::decode(br#"{"msg":"no sana","dest":"userA"}"#).unwrap();
        let out = OutboundMessage::reply_to("module2", "no life", &inbound);
        let payload = String::from_utf8(out.to_payload().unwrap()).unwrap();
        assert_eq!(payload, r#"{"module":"module2","msg":"no life","dest":"userA"}"#);
    }

    #[test]
    fn outbound_preserves_destination_key_order() {
        let inbound = InboundMessage::decode(br#"{"msg":"a","dest":{"z":1,"a":{"y":2,"b":3}}}"#).unwrap();
        let out = OutboundMessage::reply_to("m", "r", &inbound);
        let payload = String::from_utf8(out.to_payload().unwrap()).unwrap();
        assert_eq!(payload, r#"{"module":"m","msg":"r","dest":{"z":1,"a":{"y":2,"b":3}}}"#);
    }
}
