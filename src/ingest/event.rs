use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// A `message` event as delivered by the Slack Events API.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessageEvent {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(MessageEvent),
    /// Any other inner event type, kept by name for logging.
    Other(String),
}

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    event: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct InnerKind {
    #[serde(rename = "type")]
    kind: String,
}

/// Parse one frame from the event bridge.
///
/// Accepts Socket Mode `events_api` envelopes and bare `event_callback`
/// bodies. Frames that carry no callback (`hello`, `disconnect`, ...) give
/// `Ok(None)`; JSON that does not have the expected shape is an error.
pub fn parse_envelope(line: &str) -> Result<Option<InboundEvent>> {
    let mut frame: Frame = serde_json::from_str(line).context("frame is not valid JSON")?;

    if frame.kind == "events_api" {
        let payload = frame.payload.take().context("events_api frame without payload")?;
        frame = serde_json::from_value(payload).context("events_api payload malformed")?;
    }
    if frame.kind != "event_callback" {
        return Ok(None);
    }

    let inner = frame.event.context("event_callback without event")?;
    let InnerKind { kind } =
        serde_json::from_value(inner.clone()).context("inner event has no type")?;
    if kind != "message" {
        return Ok(Some(InboundEvent::Other(kind)));
    }

    let message: MessageEvent =
        serde_json::from_value(inner).context("message event malformed")?;
    Ok(Some(InboundEvent::Message(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_socket_mode_envelope() {
        let line = r#"{"type":"events_api","envelope_id":"e1","payload":{"type":"event_callback","event":{"type":"message","user":"U1","channel":"C1","text":"hi","ts":"1700000000.000100","thread_ts":"1700000000.000001"}}}"#;
        let event = parse_envelope(line).unwrap().unwrap();
        assert_eq!(
            event,
            InboundEvent::Message(MessageEvent {
                subtype: None,
                user: "U1".into(),
                channel: "C1".into(),
                text: "hi".into(),
                ts: "1700000000.000100".into(),
                thread_ts: Some("1700000000.000001".into()),
            })
        );
    }

    #[test]
    fn parses_bare_callback_with_subtype() {
        let line = r#"{"type":"event_callback","event":{"type":"message","subtype":"message_changed","channel":"C1"}}"#;
        match parse_envelope(line).unwrap() {
            Some(InboundEvent::Message(m)) => {
                assert_eq!(m.subtype.as_deref(), Some("message_changed"));
                assert!(m.text.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn control_frames_and_other_events() {
        assert_eq!(parse_envelope(r#"{"type":"hello"}"#).unwrap(), None);
        assert_eq!(
            parse_envelope(r#"{"type":"event_callback","event":{"type":"reaction_added"}}"#)
                .unwrap(),
            Some(InboundEvent::Other("reaction_added".into()))
        );
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(parse_envelope("not json").is_err());
        assert!(parse_envelope(r#"{"type":"events_api"}"#).is_err());
        assert!(parse_envelope(r#"{"type":"event_callback","event":{"type":"message","text":5}}"#).is_err());
    }
}
