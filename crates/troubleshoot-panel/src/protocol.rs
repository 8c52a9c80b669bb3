//! Wire protocol between the panel and its host.
//!
//! Both directions are JSON objects tagged by a `type` field:
//! - [`OutboundMessage`] - sent by the panel in response to user actions
//! - [`InboundMessage`] - sent by the host to drive the conversation
//!
//! Inbound decoding is a closed match on `type`. Anything outside the known
//! set is a [`ProtocolError`] and never reaches the renderer.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Value carried by a `resume` message.
///
/// Yes/no answers are booleans; hosts may also resume with free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptValue {
    Bool(bool),
    Text(String),
}

impl From<bool> for PromptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for PromptValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Message sent from the panel to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// The user submitted the initial prompt.
    Submit {
        #[serde(rename = "promptValue")]
        prompt_value: String,
    },
    /// The user answered a question; the host may resume its flow.
    Resume {
        #[serde(rename = "promptValue")]
        prompt_value: PromptValue,
    },
    /// The user asked the host to retry its last step.
    Retry,
    /// Acknowledges a host-initiated reset.
    Reset,
}

impl OutboundMessage {
    /// Create a submit message.
    pub fn submit(prompt: impl Into<String>) -> Self {
        Self::Submit {
            prompt_value: prompt.into(),
        }
    }

    /// Create a resume message.
    pub fn resume(value: impl Into<PromptValue>) -> Self {
        Self::Resume {
            prompt_value: value.into(),
        }
    }

    /// Encode as a single JSON line (no trailing newline).
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Json)
    }

    /// Wire tag of this message.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Resume { .. } => "resume",
            Self::Retry => "retry",
            Self::Reset => "reset",
        }
    }
}

/// Severity tag of a plain conversation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    User,
    Assistance,
    Error,
}

impl Severity {
    /// All known severities, in wire order.
    pub const ALL: [Severity; 4] = [
        Severity::Warning,
        Severity::User,
        Severity::Assistance,
        Severity::Error,
    ];

    /// Wire tag, also used as the turn's class name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::User => "user",
            Self::Assistance => "assistance",
            Self::Error => "error",
        }
    }

    /// Parse a wire tag. Returns `None` for anything else.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == tag)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of input the host is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    YesNo,
}

impl InputKind {
    /// Wire tag of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YesNo => "yesno",
        }
    }
}

/// Message sent from the host to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// A question to render with answer controls.
    Input { kind: InputKind, content: String },
    /// An incremental status line; stays "running" until superseded.
    Feedback { content: String },
    /// Clear the conversation and restore the initial input state.
    Reset,
    /// A plain conversation line styled by severity.
    Line { severity: Severity, content: String },
}

impl InboundMessage {
    /// Create a yes/no question.
    pub fn yes_no(content: impl Into<String>) -> Self {
        Self::Input {
            kind: InputKind::YesNo,
            content: content.into(),
        }
    }

    /// Create a feedback line.
    pub fn feedback(content: impl Into<String>) -> Self {
        Self::Feedback {
            content: content.into(),
        }
    }

    /// Create a severity-tagged line.
    pub fn line(severity: Severity, content: impl Into<String>) -> Self {
        Self::Line {
            severity,
            content: content.into(),
        }
    }

    /// Wire tag of this message.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Input { .. } => "input",
            Self::Feedback { .. } => "feedback",
            Self::Reset => "reset",
            Self::Line { severity, .. } => severity.as_str(),
        }
    }

    /// Decode a single JSON frame.
    pub fn from_json(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(raw).map_err(ProtocolError::Json)?;
        Self::from_value(&value)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;
        let tag = object
            .get("type")
            .ok_or(ProtocolError::MissingType)?
            .as_str()
            .ok_or(ProtocolError::MissingType)?;

        match tag {
            "input" => {
                let kind = object
                    .get("kind")
                    .and_then(Value::as_str)
                    .ok_or(ProtocolError::MissingField {
                        tag: "input",
                        field: "kind",
                    })?;
                if kind != InputKind::YesNo.as_str() {
                    return Err(ProtocolError::UnknownInputKind(kind.to_string()));
                }
                Ok(Self::Input {
                    kind: InputKind::YesNo,
                    content: content_field(object, "input")?,
                })
            }
            "feedback" => Ok(Self::Feedback {
                content: content_field(object, "feedback")?,
            }),
            "reset" => Ok(Self::Reset),
            other => match Severity::from_tag(other) {
                Some(severity) => Ok(Self::Line {
                    severity,
                    content: content_field(object, severity.as_str())?,
                }),
                None => Err(ProtocolError::UnknownType(other.to_string())),
            },
        }
    }

    /// Encode as a JSON value (used by host-side tooling and tests).
    pub fn to_value(&self) -> Value {
        match self {
            Self::Input { kind, content } => {
                json!({ "type": "input", "kind": kind.as_str(), "content": content })
            }
            Self::Feedback { content } => json!({ "type": "feedback", "content": content }),
            Self::Reset => json!({ "type": "reset" }),
            Self::Line { severity, content } => {
                json!({ "type": severity.as_str(), "content": content })
            }
        }
    }

    /// Encode as a single JSON line.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

fn content_field(
    object: &serde_json::Map<String, Value>,
    tag: &'static str,
) -> Result<String, ProtocolError> {
    object
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ProtocolError::MissingField {
            tag,
            field: "content",
        })
}

/// Errors raised while decoding or encoding protocol frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON, or could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[source] serde_json::Error),

    /// Frame is valid JSON but not an object.
    #[error("message is not a JSON object")]
    NotAnObject,

    /// Frame has no string `type` field.
    #[error("message has no `type` tag")]
    MissingType,

    /// Frame has a `type` outside the known set.
    #[error("unrecognized message type `{0}`")]
    UnknownType(String),

    /// `input` frame with a `kind` other than `yesno`.
    #[error("unrecognized input kind `{0}`")]
    UnknownInputKind(String),

    /// A required field is absent or has the wrong JSON type.
    #[error("`{tag}` message is missing string field `{field}`")]
    MissingField {
        tag: &'static str,
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_wire_shapes() {
        assert_eq!(
            OutboundMessage::submit("printer offline").to_json().unwrap(),
            r#"{"type":"submit","promptValue":"printer offline"}"#
        );
        assert_eq!(
            OutboundMessage::resume(true).to_json().unwrap(),
            r#"{"type":"resume","promptValue":true}"#
        );
        assert_eq!(
            OutboundMessage::resume("later".to_string()).to_json().unwrap(),
            r#"{"type":"resume","promptValue":"later"}"#
        );
        assert_eq!(
            OutboundMessage::Retry.to_json().unwrap(),
            r#"{"type":"retry"}"#
        );
        assert_eq!(
            OutboundMessage::Reset.to_json().unwrap(),
            r#"{"type":"reset"}"#
        );
    }

    #[test]
    fn test_outbound_decodes_bool_and_text_resume() {
        let yes: OutboundMessage =
            serde_json::from_str(r#"{"type":"resume","promptValue":false}"#).unwrap();
        assert_eq!(yes, OutboundMessage::resume(false));

        let text: OutboundMessage =
            serde_json::from_str(r#"{"type":"resume","promptValue":"no idea"}"#).unwrap();
        assert_eq!(text, OutboundMessage::resume("no idea".to_string()));
    }

    #[test]
    fn test_decode_known_inbound() {
        assert_eq!(
            InboundMessage::from_json(
                r#"{"type":"input","kind":"yesno","content":"Did that help?"}"#
            )
            .unwrap(),
            InboundMessage::yes_no("Did that help?")
        );
        assert_eq!(
            InboundMessage::from_json(r#"{"type":"feedback","content":"Checking logs..."}"#)
                .unwrap(),
            InboundMessage::feedback("Checking logs...")
        );
        assert_eq!(
            InboundMessage::from_json(r#"{"type":"reset"}"#).unwrap(),
            InboundMessage::Reset
        );
        for severity in Severity::ALL {
            let raw = format!(r#"{{"type":"{severity}","content":"<b>x</b>"}}"#);
            assert_eq!(
                InboundMessage::from_json(&raw).unwrap(),
                InboundMessage::line(severity, "<b>x</b>")
            );
        }
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let msg =
            InboundMessage::from_json(r#"{"type":"error","content":"boom","code":17}"#).unwrap();
        assert_eq!(msg, InboundMessage::line(Severity::Error, "boom"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = InboundMessage::from_json(r#"{"type":"banner","content":"hi"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(ref t) if t == "banner"));
    }

    #[test]
    fn test_malformed_frames_are_rejected() {
        assert!(matches!(
            InboundMessage::from_json("not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            InboundMessage::from_json("[1,2]"),
            Err(ProtocolError::NotAnObject)
        ));
        assert!(matches!(
            InboundMessage::from_json(r#"{"content":"x"}"#),
            Err(ProtocolError::MissingType)
        ));
        assert!(matches!(
            InboundMessage::from_json(r#"{"type":"input","kind":"choice","content":"x"}"#),
            Err(ProtocolError::UnknownInputKind(_))
        ));
        assert!(matches!(
            InboundMessage::from_json(r#"{"type":"feedback"}"#),
            Err(ProtocolError::MissingField {
                field: "content",
                ..
            })
        ));
        assert!(matches!(
            InboundMessage::from_json(r#"{"type":"warning","content":3}"#),
            Err(ProtocolError::MissingField { .. })
        ));
    }

    #[test]
    fn test_inbound_encoding_matches_decoder() {
        let messages = [
            InboundMessage::yes_no("Restart now?"),
            InboundMessage::feedback("Pinging gateway"),
            InboundMessage::Reset,
            InboundMessage::line(Severity::Warning, "Low disk"),
        ];
        for msg in messages {
            assert_eq!(InboundMessage::from_json(&msg.to_json()).unwrap(), msg);
        }
    }

    #[test]
    fn test_tags() {
        assert_eq!(InboundMessage::line(Severity::User, "x").tag(), "user");
        assert_eq!(InboundMessage::Reset.tag(), "reset");
        assert_eq!(OutboundMessage::Retry.tag(), "retry");
    }
}
