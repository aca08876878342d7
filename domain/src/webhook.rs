//! Video-provider webhook authenticity and payload normalization.
//!
//! The provider has shipped several historical payload shapes for the same
//! events. Rather than scattering optional chaining through handler code,
//! each field is extracted by an ordered table of named strategies; the
//! first strategy that matches wins and missing fields default to absent.

use hmac::{Hmac, Mac};
use log::*;
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies an HMAC-SHA256 webhook signature over the raw request body.
///
/// The comparison runs in constant time via `Mac::verify_slice`. Any
/// malformed signature (bad hex, wrong length) is simply a failed
/// verification, never an error.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let provided = match hex::decode(signature.trim().trim_start_matches("sha256=")) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);

    mac.verify_slice(&provided).is_ok()
}

/// Computes the hex signature for a body. Test and tooling helper.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Recording metadata delivered with a recording-ready event
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    pub url: String,
    pub format: Option<String>,
    pub size_bytes: Option<i64>,
    pub duration_seconds: Option<i64>,
}

/// A provider event reduced to the fields the core consumes
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    CallStarted {
        call_id: String,
    },
    CallEnded {
        call_id: String,
        duration_seconds: Option<i32>,
        participants_count: Option<i32>,
    },
    TranscriptionReady {
        call_id: String,
        transcript_url: Option<String>,
    },
    RecordingReady {
        call_id: String,
        recording: RecordingInfo,
    },
    /// Anything the core does not act on: unrecognized types, call events
    /// with no extractable call ID, recording events with no URL.
    Ignored {
        event_type: String,
    },
}

type Strategy<T> = fn(&Value) -> Option<T>;

/// Call ID extraction strategies, in the order the provider shipped them:
/// a nested `call.id` object, then the compound `call_cid` `"type:id"` form.
const CALL_ID_STRATEGIES: &[(&str, Strategy<String>)] = &[
    ("call.id", call_id_from_call_object),
    ("call_cid", call_id_from_call_cid),
];

const DURATION_STRATEGIES: &[(&str, Strategy<i32>)] = &[
    ("call.session.duration_seconds", duration_from_session),
    ("duration", duration_from_top_level),
    ("duration_seconds", duration_from_top_level_seconds),
];

const PARTICIPANTS_STRATEGIES: &[(&str, Strategy<i32>)] = &[
    ("call.session.participants", participants_from_session),
    ("call.participants", participants_from_call),
    ("participants_count", participants_from_count),
];

fn call_id_from_call_object(event: &Value) -> Option<String> {
    event
        .get("call")?
        .get("id")?
        .as_str()
        .map(|id| id.to_string())
}

fn call_id_from_call_cid(event: &Value) -> Option<String> {
    let cid = event.get("call_cid")?.as_str()?;
    let mut parts = cid.splitn(2, ':');
    let first = parts.next()?;
    Some(parts.next().unwrap_or(first).to_string())
}

fn duration_from_session(event: &Value) -> Option<i32> {
    as_i32(event.get("call")?.get("session")?.get("duration_seconds")?)
}

fn duration_from_top_level(event: &Value) -> Option<i32> {
    as_i32(event.get("duration")?)
}

fn duration_from_top_level_seconds(event: &Value) -> Option<i32> {
    as_i32(event.get("duration_seconds")?)
}

fn participants_from_session(event: &Value) -> Option<i32> {
    let participants = event.get("call")?.get("session")?.get("participants")?;
    participants.as_array().map(|list| list.len() as i32)
}

fn participants_from_call(event: &Value) -> Option<i32> {
    let participants = event.get("call")?.get("participants")?;
    participants.as_array().map(|list| list.len() as i32)
}

fn participants_from_count(event: &Value) -> Option<i32> {
    as_i32(event.get("participants_count")?)
}

fn as_i32(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|n| i32::try_from(n).ok())
}

fn first_match<T>(event: &Value, strategies: &[(&str, Strategy<T>)]) -> Option<T> {
    strategies
        .iter()
        .find_map(|(_name, strategy)| strategy(event))
}

/// Extracts the call ID from any of the known payload shapes.
pub fn extract_call_id(event: &Value) -> Option<String> {
    first_match(event, CALL_ID_STRATEGIES)
}

fn extract_transcript_url(event: &Value) -> Option<String> {
    event
        .get("transcription")?
        .get("url")?
        .as_str()
        .map(|url| url.to_string())
}

fn extract_recording(event: &Value) -> Option<RecordingInfo> {
    let recording = event.get("recording")?;
    let url = recording.get("url")?.as_str()?.to_string();

    Some(RecordingInfo {
        url,
        format: recording
            .get("format")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        size_bytes: recording.get("size").and_then(Value::as_i64),
        duration_seconds: recording.get("duration").and_then(Value::as_i64),
    })
}

/// Reduces a parsed provider payload to a normalized event.
///
/// Never fails: events the core cannot act on come back as `Ignored` so the
/// webhook endpoint can acknowledge them.
pub fn normalize(event: &Value) -> WebhookEvent {
    let event_type = event
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let ignored = |event_type: String| WebhookEvent::Ignored { event_type };

    match event_type.as_str() {
        "call.session_started" | "call.started" => match extract_call_id(event) {
            Some(call_id) => WebhookEvent::CallStarted { call_id },
            None => {
                warn!("call started event carried no call ID");
                ignored(event_type)
            }
        },
        "call.session_ended" | "call.ended" => match extract_call_id(event) {
            Some(call_id) => WebhookEvent::CallEnded {
                call_id,
                duration_seconds: first_match(event, DURATION_STRATEGIES),
                participants_count: first_match(event, PARTICIPANTS_STRATEGIES),
            },
            None => {
                warn!("call ended event carried no call ID");
                ignored(event_type)
            }
        },
        "call.transcription_ready" => match extract_call_id(event) {
            Some(call_id) => WebhookEvent::TranscriptionReady {
                call_id,
                transcript_url: extract_transcript_url(event),
            },
            None => {
                warn!("transcription ready event carried no call ID");
                ignored(event_type)
            }
        },
        "call.recording_ready" => match (extract_call_id(event), extract_recording(event)) {
            (Some(call_id), Some(recording)) => WebhookEvent::RecordingReady { call_id, recording },
            _ => {
                // A recording event without a URL is a no-op by contract.
                debug!("recording ready event had no call ID or recording URL");
                ignored(event_type)
            }
        },
        _ => {
            debug!("Ignoring unhandled webhook event type: {event_type}");
            ignored(event_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_signature_verifies() {
        let secret = "test_secret";
        let body = b"test payload";
        let signature = sign_body(secret, body);

        assert!(verify_signature(secret, body, &signature));
    }

    #[test]
    fn signature_over_a_different_body_is_rejected() {
        let secret = "test_secret";
        let signature = sign_body(secret, b"body A");

        assert!(!verify_signature(secret, b"body B", &signature));
    }

    #[test]
    fn malformed_signature_is_rejected_not_an_error() {
        assert!(!verify_signature("secret", b"body", "not-hex"));
        assert!(!verify_signature("secret", b"body", ""));
    }

    #[test]
    fn sha256_prefixed_signatures_are_accepted() {
        let secret = "test_secret";
        let body = b"test payload";
        let signature = format!("sha256={}", sign_body(secret, body));

        assert!(verify_signature(secret, body, &signature));
    }

    #[test]
    fn call_id_extracted_from_nested_call_object() {
        let event = json!({"call": {"id": "abc123"}});
        assert_eq!(extract_call_id(&event), Some("abc123".to_string()));
    }

    #[test]
    fn call_id_extracted_from_compound_cid() {
        let event = json!({"call_cid": "default:abc123"});
        assert_eq!(extract_call_id(&event), Some("abc123".to_string()));

        // A cid with no separator falls back to the whole string
        let bare = json!({"call_cid": "abc123"});
        assert_eq!(extract_call_id(&bare), Some("abc123".to_string()));
    }

    #[test]
    fn call_object_wins_over_compound_cid() {
        let event = json!({"call": {"id": "nested"}, "call_cid": "default:compound"});
        assert_eq!(extract_call_id(&event), Some("nested".to_string()));
    }

    #[test]
    fn session_ended_normalizes_with_metadata_from_any_location() {
        let nested = json!({
            "type": "call.session_ended",
            "call": {"id": "abc", "session": {"duration_seconds": 300, "participants": [{}, {}]}}
        });
        assert_eq!(
            normalize(&nested),
            WebhookEvent::CallEnded {
                call_id: "abc".to_string(),
                duration_seconds: Some(300),
                participants_count: Some(2),
            }
        );

        let flat = json!({
            "type": "call.ended",
            "call_cid": "default:abc",
            "duration": 120,
            "participants_count": 3
        });
        assert_eq!(
            normalize(&flat),
            WebhookEvent::CallEnded {
                call_id: "abc".to_string(),
                duration_seconds: Some(120),
                participants_count: Some(3),
            }
        );
    }

    #[test]
    fn session_ended_metadata_defaults_to_absent() {
        let event = json!({"type": "call.session_ended", "call": {"id": "abc"}});
        assert_eq!(
            normalize(&event),
            WebhookEvent::CallEnded {
                call_id: "abc".to_string(),
                duration_seconds: None,
                participants_count: None,
            }
        );
    }

    #[test]
    fn transcription_ready_carries_optional_url() {
        let event = json!({
            "type": "call.transcription_ready",
            "call_cid": "default:abc",
            "transcription": {"url": "https://cdn.example.com/t.json"}
        });
        assert_eq!(
            normalize(&event),
            WebhookEvent::TranscriptionReady {
                call_id: "abc".to_string(),
                transcript_url: Some("https://cdn.example.com/t.json".to_string()),
            }
        );
    }

    #[test]
    fn recording_ready_without_url_is_ignored() {
        let event = json!({
            "type": "call.recording_ready",
            "call": {"id": "abc"},
            "recording": {"format": "mp4"}
        });
        assert!(matches!(normalize(&event), WebhookEvent::Ignored { .. }));
    }

    #[test]
    fn recording_ready_normalizes_metadata() {
        let event = json!({
            "type": "call.recording_ready",
            "call": {"id": "abc"},
            "recording": {"url": "https://cdn.example.com/r.mp4", "format": "mp4", "size": 1024, "duration": 60}
        });
        assert_eq!(
            normalize(&event),
            WebhookEvent::RecordingReady {
                call_id: "abc".to_string(),
                recording: RecordingInfo {
                    url: "https://cdn.example.com/r.mp4".to_string(),
                    format: Some("mp4".to_string()),
                    size_bytes: Some(1024),
                    duration_seconds: Some(60),
                },
            }
        );
    }

    #[test]
    fn unrecognized_event_types_are_ignored() {
        let event = json!({"type": "call.session_participant_joined", "participant": {"user_id": "u1"}});
        assert_eq!(
            normalize(&event),
            WebhookEvent::Ignored {
                event_type: "call.session_participant_joined".to_string()
            }
        );
    }
}
