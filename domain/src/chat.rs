//! Transcript chat: ad hoc Q&A over a completed meeting's artifacts.
//!
//! Context is bounded: the transcript is truncated to a character budget,
//! the summary is embedded as text, and only the most recent turns of
//! history ride along. The user's question is persisted
//! before the provider call and the assistant reply only after a successful
//! one, so a provider failure never leaves an orphaned assistant message
//! while the question itself stays on record.

use crate::chat_role::ChatRole;
use crate::error::Error;
use crate::gateway::llm::{ChatMessage, ChatProvider, CompletionRequest, MessageRole};
use crate::meeting_status::MeetingStatus;
use crate::summary::SummaryArtifact;
use crate::transcript::TranscriptArtifact;
use crate::{chat_messages, Id};
use entity_api::{chat_message as chat_message_api, meeting as meeting_api};
use log::*;
use sea_orm::DatabaseConnection;

/// Marker appended when the transcript had to be cut to fit the budget.
pub const TRUNCATION_MARKER: &str = "\n\n[... transcript truncated for length ...]";

/// Embedded in the system prompt when the meeting has no summary yet.
pub const NO_SUMMARY_PLACEHOLDER: &str = "No summary available.";

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 1024;

/// Context-assembly budgets, sourced from configuration.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Character budget for the embedded transcript
    pub transcript_budget: usize,
    /// Number of prior turns of history to include
    pub history_turns: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            transcript_budget: 12_000,
            history_turns: 10,
        }
    }
}

/// Full chat history for a meeting, oldest first.
pub async fn history(
    db: &DatabaseConnection,
    meeting_id: Id,
    user_id: Id,
) -> Result<Vec<chat_messages::Model>, Error> {
    let _ = meeting_api::find_by_id_and_user(db, meeting_id, user_id).await?;
    Ok(chat_message_api::find_by_meeting(db, meeting_id).await?)
}

/// Answers a question about a completed meeting and persists both sides of
/// the exchange. Refuses (persisting nothing) unless the meeting is
/// `completed`, since chat requires a finalized transcript.
pub async fn send_message(
    db: &DatabaseConnection,
    provider: &dyn ChatProvider,
    settings: &ChatSettings,
    meeting_id: Id,
    user_id: Id,
    content: String,
) -> Result<chat_messages::Model, Error> {
    let meeting = meeting_api::find_by_id_and_user(db, meeting_id, user_id).await?;

    if meeting.status != MeetingStatus::Completed {
        warn!(
            "Chat rejected for meeting {meeting_id} in status: {}",
            meeting.status
        );
        return Err(Error::invalid());
    }

    // Snapshot the prior turns before the new question lands, so the window
    // holds history and the question rides as the final user message.
    let prior_turns =
        chat_message_api::find_recent(db, meeting_id, settings.history_turns).await?;

    let user_message =
        chat_message_api::create(db, meeting_id, Some(user_id), ChatRole::User, content.clone())
            .await?;
    debug!("Persisted user chat message: {}", user_message.id);

    let transcript_text = transcript_text(&meeting.transcript);
    let summary_text = summary_text(&meeting.summary);

    let system_prompt = build_system_prompt(
        summary_text.as_deref(),
        &truncate_transcript(&transcript_text, settings.transcript_budget),
    );

    let mut messages = Vec::with_capacity(prior_turns.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    for turn in &prior_turns {
        messages.push(ChatMessage {
            role: match turn.role {
                ChatRole::User => MessageRole::User,
                ChatRole::Assistant => MessageRole::Assistant,
            },
            content: turn.content.clone(),
        });
    }
    messages.push(ChatMessage::user(content));

    let reply = provider
        .complete(CompletionRequest {
            messages,
            response_format: crate::gateway::llm::ResponseFormat::Text,
            temperature: Some(CHAT_TEMPERATURE),
            max_tokens: Some(CHAT_MAX_TOKENS),
        })
        .await?;

    let assistant_message =
        chat_message_api::create(db, meeting_id, None, ChatRole::Assistant, reply).await?;
    debug!("Persisted assistant chat message: {}", assistant_message.id);

    Ok(assistant_message)
}

/// The cleaned transcript text out of the stored artifact. Falls back to the
/// raw stored string if the artifact does not parse, and to empty if absent.
fn transcript_text(stored: &Option<String>) -> String {
    match stored {
        Some(json) => match serde_json::from_str::<TranscriptArtifact>(json) {
            Ok(artifact) => artifact.cleaned,
            Err(_) => json.clone(),
        },
        None => String::new(),
    }
}

fn summary_text(stored: &Option<String>) -> Option<String> {
    stored
        .as_deref()
        .and_then(|json| serde_json::from_str::<SummaryArtifact>(json).ok())
        .map(|artifact| artifact.summary)
}

/// Truncates to a character budget, appending the truncation marker when cut.
fn truncate_transcript(transcript: &str, budget: usize) -> String {
    if transcript.chars().count() <= budget {
        return transcript.to_string();
    }

    let mut truncated: String = transcript.chars().take(budget).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

fn build_system_prompt(summary: Option<&str>, transcript: &str) -> String {
    format!(
        r#"You are an intelligent AI meeting assistant. You have access to a specific meeting's transcript and summary. Answer the user's questions based ONLY on this meeting's content. Be concise, accurate, and helpful.

If the user asks something not covered in the meeting, say so clearly.

=== MEETING SUMMARY ===
{}

=== MEETING TRANSCRIPT ===
{}

Guidelines:
- Answer based strictly on the meeting content
- Quote specific parts of the transcript when relevant
- If asked for action items, decisions, or key points, extract them from the transcript
- Be conversational but professional
- If uncertain, indicate your confidence level"#,
        summary.unwrap_or(NO_SUMMARY_PLACEHOLDER),
        transcript
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_transcripts_are_embedded_whole() {
        let text = "short transcript";
        assert_eq!(truncate_transcript(text, 100), text);
    }

    #[test]
    fn long_transcripts_are_cut_and_marked() {
        let text = "a".repeat(200);
        let truncated = truncate_transcript(&text, 50);

        assert!(truncated.starts_with(&"a".repeat(50)));
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(truncated.chars().count(), 50 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn missing_summary_embeds_the_placeholder() {
        let prompt = build_system_prompt(None, "the transcript");
        assert!(prompt.contains(NO_SUMMARY_PLACEHOLDER));
        assert!(prompt.contains("the transcript"));
    }

    #[test]
    fn present_summary_is_embedded_verbatim() {
        let prompt = build_system_prompt(Some("We shipped."), "the transcript");
        assert!(prompt.contains("We shipped."));
        assert!(!prompt.contains(NO_SUMMARY_PLACEHOLDER));
    }

    #[test]
    fn transcript_text_prefers_the_cleaned_artifact_form() {
        let artifact = TranscriptArtifact::new("Um, raw.".to_string(), "raw.".to_string());
        let stored = Some(serde_json::to_string(&artifact).unwrap());
        assert_eq!(transcript_text(&stored), "raw.");

        // Unparseable stored content falls back to itself
        let opaque = Some("not json".to_string());
        assert_eq!(transcript_text(&opaque), "not json");

        assert_eq!(transcript_text(&None), "");
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod precondition_tests {
    use super::*;
    use crate::gateway::llm::MockChatProvider;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    fn meeting_in(status: MeetingStatus, user_id: Id) -> crate::meetings::Model {
        let now = Utc::now().into();
        crate::meetings::Model {
            id: Uuid::new_v4(),
            user_id,
            agent_id: Uuid::new_v4(),
            name: "Weekly sync".to_string(),
            call_id: Some("abc123".to_string()),
            status,
            started_at: None,
            ended_at: None,
            duration_seconds: None,
            participants_count: None,
            recording_url: None,
            transcript: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn chat_refuses_meetings_that_are_not_completed() {
        let user_id = Uuid::new_v4();
        let meeting = meeting_in(MeetingStatus::Processing, user_id);
        let meeting_id = meeting.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting]])
            .into_connection();

        // The provider must never be called; an unmocked call would panic.
        let provider = MockChatProvider::new();

        let result = send_message(
            &db,
            &provider,
            &ChatSettings::default(),
            meeting_id,
            user_id,
            "What were the action items?".to_string(),
        )
        .await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            crate::error::DomainErrorKind::Internal(crate::error::InternalErrorKind::Entity(
                crate::error::EntityErrorKind::Invalid
            ))
        ));
    }
}
