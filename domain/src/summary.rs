//! AI meeting summarization.
//!
//! Turns a cleaned transcript into a structured summary artifact via the
//! LLM provider. Transcripts beyond the per-request budget are map-reduced:
//! each chunk is summarized with a lightweight plain-text prompt and one
//! final structured request combines the partials.
//!
//! Unparseable provider content degrades into a valid-but-empty artifact:
//! summarization failures must be visible in the data, not crash the
//! pipeline step. Transport errors still propagate so the orchestrator can
//! retry them.

use crate::error::Error;
use crate::gateway::llm::{ChatMessage, ChatProvider, CompletionRequest};
use crate::transcript::chunk_transcript;
use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};

/// Overall sentiment classification of a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(fmt, "positive"),
            Sentiment::Neutral => write!(fmt, "neutral"),
            Sentiment::Negative => write!(fmt, "negative"),
        }
    }
}

/// Sentiment with the model's confidence in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAnalysis {
    #[serde(default)]
    pub overall: Sentiment,
    #[serde(default)]
    pub confidence: f64,
}

impl Default for SentimentAnalysis {
    fn default() -> Self {
        Self {
            overall: Sentiment::Neutral,
            confidence: 0.0,
        }
    }
}

/// Per-speaker highlights, present when the model could identify speakers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerHighlight {
    pub speaker: String,
    #[serde(default)]
    pub main_points: Vec<String>,
}

/// The stored summary artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryArtifact {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub decisions_made: Vec<String>,
    #[serde(default)]
    pub sentiment: SentimentAnalysis,
    #[serde(default)]
    pub speaker_highlights: Vec<SpeakerHighlight>,
    #[serde(default)]
    pub meeting_notes: String,
    pub generated_at: DateTime<Utc>,
}

impl SummaryArtifact {
    /// The artifact stored when the model's content could not be parsed:
    /// structurally valid, visibly empty.
    pub fn degraded() -> Self {
        Self {
            summary: "Failed to parse meeting summary".to_string(),
            key_points: Vec::new(),
            action_items: Vec::new(),
            decisions_made: Vec::new(),
            sentiment: SentimentAnalysis::default(),
            speaker_highlights: Vec::new(),
            meeting_notes: String::new(),
            generated_at: Utc::now(),
        }
    }
}

/// Shape the model is instructed to produce. All fields are defaulted so a
/// partially-conforming response still yields a usable artifact.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModelSummary {
    summary: Option<String>,
    key_points: Vec<String>,
    action_items: Vec<String>,
    decisions_made: Vec<String>,
    sentiment: Option<SentimentAnalysis>,
    speaker_highlights: Vec<SpeakerHighlight>,
    meeting_notes: Option<String>,
}

const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an expert AI meeting assistant. Analyze the meeting transcript thoroughly and provide a comprehensive analysis.

Your response must be valid JSON with this exact structure:
{
  "summary": "A concise 2-3 sentence summary of the meeting",
  "keyPoints": ["Key point 1", "Key point 2", ...],
  "actionItems": ["Action item with owner if mentioned", ...],
  "decisionsMade": ["Decision 1", "Decision 2", ...],
  "sentiment": {
    "overall": "positive" | "neutral" | "negative",
    "confidence": 0.0 to 1.0
  },
  "speakerHighlights": [
    {"speaker": "Speaker name or role", "mainPoints": ["Point 1", "Point 2"]}
  ],
  "meetingNotes": "Formatted meeting notes in markdown style with headers and bullet points"
}

Guidelines:
- Extract action items with responsible persons if mentioned
- Identify all decisions made during the meeting
- Analyze overall sentiment (positive, neutral, or negative)
- If speaker names are identifiable, provide per-speaker highlights
- Create clean, professional meeting notes suitable for sharing"#;

const CHUNK_SYSTEM_PROMPT: &str = "Summarize this portion of a meeting transcript. \
Focus on key points, decisions, and action items. Keep it concise.";

const COMBINE_SYSTEM_PROMPT: &str = r#"You are combining multiple meeting summary segments into one comprehensive analysis.

Your response must be valid JSON with this exact structure:
{
  "summary": "A concise 2-3 sentence summary of the entire meeting",
  "keyPoints": ["Key point 1", "Key point 2", ...],
  "actionItems": ["Action item with owner if mentioned", ...],
  "decisionsMade": ["Decision 1", "Decision 2", ...],
  "sentiment": {
    "overall": "positive" | "neutral" | "negative",
    "confidence": 0.0 to 1.0
  },
  "speakerHighlights": [],
  "meetingNotes": "Formatted meeting notes in markdown style"
}"#;

const PARTIAL_SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

/// Summarization engine over a chat-completion provider.
pub struct SummaryEngine<'a> {
    provider: &'a dyn ChatProvider,
    chunk_budget: usize,
}

impl<'a> SummaryEngine<'a> {
    pub fn new(provider: &'a dyn ChatProvider, chunk_budget: usize) -> Self {
        Self {
            provider,
            chunk_budget,
        }
    }

    /// Produce a summary artifact for a cleaned transcript.
    pub async fn summarize(&self, transcript: &str) -> Result<SummaryArtifact, Error> {
        let chunks = chunk_transcript(transcript, self.chunk_budget);

        if chunks.len() > 1 {
            return self.summarize_long(&chunks).await;
        }

        let content = self
            .provider
            .complete(CompletionRequest::structured_json(vec![
                ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Please analyze this meeting transcript:\n\n{transcript}"
                )),
            ]))
            .await?;

        Ok(parse_summary(&content))
    }

    /// Map-reduce path: per-chunk plain-text summaries, then one structured
    /// combination request. Bounds per-request size while keeping the final
    /// summary globally coherent.
    async fn summarize_long(&self, chunks: &[String]) -> Result<SummaryArtifact, Error> {
        info!("Summarizing long transcript in {} chunks", chunks.len());

        let mut partials = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let partial = self
                .provider
                .complete(CompletionRequest::text(vec![
                    ChatMessage::system(CHUNK_SYSTEM_PROMPT),
                    ChatMessage::user(format!(
                        "Transcript part {} of {}:\n\n{}",
                        i + 1,
                        chunks.len(),
                        chunk
                    )),
                ]))
                .await?;
            partials.push(partial);
        }

        let combined = partials.join(PARTIAL_SUMMARY_SEPARATOR);

        let content = self
            .provider
            .complete(CompletionRequest::structured_json(vec![
                ChatMessage::system(COMBINE_SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Combine these meeting summaries into one comprehensive analysis:\n\n{combined}"
                )),
            ]))
            .await?;

        Ok(parse_summary(&content))
    }
}

/// Parses model content into an artifact, degrading on malformed JSON.
pub fn parse_summary(content: &str) -> SummaryArtifact {
    match serde_json::from_str::<ModelSummary>(content) {
        Ok(parsed) => SummaryArtifact {
            summary: parsed
                .summary
                .unwrap_or_else(|| "No summary available".to_string()),
            key_points: parsed.key_points,
            action_items: parsed.action_items,
            decisions_made: parsed.decisions_made,
            // A well-formed response missing sentiment gets a neutral
            // middle-confidence default, distinct from the degraded zero.
            sentiment: parsed.sentiment.unwrap_or(SentimentAnalysis {
                overall: Sentiment::Neutral,
                confidence: 0.5,
            }),
            speaker_highlights: parsed.speaker_highlights,
            meeting_notes: parsed.meeting_notes.unwrap_or_default(),
            generated_at: Utc::now(),
        },
        Err(e) => {
            warn!("Failed to parse summary content, storing degraded artifact: {e}");
            SummaryArtifact::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::llm::{MockChatProvider, ResponseFormat};

    fn well_formed_summary_json() -> String {
        serde_json::json!({
            "summary": "The team agreed to ship on Friday.",
            "keyPoints": ["Ship date set"],
            "actionItems": ["Alice: prepare release notes"],
            "decisionsMade": ["Ship Friday"],
            "sentiment": {"overall": "positive", "confidence": 0.9},
            "speakerHighlights": [{"speaker": "Alice", "mainPoints": ["Owns release"]}],
            "meetingNotes": "# Notes"
        })
        .to_string()
    }

    #[tokio::test]
    async fn short_transcript_issues_one_structured_request() {
        let mut provider = MockChatProvider::new();
        provider
            .expect_complete()
            .times(1)
            .withf(|request| request.response_format == ResponseFormat::JsonObject)
            .returning(|_| Ok(well_formed_summary_json()));

        let engine = SummaryEngine::new(&provider, 8000);
        let artifact = engine.summarize("A short meeting. It went fine.").await.unwrap();

        assert_eq!(artifact.summary, "The team agreed to ship on Friday.");
        assert_eq!(artifact.sentiment.overall, Sentiment::Positive);
        assert_eq!(artifact.decisions_made, vec!["Ship Friday"]);
    }

    #[tokio::test]
    async fn long_transcript_issues_chunk_calls_plus_one_combining_call() {
        // 20 sentences of ~110 chars with a 500-char budget force multiple
        // chunks; every chunk call is plain text, the final call structured.
        let transcript = (0..20)
            .map(|i| {
                format!(
                    "Sentence number {i} talks about the quarterly planning process in considerable and repetitive detail."
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        let expected_chunks = chunk_transcript(&transcript, 500).len();
        assert!(expected_chunks > 1);

        let mut provider = MockChatProvider::new();
        provider
            .expect_complete()
            .times(expected_chunks)
            .withf(|request| request.response_format == ResponseFormat::Text)
            .returning(|_| Ok("partial summary".to_string()));
        provider
            .expect_complete()
            .times(1)
            .withf(|request| {
                request.response_format == ResponseFormat::JsonObject
                    && request.messages[1].content.contains("---")
            })
            .returning(|_| Ok(well_formed_summary_json()));

        let engine = SummaryEngine::new(&provider, 500);
        let artifact = engine.summarize(&transcript).await.unwrap();
        assert_eq!(artifact.key_points, vec!["Ship date set"]);
    }

    #[tokio::test]
    async fn non_json_content_degrades_instead_of_failing() {
        let mut provider = MockChatProvider::new();
        provider
            .expect_complete()
            .returning(|_| Ok("I'm sorry, I can't produce JSON today.".to_string()));

        let engine = SummaryEngine::new(&provider, 8000);
        let artifact = engine.summarize("Short meeting.").await.unwrap();

        assert!(artifact.key_points.is_empty());
        assert!(artifact.action_items.is_empty());
        assert!(artifact.decisions_made.is_empty());
        assert_eq!(artifact.sentiment.overall, Sentiment::Neutral);
        assert_eq!(artifact.sentiment.confidence, 0.0);
    }

    #[tokio::test]
    async fn provider_transport_errors_propagate() {
        let mut provider = MockChatProvider::new();
        provider.expect_complete().returning(|_| {
            Err(crate::error::Error {
                source: None,
                error_kind: crate::error::DomainErrorKind::External(
                    crate::error::ExternalErrorKind::Network,
                ),
            })
        });

        let engine = SummaryEngine::new(&provider, 8000);
        assert!(engine.summarize("Short meeting.").await.is_err());
    }

    #[test]
    fn parsed_summary_defaults_missing_fields() {
        let artifact = parse_summary(r#"{"summary": "Just a summary."}"#);
        assert_eq!(artifact.summary, "Just a summary.");
        assert!(artifact.key_points.is_empty());
        assert_eq!(artifact.sentiment.confidence, 0.5);
    }

    #[test]
    fn artifact_serializes_with_camel_case_keys() {
        let json = serde_json::to_string(&SummaryArtifact::degraded()).unwrap();
        assert!(json.contains("\"keyPoints\""));
        assert!(json.contains("\"decisionsMade\""));
        assert!(json.contains("\"generatedAt\""));
    }
}
