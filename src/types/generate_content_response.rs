use serde::{Deserialize, Serialize};

use crate::types::Content;

/// Why the model stopped producing a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// Natural stop point.
    Stop,
    /// The configured token limit was reached.
    MaxTokens,
    /// Flagged by safety filters.
    Safety,
    /// Flagged for reciting training data.
    Recitation,
    /// Unsupported language.
    Language,
    /// Matched a forbidden-terms list.
    Blocklist,
    /// Prohibited content.
    ProhibitedContent,
    /// Sensitive personally identifiable information.
    Spii,
    /// Any reason this crate does not know about.
    #[serde(other)]
    Other,
}

impl FinishReason {
    /// The wire spelling of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Stop => "STOP",
            FinishReason::MaxTokens => "MAX_TOKENS",
            FinishReason::Safety => "SAFETY",
            FinishReason::Recitation => "RECITATION",
            FinishReason::Language => "LANGUAGE",
            FinishReason::Blocklist => "BLOCKLIST",
            FinishReason::ProhibitedContent => "PROHIBITED_CONTENT",
            FinishReason::Spii => "SPII",
            FinishReason::Other => "OTHER",
        }
    }

    /// Returns true for reasons that mean the reply was withheld.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety
                | FinishReason::Recitation
                | FinishReason::Blocklist
                | FinishReason::ProhibitedContent
                | FinishReason::Spii
        )
    }
}

/// One candidate reply.  Streaming chunks carry a slice of the candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content, absent when the candidate was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Set on the final chunk of the candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Index of the candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// Feedback about the prompt itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Set when the prompt was refused outright.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Token accounting for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, including history and system instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u32>,

    /// Tokens across all candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u32>,

    /// Total tokens billed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u32>,
}

/// A complete response, or one chunk of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate replies; only the first is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Feedback about the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,

    /// Token accounting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    /// The concrete model version that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// The text carried by the first candidate, possibly empty.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(Content::text)
            .unwrap_or_default()
    }

    /// The finish reason of the first candidate.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.finish_reason)
    }

    /// Why this response was withheld, if it was.
    ///
    /// A prompt block always counts.  A blocking finish reason only counts when
    /// the chunk carries no text, since the API reports the reason on the last
    /// chunk of an otherwise normal reply as well.
    pub fn block_reason(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
        {
            return Some(reason);
        }
        match self.finish_reason() {
            Some(reason) if reason.is_blocking() && self.text().is_empty() => {
                Some(reason.as_str().to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_stream_chunk() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hi"}], "role": "model"},
                "index": 0,
                "safetyRatings": []
            }],
            "usageMetadata": {"promptTokenCount": 12, "totalTokenCount": 12},
            "modelVersion": "gemini-1.5-flash-002"
        }))
        .unwrap();
        assert_eq!(chunk.text(), "Hi");
        assert_eq!(chunk.finish_reason(), None);
        assert_eq!(chunk.block_reason(), None);
        assert_eq!(
            chunk.usage_metadata.and_then(|u| u.prompt_token_count),
            Some(12)
        );
    }

    #[test]
    fn prompt_block_is_reported() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(chunk.text(), "");
        assert_eq!(chunk.block_reason(), Some("SAFETY".to_string()));
    }

    #[test]
    fn finish_reason_blocks_only_without_text() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert_eq!(chunk.block_reason(), Some("SAFETY".to_string()));

        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "done."}], "role": "model"},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(chunk.block_reason(), None);
    }

    #[test]
    fn unknown_finish_reason_is_other() {
        let candidate: Candidate =
            serde_json::from_value(json!({"finishReason": "MALFORMED_FUNCTION_CALL"})).unwrap();
        assert_eq!(candidate.finish_reason, Some(FinishReason::Other));
    }
}
