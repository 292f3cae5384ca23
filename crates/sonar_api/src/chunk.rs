use serde::{Deserialize, Serialize};

/// Token usage counters reported in the final stream event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub citation_tokens: u64,
    #[serde(default)]
    pub reasoning_tokens: u64,
    #[serde(default)]
    pub num_search_queries: u64,
}

/// Monetary cost breakdown reported in the final stream event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostInfo {
    #[serde(default)]
    pub input_tokens_cost: f64,
    #[serde(default)]
    pub output_tokens_cost: f64,
    #[serde(default)]
    pub reasoning_tokens_cost: f64,
    #[serde(default)]
    pub citation_tokens_cost: f64,
    #[serde(default)]
    pub search_queries_cost: f64,
    #[serde(default)]
    pub total_cost: f64,
}

/// One search hit attached to the final stream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "web".to_string()
}

/// Usage block as it appears on the wire, with the cost breakdown nested
/// inside it.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ChunkUsage {
    #[serde(flatten)]
    pub counters: UsageInfo,
    #[serde(default)]
    pub cost: CostInfo,
}

/// Content carrier inside a choice. Servers populate either `delta` (true
/// delta mode) or `message` (cumulative mode), sometimes both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkContent {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkContent,
    #[serde(default)]
    pub message: ChunkContent,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One parsed stream event body. Every field is defaulted so irregular
/// first/last events never fail the parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub related_questions: Vec<String>,
    #[serde(default)]
    pub search_results: Vec<SearchResult>,
    #[serde(default)]
    pub usage: ChunkUsage,
    #[serde(default)]
    pub model: String,
}

impl ChatChunk {
    /// Text carried by this event, preferring delta framing over cumulative.
    /// Whether the value is a true delta or the whole response so far is
    /// ambiguous here; `DeltaTracker` resolves that.
    pub fn content(&self) -> &str {
        let Some(choice) = self.choices.first() else {
            return "";
        };

        if !choice.delta.content.is_empty() {
            &choice.delta.content
        } else {
            &choice.message.content
        }
    }

    /// Finish reason of the first reported choice, empty when absent.
    pub fn finish_reason(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::ChatChunk;

    #[test]
    fn content_prefers_delta_over_message() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"a"},"message":{"content":"ab"}}]}"#,
        )
        .expect("chunk should parse");
        assert_eq!(chunk.content(), "a");
    }

    #[test]
    fn content_falls_back_to_message_field() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"ab"}}]}"#)
                .expect("chunk should parse");
        assert_eq!(chunk.content(), "ab");
    }

    #[test]
    fn empty_chunk_has_no_content_and_no_finish_reason() {
        let chunk: ChatChunk = serde_json::from_str("{}").expect("chunk should parse");
        assert_eq!(chunk.content(), "");
        assert_eq!(chunk.finish_reason(), "");
    }

    #[test]
    fn usage_parses_nested_cost_block() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"usage":{"prompt_tokens":10,"total_tokens":14,"cost":{"total_cost":0.002}}}"#,
        )
        .expect("chunk should parse");
        assert_eq!(chunk.usage.counters.prompt_tokens, 10);
        assert_eq!(chunk.usage.counters.total_tokens, 14);
        assert!((chunk.usage.cost.total_cost - 0.002).abs() < f64::EPSILON);
    }
}
