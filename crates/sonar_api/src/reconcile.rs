use serde::{Deserialize, Serialize};

use crate::chunk::{ChatChunk, CostInfo, SearchResult, UsageInfo};

/// Fully assembled response, built exactly once per exchange from the last
/// well-formed stream event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub content: String,
    pub citations: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub related_questions: Vec<String>,
    pub usage: UsageInfo,
    pub cost: CostInfo,
    pub model: String,
    pub finish_reason: String,
}

/// Classifies ambiguously framed stream content into display increments.
///
/// Servers disagree on framing: some events carry only newly generated text,
/// others re-send the whole response so far, and streams can switch mode
/// midway. Detection is a best-effort string-prefix comparison, not a
/// guaranteed parse; the one hard guarantee is that the tracked content
/// never shrinks between events.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    previous_content: String,
}

impl DeltaTracker {
    /// Consume one event's `content` field and return the display increment
    /// it contributes, if any.
    pub fn push(&mut self, content: &str) -> Option<String> {
        if content.is_empty() {
            return None;
        }

        let increment = if content.len() > self.previous_content.len()
            && content.starts_with(&self.previous_content)
        {
            // Cumulative framing: only the suffix is new.
            Some(content[self.previous_content.len()..].to_string())
        } else if content != self.previous_content {
            // True delta, or the first event of either mode.
            Some(content.to_string())
        } else {
            // Repeat of what we already have.
            None
        };

        if content.len() >= self.previous_content.len() {
            self.previous_content = content.to_string();
        } else if let Some(increment) = &increment {
            self.previous_content.push_str(increment);
        }

        increment.filter(|increment| !increment.is_empty())
    }
}

/// Build the terminal [`SearchResponse`] from the last parsed event body (or
/// an empty chunk when none arrived) and the independently accumulated full
/// text.
pub fn assemble_response(last_chunk: &ChatChunk, full_content: String) -> SearchResponse {
    SearchResponse {
        content: full_content,
        citations: last_chunk.citations.clone(),
        search_results: last_chunk.search_results.clone(),
        related_questions: last_chunk.related_questions.clone(),
        usage: last_chunk.usage.counters,
        cost: last_chunk.usage.cost,
        model: last_chunk.model.clone(),
        finish_reason: last_chunk.finish_reason().to_string(),
    }
}
