//! Rendering collaborator surface. The exchange core calls these hooks and
//! owns no presentation logic itself.

use std::io::Write;

use sonar_api::SearchResponse;

/// Display surface driven by the conversation controller.
pub trait ChatView {
    /// One reconciled text increment, called as it arrives mid-stream.
    fn render_progress(&mut self, partial_text: &str);

    /// The assembled response once the stream is exhausted.
    fn render_final(&mut self, response: &SearchResponse);

    /// One user-facing message for a failed exchange.
    fn render_error(&mut self, message: &str);

    /// Command feedback and status lines.
    fn render_notice(&mut self, message: &str);
}

/// Plain-text console renderer.
pub struct ConsoleView {
    show_citations: bool,
    show_related: bool,
}

impl ConsoleView {
    #[must_use]
    pub fn new(show_citations: bool, show_related: bool) -> Self {
        Self {
            show_citations,
            show_related,
        }
    }
}

impl ChatView for ConsoleView {
    fn render_progress(&mut self, partial_text: &str) {
        print!("{partial_text}");
        let _ = std::io::stdout().flush();
    }

    fn render_final(&mut self, response: &SearchResponse) {
        println!();

        if self.show_citations && !response.citations.is_empty() {
            println!("\nSources:");
            for (index, citation) in response.citations.iter().enumerate() {
                println!("  [{}] {citation}", index + 1);
            }
        }

        if self.show_related && !response.related_questions.is_empty() {
            println!("\nRelated:");
            for question in &response.related_questions {
                println!("  - {question}");
            }
        }
    }

    fn render_error(&mut self, message: &str) {
        eprintln!("\n  ! {message}");
    }

    fn render_notice(&mut self, message: &str) {
        println!("  {message}");
    }
}
