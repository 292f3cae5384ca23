//! Conversation controller: one user turn in, one assistant turn out, with
//! commit-or-rollback bookkeeping on both the in-memory history and the
//! transcript store.

use std::fmt;

use sonar_api::{ChatMessage, ChatRequest, SearchResponse, SonarApiError, WebSearchOptions};
use tracing::{debug, error, warn};
use transcript_store::{
    Conversation, Role, TranscriptStore, TranscriptStoreError, TurnMetadata,
};

use crate::backend::StreamBackend;
use crate::commands::{parse_slash_command, SearchCommand, SlashCommand};
use crate::config::AppConfig;
use crate::display::ChatView;
use crate::export::{export_json, export_markdown};
use crate::models::{find_model, MODELS};

const LIST_LIMIT: usize = 20;

/// Mutable per-session state, passed around explicitly rather than living in
/// globals.
#[derive(Debug)]
pub struct SessionState {
    pub conversation_id: i64,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub session_cost: f64,
    pub session_tokens: i64,
    pub running: bool,
}

/// Anything that can fail one exchange. Both arms trigger the same rollback.
enum ExchangeError {
    Api(SonarApiError),
    Store(TranscriptStoreError),
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(error) => write!(f, "{error}"),
            Self::Store(error) => write!(f, "{error}"),
        }
    }
}

pub struct ChatApp {
    config: AppConfig,
    store: TranscriptStore,
    backend: Box<dyn StreamBackend>,
    view: Box<dyn ChatView>,
    state: SessionState,
}

impl ChatApp {
    /// Build the app around an open store, creating the session's initial
    /// conversation with its system turn.
    pub fn new(
        config: AppConfig,
        mut store: TranscriptStore,
        backend: Box<dyn StreamBackend>,
        view: Box<dyn ChatView>,
    ) -> Result<Self, TranscriptStoreError> {
        let conversation_id = store.create(&config.default_model)?;
        store.append(conversation_id, Role::System, &config.system_prompt, None)?;

        let state = SessionState {
            conversation_id,
            model: config.default_model.clone(),
            messages: vec![ChatMessage::system(&config.system_prompt)],
            session_cost: 0.0,
            session_tokens: 0,
            running: true,
        };

        Ok(Self {
            config,
            store,
            backend,
            view,
            state,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Route one input line: slash commands dispatch to handlers, everything
    /// else becomes an exchange.
    pub fn handle_line(&mut self, line: &str) {
        let text = line.trim();
        if text.is_empty() {
            return;
        }

        match parse_slash_command(text) {
            Some(command) => self.handle_command(command),
            None => self.send_message(text),
        }
    }

    /// Run one exchange: persist the user turn, stream the response, then
    /// commit the assistant turn or roll the user turn back on both sides.
    pub fn send_message(&mut self, text: &str) {
        self.state.messages.push(ChatMessage::user(text));
        if let Err(storage_error) =
            self.store
                .append(self.state.conversation_id, Role::User, text, None)
        {
            // Storage refused the user turn; memory must not drift ahead.
            self.state.messages.pop();
            error!(error = %storage_error, "failed to persist user turn");
            self.view
                .render_error(&failure_message(&ExchangeError::Store(storage_error)));
            return;
        }

        debug!(
            model = %self.state.model,
            turns = self.state.messages.len(),
            "starting exchange"
        );

        let request = self.build_request();
        let view = &mut self.view;
        let result = self
            .backend
            .stream(&request, &mut |increment| view.render_progress(increment));

        match result {
            Ok(response) => self.commit_exchange(response),
            Err(api_error) => self.fail_exchange(ExchangeError::Api(api_error)),
        }
    }

    fn build_request(&self) -> ChatRequest {
        let mut request =
            ChatRequest::new(self.state.model.clone(), self.state.messages.clone());
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;
        request.top_p = self.config.top_p;
        request.return_citations = self.config.return_citations;
        request.return_related_questions = self.config.return_related_questions;
        request.return_images = self.config.return_images;
        request.search_domain_filter = self.config.search_domain_filter.clone();
        request.search_recency_filter = self.config.search_recency_filter.clone();
        if self.config.search_mode != "web" {
            request.search_mode = Some(self.config.search_mode.clone());
        }
        if self.config.search_context_size != "medium" {
            request.web_search_options = Some(WebSearchOptions {
                search_context_size: self.config.search_context_size.clone(),
            });
        }
        request
    }

    fn commit_exchange(&mut self, response: SearchResponse) {
        let metadata = TurnMetadata::new(
            response.citations.clone(),
            serde_json::to_value(response.usage).unwrap_or_default(),
            serde_json::to_value(response.cost).unwrap_or_default(),
        );

        if let Err(storage_error) = self.store.append(
            self.state.conversation_id,
            Role::Assistant,
            &response.content,
            Some(&metadata),
        ) {
            // The user turn must not survive without its assistant turn.
            self.fail_exchange(ExchangeError::Store(storage_error));
            return;
        }

        self.state
            .messages
            .push(ChatMessage::assistant(response.content.clone()));

        let total_cost = response.cost.total_cost;
        let total_tokens = response.usage.total_tokens as i64;
        if let Err(storage_error) =
            self.store
                .accumulate_cost(self.state.conversation_id, total_cost, total_tokens)
        {
            warn!(error = %storage_error, "failed to update running totals");
        }
        self.state.session_cost += total_cost;
        self.state.session_tokens += total_tokens;

        self.view.render_final(&response);
        if self.config.show_cost {
            let notice = format!(
                "session cost ${:.6} | tokens {}",
                self.state.session_cost, self.state.session_tokens
            );
            self.view.render_notice(&notice);
        }
    }

    /// Two-sided rollback: memory and storage drop the same just-appended
    /// user turn, leaving the conversation indistinguishable from its
    /// pre-exchange state.
    fn fail_exchange(&mut self, failure: ExchangeError) {
        self.state.messages.pop();
        match self.store.delete_last(self.state.conversation_id) {
            Ok(removed) => {
                if !removed {
                    warn!("rollback found no turn to remove");
                }
            }
            Err(rollback_error) => {
                error!(
                    error = %rollback_error,
                    "rollback failed; stored transcript may retain an orphaned user turn"
                );
            }
        }

        error!(error = %failure, "exchange failed");
        self.view.render_error(&failure_message(&failure));
    }

    /// Current conversation, fully materialized. Read-side storage failures
    /// degrade to `None` with a warning.
    pub fn current_conversation(&self) -> Option<Conversation> {
        match self.store.get(self.state.conversation_id) {
            Ok(conversation) => conversation,
            Err(storage_error) => {
                warn!(error = %storage_error, "could not read current conversation");
                None
            }
        }
    }

    pub fn handle_command(&mut self, command: SlashCommand) {
        match command {
            SlashCommand::Help => self.cmd_help(),
            SlashCommand::Model(selection) => self.cmd_model(selection),
            SlashCommand::Clear => self.cmd_clear(),
            SlashCommand::New => self.cmd_new(),
            SlashCommand::Save(name) => self.cmd_save(name),
            SlashCommand::Load(id) => self.cmd_load(id),
            SlashCommand::List => self.cmd_list(),
            SlashCommand::Delete(id) => self.cmd_delete(id),
            SlashCommand::Rename(name) => self.cmd_rename(name),
            SlashCommand::Export(format) => self.cmd_export(format),
            SlashCommand::Cost => self.cmd_cost(),
            SlashCommand::Search(search) => self.cmd_search(search),
            SlashCommand::System(prompt) => self.cmd_system(prompt),
            SlashCommand::Info => self.cmd_info(),
            SlashCommand::Exit => self.cmd_exit(),
            SlashCommand::Unknown(name) => {
                self.view
                    .render_notice(&format!("Unknown command {name}. Type /help for commands."));
            }
        }
    }

    fn cmd_help(&mut self) {
        let help = "\
Commands:
  /help               Show this help
  /model [id]         Show models or switch to one
  /clear              Reset the in-memory conversation
  /new                Start a new stored conversation
  /save [name]        Name the current conversation
  /load <id>          Resume a stored conversation
  /list               List recent conversations
  /delete <id>        Delete a stored conversation
  /rename <name>      Rename the current conversation
  /export [md|json]   Export the current conversation
  /cost               Show session cost and tokens
  /search ...         domain <d1,d2> | recency <hour|day|week|month|year> | mode <web|academic|sec> | clear
  /system [prompt]    Show or replace the system prompt
  /info               Show session status
  /exit               Quit";
        self.view.render_notice(help);
    }

    fn cmd_model(&mut self, selection: Option<String>) {
        let Some(id) = selection else {
            let mut listing = String::from("Models:");
            for model in MODELS {
                let marker = if model.id == self.state.model { "*" } else { " " };
                listing.push_str(&format!(
                    "\n {marker} {:<22} {}",
                    model.id, model.description
                ));
            }
            listing.push_str("\nSwitch with /model <id>");
            self.view.render_notice(&listing);
            return;
        };

        match find_model(&id) {
            Some(model) => {
                self.state.model = model.id.to_string();
                self.view.render_notice(&format!("Switched to {}", model.id));
            }
            None => {
                self.view
                    .render_notice(&format!("Unknown model '{id}'. See /model for choices."));
            }
        }
    }

    fn cmd_clear(&mut self) {
        self.state.messages = vec![ChatMessage::system(&self.config.system_prompt)];
        self.view.render_notice("Conversation context cleared.");
    }

    fn cmd_new(&mut self) {
        let conversation_id = match self.store.create(&self.state.model) {
            Ok(conversation_id) => conversation_id,
            Err(storage_error) => {
                error!(error = %storage_error, "failed to create conversation");
                self.view
                    .render_error(&failure_message(&ExchangeError::Store(storage_error)));
                return;
            }
        };
        if let Err(storage_error) = self.store.append(
            conversation_id,
            Role::System,
            &self.config.system_prompt,
            None,
        ) {
            error!(error = %storage_error, "failed to persist system turn");
            self.view
                .render_error(&failure_message(&ExchangeError::Store(storage_error)));
            return;
        }

        self.state.conversation_id = conversation_id;
        self.state.messages = vec![ChatMessage::system(&self.config.system_prompt)];
        self.state.session_cost = 0.0;
        self.state.session_tokens = 0;
        self.view
            .render_notice(&format!("New conversation #{conversation_id} started."));
    }

    fn cmd_save(&mut self, name: Option<String>) {
        let name =
            name.unwrap_or_else(|| format!("Conversation #{}", self.state.conversation_id));
        match self.store.rename(self.state.conversation_id, &name) {
            Ok(()) => self.view.render_notice(&format!("Saved as '{name}'.")),
            Err(storage_error) => {
                warn!(error = %storage_error, "could not save conversation name");
                self.view.render_notice("Could not save the conversation name.");
            }
        }
    }

    fn cmd_load(&mut self, id: Option<i64>) {
        let Some(id) = id else {
            self.cmd_list();
            self.view.render_notice("Usage: /load <id>");
            return;
        };

        let conversation = match self.store.get(id) {
            Ok(Some(conversation)) => conversation,
            Ok(None) => {
                self.view.render_notice(&format!("Conversation #{id} not found."));
                return;
            }
            Err(storage_error) => {
                warn!(error = %storage_error, "could not load conversation");
                self.view.render_notice(&format!("Conversation #{id} not found."));
                return;
            }
        };

        self.state.conversation_id = conversation.id;
        self.state.model = conversation.model.clone();
        self.state.session_cost = conversation.total_cost;
        self.state.session_tokens = conversation.total_tokens;
        self.state.messages = conversation
            .turns
            .iter()
            .map(|turn| ChatMessage {
                role: message_role(turn.role),
                content: turn.content.clone(),
            })
            .collect();

        self.view.render_notice(&format!(
            "Loaded conversation #{} ({} turns, model {}).",
            conversation.id,
            conversation.turns.len(),
            conversation.model
        ));
    }

    fn cmd_list(&mut self) {
        let summaries = match self.store.list(LIST_LIMIT) {
            Ok(summaries) => summaries,
            Err(storage_error) => {
                warn!(error = %storage_error, "could not list conversations");
                Vec::new()
            }
        };

        if summaries.is_empty() {
            self.view.render_notice("No saved conversations.");
            return;
        }

        let mut listing = String::from("Conversations:");
        for summary in summaries {
            let name = if summary.name.is_empty() {
                "(unnamed)".to_string()
            } else {
                summary.name.clone()
            };
            listing.push_str(&format!(
                "\n  #{:<5} {:<28} {:<20} {:>3} turns  ${:.4}",
                summary.id, name, summary.model, summary.turn_count, summary.total_cost
            ));
        }
        self.view.render_notice(&listing);
    }

    fn cmd_delete(&mut self, id: Option<i64>) {
        let Some(id) = id else {
            self.view.render_notice("Usage: /delete <id>");
            return;
        };

        let removed = match self.store.delete(id) {
            Ok(removed) => removed,
            Err(storage_error) => {
                warn!(error = %storage_error, "could not delete conversation");
                false
            }
        };

        if removed {
            self.view.render_notice(&format!("Deleted conversation #{id}."));
        } else {
            self.view.render_notice(&format!("Conversation #{id} not found."));
        }
    }

    fn cmd_rename(&mut self, name: String) {
        let name = name.trim();
        if name.is_empty() {
            self.view.render_notice("Usage: /rename <name>");
            return;
        }
        self.cmd_save(Some(name.to_string()));
    }

    fn cmd_export(&mut self, format: Option<String>) {
        let format = format.unwrap_or_else(|| "md".to_string());
        let Some(conversation) = self.current_conversation() else {
            self.view.render_notice("No conversation to export.");
            return;
        };

        let exported = match format.as_str() {
            "md" | "markdown" => export_markdown(&conversation, &self.config.export_dir),
            "json" => export_json(&conversation, &self.config.export_dir),
            other => {
                self.view
                    .render_notice(&format!("Unknown format '{other}'. Use 'md' or 'json'."));
                return;
            }
        };

        match exported {
            Ok(path) => self
                .view
                .render_notice(&format!("Exported to {}", path.display())),
            Err(message) => {
                warn!(%message, "export failed");
                self.view.render_notice(&format!("Export failed: {message}"));
            }
        }
    }

    fn cmd_cost(&mut self) {
        self.view.render_notice(&format!(
            "session cost ${:.6} | tokens {}",
            self.state.session_cost, self.state.session_tokens
        ));
    }

    fn cmd_search(&mut self, search: Option<SearchCommand>) {
        let Some(search) = search else {
            self.view.render_notice(
                "Usage:\n  /search domain <d1,d2>\n  /search recency <hour|day|week|month|year>\n  /search mode <web|academic|sec>\n  /search clear",
            );
            return;
        };

        match search {
            SearchCommand::Domains(domains) => {
                self.view
                    .render_notice(&format!("Domain filter: {}", domains.join(", ")));
                self.config.search_domain_filter = domains;
            }
            SearchCommand::Recency(value) => {
                self.view.render_notice(&format!("Recency filter: {value}"));
                self.config.search_recency_filter = Some(value);
            }
            SearchCommand::Mode(value) => {
                self.view.render_notice(&format!("Search mode: {value}"));
                self.config.search_mode = value;
            }
            SearchCommand::Clear => {
                self.config.search_domain_filter.clear();
                self.config.search_recency_filter = None;
                self.config.search_mode = "web".to_string();
                self.view.render_notice("Search filters cleared.");
            }
        }
    }

    fn cmd_system(&mut self, prompt: Option<String>) {
        let Some(prompt) = prompt else {
            let preview: String = self.config.system_prompt.chars().take(100).collect();
            self.view.render_notice(&format!("System prompt: {preview}"));
            return;
        };

        self.config.system_prompt = prompt.clone();
        if let Some(first) = self.state.messages.first_mut() {
            *first = ChatMessage::system(prompt);
        }
        self.view.render_notice("System prompt updated.");
    }

    fn cmd_info(&mut self) {
        let mut info = format!(
            "model {} | conversation #{} | cost ${:.6} | tokens {} | messages {} | search {}",
            self.state.model,
            self.state.conversation_id,
            self.state.session_cost,
            self.state.session_tokens,
            self.state.messages.len(),
            self.config.search_mode
        );
        if !self.config.search_domain_filter.is_empty() {
            info.push_str(&format!(
                " | domains {}",
                self.config.search_domain_filter.join(",")
            ));
        }
        if let Some(recency) = &self.config.search_recency_filter {
            info.push_str(&format!(" | recency {recency}"));
        }
        self.view.render_notice(&info);
    }

    fn cmd_exit(&mut self) {
        self.state.running = false;
        self.view.render_notice("Goodbye.");
    }
}

fn message_role(role: Role) -> sonar_api::Role {
    match role {
        Role::System => sonar_api::Role::System,
        Role::User => sonar_api::Role::User,
        Role::Assistant => sonar_api::Role::Assistant,
    }
}

fn failure_message(failure: &ExchangeError) -> String {
    match failure {
        ExchangeError::Api(SonarApiError::Authentication(_)) => {
            "Invalid API key. Check SONAR_API_KEY in your environment.".to_string()
        }
        ExchangeError::Api(SonarApiError::InsufficientBalance(_)) => {
            "Insufficient balance. Top up your account and try again.".to_string()
        }
        ExchangeError::Api(SonarApiError::RateLimited(_)) => {
            "Rate limited. Wait a moment and try again.".to_string()
        }
        ExchangeError::Api(SonarApiError::Cancelled) => {
            "Cancelled. Your message was rolled back.".to_string()
        }
        ExchangeError::Api(api_error) => format!("Upstream error: {api_error}"),
        ExchangeError::Store(storage_error) => format!("Storage error: {storage_error}"),
    }
}
