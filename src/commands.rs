/// Search-filter subcommands of `/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    Domains(Vec<String>),
    Recency(String),
    Mode(String),
    Clear,
}

/// Closed set of slash commands. Dispatch happens through an exhaustive
/// `match`, so adding a variant forces every handler site to be updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Model(Option<String>),
    Clear,
    New,
    Save(Option<String>),
    Load(Option<i64>),
    List,
    Delete(Option<i64>),
    Rename(String),
    Export(Option<String>),
    Cost,
    Search(Option<SearchCommand>),
    System(Option<String>),
    Info,
    Exit,
    Unknown(String),
}

pub const RECENCY_VALUES: &[&str] = &["hour", "day", "week", "month", "year"];
pub const SEARCH_MODES: &[&str] = &["web", "academic", "sec"];

/// Parse one input line into a slash command. Returns `None` for ordinary
/// messages.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, args) = match trimmed.split_once(char::is_whitespace) {
        Some((command, args)) => (command, args.trim()),
        None => (trimmed, ""),
    };

    let optional_text = || {
        if args.is_empty() {
            None
        } else {
            Some(args.to_string())
        }
    };

    let parsed = match command {
        "/help" | "/h" | "/?" => SlashCommand::Help,
        "/model" | "/m" => SlashCommand::Model(optional_text()),
        "/clear" => SlashCommand::Clear,
        "/new" | "/n" => SlashCommand::New,
        "/save" => SlashCommand::Save(optional_text()),
        "/load" => SlashCommand::Load(args.parse().ok()),
        "/list" | "/ls" => SlashCommand::List,
        "/delete" | "/del" => SlashCommand::Delete(args.parse().ok()),
        "/rename" => SlashCommand::Rename(args.to_string()),
        "/export" => SlashCommand::Export(optional_text()),
        "/cost" => SlashCommand::Cost,
        "/search" => SlashCommand::Search(parse_search_args(args)),
        "/system" => SlashCommand::System(optional_text()),
        "/info" | "/i" => SlashCommand::Info,
        "/exit" | "/quit" | "/q" => SlashCommand::Exit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}

fn parse_search_args(args: &str) -> Option<SearchCommand> {
    let (option, value) = match args.split_once(char::is_whitespace) {
        Some((option, value)) => (option, value.trim()),
        None => (args, ""),
    };

    match option {
        "clear" => Some(SearchCommand::Clear),
        "domain" | "domains" if !value.is_empty() => Some(SearchCommand::Domains(
            value
                .split(',')
                .map(|domain| domain.trim().to_string())
                .filter(|domain| !domain.is_empty())
                .collect(),
        )),
        "recency" if RECENCY_VALUES.contains(&value) => {
            Some(SearchCommand::Recency(value.to_string()))
        }
        "mode" if SEARCH_MODES.contains(&value) => Some(SearchCommand::Mode(value.to_string())),
        _ => None,
    }
}
