use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use sonar_api::{CancellationSignal, SonarApiClient, SonarApiConfig};
use sonar_chat::{AppConfig, ChatApp, ConsoleView, SonarStreamBackend};
use transcript_store::TranscriptStore;

fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("sonar-chat: {message}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = sonar_chat::logging::init(&config.log_path);

    // SIGINT flips the shared flag; the in-flight exchange observes it and
    // fails over into the rollback path instead of killing the process.
    let cancellation: CancellationSignal = Arc::new(AtomicBool::new(false));
    if let Err(error) =
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&cancellation))
    {
        eprintln!("sonar-chat: cannot install interrupt handler: {error}");
        return ExitCode::FAILURE;
    }

    let store = match TranscriptStore::open(&config.db_path) {
        Ok(store) => store,
        Err(error) => {
            eprintln!("sonar-chat: {error}");
            return ExitCode::FAILURE;
        }
    };

    let client = match SonarApiClient::new(
        SonarApiConfig::new(config.api_key.clone()).with_base_url(config.base_url.clone()),
    ) {
        Ok(client) => client,
        Err(error) => {
            eprintln!("sonar-chat: {error}");
            return ExitCode::FAILURE;
        }
    };

    let backend = SonarStreamBackend::new(client, cancellation);
    let view = ConsoleView::new(config.show_citations, config.show_related);
    let mut app = match ChatApp::new(config, store, Box::new(backend), Box::new(view)) {
        Ok(app) => app,
        Err(error) => {
            eprintln!("sonar-chat: {error}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "sonar-chat | model {} | conversation #{} | /help for commands",
        app.state().model,
        app.state().conversation_id
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while app.is_running() {
        print!("{} > ", app.state().model);
        let _ = io::stdout().flush();

        match lines.next() {
            Some(Ok(line)) => app.handle_line(&line),
            Some(Err(_)) | None => break,
        }
    }

    ExitCode::SUCCESS
}
