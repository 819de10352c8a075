use anyhow::Context;
use clap::Parser;
use pdf_chat_core::{
    AnswerGenerator, AssistantConfig, ChatCoordinator, ChatError, ChatRole, HashedNgramEmbedder,
    OpenRouterClient, PdfSource, DEFAULT_CHAT_BASE_URL, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_LLM_MODEL,
};
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version, about = "Multi-session chat over your PDF documents")]
struct Cli {
    /// OpenRouter API key for the chat model.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat completion model identifier.
    #[arg(long, env = "LLM_MODEL_NAME", default_value = DEFAULT_LLM_MODEL)]
    llm_model: String,

    /// Local embedding model identifier.
    #[arg(long, env = "LOCAL_EMBEDDING_MODEL_NAME", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Base URL of the OpenAI-compatible chat endpoint.
    #[arg(long, default_value = DEFAULT_CHAT_BASE_URL)]
    chat_base_url: String,
}

const HELP: &str = "\
commands:
  /new               start a new chat session
  /sessions          list sessions
  /select <number>   switch to a session from the list
  /delete            delete the current session
  /load <pdf...>     process PDF files for the current session
  /history           show the current transcript
  /quit              exit
anything else is asked as a question against the current session.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AssistantConfig::new(cli.api_key.unwrap_or_default())
        .context("configuration error")?
        .with_llm_model(cli.llm_model)
        .with_chat_base_url(cli.chat_base_url)
        .with_embedding_model(cli.embedding_model);

    let embedder =
        HashedNgramEmbedder::load(&config.embedding_model).context("configuration error")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        llm_model = %config.llm_model,
        embedding_model = %config.embedding_model,
        "pdf-chat boot"
    );

    let client = OpenRouterClient::new(&config.api_key, &config.chat_base_url);
    let generator = AnswerGenerator::new(client, config.llm_model.clone());
    let mut coordinator = ChatCoordinator::new(Arc::new(embedder), generator);
    coordinator.store_mut().ensure_session();

    println!("pdf-chat — type /help for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let prompt_name = coordinator
            .store()
            .current()
            .map(|session| session.name.clone())
            .unwrap_or_else(|| "no session".to_string());
        print!("{prompt_name}> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().next() {
            Some("/quit") | Some("/exit") => break,
            Some("/help") => println!("{HELP}"),
            Some("/new") => {
                let id = coordinator.store_mut().create();
                let name = &coordinator.store().get(id).expect("just created").name;
                println!("started {name}");
            }
            Some("/sessions") => list_sessions(&coordinator),
            Some("/select") => select_session(&mut coordinator, line),
            Some("/delete") => delete_current(&mut coordinator),
            Some("/load") => load_documents(&mut coordinator, line).await,
            Some("/history") => show_history(&coordinator),
            Some(command) if command.starts_with('/') => {
                println!("unknown command: {command} (try /help)");
            }
            _ => ask_question(&mut coordinator, line).await,
        }
    }

    Ok(())
}

fn list_sessions(coordinator: &ChatCoordinator<OpenRouterClient>) {
    let current = coordinator.store().current_id();
    for (number, session) in coordinator.store().list().iter().enumerate() {
        let marker = if current == Some(session.id) { "*" } else { " " };
        let status = if session.is_indexed() {
            format!("{} document(s) processed", session.document_names.len())
        } else {
            "no documents processed".to_string()
        };
        println!(
            "{marker} {}: {} (created {}) — {status}",
            number + 1,
            session.name,
            session.created_at.format("%Y-%m-%d %H:%M UTC")
        );
        for name in &session.document_names {
            println!("      - {name}");
        }
    }
}

fn select_session(coordinator: &mut ChatCoordinator<OpenRouterClient>, line: &str) {
    let choice = line
        .split_whitespace()
        .nth(1)
        .and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|number| number.checked_sub(1))
        .and_then(|position| coordinator.store().list().get(position))
        .map(|session| session.id);

    match choice {
        Some(id) => {
            if coordinator.store_mut().select(id).is_ok() {
                let name = &coordinator.store().get(id).expect("selected").name;
                println!("switched to {name}");
            }
        }
        None => println!("usage: /select <number> (see /sessions)"),
    }
}

fn delete_current(coordinator: &mut ChatCoordinator<OpenRouterClient>) {
    let Some(id) = coordinator.store().current_id() else {
        println!("no session to delete");
        return;
    };
    let name = coordinator
        .store()
        .get(id)
        .expect("current session")
        .name
        .clone();

    if coordinator.store_mut().delete(id).is_ok() {
        println!("deleted {name}");
    }
    if coordinator.store().is_empty() {
        coordinator.store_mut().ensure_session();
    }
}

async fn load_documents(coordinator: &mut ChatCoordinator<OpenRouterClient>, line: &str) {
    let paths: Vec<&str> = line.split_whitespace().skip(1).collect();
    if paths.is_empty() {
        println!("usage: /load <pdf file> [more files...]");
        return;
    }

    let mut sources = Vec::new();
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let name = Path::new(path)
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.to_string());
                sources.push(PdfSource::new(name, bytes));
            }
            Err(error) => {
                warn!(path, %error, "unable to read file");
                println!("unable to read {path}: {error}");
            }
        }
    }

    let session_id = coordinator.store_mut().ensure_session();
    match coordinator.process_documents(session_id, &sources) {
        Ok(report) => {
            for skipped in &report.skipped {
                warn!(file = %skipped.name, reason = %skipped.reason, "skipped document");
                println!("warning: skipped {}: {}", skipped.name, skipped.reason);
            }
            println!(
                "processed {} document(s) into {} chunks",
                report.document_names.len(),
                report.chunk_count
            );
        }
        Err(error) => println!("processing failed: {error}"),
    }
}

fn show_history(coordinator: &ChatCoordinator<OpenRouterClient>) {
    let Some(session) = coordinator.store().current() else {
        println!("no session");
        return;
    };
    if session.transcript.is_empty() {
        println!("(empty transcript)");
    }
    for turn in &session.transcript {
        let speaker = match turn.role {
            ChatRole::Assistant => "assistant",
            _ => "you",
        };
        println!("{speaker}: {}", turn.content);
    }
}

async fn ask_question(coordinator: &mut ChatCoordinator<OpenRouterClient>, question: &str) {
    let session_id = coordinator.store_mut().ensure_session();

    let mut printed = String::new();
    let result = coordinator
        .ask(session_id, question, |fragment| {
            print!("{fragment}");
            let _ = std::io::stdout().flush();
            printed.push_str(fragment);
        })
        .await;

    match result {
        Ok(outcome) => {
            if let Some(failure) = &outcome.failure {
                warn!(%failure, "generation failed; fixed answer substituted");
            }
            // Canned and substituted answers never went through the
            // fragment sink, so print them now.
            if printed.is_empty() {
                println!("{}", outcome.answer);
            } else if printed != outcome.answer {
                println!("\n{}", outcome.answer);
            } else {
                println!();
            }
        }
        Err(ChatError::NotIndexed) => {
            println!("no documents processed for this session yet — use /load first");
        }
        Err(error) => println!("error: {error}"),
    }
}
