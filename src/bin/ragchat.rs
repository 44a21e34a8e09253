//! Interactive terminal client for a retrieval-augmented chat service.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the service on localhost:8000, resuming the saved session
//! ragchat
//!
//! # Point at another deployment
//! ragchat --base-url https://rag.example.com
//!
//! # A throwaway session that is not persisted
//! ragchat --ephemeral --no-color
//! ```
//!
//! Set `RUST_LOG=ragchat=debug` to see request and stream diagnostics on
//! stderr.

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use ragchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, help_text, parse_command,
};
use ragchat::{
    ChatBackend, ChatClient, ChatController, FileStore, KeyValueStore, MemoryStore, MessageRole,
    SendOutcome,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let (args, _) = ChatArgs::from_command_line_relaxed("ragchat [OPTIONS]");
    let config = ChatConfig::from(args);

    let client = ChatClient::with_options(Some(config.base_url.clone()), config.timeout)?;
    let store: Arc<dyn KeyValueStore> = match &config.state_path {
        Some(path) => Arc::new(FileStore::new(path.clone())),
        None => Arc::new(MemoryStore::new()),
    };
    let mut controller = ChatController::start(client, store.as_ref()).await;
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    println!("RAG Chat ({})", controller.backend().base_url());
    println!("Type /help for commands, /quit to exit\n");
    if config.show_history {
        renderer.print_transcript(controller.messages());
    }

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Session => {
                            renderer.print_info(&format!("Session: {}", controller.session_id()));
                        }
                        ChatCommand::History => {
                            renderer.print_transcript(controller.messages());
                        }
                        ChatCommand::Health => match controller.backend().health().await {
                            Ok(health) if health.is_ok() => {
                                renderer.print_info(&format!("Service is {}", health.status))
                            }
                            Ok(health) => renderer
                                .print_error(&format!("Service reports {}", health.status)),
                            Err(err) => renderer.print_error(&format!("Health check failed: {err}")),
                        },
                        ChatCommand::Save(path) => match controller.save_transcript_to(&path) {
                            Ok(_) => renderer.print_info(&format!("Transcript saved to {}", path)),
                            Err(err) => {
                                renderer.print_error(&format!("Failed to save transcript: {}", err))
                            }
                        },
                        ChatCommand::Stats => print_stats(&controller),
                        ChatCommand::ShowConfig => print_config(&config),
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                renderer.print_label(MessageRole::Assistant);
                let outcome = tokio::select! {
                    outcome = controller.send(line, &mut renderer) => Some(outcome),
                    _ = tokio::signal::ctrl_c() => None,
                };
                match outcome {
                    Some(SendOutcome::NoBody) => renderer.print_info("(no response)"),
                    Some(_) => {}
                    None => renderer.print_info("Interrupted."),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragchat=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_stats<B: ChatBackend>(controller: &ChatController<B>) {
    let stats = controller.stats();
    println!("    Session Statistics:");
    println!("      Session: {}", stats.session_id);
    println!(
        "      Messages: {} ({} from you, {} from the assistant)",
        stats.message_count, stats.user_messages, stats.assistant_messages
    );
    println!(
        "      Exchanges: {} ({} failed)",
        stats.exchanges, stats.failures
    );
    println!(
        "      History loaded: {}",
        if stats.hydrated { "yes" } else { "no" }
    );
}

fn print_config(config: &ChatConfig) {
    println!("    Current Configuration:");
    println!("      Service: {}", config.base_url);
    match config.state_path {
        Some(ref path) => println!("      State file: {}", path.display()),
        None => println!("      State file: (in memory)"),
    }
    match config.timeout {
        Some(timeout) => println!("      Timeout: {}s", timeout.as_secs()),
        None => println!("      Timeout: (none)"),
    }
    println!(
        "      Color: {}",
        if config.use_color { "on" } else { "off" }
    );
}
