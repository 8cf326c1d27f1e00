//! `lariat chat`, the interactive conversation mode.

use std::io::Write;
use std::sync::Arc;

use lariat_config::AppConfig;
use lariat_core::{Dispatcher, LoopOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::runtime::Runtime;
use crate::sink::ConsoleSink;

pub async fn run(model: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let sink = Arc::new(ConsoleSink::new().with_label("  Assistant > "));
    let runtime = Runtime::build(config.clone(), Some(sink.clone())).await?;

    let model_name = model.as_deref().unwrap_or(&config.model.default);
    println!();
    println!("  Lariat interactive mode");
    println!();
    println!("  Backend:  {}", config.backend.base_url);
    println!(
        "  Model:    {}",
        if model_name.is_empty() {
            "(backend default)"
        } else {
            model_name
        }
    );
    println!(
        "  Tools:    browser {}, remote {}",
        on_off(config.agent.enable_browser_control),
        on_off(config.agent.enable_remote_tools),
    );
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/new' for a fresh conversation, 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }
        if input == "/new" {
            runtime.coordinator.new_conversation().await;
            println!("  Started a fresh conversation.");
            println!();
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }

        let request = runtime.request(input, model.as_deref());
        let handle = runtime.registry.start(request, sink.clone()).await;
        println!();

        match handle.join().await {
            LoopOutcome::Done { .. } | LoopOutcome::Cancelled => {}
            LoopOutcome::Failed { error, .. } => {
                eprintln!("  [Error] {error}");
            }
        }

        println!();
        print!("  You > ");
        std::io::stdout().flush()?;
    }

    let messages = runtime.history.message_count().await;
    println!();
    println!("  Goodbye! ({messages} messages this session)");
    println!();

    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
