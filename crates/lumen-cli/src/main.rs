use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;

use lumen_application::{ConversationManager, QueryOrchestrator, QueryPhase, TurnOutcome};
use lumen_core::identity::IdentityStore;
use lumen_core::session::{ChatMessage, MessageRole, SessionContext};
use lumen_infrastructure::{ConfigService, FileIdentityStore};
use lumen_interaction::HttpApiClient;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Lumen - Interactive Analytical Insight Client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a query and print the result as it is revealed
    Ask { question: String },
    /// Submit a query, then follow up in a deep-dive conversation
    Chat { question: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = ConfigService::new();
    let identity_store = FileIdentityStore::new_default()?;
    let identity = identity_store.identity().await?;
    tracing::debug!(user_id = %identity.user_id, session_id = %identity.session_id, "identity resolved");

    let context = Arc::new(SessionContext::new(identity));
    let client = Arc::new(HttpApiClient::new(config.api_base_url())?);

    match cli.command {
        Commands::Ask { question } => {
            let orchestrator = Arc::new(QueryOrchestrator::new(client, Arc::clone(&context)));
            run_query(&orchestrator, &question).await?;
        }
        Commands::Chat { question } => {
            let orchestrator = Arc::new(QueryOrchestrator::new(
                client.clone(),
                Arc::clone(&context),
            ));
            run_query(&orchestrator, &question).await?;
            run_deep_dive(client, context).await?;
        }
    }

    Ok(())
}

/// Submits the question and prints each section as its reveal flag flips.
async fn run_query(orchestrator: &Arc<QueryOrchestrator>, question: &str) -> Result<()> {
    let mut updates = orchestrator.subscribe();
    let submit = {
        let orchestrator = Arc::clone(orchestrator);
        let question = question.to_string();
        tokio::spawn(async move { orchestrator.submit(&question).await })
    };

    let mut thinking_shown = false;
    let mut reasoning_shown = false;
    let mut insight_shown = false;
    let mut documents_shown = false;

    loop {
        updates.changed().await?;
        let snapshot = updates.borrow_and_update().clone();

        if snapshot.reveal.reasoning && snapshot.thinking && !thinking_shown {
            thinking_shown = true;
            println!("Thinking...");
        }

        if let Some(result) = &snapshot.result {
            if !reasoning_shown {
                reasoning_shown = true;
                println!("\nReasoning\n---------\n{}", result.reasoning);
            }
            if snapshot.reveal.insight && !insight_shown {
                insight_shown = true;
                println!(
                    "\nInsight ({}% confidence)\n-----------------------\n{}",
                    result.confidence, result.insight
                );
            }
            if snapshot.reveal.documents && !documents_shown {
                documents_shown = true;
                if !result.documents.is_empty() {
                    println!("\nDocuments\n---------");
                    for doc in &result.documents {
                        println!("- {} ({})", doc.file_name, doc.url);
                    }
                }
            }
            if snapshot.reveal.deep_dive {
                break;
            }
        }

        if snapshot.phase == QueryPhase::Failed {
            break;
        }
    }

    // Propagate a failed submission as the process outcome.
    submit.await??;
    Ok(())
}

/// Opens a deep dive on the last answer and runs a stdin turn loop.
async fn run_deep_dive(client: Arc<HttpApiClient>, context: Arc<SessionContext>) -> Result<()> {
    let manager = ConversationManager::new(client, context);
    manager.open().await?;

    println!("\nDeep Dive\n---------");
    for message in &manager.snapshot().await.messages {
        print_message(message);
    }
    println!("Ask follow-up questions; /quit ends the deep dive.");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }

        match manager.send_turn(text).await {
            Ok(TurnOutcome::Completed) => {
                let snapshot = manager.snapshot().await;
                if let Some(message) = snapshot.messages.last()
                    && message.role == MessageRole::Assistant
                {
                    print_message(message);
                }
            }
            Ok(TurnOutcome::Rejected) => {
                println!("(previous turn still pending)");
            }
            Err(e) => {
                eprintln!("Error: {}", e);
            }
        }
    }

    manager.close().await;
    Ok(())
}

fn print_message(message: &ChatMessage) {
    match message.role {
        MessageRole::User => println!("You: {}", message.content),
        MessageRole::Assistant => println!("Assistant: {}", message.content),
    }
}
