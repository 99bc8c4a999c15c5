//! Quotesync console client.
//!
//! Keeps a local quote collection synced with a quote server and offers a
//! small line-based interface to browse and add quotes.

use quotesync_client::{build_client, Config, PromptRequest, Scheduler};
use quotesync_engine::{CategoryFilter, Decision};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  list                      show quotes under the current filter
  random                    show a random quote
  add <text> | <category>   add a quote
  categories                list categories
  filter <category|all>     change the filter
  sync                      sync now
  import <path>             merge quotes from a JSON file
  export                    print all quotes as JSON
  status                    show sync status
  quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quotesync=info,quotesync_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        server = %config.server_url,
        storage = %config.storage_dir.display(),
        "Starting quotesync"
    );

    let client = build_client(&config)?;
    let orchestrator = client.orchestrator;
    let mut prompts = match client.prompts {
        Some(prompts) => prompts,
        // No prompts in automatic mode; a closed channel never yields
        None => mpsc::channel(1).1,
    };

    let (scheduler, mut outcomes) = Scheduler::spawn(orchestrator.clone(), config.sync_period());

    if let Some(quote) = orchestrator.random_quote() {
        println!("\"{}\" - {}", quote.text, quote.category);
    }
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<PromptRequest> = None;

    loop {
        tokio::select! {
            Some(request) = prompts.recv(), if pending.is_none() => {
                print_prompt(&request);
                pending = Some(request);
            }
            Some(outcome) = outcomes.recv() => match outcome {
                Ok(report) => {
                    println!("{}", report);
                    for warning in &report.warnings {
                        println!("warning: {}", warning);
                    }
                }
                Err(e) => println!("sync failed: {}", e),
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();

                if let Some(request) = pending.take() {
                    match line.parse::<Decision>() {
                        Ok(decision) => {
                            if !request.answer(decision) {
                                println!("that sync was abandoned");
                            }
                        }
                        Err(_) => {
                            println!("answer local, server or both");
                            pending = Some(request);
                        }
                    }
                    continue;
                }

                if !run_command(line, &orchestrator, &scheduler).await {
                    break;
                }
            }
        }
    }

    scheduler.shutdown().await;
    tracing::info!("Stopped");
    Ok(())
}

fn print_prompt(request: &PromptRequest) {
    let conflict = &request.conflict;
    println!("conflict on \"{}\":", conflict.key);
    println!("  local:  \"{}\" - {}", conflict.local.text, conflict.local.category);
    println!("  server: \"{}\" - {}", conflict.server.text, conflict.server.category);
    println!("keep local, server or both?");
}

/// Run one console command; false means quit.
async fn run_command(
    line: &str,
    orchestrator: &quotesync_client::SyncOrchestrator,
    scheduler: &Scheduler,
) -> bool {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(c, r)| (c, r.trim()))
        .unwrap_or((line, ""));

    match command {
        "" => {}
        "help" => println!("{}", HELP),
        "quit" | "exit" => return false,
        "list" => {
            for quote in orchestrator.visible_quotes() {
                println!("\"{}\" - {}", quote.text, quote.category);
            }
        }
        "random" => match orchestrator.random_quote() {
            Some(quote) => println!("\"{}\" - {}", quote.text, quote.category),
            None => println!("no quotes under filter '{}'", orchestrator.filter()),
        },
        "categories" => println!("{}", orchestrator.categories().join(", ")),
        "filter" => match rest.parse::<CategoryFilter>() {
            Ok(filter) => {
                for warning in orchestrator.set_filter(filter) {
                    println!("warning: {}", warning);
                }
            }
            Err(e) => println!("{}", e),
        },
        "add" => {
            let (text, category) = rest.split_once('|').unwrap_or((rest, ""));
            match orchestrator.add_quote(text, category) {
                Ok(report) => {
                    println!("New quote added successfully!");
                    for warning in report.warnings {
                        println!("warning: {}", warning);
                    }
                }
                Err(e) => println!("{}", e),
            }
        }
        "sync" => {
            if !scheduler.trigger() {
                println!("sync is not running");
            }
        }
        "import" => match tokio::fs::read_to_string(rest).await {
            Ok(json) => match orchestrator.import_json(&json) {
                Ok(report) => println!(
                    "imported: {} added, {} replaced, {} skipped",
                    report.added, report.replaced, report.skipped
                ),
                Err(e) => println!("{}", e),
            },
            Err(e) => println!("cannot read {}: {}", rest, e),
        },
        "export" => match orchestrator.export_json() {
            Ok(json) => println!("{}", json),
            Err(e) => println!("{}", e),
        },
        "status" => {
            let state = orchestrator.sync_state();
            println!(
                "{} quotes, filter '{}', last sync {}{}",
                orchestrator.quotes().len(),
                state.last_filter,
                state
                    .last_sync
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
                if orchestrator.is_syncing() { " (syncing)" } else { "" }
            );
        }
        other => println!("unknown command '{}', type 'help'", other),
    }

    true
}
