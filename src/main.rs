use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use college_admission_assistant::api::{self, AppState};
use college_admission_assistant::commands::CommandHandler;
use college_admission_assistant::config::AppConfig;
use college_admission_assistant::llm::{ExplanationService, SemanticSearch};
use college_admission_assistant::providers::traits::CompletionProvider;
use college_admission_assistant::providers::GroqProvider;
use college_admission_assistant::{build_index, Catalog};
use dotenv::dotenv;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serve the HTTP API instead of the interactive prompt
    #[arg(long)]
    api: bool,

    #[arg(long)]
    port: Option<u16>,

    /// JSON catalog to load instead of the bundled one
    #[arg(long)]
    colleges: Option<PathBuf>,

    /// Never call the language model; use rule-based explanations
    #[arg(long)]
    no_ai: bool,
}

struct Services {
    catalog: Arc<Catalog>,
    explainer: Arc<ExplanationService>,
    chat: Option<Arc<dyn CompletionProvider>>,
    state: AppState,
}

fn build_services(args: &Args, config: &AppConfig) -> Result<Services> {
    let colleges_path = args.colleges.clone().or_else(|| config.colleges_path.clone());
    let catalog = match &colleges_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("Failed to load colleges from {}", path.display()))?,
        None => Catalog::bundled().context("Failed to load bundled colleges")?,
    };
    let catalog = Arc::new(catalog);

    let store = Arc::new(build_index(catalog.colleges()));
    log::info!(
        "Vector store built with {} colleges ({} terms)",
        store.len(),
        store.vocabulary().len()
    );

    let groq = match (&config.provider.api_key, args.no_ai) {
        (Some(api_key), false) => Some(GroqProvider::new(api_key.clone(), &config.provider)),
        (None, false) => {
            log::warn!("GROQ_API_KEY not set, explanations will be rule-based");
            None
        }
        (_, true) => None,
    };

    let explain_provider = groq
        .clone()
        .map(|p| Arc::new(p) as Arc<dyn CompletionProvider>);
    let chat_provider = groq.map(|p| {
        Arc::new(p.with_max_tokens(config.provider.chat_max_tokens)) as Arc<dyn CompletionProvider>
    });

    let explainer = Arc::new(ExplanationService::new(
        explain_provider,
        SemanticSearch::new(store.clone()),
    ));
    let state = AppState::new(catalog.clone(), store, explainer.clone(), chat_provider.clone());

    Ok(Services {
        catalog,
        explainer,
        chat: chat_provider,
        state,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;
    let services = build_services(&args, &config)?;
    if let Some(provider) = &services.chat {
        log::info!("Language model: {}", provider.get_model_info().await?);
    }

    if args.api {
        run_api_server(args.port.unwrap_or(config.port), services).await
    } else {
        run_cli_mode(services).await
    }
}

async fn run_cli_mode(services: Services) -> Result<()> {
    colored::control::set_override(true);

    let command_handler = CommandHandler::new(services.catalog, services.explainer);
    println!("{}", command_handler.handle_command("help").await?);

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("🎓 ") {
            Ok(line) => {
                let input = line.trim();
                if input == "exit" || input == "quit" {
                    break;
                }
                let _ = rl.add_history_entry(input);

                match command_handler.handle_command(input).await {
                    Ok(output) if !output.is_empty() => println!("{}", output),
                    Ok(_) => {}
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

async fn run_api_server(port: u16, services: Services) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = api::create_api(services.state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    log::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
