//! cypher-qa CLI: ask a Neo4j graph questions in plain English
//!
//! Connects to Neo4j over HTTP and to the configured LLM provider, snapshots
//! the schema, and answers questions through the Text-to-Cypher repair loop.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use cypher_qa::{AttemptOutcome, LLMProvider, QaConfig, QaSession, QueryObserver, RepairReport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(name = "cypher-qa", version, about = "Ask a Neo4j graph questions in plain English")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Neo4j HTTP URL
    #[arg(long, global = true, env = "NEO4J_URL")]
    url: Option<String>,

    /// Neo4j username
    #[arg(long, global = true, env = "NEO4J_USERNAME")]
    user: Option<String>,

    /// Neo4j password
    #[arg(long, global = true, env = "NEO4J_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Neo4j database name
    #[arg(long, global = true, env = "NEO4J_DATABASE")]
    database: Option<String>,

    /// LLM API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// LLM provider
    #[arg(long, global = true)]
    provider: Option<ProviderArg>,

    /// Model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Malformed queries tolerated per question
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum ProviderArg {
    Openai,
    Ollama,
    Gemini,
}

impl From<ProviderArg> for LLMProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Openai => LLMProvider::OpenAI,
            ProviderArg::Ollama => LLMProvider::Ollama,
            ProviderArg::Gemini => LLMProvider::Gemini,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question, in plain English
        #[arg(required = true)]
        question: Vec<String>,

        /// Print every generated query and its outcome
        #[arg(long)]
        show_queries: bool,
    },
    /// Print the schema description used to ground query generation
    Schema,
    /// Start an interactive question prompt
    Shell {
        /// Print every generated query and its outcome
        #[arg(long)]
        show_queries: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints each generated query as soon as it is produced
struct ConsoleObserver;

impl QueryObserver for ConsoleObserver {
    fn query_generated(&self, attempt: u32, query: &str) {
        println!("Generated query (attempt {}):", attempt);
        println!("{}", query);
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<QaConfig> {
    let mut config = match &cli.config {
        Some(path) => QaConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => QaConfig::default(),
    };
    config.apply_env();

    if let Some(url) = &cli.url {
        config.database.url = url.clone();
    }
    if let Some(user) = &cli.user {
        config.database.username = user.clone();
    }
    if let Some(password) = &cli.password {
        config.database.password = Some(password.clone());
    }
    if let Some(database) = &cli.database {
        config.database.database = database.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.llm.api_key = Some(api_key.clone());
    }
    if let Some(provider) = &cli.provider {
        config.llm.provider = provider.clone().into();
    }
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.max_attempts = max_attempts;
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    let mut session = QaSession::connect(config)
        .await
        .context("failed to start session")?;
    session.set_query_observer(Arc::new(ConsoleObserver));
    eprintln!("Everything is connected.");

    let outcome = match &cli.command {
        Commands::Ask { question, show_queries } => {
            run_ask(&session, &question.join(" "), *show_queries).await
        }
        Commands::Schema => {
            println!("{}", session.grounding());
            Ok(())
        }
        Commands::Shell { show_queries } => run_shell(&mut session, *show_queries).await,
    };

    // The session is closed whatever happened above.
    let closed = session.close().await;
    eprintln!("Connection closed, bye!");

    outcome?;
    closed?;
    Ok(())
}

async fn run_ask(session: &QaSession, question: &str, show_queries: bool) -> anyhow::Result<()> {
    let report = session.ask_with_report(question).await?;
    if show_queries {
        print_attempts(&report);
    }

    println!();
    println!("Hi, here is your answer:");
    println!("{}", report.answer);
    println!();
    Ok(())
}

fn print_attempts(report: &RepairReport) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Query", "Outcome"]);

    for attempt in &report.attempts {
        let outcome = match &attempt.outcome {
            AttemptOutcome::Success(rows) => format!("ok, {} row(s)", rows.len()),
            AttemptOutcome::SyntaxFailure(message) => format!("syntax error: {}", message),
        };
        table.add_row(vec![attempt.number.to_string(), attempt.query.clone(), outcome]);
    }

    println!("{}", table);
}

async fn run_shell(session: &mut QaSession, show_queries: bool) -> anyhow::Result<()> {
    println!("cypher-qa interactive shell");
    println!("Ask a question, or :help for commands. :quit to exit.\n");

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        eprint!("cypher-qa> ");

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed {
            ":quit" | ":exit" | ":q" => break,
            ":help" | ":h" => {
                println!("Commands:");
                println!("  :schema   — Show the schema description");
                println!("  :refresh  — Re-read the schema from the database");
                println!("  :quit     — Exit shell");
                println!("  <text>    — Ask a question");
            }
            ":schema" => println!("{}", session.grounding()),
            ":refresh" => match session.refresh_schema().await {
                Ok(()) => println!("Schema refreshed."),
                Err(e) => eprintln!("Error: {}", e),
            },
            question => {
                if let Err(e) = run_ask(session, question, show_queries).await {
                    eprintln!("Error: {:#}", e);
                }
            }
        }
    }

    println!("Bye!");
    Ok(())
}
