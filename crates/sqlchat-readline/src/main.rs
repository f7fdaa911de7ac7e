use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing_subscriber::EnvFilter;

use sqlchat_application::{SessionContext, SessionSettings, TurnOutcome};
use sqlchat_core::{Conversation, Role};
use sqlchat_infrastructure::config_service::{ENV_DB_PASSWORD, env_lookup};
use sqlchat_infrastructure::{
    ConnectionOverrides, PgDatabase, load_app_config, load_secrets, resolve_connection,
};
use sqlchat_interaction::OpenAiCompletion;

mod helper;

use helper::{CliHelper, PasswordHelper};

#[derive(Parser, Debug)]
#[command(name = "sqlchat")]
#[command(version, about = "Ask questions about a SQL database in plain language", long_about = None)]
struct Args {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to secret.json (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    secrets: Option<PathBuf>,

    /// Database host
    #[arg(long)]
    host: Option<String>,

    /// Database port
    #[arg(long)]
    port: Option<u16>,

    /// Database user
    #[arg(long)]
    user: Option<String>,

    /// Database or service name
    #[arg(long)]
    service_name: Option<String>,

    /// Print the generated SQL above each answer
    #[arg(long)]
    show_sql: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format!("Error: {err:#}").red());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = load_app_config(args.config.as_deref())?;
    let secrets = load_secrets(args.secrets.as_deref())?;

    let mut overrides = ConnectionOverrides {
        host: args.host,
        port: args.port,
        user: args.user,
        password: None,
        service_name: args.service_name,
    };
    if env_lookup(ENV_DB_PASSWORD).is_none() {
        overrides.password = Some(prompt_password()?);
    }
    let descriptor = resolve_connection(&config.database, overrides, env_lookup)?;

    println!(
        "{}",
        format!("Connecting to {}...", descriptor.display_target()).bright_black()
    );
    let database = PgDatabase::connect(&descriptor).await?;
    let completion = OpenAiCompletion::from_config(&config.completion, &secrets)
        .context("completion service is not configured")?;
    tracing::info!(model = completion.model(), database = database.target(), "ready");

    let session = SessionContext::new(
        Arc::new(database),
        Arc::new(completion),
        SessionSettings::from_prompt_config(&config.prompt),
    )?;

    repl(session, args.show_sql).await
}

fn prompt_password() -> Result<String> {
    let mut rl: Editor<PasswordHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(PasswordHelper));
    let password = rl
        .readline("Database password: ")
        .context("database password was not entered")?;
    Ok(password)
}

async fn repl(mut session: SessionContext, show_sql: bool) -> Result<()> {
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== sqlchat ===".bright_magenta().bold());
    println!(
        "{}",
        "Ask a question, say 'generate report' for a summary, or use /history /schema /clear /quit."
            .bright_black()
    );
    println!();
    print_transcript(session.conversation());

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match input {
                    "/quit" | "/exit" => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    "/history" => print_transcript(session.conversation()),
                    "/schema" => match session.schema_snapshot().await {
                        Ok(schema) => println!("{}", schema.bright_black()),
                        Err(err) => eprintln!("{}", err.to_string().red()),
                    },
                    "/clear" => {
                        session.reset();
                        println!("{}", "Conversation cleared.".bright_black());
                        print_transcript(session.conversation());
                    }
                    command if command.starts_with('/') => {
                        println!("{}", format!("Unknown command: {command}").bright_black());
                    }
                    question => {
                        let outcome = session.ask(question).await;
                        print_outcome(&outcome, show_sql);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    session.close().await;
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome, show_sql: bool) {
    match outcome {
        TurnOutcome::Ignored => {}
        TurnOutcome::Answered { sql, answer } => {
            if show_sql {
                println!("{}", sql.dimmed());
            }
            print_assistant(answer);
        }
        TurnOutcome::Report { report } => print_assistant(report),
        TurnOutcome::Failed { notice } => println!("{}", notice.yellow()),
    }
    println!();
}

fn print_assistant(text: &str) {
    for line in text.lines() {
        println!("{}", line.bright_blue());
    }
}

fn print_transcript(conversation: &Conversation) {
    for turn in conversation.turns() {
        let label = format!("{}:", turn.role());
        match turn.role() {
            Role::User => println!("{} {}", label.green(), turn.text()),
            Role::Assistant => println!("{} {}", label.bright_magenta(), turn.text().bright_blue()),
        }
    }
}
