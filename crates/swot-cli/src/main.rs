//! Swot CLI
//!
//! Main entry point for requesting study material from the terminal.

use std::io::{BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use swot_client::{HttpAuthProvider, HttpStudyService};
use swot_core::{
    option_letter, AuthGate, Config, HistoryEntry, MathQuestion, QuizAttempt, QuizQuestion,
    StudyMode, StudyResult, StudySessionOrchestrator, Submission,
};
use tracing_subscriber::EnvFilter;

/// Environment variable consulted when `--email` is absent.
const EMAIL_ENV: &str = "SWOT_EMAIL";

/// Environment variable consulted when `--password` is absent.
const PASSWORD_ENV: &str = "SWOT_PASSWORD";

/// Swot - AI Study Assistant
///
/// Generates study material for any topic: a summary, a quiz, a study tip,
/// and (in math mode) a practice problem. Requires an account on the study
/// service.
#[derive(Parser, Debug)]
#[command(name = "swot")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: swot.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Base URL of the study service (overrides the config file)
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Account email (default: SWOT_EMAIL environment variable)
    #[arg(long, value_name = "EMAIL", global = true)]
    email: Option<String>,

    /// Account password (default: SWOT_PASSWORD environment variable)
    #[arg(long, value_name = "PASSWORD", global = true)]
    password: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate study material for a topic and take the quiz
    Study {
        /// Topic to study
        #[arg(value_name = "TOPIC")]
        topic: String,

        /// Use math mode (adds a practice problem)
        #[arg(long)]
        math: bool,
    },

    /// List past study requests
    History,

    /// Delete the entire study history
    ClearHistory,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing subscriber with appropriate filter
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs the selected command end to end: load config, authenticate, execute.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI argument overrides
    if let Some(ref base_url) = args.base_url {
        config.api_base_url.clone_from(base_url);
    }

    // Re-validate after overrides
    config.validate()?;
    tracing::debug!(base_url = %config.api_base_url, "Configuration loaded");

    let (email, password) = resolve_credentials(&args)?;

    let provider = Arc::new(HttpAuthProvider::new(&config)?);
    let gate = Arc::new(AuthGate::new(provider));
    let service = Arc::new(HttpStudyService::new(&config)?);
    let orchestrator = StudySessionOrchestrator::new(gate, service);

    let outcome = orchestrator.login(&email, &password).await;
    if !outcome.success {
        anyhow::bail!(
            "Login failed: {}",
            outcome.error.as_deref().unwrap_or("unknown reason")
        );
    }
    if let Some(user) = &outcome.user {
        println!("Logged in as {} <{}>", user.name, user.email);
    }

    match args.command {
        Command::Study { topic, math } => {
            let mode = if math {
                StudyMode::Math
            } else {
                StudyMode::Normal
            };
            run_study(&orchestrator, &topic, mode).await
        }
        Command::History => run_history(&orchestrator).await,
        Command::ClearHistory => run_clear_history(&orchestrator).await,
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Resolves the account credentials from flags or the environment.
fn resolve_credentials(args: &Args) -> anyhow::Result<(String, String)> {
    let email = args
        .email
        .clone()
        .or_else(|| std::env::var(EMAIL_ENV).ok())
        .ok_or_else(|| {
            anyhow::anyhow!("No account email\n\nSuggestion: Pass --email or set {EMAIL_ENV}")
        })?;
    let password = args
        .password
        .clone()
        .or_else(|| std::env::var(PASSWORD_ENV).ok())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No account password\n\nSuggestion: Pass --password or set {PASSWORD_ENV}"
            )
        })?;
    Ok((email, password))
}

// ============================================================================
// Study command
// ============================================================================

/// Requests material for the topic, prints it, then runs the quiz.
async fn run_study(
    orchestrator: &StudySessionOrchestrator,
    topic: &str,
    mode: StudyMode,
) -> anyhow::Result<()> {
    println!();
    println!("Generating study material for '{topic}'...");

    let submission = orchestrator
        .submit(topic, mode)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.message()))?;

    let result = match submission {
        Submission::Completed(result) => result,
        // A single-submission CLI run cannot be superseded.
        Submission::Superseded => return Ok(()),
    };

    print_study_result(&result);

    if !result.quiz.is_empty() {
        run_quiz(&result.quiz)?;
    }
    if let Some(math) = &result.math_question {
        run_math_question(math)?;
    }

    Ok(())
}

/// Prints the summary, study tip, and further-reading link.
fn print_study_result(result: &StudyResult) {
    println!();
    println!("=== {} ===", result.topic);
    for (i, point) in result.summary.iter().enumerate() {
        println!("  {}. {point}", i + 1);
    }

    println!();
    println!("Study tip: {}", result.study_tip);

    if let Some(url) = &result.wikipedia_url {
        println!("Further reading: {url}");
    }
}

/// Runs the interactive quiz until the user declines a retry.
fn run_quiz(quiz: &[QuizQuestion]) -> anyhow::Result<()> {
    let mut attempt = QuizAttempt::new();

    loop {
        for (index, question) in quiz.iter().enumerate() {
            println!();
            println!("Question {}: {}", index + 1, question.question);
            for (position, option) in question.options.iter().enumerate() {
                let letter = option_letter(position).unwrap_or('?');
                println!("  {letter}. {option}");
            }

            let letter = read_option_letter(question.options.len())?;
            attempt.select(index, letter.to_string());
        }

        // Every question has an answer at this point, so submission succeeds.
        let Some(score) = attempt.submit(quiz) else {
            continue;
        };
        println!();
        println!("Score: {} / {}", score.correct, score.total);

        let again = prompt("Try again? [y/N] ")?;
        if !again.trim().eq_ignore_ascii_case("y") {
            return Ok(());
        }
        attempt.reset();
    }
}

/// Prompts until the user enters a letter that names one of the options.
fn read_option_letter(option_count: usize) -> anyhow::Result<char> {
    loop {
        let input = prompt("Your answer: ")?;
        let Some(letter) = input.trim().chars().next().map(|c| c.to_ascii_uppercase()) else {
            continue;
        };

        let in_range = option_letter(option_count.saturating_sub(1))
            .is_some_and(|last| letter.is_ascii_uppercase() && letter <= last);
        if in_range {
            return Ok(letter);
        }
        println!("Please answer with one of the option letters.");
    }
}

/// Poses the math practice problem and reveals the explanation.
fn run_math_question(math: &MathQuestion) -> anyhow::Result<()> {
    println!();
    println!("Practice problem: {}", math.question);
    let answer = prompt("Your answer: ")?;

    if answer.trim() == math.answer.trim() {
        println!("Correct!");
    } else {
        println!("Not quite. The answer is {}.", math.answer);
    }
    println!("{}", math.explanation);
    Ok(())
}

// ============================================================================
// History commands
// ============================================================================

/// Prints the study history, newest formatting handled by the service order.
async fn run_history(orchestrator: &StudySessionOrchestrator) -> anyhow::Result<()> {
    let snapshot = orchestrator.snapshot().await;

    println!();
    if snapshot.history.is_empty() {
        println!("No study history yet.");
        return Ok(());
    }

    println!("Study history:");
    for entry in &snapshot.history {
        print_history_entry(entry);
    }
    Ok(())
}

fn print_history_entry(entry: &HistoryEntry) {
    let mode_suffix = match entry.mode {
        StudyMode::Math => " [math]",
        StudyMode::Normal => "",
    };
    println!(
        "  {}{mode_suffix} - {}",
        entry.topic,
        format_relative(entry.created_at, Utc::now())
    );
}

/// Deletes the entire history after an explicit confirmation.
async fn run_clear_history(orchestrator: &StudySessionOrchestrator) -> anyhow::Result<()> {
    let confirmation = prompt("Delete all study history? [y/N] ")?;
    if !confirmation.trim().eq_ignore_ascii_case("y") {
        println!("Nothing deleted.");
        return Ok(());
    }

    orchestrator
        .clear_history()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.message()))?;
    println!("History cleared.");
    Ok(())
}

/// Formats a timestamp relative to `now`, matching how recency reads best:
/// "just now", minutes, hours, days, then the plain date.
fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);

    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}

// ============================================================================
// Terminal helpers
// ============================================================================

/// Prints a prompt and reads one line from stdin.
fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
