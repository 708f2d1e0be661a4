//! tbl - Team-Based Learning exercise chat

mod actions;
mod commands;
mod config;
mod ui;
mod utils;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tbl_ai::providers::OpenAIProvider;
use tbl_session::{ExerciseCatalog, SessionController};
use tracing_subscriber::EnvFilter;

use actions::Feedback;
use commands::{CommandResult, ExerciseCommand, ModelCommand};
use utils::{format_turn_summary, truncate_chars};

/// tbl - chat with an AI assistant through Team-Based Learning exercises
#[derive(Parser, Debug)]
#[command(name = "tbl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o-mini-2024-07-18)
    #[arg(short, long)]
    model: Option<String>,

    /// Directory of exercise prompts (default: systemmessages)
    #[arg(short, long)]
    prompts_dir: Option<PathBuf>,

    /// Directory that saved conversations are written to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Exercise to load at startup
    #[arg(short, long)]
    exercise: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// List available exercises and exit
    #[arg(long)]
    list_exercises: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

fn init_tracing(verbose: bool, use_tui: bool) {
    if !verbose {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tbl=debug"));

    // The TUI owns the terminal, so log to a file instead
    if use_tui {
        let dir = config::log_dir();
        let file = std::fs::create_dir_all(&dir)
            .and_then(|()| std::fs::File::create(dir.join("tbl.log")));
        match file {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            Err(e) => eprintln!("Warning: Could not open log file: {}", e),
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file
    let cfg = config::Config::load();

    let use_tui = !args.no_tui && cfg.tui.unwrap_or(true);
    init_tracing(args.verbose, use_tui);

    // Merge config with CLI args (CLI takes precedence)
    let prompts_dir = args
        .prompts_dir
        .as_deref()
        .map(config::expand_tilde)
        .unwrap_or_else(|| cfg.prompts_dir());
    let export_dir = args
        .export_dir
        .as_deref()
        .map(config::expand_tilde)
        .unwrap_or_else(|| cfg.export_dir());
    let catalog = ExerciseCatalog::new(&prompts_dir);

    // List exercises and exit
    if args.list_exercises {
        let exercises = catalog.list_exercises();
        if exercises.is_empty() {
            println!("No exercises available in {}", prompts_dir.display());
        } else {
            for name in exercises {
                println!("{}", name);
            }
        }
        return Ok(());
    }

    let Some(api_key) = cfg.api_key() else {
        eprintln!("Error: No OpenAI API key found");
        eprintln!();
        eprintln!("Set your API key with: export OPENAI_API_KEY=your-key");
        eprintln!("Or add it to config file: tbl --init-config");
        std::process::exit(1);
    };

    let mut provider = OpenAIProvider::new(api_key);
    if let Some(ref base_url) = cfg.base_url {
        provider = provider.with_base_url(base_url);
    }
    if let Some(timeout) = cfg.request_timeout() {
        provider = provider.with_timeout(timeout)?;
    }
    tracing::debug!(base_url = provider.base_url(), "Using completion endpoint");

    let session_config = cfg.session_config(args.model);
    let mut controller = SessionController::new(catalog, Arc::new(provider), session_config);

    if let Some(ref exercise) = args.exercise {
        match actions::select_exercise(&mut controller, exercise) {
            Feedback::Error(text) => {
                eprintln!("Error: {}", text);
                std::process::exit(1);
            }
            feedback => tracing::info!("{}", feedback.text()),
        }
    }

    // TUI mode
    if use_tui {
        return ui::run_tui(&mut controller, export_dir).await;
    }

    // Interactive mode (simple stdin/stdout)
    run_interactive(&mut controller, &export_dir).await
}

fn print_feedback(feedback: Feedback) {
    match feedback {
        Feedback::Info(text) => println!("{}", text),
        Feedback::Warning(text) => println!("Warning: {}", text),
        Feedback::Error(text) => eprintln!("Error: {}", text),
    }
}

/// Line mode: one message per line, slash commands for everything else
async fn run_interactive(controller: &mut SessionController, export_dir: &Path) -> anyhow::Result<()> {
    use std::io::{self, Write};

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!(
            "tbl ({}) exercise: {}",
            controller.model(),
            controller.current_exercise().unwrap_or("none")
        );
        if controller.current_exercise().is_none() {
            eprintln!(
                "{}",
                ExerciseCommand::list_exercises_text(None, &controller.list_exercises())
            );
        }
        eprintln!("Type /help for available commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if input.starts_with('/') {
            let models = controller.models().to_vec();
            let exercises = controller.list_exercises();
            let Some(result) = commands::execute_command(input, &models, &exercises) else {
                continue;
            };

            let feedback = match result {
                CommandResult::Exit => break,
                CommandResult::Message(msg) => Feedback::Info(msg),
                CommandResult::Clear => actions::clear(controller),
                CommandResult::Save => actions::save(controller, export_dir),
                CommandResult::ShowCost => actions::show_cost(controller),
                CommandResult::OpenExerciseSelector => Feedback::Info(
                    ExerciseCommand::list_exercises_text(controller.current_exercise(), &exercises),
                ),
                CommandResult::SelectExercise(name) => {
                    match actions::select_exercise(controller, &name) {
                        Feedback::Warning(question) => Feedback::Info(format!(
                            "{}\nAnswer with /yes (save), /no (don't save) or /cancel.",
                            question
                        )),
                        other => other,
                    }
                }
                CommandResult::OpenModelSelector => Feedback::Info(ModelCommand::list_models_text(
                    controller.model(),
                    &models,
                    controller.rates(),
                )),
                CommandResult::ChangeModel(model) => actions::change_model(controller, &model),
                CommandResult::ConfirmSwitch { save } => {
                    actions::confirm_switch(controller, save, export_dir)
                }
                CommandResult::CancelSwitch => actions::cancel_switch(controller),
                CommandResult::Unknown(cmd) => Feedback::Warning(format!(
                    "Unknown command: /{}\nType /help for available commands.",
                    cmd
                )),
            };
            print_feedback(feedback);
            continue;
        }

        if !controller.can_submit() {
            let error = if controller.current_exercise().is_none() {
                tbl_session::SessionError::NoExerciseSelected
            } else {
                tbl_session::SessionError::ConfirmationPending
            };
            print_feedback(actions::submit_error(&error));
            continue;
        }

        tracing::debug!(text = %truncate_chars(input, 60), "Submitting message");
        match controller.submit(input).await {
            Ok(outcome) => {
                println!("\n{}\n", outcome.reply);
                println!(
                    "{}",
                    format_turn_summary(&outcome.usage, outcome.cost, controller.accumulated_cost())
                );
            }
            Err(e) => print_feedback(actions::submit_error(&e)),
        }
    }

    Ok(())
}
