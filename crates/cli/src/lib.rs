pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "nomorejokes",
    about = "NoMoreJokes operator CLI",
    long_about = "Inspect configuration, check publishing readiness, and generate articles without the chat layer.",
    after_help = "Examples:\n  nomorejokes doctor --json\n  nomorejokes config\n  nomorejokes generate \"Mars rover finds water\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, publishing paths, and Telegram connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Generate and publish one article for a topic")]
    Generate {
        #[arg(required = true, num_args = 1.., help = "Headline or topic to write about")]
        topic: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Generate { topic } => commands::generate::run(&topic.join(" ")),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
