mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use lexis_lib::vocabulary::{NewWord, ReviewOutcome};

#[derive(Parser)]
#[command(name = "lexis-cli", about = "Look up, review and track vocabulary", version)]
struct Cli {
    /// User whose vocabulary to work on
    #[arg(long)]
    user: i64,

    /// Config file (default: <config dir>/lexis/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Look up one word, generating and saving a definition if needed
    Lookup {
        word: String,
        /// Context tag such as "tech" or "finance"
        #[arg(long)]
        context: Option<String>,
        /// Article the word was clicked in
        #[arg(long)]
        article: Option<i64>,
    },

    /// Look up several words at once
    LookupBatch {
        #[arg(required = true)]
        words: Vec<String>,
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        article: Option<i64>,
    },

    /// Save a word with your own meaning
    Add {
        word: String,
        #[arg(long)]
        meaning: String,
        #[arg(long)]
        example: Option<String>,
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        article: Option<i64>,
    },

    /// Record the outcome of reviewing a word
    #[command(group(ArgGroup::new("outcome").required(true).args(["success", "fail"])))]
    Review {
        word_id: i64,
        /// You remembered the word
        #[arg(long)]
        success: bool,
        /// You forgot the word
        #[arg(long)]
        fail: bool,
    },

    /// Stop reviewing a word
    Retire { word_id: i64 },

    /// List words due for review
    Due,

    /// Show vocabulary statistics
    Stats,

    /// Show words added per day
    Growth {
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Remove duplicate words
    Cleanup {
        /// Clean up every user's vocabulary, not just yours
        #[arg(long)]
        all_users: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config.as_deref(), cli.user)?;

    match cli.command {
        Command::Lookup { word, context, article } => {
            commands::lookup::run(&app, &word, context.as_deref(), article, &cli.format, use_color).await?;
        }
        Command::LookupBatch { words, context, article } => {
            commands::lookup::run_batch(&app, &words, context.as_deref(), article, &cli.format, use_color)
                .await?;
        }
        Command::Add { word, meaning, example, context, article } => {
            let new_word = NewWord {
                word,
                context,
                meaning,
                example,
                article_id: article,
            };
            commands::add::run(&app, new_word, &cli.format, use_color)?;
        }
        Command::Review { word_id, success, fail: _ } => {
            let outcome = if success { ReviewOutcome::Success } else { ReviewOutcome::Fail };
            commands::review::run_review(&app, word_id, outcome, &cli.format, use_color)?;
        }
        Command::Retire { word_id } => {
            commands::review::run_retire(&app, word_id, &cli.format, use_color)?;
        }
        Command::Due => {
            commands::due::run(&app, &cli.format, use_color)?;
        }
        Command::Stats => {
            commands::stats::run(&app, &cli.format, use_color)?;
        }
        Command::Growth { days } => {
            commands::stats::run_growth(&app, days, &cli.format, use_color)?;
        }
        Command::Cleanup { all_users } => {
            commands::cleanup::run(&app, all_users, &cli.format, use_color)?;
        }
    }

    // Let lookup backfills land before the runtime shuts down
    app.service.flush().await;

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
