//! Wordchain command line
//!
//! Maintains the word-chain dictionary database and answers next-word queries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::warn;

use wordchain::config::AppConfig;
use wordchain::core::batch::{parse_list, CancelToken};
use wordchain::core::flags::WordFlags;
use wordchain::core::logging;
use wordchain::core::node::{GameMode, NodeCategories};
use wordchain::core::resolver::{NodeCondition, PathOptions, ResolveRequest, Resolution, TimeBudget};
use wordchain::core::verify::HttpDictionaryVerifier;
use wordchain::core::{Dictionary, NodeMark};
use wordchain::database::Database;
use wordchain::VERSION;

#[derive(Parser, Debug)]
#[clap(name = "wordchain", version, about = "Word-chain dictionary engine")]
struct Cli {
    /// Configuration file. Defaults to the per-user config location.
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Dictionary database file, overriding the configured location.
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add the newline-delimited words in FILE.
    AddWords {
        file: PathBuf,
        /// Minimum flag bits every word is added with.
        #[clap(long, default_value_t = 0)]
        flags: u16,
        /// Skip words the online dictionary does not know.
        #[clap(long)]
        verify: bool,
    },

    /// Remove the newline-delimited words in FILE.
    RemoveWords { file: PathBuf },

    /// Register the newline-delimited nodes in FILE.
    AddNodes {
        file: PathBuf,
        /// Comma-separated categories, e.g. `end,reverse_attack`, or `all`.
        #[clap(long)]
        categories: NodeCategories,
    },

    /// Deregister the newline-delimited nodes in FILE.
    RemoveNodes {
        file: PathBuf,
        #[clap(long)]
        categories: NodeCategories,
    },

    /// Find the best word starting from NODE.
    Find {
        node: String,
        #[clap(long)]
        mode: Option<GameMode>,
        /// Mission character to maximise.
        #[clap(long)]
        mission: Option<char>,
        /// Words that must not be suggested.
        #[clap(long)]
        exclude: Vec<String>,
        /// Remaining turn time in milliseconds.
        #[clap(long)]
        remaining_ms: Option<u64>,
        /// Typing delay per character; overrides the configured value.
        #[clap(long)]
        delay_ms: Option<u64>,
        /// Do not also accept the initial-sound-law form of NODE.
        #[clap(long)]
        no_initial_law: bool,
    },

    /// Re-mark the tail node of WORD.
    Mark {
        word: String,
        #[clap(long)]
        mode: Option<GameMode>,
        #[clap(long = "as", value_enum)]
        mark: MarkArg,
    },

    /// Deduplicate, drop unplayable words and repair derived columns.
    Check {
        /// Also drop words the online dictionary does not know.
        #[clap(long)]
        verify: bool,
    },

    /// Print word and node totals.
    Stats,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MarkArg {
    End,
    Attack,
    Normal,
}

impl From<MarkArg> for NodeMark {
    fn from(mark: MarkArg) -> Self {
        match mark {
            MarkArg::End => NodeMark::End,
            MarkArg::Attack => NodeMark::Attack,
            MarkArg::Normal => NodeMark::Normal,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_list(file: &PathBuf) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(parse_list(&content))
}

async fn open_dictionary(cli: &Cli, config: &AppConfig) -> Result<Dictionary> {
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    let db = Database::open(&db_path, config.database.max_connections)
        .await
        .with_context(|| format!("opening {}", db_path.display()))?;

    let mut dictionary = Dictionary::open(Arc::new(db))
        .await?
        .with_max_candidates(config.path_finder.max_candidates);

    if let Some(base_url) = &config.verification.base_url {
        let verifier = HttpDictionaryVerifier::new(base_url.clone(), config.verification.timeout())?;
        dictionary = dictionary.with_verifier(Arc::new(verifier), config.verification.retry_policy());
    }
    Ok(dictionary)
}

/// Cancel `token` on Ctrl-C so running jobs stop between items.
fn cancel_on_interrupt(token: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::load(),
    };

    let _log_guard = logging::init(&config.logging);
    log::info!("Wordchain v{} starting", VERSION);

    let dictionary = open_dictionary(&cli, &config).await?;
    let cancel = CancelToken::new();
    cancel_on_interrupt(cancel.clone());

    match cli.command {
        Command::AddWords { file, flags, verify } => {
            let words = read_list(&file)?;
            let count = dictionary
                .batch_add_words(&words, WordFlags::from_bits_truncate(flags), verify, &cancel)
                .await?;
            print_json(&count)?;
        }
        Command::RemoveWords { file } => {
            let words = read_list(&file)?;
            print_json(&dictionary.batch_remove_words(&words, &cancel).await?)?;
        }
        Command::AddNodes { file, categories } => {
            let nodes = read_list(&file)?;
            print_json(&dictionary.batch_add_nodes(&nodes, categories, &cancel).await?)?;
        }
        Command::RemoveNodes { file, categories } => {
            let nodes = read_list(&file)?;
            print_json(&dictionary.batch_remove_nodes(&nodes, categories, &cancel).await?)?;
        }
        Command::Find {
            node,
            mode,
            mission,
            exclude,
            remaining_ms,
            delay_ms,
            no_initial_law,
        } => {
            let finder = &config.path_finder;
            let condition = if no_initial_law {
                NodeCondition::new(node.trim())
            } else {
                NodeCondition::with_initial_law(node.trim())
            };
            let mut request = ResolveRequest::new(condition, mode.unwrap_or(finder.mode))
                .with_preference(finder.preference.clone())
                .with_options(PathOptions {
                    manual_search: remaining_ms.is_none(),
                    ..finder.options()
                })
                .with_mission(mission)
                .exclude(exclude);
            if let (Some(remaining), Some(delay)) = (remaining_ms, delay_ms.or(finder.delay_per_char_ms)) {
                request = request.with_budget(TimeBudget {
                    remaining: Duration::from_millis(remaining),
                    per_char_delay: Duration::from_millis(delay),
                });
            }

            match dictionary.resolve(&request).await {
                Resolution::Found(path) => print_json(&path)?,
                Resolution::NotFound(report) if report.is_time_limited() => {
                    bail!("no word fits the remaining time ({} candidates seen)", report.candidates_seen)
                }
                Resolution::NotFound(_) => bail!("no word found for {}", request.condition.node),
                Resolution::Error(e) => return Err(e.into()),
            }
        }
        Command::Mark { word, mode, mark } => {
            let mode = mode.unwrap_or(config.path_finder.mode);
            let changed = dictionary.mark_node(&word, mode, mark.into()).await?;
            println!("{}", if changed { "updated" } else { "unchanged" });
        }
        Command::Check { verify } => {
            print_json(&dictionary.check_integrity(verify, &cancel).await?)?;
        }
        Command::Stats => {
            print_json(&dictionary.stats().await?)?;
        }
    }

    Ok(())
}
