//! ParamScrub CLI
//!
//! CLI tool for compiling removeparam filter lists and stripping tracking
//! parameters from text.

mod config;
mod fetch;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use ps_compiler::{optimize_rules, parse_filter_list, FilterCompiler};
use ps_core::{RemoverOptions, RuleStore, TrackingRemover, UpdateSummary};

use crate::config::Config;
use crate::fetch::Fetcher;

#[derive(Parser)]
#[command(name = "ps-cli")]
#[command(about = "ParamScrub filter list compiler and tracking parameter remover")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile local filter lists and report rule counts
    Compile {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Print every compiled rule
        #[arg(long)]
        dump: bool,
    },

    /// Update filters once, then clean the given texts (or stdin lines)
    Clean {
        #[command(flatten)]
        sources: SourceArgs,

        /// Texts to clean; reads stdin line by line when omitted
        text: Vec<String>,
    },

    /// Keep filters updated periodically while cleaning stdin lines
    Watch {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Filter list URL or path (repeatable)
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Stop scanning a message at the first URL no rule changes
    #[arg(long)]
    parity: bool,
}

impl SourceArgs {
    fn config(&self) -> Result<Config> {
        Config::resolve(self.config.as_deref(), &self.filters)
    }

    fn remover_options(&self) -> RemoverOptions {
        RemoverOptions {
            stop_at_first_untouched: self.parity,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            input,
            verbose,
            dump,
        } => cmd_compile(&input, verbose, dump),
        Commands::Clean { sources, text } => cmd_clean(&sources, &text).await,
        Commands::Watch { sources } => cmd_watch(&sources).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_compile(inputs: &[String], verbose: bool, dump: bool) -> Result<()> {
    if inputs.is_empty() {
        return Err(anyhow!("No input files specified"));
    }

    let start = Instant::now();
    let mut all_rules = Vec::new();
    let mut total_lines = 0usize;

    for (list_id, path) in inputs.iter().enumerate() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path))?;

        let line_count = content.lines().count();
        total_lines += line_count;

        let rules = parse_filter_list(&content);

        if verbose {
            println!(
                "  [{}] {} - {} lines, {} rules",
                list_id,
                Path::new(path).file_name().unwrap_or_default().to_string_lossy(),
                line_count,
                rules.len()
            );
        }

        all_rules.extend(rules);
    }

    let parse_time = start.elapsed();
    let stats = optimize_rules(&mut all_rules);

    if dump {
        let mut out = io::stdout().lock();
        for rule in &all_rules {
            writeln!(out, "{rule}")?;
        }
    }

    println!("Compiled {} filter lists", inputs.len());
    println!("  Lines:    {}", total_lines);
    println!("  Rules:    {} -> {} (dedupe removed {})", stats.before, stats.after, stats.deduped);
    println!("  Time:     {:.1}ms", parse_time.as_secs_f64() * 1000.0);

    Ok(())
}

async fn cmd_clean(args: &SourceArgs, texts: &[String]) -> Result<()> {
    let config = args.config()?;
    let store = Arc::new(RuleStore::new());
    let cancel = Arc::new(AtomicBool::new(false));
    let fetcher = Fetcher::new(&config.cache_dir)?;

    update_filters(&fetcher, &config, &store, &cancel).await?;

    let remover = TrackingRemover::new(store).options(args.remover_options());

    if !texts.is_empty() {
        for text in texts {
            println!("{}", remover.remove_tracking(text).text);
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        println!("{}", remover.remove_tracking(&line).text);
    }

    Ok(())
}

async fn cmd_watch(args: &SourceArgs) -> Result<()> {
    let config = args.config()?;
    let store = Arc::new(RuleStore::new());
    let cancel = Arc::new(AtomicBool::new(false));
    let fetcher = Fetcher::new(&config.cache_dir)?;

    log::info!("Starting filter updater, period {}h", config.update_period_hours);
    update_filters(&fetcher, &config, &store, &cancel).await?;

    let updater = {
        let store = Arc::clone(&store);
        let cancel = Arc::clone(&cancel);
        let config = config.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.update_period());
            // The first tick completes immediately; the initial update already ran.
            interval.tick().await;
            loop {
                interval.tick().await;
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                log::info!("Updating filters");
                if let Err(e) = update_filters(&fetcher, &config, &store, &cancel).await {
                    log::error!("Failed to update filters: {e:#}");
                }
            }
        })
    };

    let remover = TrackingRemover::new(store).options(args.remover_options());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    let cleaned = remover.remove_tracking(&line);
                    if cleaned.changed {
                        log::info!("Removed tracking from message");
                    }
                    println!("{}", cleaned.text);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, stopping");
                break;
            }
        }
    }

    cancel.store(true, Ordering::Relaxed);
    updater.abort();
    log::info!("Stopping filter updater");
    Ok(())
}

/// Fetch every configured source, then compile changed ones into `store`.
async fn update_filters(
    fetcher: &Fetcher,
    config: &Config,
    store: &Arc<RuleStore>,
    cancel: &Arc<AtomicBool>,
) -> Result<UpdateSummary> {
    log::info!("Updating filters:\n\t{}", config.filters.join("\n\t"));
    let start = Instant::now();

    let sources = fetcher.fetch_all(&config.filters).await;

    let store = Arc::clone(store);
    let cancel = Arc::clone(cancel);
    let summary = tokio::task::spawn_blocking(move || {
        store.update_all(&FilterCompiler::new(), sources, &cancel)
    })
    .await
    .context("Filter compilation task failed")??;

    log::info!(
        "Update finished in {:.1}ms: {} rules from {} sources",
        start.elapsed().as_secs_f64() * 1000.0,
        summary.total_rules,
        summary.sources
    );
    Ok(summary)
}
