//! chatsift command-line entrypoint.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;

use chatsift::config::Config;
use chatsift::dispatch::{Dispatcher, ProgressFn};
use chatsift::report::{AnalysisInfo, AnalysisReport, BlockResult, MessagePreview};
use chatsift::transcript::{Chunk, Message, filter_recent, load_transcript, sliding_windows};
use chatsift::usage::{CostEstimate, ModelPricing};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(
    name = "chatsift",
    version,
    about = "Score chat transcript windows against a criterion with an LLM"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score every window of a transcript and save a report
    Analyze(AnalyzeArgs),
    /// List blocks of a saved report at or above a match rate
    Search(SearchArgs),
    /// Print the match-rate distribution of a saved report
    Stats(StatsArgs),
    /// Print one block of a saved report
    Detail(DetailArgs),
    /// Estimate tokens and cost before running `analyze`
    Estimate(EstimateArgs),
    /// List the per-model price table
    Pricing,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Concurrent requests
    #[arg(long)]
    workers: Option<usize>,

    /// Attempts per window before giving up
    #[arg(long)]
    max_retries: Option<u32>,

    /// Disable the request cache
    #[arg(long)]
    no_cache: bool,

    /// Report path (default: analysis_results_<timestamp>.json)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// Transcript selection and windowing shared by `analyze` and `estimate`.
#[derive(Args, Debug)]
struct InputArgs {
    /// Transcript file: `.csv` with Date,User,Message columns, or a JSON array
    transcript: PathBuf,

    /// What to look for, in plain language
    criterion: String,

    /// Messages per window
    #[arg(long)]
    window_size: Option<usize>,

    /// Messages shared by consecutive windows
    #[arg(long)]
    overlap: Option<usize>,

    /// Provider model id
    #[arg(long)]
    model: Option<String>,

    /// Only keep messages from the last N days
    #[arg(long, short = 'd')]
    recent_days: Option<u32>,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Report produced by `analyze`
    report: PathBuf,
}

#[derive(Args, Debug)]
struct DetailArgs {
    /// Report produced by `analyze`
    report: PathBuf,

    /// 1-based block id
    block_id: usize,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Report produced by `analyze`
    report: PathBuf,

    /// Minimum match rate (0-100)
    threshold: f64,

    /// Show only the N best blocks
    #[arg(long)]
    top: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Analyze(args) => analyze(args).await,
        Command::Search(args) => search(args),
        Command::Stats(args) => stats(args),
        Command::Detail(args) => detail(args),
        Command::Estimate(args) => estimate(args),
        Command::Pricing => {
            pricing();
            Ok(())
        }
    }
}

fn apply_input_overrides(mut config: Config, args: &InputArgs) -> Config {
    if let Some(size) = args.window_size {
        config.window_size = size;
    }
    if let Some(overlap) = args.overlap {
        config.window_overlap = overlap;
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    config
}

fn apply_overrides(config: Config, args: &AnalyzeArgs) -> Config {
    let mut config = apply_input_overrides(config, &args.input);
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(retries) = args.max_retries {
        config.max_retries = retries;
    }
    if args.no_cache {
        config.cache_enabled = false;
    }
    config
}

/// Loads, date-filters and windows the transcript named by `args`.
fn prepare(config: &Config, args: &InputArgs) -> anyhow::Result<(Vec<Message>, Vec<Chunk>)> {
    let mut messages = load_transcript(&args.transcript)
        .with_context(|| format!("loading {}", args.transcript.display()))?;
    if let Some(days) = args.recent_days {
        let now = chrono::Local::now().naive_local();
        messages = filter_recent(messages, days, now);
        if messages.is_empty() {
            anyhow::bail!("no messages from the last {days} days");
        }
    }

    let window = config.window_config();
    let chunks = sliding_windows(&messages, &window)?;
    if chunks.is_empty() {
        anyhow::bail!(
            "{} messages yield no window of at least {} messages",
            messages.len(),
            window.min_messages
        );
    }
    Ok((messages, chunks))
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = apply_overrides(Config::from_env()?, &args);
    config.validate()?;

    let (messages, chunks) = prepare(&config, &args.input)?;
    let window = config.window_config();
    let criterion = &args.input.criterion;

    tracing::info!(
        messages = messages.len(),
        windows = chunks.len(),
        model = %config.model,
        workers = config.workers,
        "Analysis starting"
    );

    let dispatcher = Dispatcher::genai(config.dispatcher_config());

    let progress: ProgressFn = Arc::new(|done, total, score| {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r[{done}/{total}] last score {score:>5.1}");
        if done == total {
            let _ = writeln!(stderr);
        }
    });
    let results = dispatcher
        .run_batch_with_progress(&chunks, criterion, Some(progress))
        .await;

    let info = AnalysisInfo::new(criterion, &config.model, &window, messages.len());
    let report = AnalysisReport::from_batch(info, &chunks, &results, dispatcher.usage())?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(report.default_file_name()));
    report.save(&path)?;

    print_summary(&report);
    println!("\nTop matches:");
    for block in report.top_matches(5) {
        print_block(block);
    }
    println!("\nReport saved to {}", path.display());
    println!(
        "Search it with: chatsift search {} <threshold>",
        path.display()
    );
    Ok(())
}

fn search(args: SearchArgs) -> anyhow::Result<()> {
    let report = AnalysisReport::load(&args.report)
        .with_context(|| format!("loading {}", args.report.display()))?;

    let mut hits = report.filter_by_threshold(args.threshold);
    if let Some(top) = args.top {
        hits.truncate(top);
    }

    println!(
        "Criterion: {} ({} blocks)",
        report.analysis_info.criterion, report.analysis_info.total_blocks
    );
    if hits.is_empty() {
        println!("No block reaches {:.1}%.", args.threshold);
        return Ok(());
    }
    println!("{} blocks at or above {:.1}%:\n", hits.len(), args.threshold);
    for block in hits {
        print_block(block);
    }
    Ok(())
}

fn stats(args: StatsArgs) -> anyhow::Result<()> {
    let report = AnalysisReport::load(&args.report)
        .with_context(|| format!("loading {}", args.report.display()))?;
    println!("Criterion: {}", report.analysis_info.criterion);
    print_summary(&report);
    Ok(())
}

fn detail(args: DetailArgs) -> anyhow::Result<()> {
    let report = AnalysisReport::load(&args.report)
        .with_context(|| format!("loading {}", args.report.display()))?;
    let Some(block) = report.block(args.block_id) else {
        anyhow::bail!(
            "block #{} not found ({} blocks in report)",
            args.block_id,
            report.results.len()
        );
    };

    println!("Block #{}", block.block_id);
    println!("  match rate: {:.1}%", block.match_rate);
    println!("  summary:    {}", block.summary);
    println!("  criterion:  {}", report.analysis_info.criterion);
    println!("  messages:   {}", block.message_count);
    println!("  range:      {}..{}", block.start_index, block.end_index);
    if block.failed {
        println!("  (scoring failed for this block)");
    }
    if let Some(first) = &block.first_message {
        print_preview("first", first);
    }
    if let Some(last) = &block.last_message {
        print_preview("last", last);
    }
    Ok(())
}

fn estimate(args: EstimateArgs) -> anyhow::Result<()> {
    let config = apply_input_overrides(Config::from_env()?, &args.input);
    config.validate()?;

    let (_, chunks) = prepare(&config, &args.input)?;
    let estimate = CostEstimate::for_batch(&config.model, &chunks, &args.input.criterion);

    println!("model:        {}", estimate.model);
    println!("blocks:       {}", estimate.total_blocks);
    println!(
        "tokens:       {} ({} in, {} out)",
        estimate.total_tokens(),
        estimate.total_input_tokens,
        estimate.total_output_tokens
    );
    println!("avg in/block: {}", estimate.average_input_tokens());
    println!("cost:         ${:.4}", estimate.total_cost);
    if ModelPricing::lookup(&config.model).is_none() {
        println!("(no price listed for {}; see `chatsift pricing`)", config.model);
    }
    Ok(())
}

fn pricing() {
    println!("{:<32} {:>12} {:>12}", "model", "input/1K", "output/1K");
    for (model, pricing) in ModelPricing::table() {
        println!(
            "{:<32} {:>12.5} {:>12.5}",
            model, pricing.input_per_1k, pricing.output_per_1k
        );
    }
}

fn print_preview(label: &str, preview: &MessagePreview) {
    match &preview.timestamp {
        Some(ts) => println!("  {label}: [{ts}] {}: {}", preview.speaker, preview.text),
        None => println!("  {label}: {}: {}", preview.speaker, preview.text),
    }
}

fn print_summary(report: &AnalysisReport) {
    let usage = &report.analysis_info.usage;
    println!("\n{usage}");
    if let Some(stats) = report.statistics() {
        println!(
            "blocks={} avg={:.1} max={:.1} min={:.1} >=50: {} >=75: {} failed: {}",
            stats.total_blocks,
            stats.average_match_rate,
            stats.max_match_rate,
            stats.min_match_rate,
            stats.blocks_above_50,
            stats.blocks_above_75,
            stats.failed_blocks,
        );
    }
}

fn print_block(block: &BlockResult) {
    println!(
        "#{:<4} {:>5.1}%  messages {}..{}  {}",
        block.block_id, block.match_rate, block.start_index, block.end_index, block.summary
    );
    if let Some(first) = &block.first_message {
        println!("       first: {}: {}", first.speaker, first.text);
    }
    if let Some(last) = &block.last_message {
        println!("       last:  {}: {}", last.speaker, last.text);
    }
}
