//! Lectern CLI binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use log::{LevelFilter, info, warn};

use lectern::document::ContentSource;
use lectern::engine::SearchIndex;
use lectern::engine::config::IndexConfig;
use lectern::search::SearchOptions;

/// Lectern - an embeddable full-text search engine
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct LecternArgs {
    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Index configuration as JSON
    #[arg(long, env = "LECTERN_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index the .txt and .md files under a directory and run a query
    Index(IndexArgs),
    /// Run a query against a saved index
    Search(SearchArgs),
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Directory to index
    dir: PathBuf,

    #[command(flatten)]
    query: QueryArgs,

    /// Save the index to this file
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Index file written with `index --save`
    index: PathBuf,

    #[command(flatten)]
    query: QueryArgs,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Query string
    #[arg(long)]
    query: String,

    /// Maximum matches per batch
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Time budget in milliseconds
    #[arg(long = "time-ms", default_value_t = 1000)]
    time_ms: u64,

    /// Whitespace means OR
    #[arg(long)]
    or: bool,

    /// Skip relevance scoring
    #[arg(long)]
    no_scores: bool,

    /// Similarity search; operators are plain text
    #[arg(long)]
    similar: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

impl LecternArgs {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

fn main() {
    let args = LecternArgs::parse();

    Builder::new()
        .filter_level(args.log_level())
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: LecternArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => IndexConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => IndexConfig::default(),
    };

    match args.command {
        Command::Index(index_args) => {
            let index = SearchIndex::new(config)?;
            index_directory(&index, &index_args.dir)?;
            if let Some(path) = &index_args.save {
                index
                    .save_to(path)
                    .with_context(|| format!("saving index to {}", path.display()))?;
            }
            run_query(&index, &index_args.query)
        }
        Command::Search(search_args) => {
            let index = SearchIndex::open(&search_args.index, config)
                .with_context(|| format!("opening index {}", search_args.index.display()))?;
            run_query(&index, &search_args.query)
        }
    }
}

fn index_directory(index: &SearchIndex, dir: &Path) -> Result<()> {
    let files = collect_files(dir).with_context(|| format!("walking {}", dir.display()))?;

    let pending = files
        .iter()
        .map(|path| index.add_document(ContentSource::file_with_mime(path, "text/plain")))
        .collect::<lectern::error::Result<Vec<_>>>()?;

    let mut indexed = 0;
    for (path, work) in files.iter().zip(pending) {
        match work.wait() {
            Ok(_) => indexed += 1,
            Err(e) => warn!("skipping {}: {e}", path.display()),
        }
    }
    index.flush()?;
    info!("indexed {indexed} of {} files", files.len());
    Ok(())
}

fn collect_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt" | "md")
            ) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn run_query(index: &SearchIndex, args: &QueryArgs) -> Result<()> {
    let options = SearchOptions::DEFAULT
        .with_space_means_or(args.or)
        .with_no_relevance_scores(args.no_scores)
        .with_find_similar(args.similar);

    let outcome = index
        .search(
            &args.query,
            options,
            args.limit,
            Duration::from_millis(args.time_ms),
        )?
        .collect_outcome()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    for found in &outcome.matches {
        println!("{:.4}\t{}", found.score, found.identifier);
    }
    info!(
        "{} matches, search ended {:?}",
        outcome.matches.len(),
        outcome.state
    );
    Ok(())
}
