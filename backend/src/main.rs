//! Leadgen CLI - Validate, score, deduplicate and export leads
//!
//! # Main Commands
//!
//! ```bash
//! leadgen serve                          # Start HTTP server (port 3000)
//! leadgen process leads.csv -o out.csv   # Validate → score → dedup
//! leadgen scrape --keyword fintech       # Generate mock leads
//! ```
//!
//! # Single Stages
//!
//! ```bash
//! leadgen parse leads.csv                # CSV to JSON
//! leadgen check leads.csv                # Report malformed rows
//! leadgen validate leads.json --no-mx    # Attach email flags
//! leadgen score leads.json --sort        # Attach scores
//! leadgen dedup leads.json --key domain  # Drop duplicates
//! leadgen merge leads.json               # Merge leads sharing an email
//! leadgen filter leads.json --senior     # Dashboard filters
//! leadgen stats leads.json               # Counters and tiers
//! leadgen export leads.json -o out/      # JSON to CSV
//! ```
//!
//! Inputs ending in `.json` are read as a lead array, anything else as CSV.

use clap::{Parser, Subcommand, ValueEnum};
use leadgen::{
    calculate_lead_stats, categorize, dedup, filter_by_min_score, filter_leads, load_leads, mark_duplicates,
    merge_leads, normalize_leads, sort_by_score, to_csv, validate_csv_format, DedupKey, DnsMxChecker,
    FilterOptions, Lead, MockScraper, MxChecker, Pipeline, PipelineError, PipelineOptions, RulesConfig,
    ScrapeRequest, StaticMxChecker,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "leadgen")]
#[command(about = "Validate, score, deduplicate and export leads", long_about = None)]
struct Cli {
    /// JSON rules file (role keywords, TLDs, generic providers)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Trim fields and lower-case emails and domains
        #[arg(long)]
        normalize: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report structural problems in a CSV file
    Check {
        /// Input CSV file
        input: PathBuf,
    },

    /// Attach email flags (format, generic provider, MX)
    Validate {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Skip DNS lookups and assume every domain has MX records
        #[arg(long)]
        no_mx: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score leads
    Score {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Keep only leads scoring at least this much
        #[arg(long)]
        min_score: Option<f64>,

        /// Highest score first
        #[arg(long)]
        sort: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove duplicate leads
    Dedup {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Identity strategy
        #[arg(short, long, value_enum, default_value = "email")]
        key: KeyArg,

        /// Keep duplicates and flag them instead of dropping
        #[arg(long)]
        mark: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge leads that share an email address
    Merge {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full pipeline: validate → score → dedup
    Process {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Skip DNS lookups and assume every domain has MX records
        #[arg(long)]
        no_mx: bool,

        /// Identity strategy for the dedup stage
        #[arg(short, long, value_enum, default_value = "email")]
        key: KeyArg,

        /// Leads validated concurrently per batch
        #[arg(long, default_value = "10")]
        batch_size: usize,

        /// Output file; `.csv` writes CSV, anything else JSON (default: stdout JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply dashboard filters
    Filter {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Case-insensitive search over name, company, email, domain and role
        #[arg(short, long)]
        search: Option<String>,

        /// Only senior roles
        #[arg(long)]
        senior: bool,

        /// Only domains with a good TLD
        #[arg(long)]
        good_tlds: bool,

        /// Minimum score
        #[arg(long)]
        min_score: Option<f64>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert leads to CSV
    Export {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Output file, or a directory to get a timestamped file name (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show dashboard counters and score tiers
    Stats {
        /// Input file (.csv or .json)
        input: PathBuf,
    },

    /// Generate mock leads for a keyword and/or URLs
    Scrape {
        /// Search keyword
        #[arg(short, long)]
        keyword: Option<String>,

        /// Page URL (repeatable)
        #[arg(short, long = "url")]
        urls: Vec<String>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: $LEADGEN_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Skip DNS lookups and assume every domain has MX records
        #[arg(long)]
        no_mx: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KeyArg {
    Email,
    Domain,
    Advanced,
}

impl From<KeyArg> for DedupKey {
    fn from(key: KeyArg) -> Self {
        match key {
            KeyArg::Email => DedupKey::Email,
            KeyArg::Domain => DedupKey::Domain,
            KeyArg::Advanced => DedupKey::Advanced,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    leadgen::logging::init_cli_logger(cli.verbose);

    let rules = match load_rules(cli.rules.as_deref()) {
        Ok(rules) => rules,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Parse {
            input,
            normalize,
            output,
        } => cmd_parse(&input, normalize, output.as_deref()),

        Commands::Check { input } => cmd_check(&input),

        Commands::Validate { input, no_mx, output } => cmd_validate(&input, rules, no_mx, output.as_deref()).await,

        Commands::Score {
            input,
            min_score,
            sort,
            output,
        } => cmd_score(&input, rules, min_score, sort, output.as_deref()),

        Commands::Dedup {
            input,
            key,
            mark,
            output,
        } => cmd_dedup(&input, key.into(), mark, output.as_deref()),

        Commands::Merge { input, output } => cmd_merge(&input, output.as_deref()),

        Commands::Process {
            input,
            no_mx,
            key,
            batch_size,
            output,
        } => {
            let options = PipelineOptions {
                batch_size,
                dedup_key: key.into(),
                ..PipelineOptions::default()
            };
            cmd_process(&input, rules, no_mx, options, output.as_deref()).await
        }

        Commands::Filter {
            input,
            search,
            senior,
            good_tlds,
            min_score,
            output,
        } => {
            let options = FilterOptions {
                search_term: search,
                senior_roles_only: senior,
                good_tlds_only: good_tlds,
                min_score,
            };
            cmd_filter(&input, &rules, &options, output.as_deref())
        }

        Commands::Export { input, output } => cmd_export(&input, output.as_deref()),

        Commands::Stats { input } => cmd_stats(&input),

        Commands::Scrape {
            keyword,
            urls,
            seed,
            output,
        } => cmd_scrape(keyword, urls, seed, output.as_deref()),

        Commands::Serve { port, no_mx } => cmd_serve(port, rules, no_mx).await,
    };

    if let Err(e) = result {
        tracing::error!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_rules(path: Option<&Path>) -> Result<RulesConfig, leadgen::ConfigError> {
    match path {
        Some(path) => RulesConfig::load(path),
        None => Ok(RulesConfig::default()),
    }
}

fn mx_checker(no_mx: bool) -> Arc<dyn MxChecker> {
    if no_mx {
        Arc::new(StaticMxChecker::AcceptAll)
    } else {
        Arc::new(DnsMxChecker::default())
    }
}

fn read_leads(input: &Path) -> Result<Vec<Lead>, PipelineError> {
    let leads = load_leads(input)?;
    tracing::info!("📄 Loaded {} leads from {}", leads.len(), input.display());
    Ok(leads)
}

fn cmd_parse(input: &Path, normalize: bool, output: Option<&Path>) -> CliResult {
    let mut leads = read_leads(input)?;
    if normalize {
        leads = normalize_leads(&leads);
    }
    write_json(&leads, output)
}

fn cmd_check(input: &Path) -> CliResult {
    let content = leadgen::codec::decode_upload(&fs::read(input)?);
    let validation = validate_csv_format(&content);

    if validation.is_valid {
        tracing::info!("✅ {}: {} lines, structure OK", input.display(), validation.line_count);
        return Ok(());
    }

    for error in &validation.errors {
        tracing::warn!("   - {}", error);
    }
    Err(PipelineError::InvalidCsv(validation.errors).into())
}

async fn cmd_validate(input: &Path, rules: RulesConfig, no_mx: bool, output: Option<&Path>) -> CliResult {
    let leads = read_leads(input)?;
    let pipeline = Pipeline::new(rules, mx_checker(no_mx), PipelineOptions::default());

    let validated = pipeline.validate(&leads).await;
    let flagged = validated.iter().filter(|l| !l.flags.is_empty()).count();
    tracing::info!("✉️  {} of {} leads flagged", flagged, validated.len());

    write_json(&validated, output)
}

fn cmd_score(
    input: &Path,
    rules: RulesConfig,
    min_score: Option<f64>,
    sort: bool,
    output: Option<&Path>,
) -> CliResult {
    let leads = read_leads(input)?;
    let pipeline = Pipeline::new(rules, Arc::new(StaticMxChecker::AcceptAll), PipelineOptions::default());

    let mut scored = pipeline.score(&leads);
    if let Some(min) = min_score {
        scored = filter_by_min_score(&scored, min);
    }
    if sort {
        scored = sort_by_score(&scored);
    }

    write_json(&scored, output)
}

fn cmd_dedup(input: &Path, key: DedupKey, mark: bool, output: Option<&Path>) -> CliResult {
    let leads = read_leads(input)?;

    if mark {
        let marked = mark_duplicates(&leads, key);
        let flagged = marked.iter().filter(|l| l.has_flag(leadgen::flag::DUPLICATE)).count();
        tracing::info!("🧹 {} duplicates flagged", flagged);
        return write_json(&marked, output);
    }

    let outcome = dedup(&leads, key);
    tracing::info!("🧹 {} duplicates removed, {} kept", outcome.removed_count, outcome.leads.len());
    write_json(&outcome.leads, output)
}

fn cmd_merge(input: &Path, output: Option<&Path>) -> CliResult {
    let leads = read_leads(input)?;
    let merged = merge_leads(&leads);
    tracing::info!("🔗 {} leads merged into {}", leads.len(), merged.len());
    write_json(&merged, output)
}

async fn cmd_process(
    input: &Path,
    rules: RulesConfig,
    no_mx: bool,
    options: PipelineOptions,
    output: Option<&Path>,
) -> CliResult {
    let leads = read_leads(input)?;
    let pipeline = Pipeline::new(rules, mx_checker(no_mx), options);

    let result = pipeline.process(&leads).await?;
    tracing::info!(
        "📊 {} leads, {} invalid, {} without MX, average score {}",
        result.stats.total,
        result.stats.invalid_format,
        result.stats.no_mx,
        result.stats.avg_score
    );

    match output {
        Some(path) if has_extension(path, "csv") => write_output(&to_csv(&result.leads), Some(path)),
        _ => write_json(&result, output),
    }
}

fn cmd_filter(input: &Path, rules: &RulesConfig, options: &FilterOptions, output: Option<&Path>) -> CliResult {
    let leads = read_leads(input)?;
    let kept = filter_leads(&leads, options, &rules.scoring);
    tracing::info!("🔎 {} of {} leads match", kept.len(), leads.len());
    write_json(&kept, output)
}

fn cmd_export(input: &Path, output: Option<&Path>) -> CliResult {
    let leads = read_leads(input)?;
    if leads.is_empty() {
        return Err("No leads to export".into());
    }

    let content = to_csv(&leads);
    match output {
        Some(dir) if dir.is_dir() => {
            let path = dir.join(leadgen::codec::export_filename("leads-export", chrono::Utc::now()));
            write_output(&content, Some(&path))
        }
        other => write_output(&content, other),
    }
}

fn cmd_stats(input: &Path) -> CliResult {
    let leads = read_leads(input)?;
    let stats = calculate_lead_stats(&leads);
    let tiers = categorize(&leads);

    let report = json!({
        "stats": stats,
        "tiers": {
            "hot": tiers.hot.len(),
            "warm": tiers.warm.len(),
            "cold": tiers.cold.len(),
        }
    });
    write_output(&serde_json::to_string_pretty(&report)?, None)
}

fn cmd_scrape(keyword: Option<String>, urls: Vec<String>, seed: Option<u64>, output: Option<&Path>) -> CliResult {
    let request = ScrapeRequest {
        keyword,
        urls: Some(urls),
    };
    let mut scraper = match seed {
        Some(seed) => MockScraper::seeded(seed),
        None => MockScraper::from_entropy(),
    };

    let leads = scraper.scrape(&request)?;
    tracing::info!("🕸️  Generated {} leads", leads.len());
    write_json(&leads, output)
}

async fn cmd_serve(port: Option<u16>, rules: RulesConfig, no_mx: bool) -> CliResult {
    let port = port
        .or_else(|| std::env::var("LEADGEN_PORT").ok()?.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let pipeline = Pipeline::new(rules, mx_checker(no_mx), PipelineOptions::default());
    leadgen::server::start_server(port, pipeline).await
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn write_json<T: serde::Serialize + ?Sized>(value: &T, path: Option<&Path>) -> CliResult {
    let json = serde_json::to_string_pretty(value)?;
    write_output(&json, path)
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            tracing::info!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
